//! AST Builder.
//!
//! Each appended statement is rendered to its JavaScript text first; node
//! offsets are then derived purely from the lengths of the pieces of that
//! text, relative to the output cursor. The builder keeps the synthesized
//! text itself, one statement per line, so the cursor is always its length:
//! appending a statement advances the cursor by `len(text) + 1`.
//!
//! Function parameters are the one approximation: parameter `i` starts `i`
//! bytes after the opening parenthesis, whatever the preceding names' lengths.

use pj_ast::{
    BlockStatement, CallExpression, Expression, ExpressionStatement, FunctionDeclaration,
    Identifier, Literal, MemberExpression, Program, Statement, VariableDeclaration,
    VariableDeclarator, VariableKind,
};

use crate::builtins::{Callee, JsLiteral, MappedCall, TargetArg};

/// A statement with builtins mapped and literals rendered, ready to build.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Variable {
        name: String,
        value: JsLiteral,
    },
    Call(MappedCall),
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<Lowered>,
    },
}

#[derive(Debug, Default)]
pub struct AstBuilder {
    body: Vec<Statement>,
    text: String,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of target text emitted so far.
    pub fn cursor(&self) -> usize {
        self.text.len()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn append(&mut self, stmt: &Lowered) {
        let (node, text) = build(stmt, self.cursor());
        self.body.push(node);
        self.text.push_str(&text);
        self.text.push('\n');
    }

    /// The finished program and the synthesized text its offsets refer to.
    pub fn finish(self) -> (Program, String) {
        (Program::new(self.body, self.text.len()), self.text)
    }
}

/// Build the node for `stmt` placed at offset `at`, returning it with its
/// rendered text.
fn build(stmt: &Lowered, at: usize) -> (Statement, String) {
    match stmt {
        Lowered::Variable { name, value } => build_variable(name, value, at),
        Lowered::Call(call) => build_call(call, at),
        Lowered::Function { name, params, body } => build_function(name, params, body, at),
    }
}

fn build_variable(name: &str, value: &JsLiteral, at: usize) -> (Statement, String) {
    let text = format!("var {name} = {};", value.raw);
    let end = at + text.len();
    let id = Identifier::at(at + "var ".len(), name);
    let init = Literal {
        start: id.end + " = ".len(),
        end: end - 1,
        value: value.value.clone(),
        raw: value.raw.clone(),
    };

    let node = VariableDeclaration {
        start: at,
        end,
        declarations: vec![VariableDeclarator {
            start: id.start,
            end: end - 1,
            id,
            init: Some(Expression::Literal(init)),
        }],
        kind: VariableKind::Var,
    };
    (Statement::VariableDeclaration(node), text)
}

fn build_call(call: &MappedCall, at: usize) -> (Statement, String) {
    let callee_text = call.callee.render();
    let arg_texts: Vec<&str> = call.args.iter().map(TargetArg::render).collect();
    let text = format!("{callee_text}({});", arg_texts.join(", "));
    let end = at + text.len();

    let callee = match &call.callee {
        Callee::Member { object, property } => {
            let object = Identifier::at(at, *object);
            let property = Identifier::at(object.end + 1, *property);
            Expression::MemberExpression(Box::new(MemberExpression {
                start: at,
                end: property.end,
                object: Expression::Identifier(object),
                property,
                computed: false,
                optional: false,
            }))
        }
        Callee::Name(name) => Expression::Identifier(Identifier::at(at, name.as_str())),
    };

    let mut pos = at + callee_text.len() + 1;
    let arguments = call
        .args
        .iter()
        .map(|arg| {
            let start = pos;
            pos += arg.render().len() + ", ".len();
            match arg {
                TargetArg::Identifier(name) => {
                    Expression::Identifier(Identifier::at(start, name.as_str()))
                }
                TargetArg::Literal(lit) => Expression::Literal(Literal {
                    start,
                    end: start + lit.raw.len(),
                    value: lit.value.clone(),
                    raw: lit.raw.clone(),
                }),
            }
        })
        .collect();

    let node = ExpressionStatement {
        start: at,
        end,
        expression: Expression::CallExpression(Box::new(CallExpression {
            start: at,
            end: end - 1,
            callee,
            arguments,
            optional: false,
        })),
    };
    (Statement::ExpressionStatement(node), text)
}

fn build_function(name: &str, params: &[String], body: &[Lowered], at: usize) -> (Statement, String) {
    let header = format!("function {name}({}) ", params.join(", "));
    let id = Identifier::at(at + "function ".len(), name);

    let params_at = id.end + 1;
    let param_nodes = params
        .iter()
        .enumerate()
        .map(|(i, p)| Identifier::at(params_at + i, p.as_str()))
        .collect();

    let block_start = at + header.len();
    let mut block_text = String::from("{");
    let mut block_body = Vec::with_capacity(body.len());
    if body.is_empty() {
        block_text.push(' ');
    } else {
        block_text.push('\n');
        for stmt in body {
            let (node, text) = build(stmt, block_start + block_text.len());
            block_body.push(node);
            block_text.push_str(&text);
            block_text.push('\n');
        }
    }
    block_text.push('}');

    let text = format!("{header}{block_text}");
    let end = at + text.len();
    let node = FunctionDeclaration {
        start: at,
        end,
        id,
        expression: false,
        generator: false,
        is_async: false,
        params: param_nodes,
        body: BlockStatement {
            start: block_start,
            end,
            body: block_body,
        },
    };
    (Statement::FunctionDeclaration(node), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{js_literal, map_call};
    use pj_ast::LiteralValue;
    use pj_parser::ScalarLiteral;

    fn string_var(name: &str, value: &str) -> Lowered {
        Lowered::Variable {
            name: name.into(),
            value: js_literal(&ScalarLiteral::Str(value.into())).unwrap(),
        }
    }

    fn call(name: &str, args: &str) -> Lowered {
        Lowered::Call(map_call(name, args).unwrap())
    }

    #[test]
    fn variable_offsets_follow_synthesized_text() {
        let mut builder = AstBuilder::new();
        builder.append(&string_var("x", "hello"));
        let (program, text) = builder.finish();

        assert_eq!(text, "var x = \"hello\";\n");
        assert_eq!(program.end, text.len());

        let Statement::VariableDeclaration(decl) = &program.body[0] else {
            panic!("expected a variable declaration");
        };
        assert_eq!((decl.start, decl.end), (0, 16));
        let declarator = &decl.declarations[0];
        assert_eq!((declarator.start, declarator.end), (4, 15));
        assert_eq!(&text[declarator.id.start..declarator.id.end], "x");
        let Some(Expression::Literal(lit)) = &declarator.init else {
            panic!("expected a literal initializer");
        };
        assert_eq!(&text[lit.start..lit.end], "\"hello\"");
        assert_eq!(lit.value, LiteralValue::String("hello".into()));
    }

    #[test]
    fn log_call_offsets_follow_synthesized_text() {
        let mut builder = AstBuilder::new();
        builder.append(&string_var("x", "hi"));
        let call_at = builder.cursor();
        builder.append(&call("echo", "$x"));
        let (program, text) = builder.finish();

        assert_eq!(text, "var x = \"hi\";\nconsole.log(x);\n");

        let Statement::ExpressionStatement(stmt) = &program.body[1] else {
            panic!("expected an expression statement");
        };
        assert_eq!((stmt.start, stmt.end), (call_at, call_at + 15));
        let Expression::CallExpression(call) = &stmt.expression else {
            panic!("expected a call");
        };
        assert_eq!(&text[call.start..call.end], "console.log(x)");
        let Expression::MemberExpression(member) = &call.callee else {
            panic!("expected a member callee");
        };
        assert_eq!(&text[member.start..member.end], "console.log");
        assert_eq!(&text[member.object.start()..member.object.end()], "console");
        assert_eq!(&text[member.property.start..member.property.end], "log");
        assert_eq!(&text[call.arguments[0].start()..call.arguments[0].end()], "x");
    }

    #[test]
    fn multiple_arguments_each_get_their_own_range() {
        let mut builder = AstBuilder::new();
        builder.append(&call("max", "$a, 10, \"z\""));
        let (program, text) = builder.finish();
        assert_eq!(text, "Math.max(a, 10, \"z\");\n");

        let Statement::ExpressionStatement(stmt) = &program.body[0] else {
            panic!("expected an expression statement");
        };
        let Expression::CallExpression(call) = &stmt.expression else {
            panic!("expected a call");
        };
        let slices: Vec<_> = call
            .arguments
            .iter()
            .map(|a| &text[a.start()..a.end()])
            .collect();
        assert_eq!(slices, vec!["a", "10", "\"z\""]);
    }

    #[test]
    fn passthrough_call_uses_identifier_callee() {
        let mut builder = AstBuilder::new();
        builder.append(&call("my_helper", ""));
        let (program, text) = builder.finish();
        assert_eq!(text, "my_helper();\n");
        let Statement::ExpressionStatement(stmt) = &program.body[0] else {
            panic!("expected an expression statement");
        };
        let Expression::CallExpression(call) = &stmt.expression else {
            panic!("expected a call");
        };
        assert_eq!(
            call.callee,
            Expression::Identifier(Identifier::at(0, "my_helper"))
        );
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn empty_function_declaration() {
        let mut builder = AstBuilder::new();
        builder.append(&Lowered::Function {
            name: "add".into(),
            params: vec!["a".into(), "b".into()],
            body: vec![],
        });
        let (program, text) = builder.finish();
        assert_eq!(text, "function add(a, b) { }\n");

        let Statement::FunctionDeclaration(func) = &program.body[0] else {
            panic!("expected a function declaration");
        };
        assert_eq!(&text[func.id.start..func.id.end], "add");
        assert_eq!(&text[func.body.start..func.body.end], "{ }");
        assert_eq!((func.start, func.end), (0, 22));

        // One byte per parameter from the opening parenthesis.
        let starts: Vec<_> = func.params.iter().map(|p| p.start).collect();
        assert_eq!(starts, vec![13, 14]);
        let names: Vec<_> = func.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn function_body_statements_sit_inside_the_block() {
        let mut builder = AstBuilder::new();
        builder.append(&string_var("x", "1"));
        builder.append(&Lowered::Function {
            name: "greet".into(),
            params: vec!["name".into()],
            body: vec![call("echo", "$name"), string_var("done", "yes")],
        });
        let (program, text) = builder.finish();
        assert_eq!(
            text,
            "var x = \"1\";\nfunction greet(name) {\nconsole.log(name);\nvar done = \"yes\";\n}\n"
        );

        let Statement::FunctionDeclaration(func) = &program.body[1] else {
            panic!("expected a function declaration");
        };
        assert_eq!(func.body.body.len(), 2);
        let inner = &func.body.body[0];
        assert_eq!(&text[inner.start()..inner.end()], "console.log(name);");
        let inner = &func.body.body[1];
        assert_eq!(&text[inner.start()..inner.end()], "var done = \"yes\";");
        assert_eq!(func.body.end, func.end);
        assert_eq!((func.start, func.end), (13, text.len() - 1));
    }

    #[test]
    fn cursor_is_sum_of_statement_lengths_plus_separators() {
        let stmts = [
            string_var("a", "x"),
            call("echo", "$a"),
            call("abs", "-3"),
            Lowered::Function {
                name: "f".into(),
                params: vec![],
                body: vec![],
            },
        ];
        let mut builder = AstBuilder::new();
        let mut expected = 0;
        let mut previous = builder.cursor();
        for stmt in &stmts {
            builder.append(stmt);
            assert!(builder.cursor() >= previous);
            previous = builder.cursor();
        }
        let (program, text) = builder.finish();
        for stmt in &program.body {
            expected += stmt.end() - stmt.start() + 1;
        }
        assert_eq!(text.len(), expected);
        assert_eq!(program.end, expected);
    }
}
