//! Tree-sitter based front-end.
//!
//! Parses the whole file with the PHP grammar and maps the node kinds that
//! correspond to pj's statement taxonomy onto [`StatementRecord`]s. Anything
//! else at statement level is reported, never dropped.

use tree_sitter::{Node, Parser};

use crate::record::{ScalarLiteral, ScanError, Scanned, Statement, StatementRecord};
use crate::{Frontend, ReadError, StatementStream};

pub struct TreeSitterFrontend;

impl Frontend for TreeSitterFrontend {
    fn kind(&self) -> pj_ast::FrontendKind {
        pj_ast::FrontendKind::TreeSitter
    }

    fn statements<'src>(&self, source: &'src str) -> Result<StatementStream<'src>, ReadError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP_ONLY.into())
            .map_err(|err| ReadError::Language(err.to_string()))?;

        let tree = parser.parse(source, None).ok_or(ReadError::NoTree)?;

        let ctx = ReadContext::new(source);
        let items = ctx.read_statements(tree.root_node());
        Ok(Box::new(items.into_iter()))
    }
}

struct ReadContext<'a> {
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn record(&self, statement: Statement, node: Node) -> Scanned {
        Ok(StatementRecord::new(statement, self.source, node.byte_range()))
    }

    fn unsupported(&self, construct: impl Into<String>, node: Node) -> ScanError {
        ScanError::UnsupportedConstruct {
            construct: construct.into(),
            span: node.byte_range(),
            text: self.node_text(node).to_string(),
        }
    }

    /// Read the named children of a `program` or `compound_statement`.
    fn read_statements(&self, parent: Node) -> Vec<Scanned> {
        let mut cursor = parent.walk();
        parent
            .named_children(&mut cursor)
            .filter_map(|child| self.read_statement(child))
            .collect()
    }

    fn read_statement(&self, node: Node) -> Option<Scanned> {
        let item = match node.kind() {
            "comment" | "php_tag" | "text_interpolation" | "empty_statement" => return None,
            "expression_statement" => self.read_expression_statement(node),
            "echo_statement" => self.read_echo(node),
            "function_definition" => self.read_function(node),
            "ERROR" => Err(ScanError::UnrecognizedStatement {
                span: node.byte_range(),
                text: self.node_text(node).to_string(),
            }),
            kind => Err(self.unsupported(kind, node)),
        };
        Some(item)
    }

    fn read_expression_statement(&self, node: Node) -> Scanned {
        let Some(expr) = node.named_child(0) else {
            return Err(self.unsupported("expression_statement", node));
        };

        match expr.kind() {
            "assignment_expression" => {
                let left = expr
                    .child_by_field_name("left")
                    .filter(|l| l.kind() == "variable_name")
                    .ok_or_else(|| self.unsupported("assignment target", node))?;
                let right = expr
                    .child_by_field_name("right")
                    .ok_or_else(|| self.unsupported("assignment_expression", node))?;
                let value = self.read_literal(right)?;
                let name = self.node_text(left).trim_start_matches('$').to_string();
                self.record(Statement::VariableAssignment { name, value }, node)
            }
            "function_call_expression" => {
                let function = expr
                    .child_by_field_name("function")
                    .filter(|f| matches!(f.kind(), "name" | "qualified_name"))
                    .ok_or_else(|| self.unsupported("dynamic call", node))?;
                let args = expr
                    .child_by_field_name("arguments")
                    .map(|a| strip_parens(self.node_text(a)))
                    .unwrap_or_default();
                self.record(
                    Statement::FunctionCall {
                        callee: self.node_text(function).to_string(),
                        args: args.to_string(),
                    },
                    node,
                )
            }
            "print_intrinsic" => {
                let args = expr
                    .named_child(0)
                    .map(|arg| self.argument_text(arg))
                    .unwrap_or_default();
                self.record(
                    Statement::FunctionCall {
                        callee: "print".into(),
                        args: args.to_string(),
                    },
                    node,
                )
            }
            kind => Err(self.unsupported(kind, node)),
        }
    }

    /// `echo $a;`, `echo($a);` and `echo $a, $b;`.
    fn read_echo(&self, node: Node) -> Scanned {
        let mut cursor = node.walk();
        let args: Vec<&str> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .map(|child| self.argument_text(child))
            .collect();
        self.record(
            Statement::FunctionCall {
                callee: "echo".into(),
                args: args.join(", "),
            },
            node,
        )
    }

    fn read_function(&self, node: Node) -> Scanned {
        let name = node
            .child_by_field_name("name")
            .ok_or_else(|| self.unsupported("anonymous function_definition", node))?;
        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| self.unsupported("function without body", node))?;

        let mut params = Vec::new();
        if let Some(list) = node.child_by_field_name("parameters") {
            let mut cursor = list.walk();
            for param in list.named_children(&mut cursor) {
                match param.kind() {
                    "comment" => continue,
                    "simple_parameter" => {}
                    // `...$rest`, constructor promotion
                    kind => return Err(self.unsupported(kind, param)),
                }
                let param_name = param
                    .child_by_field_name("name")
                    .ok_or_else(|| self.unsupported(param.kind(), param))?;
                params.push(self.node_text(param_name).trim_start_matches('$').to_string());
            }
        }

        self.record(
            Statement::FunctionDeclaration {
                name: self.node_text(name).to_string(),
                params,
                body: strip_braces(self.node_text(body)).to_string(),
                body_statements: self.read_statements(body),
            },
            node,
        )
    }

    fn read_literal(&self, node: Node) -> Result<ScalarLiteral, ScanError> {
        let text = self.node_text(node);
        match node.kind() {
            "encapsed_string" => {
                let mut cursor = node.walk();
                let interpolated = node
                    .named_children(&mut cursor)
                    .any(|c| !matches!(c.kind(), "string_content" | "string_value" | "escape_sequence"));
                if interpolated {
                    return Err(self.unsupported("interpolated string", node));
                }
                self.read_string(node)
            }
            "string" => self.read_string(node),
            "integer" | "float" => Ok(ScalarLiteral::Number(text.to_string())),
            "boolean" => Ok(ScalarLiteral::Bool(text.eq_ignore_ascii_case("true"))),
            "null" => Ok(ScalarLiteral::Null),
            "unary_op_expression" => {
                let compact: String = text.split_whitespace().collect();
                if compact.starts_with('-') && crate::parse_php_number(&compact).is_some() {
                    Ok(ScalarLiteral::Number(compact))
                } else {
                    Err(self.unsupported("unary_op_expression", node))
                }
            }
            kind => Err(self.unsupported(kind, node)),
        }
    }

    fn read_string(&self, node: Node) -> Result<ScalarLiteral, ScanError> {
        pj_lexer::unquote(self.node_text(node))
            .map(ScalarLiteral::Str)
            .ok_or_else(|| self.unsupported("string escape", node))
    }

    /// Argument text with one layer of parentheses removed.
    fn argument_text(&self, node: Node) -> &'a str {
        let text = self.node_text(node);
        if node.kind() == "parenthesized_expression" {
            strip_parens(text)
        } else {
            text
        }
    }
}

fn strip_parens(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text)
        .trim()
}

fn strip_braces(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text)
        .trim()
}
