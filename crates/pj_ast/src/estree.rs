//! ESTree node types.
//!
//! Every node carries a half-open `[start, end)` byte range into the
//! synthesized target text. Each struct serializes with its ESTree `"type"`
//! tag; the [`Statement`] and [`Expression`] unions are untagged so the
//! inner tag is the only one written.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Program {
    pub start: usize,
    pub end: usize,
    pub body: Vec<Statement>,
    pub source_type: SourceType,
}

impl Program {
    pub fn new(body: Vec<Statement>, end: usize) -> Self {
        Self {
            start: 0,
            end,
            body,
            source_type: SourceType::Script,
        }
    }
}

/// Top-level and block-level statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Statement {
    VariableDeclaration(VariableDeclaration),
    ExpressionStatement(ExpressionStatement),
    FunctionDeclaration(FunctionDeclaration),
}

impl Statement {
    pub fn start(&self) -> usize {
        match self {
            Statement::VariableDeclaration(n) => n.start,
            Statement::ExpressionStatement(n) => n.start,
            Statement::FunctionDeclaration(n) => n.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Statement::VariableDeclaration(n) => n.end,
            Statement::ExpressionStatement(n) => n.end,
            Statement::FunctionDeclaration(n) => n.end,
        }
    }

    /// ESTree `"type"` tag of the node.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::VariableDeclaration(_) => "VariableDeclaration",
            Statement::ExpressionStatement(_) => "ExpressionStatement",
            Statement::FunctionDeclaration(_) => "FunctionDeclaration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Identifier(Identifier),
    Literal(Literal),
    CallExpression(Box<CallExpression>),
    MemberExpression(Box<MemberExpression>),
}

impl Expression {
    pub fn start(&self) -> usize {
        match self {
            Expression::Identifier(n) => n.start,
            Expression::Literal(n) => n.start,
            Expression::CallExpression(n) => n.start,
            Expression::MemberExpression(n) => n.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Expression::Identifier(n) => n.end,
            Expression::Literal(n) => n.end,
            Expression::CallExpression(n) => n.end,
            Expression::MemberExpression(n) => n.end,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    Var,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct VariableDeclaration {
    pub start: usize,
    pub end: usize,
    pub declarations: Vec<VariableDeclarator>,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct VariableDeclarator {
    pub start: usize,
    pub end: usize,
    pub id: Identifier,
    pub init: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Identifier {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

impl Identifier {
    /// Identifier spanning `name.len()` bytes from `start`.
    pub fn at(start: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            start,
            end: start + name.len(),
            name,
        }
    }
}

/// Scalar literal value. `Null` serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Literal {
    pub start: usize,
    pub end: usize,
    pub value: LiteralValue,
    /// Target-language source text of the literal.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct ExpressionStatement {
    pub start: usize,
    pub end: usize,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct CallExpression {
    pub start: usize,
    pub end: usize,
    pub callee: Expression,
    pub arguments: Vec<Expression>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct MemberExpression {
    pub start: usize,
    pub end: usize,
    pub object: Expression,
    pub property: Identifier,
    pub computed: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FunctionDeclaration {
    pub start: usize,
    pub end: usize,
    pub id: Identifier,
    pub expression: bool,
    pub generator: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub params: Vec<Identifier>,
    pub body: BlockStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct BlockStatement {
    pub start: usize,
    pub end: usize,
    pub body: Vec<Statement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variable_declaration_serializes_as_estree() {
        let decl = Statement::VariableDeclaration(VariableDeclaration {
            start: 0,
            end: 16,
            declarations: vec![VariableDeclarator {
                start: 4,
                end: 15,
                id: Identifier::at(4, "x"),
                init: Some(Expression::Literal(Literal {
                    start: 8,
                    end: 15,
                    value: LiteralValue::String("hello".into()),
                    raw: "\"hello\"".into(),
                })),
            }],
            kind: VariableKind::Var,
        });

        let value = serde_json::to_value(&decl).unwrap();
        assert_eq!(value["type"], "VariableDeclaration");
        assert_eq!(value["kind"], "var");
        assert_eq!(value["declarations"][0]["type"], "VariableDeclarator");
        assert_eq!(
            value["declarations"][0]["id"],
            json!({"type": "Identifier", "start": 4, "end": 5, "name": "x"})
        );
        assert_eq!(value["declarations"][0]["init"]["value"], "hello");
        assert_eq!(value["declarations"][0]["init"]["raw"], "\"hello\"");
    }

    #[test]
    fn program_uses_camel_case_source_type() {
        let value = serde_json::to_value(Program::new(vec![], 0)).unwrap();
        assert_eq!(
            value,
            json!({"type": "Program", "start": 0, "end": 0, "body": [], "sourceType": "script"})
        );
    }

    #[test]
    fn null_literal_serializes_as_json_null() {
        let lit = Literal {
            start: 0,
            end: 4,
            value: LiteralValue::Null,
            raw: "null".into(),
        };
        let value = serde_json::to_value(&lit).unwrap();
        assert!(value["value"].is_null());
    }

    #[test]
    fn function_declaration_writes_async_flag() {
        let decl = FunctionDeclaration {
            start: 0,
            end: 22,
            id: Identifier::at(9, "add"),
            expression: false,
            generator: false,
            is_async: false,
            params: vec![Identifier::at(13, "a"), Identifier::at(14, "b")],
            body: BlockStatement {
                start: 19,
                end: 22,
                body: vec![],
            },
        };
        let value = serde_json::to_value(&decl).unwrap();
        assert_eq!(value["async"], false);
        assert_eq!(value["body"]["type"], "BlockStatement");
        assert_eq!(value["params"][1]["name"], "b");
    }
}
