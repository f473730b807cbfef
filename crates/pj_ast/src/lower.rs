//! Lowering from the ESTree tree to `swc_ecma_ast`.
//!
//! Offsets become SWC spans relative to `base`, the start position of the
//! synthesized text once it is registered in a `SourceMap`. Printing the
//! module with that map yields source maps pointing back at the synthesized
//! text.

use swc_common::{BytePos, Span, SyntaxContext};
use swc_ecma_ast as ast;

use crate::estree::*;

/// Lower a program into an SWC module whose spans are shifted by `base`.
pub fn lower_program(program: &Program, base: BytePos) -> ast::Module {
    let lowering = Lowering { base };
    ast::Module {
        span: lowering.span(program.start, program.end),
        body: program
            .body
            .iter()
            .map(|stmt| ast::ModuleItem::Stmt(lowering.stmt(stmt)))
            .collect(),
        shebang: None,
    }
}

struct Lowering {
    base: BytePos,
}

impl Lowering {
    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(
            BytePos(self.base.0 + start as u32),
            BytePos(self.base.0 + end as u32),
        )
    }

    fn stmt(&self, stmt: &Statement) -> ast::Stmt {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                ast::Stmt::Decl(ast::Decl::Var(Box::new(ast::VarDecl {
                    span: self.span(decl.start, decl.end),
                    ctxt: SyntaxContext::empty(),
                    kind: ast::VarDeclKind::Var,
                    declare: false,
                    decls: decl
                        .declarations
                        .iter()
                        .map(|d| self.declarator(d))
                        .collect(),
                })))
            }
            Statement::ExpressionStatement(expr_stmt) => ast::Stmt::Expr(ast::ExprStmt {
                span: self.span(expr_stmt.start, expr_stmt.end),
                expr: Box::new(self.expr(&expr_stmt.expression)),
            }),
            Statement::FunctionDeclaration(func) => ast::Stmt::Decl(ast::Decl::Fn(ast::FnDecl {
                ident: self.ident(&func.id),
                declare: false,
                function: Box::new(self.function(func)),
            })),
        }
    }

    fn declarator(&self, decl: &VariableDeclarator) -> ast::VarDeclarator {
        ast::VarDeclarator {
            span: self.span(decl.start, decl.end),
            name: ast::Pat::Ident(self.ident(&decl.id).into()),
            init: decl.init.as_ref().map(|e| Box::new(self.expr(e))),
            definite: false,
        }
    }

    fn function(&self, func: &FunctionDeclaration) -> ast::Function {
        ast::Function {
            params: func
                .params
                .iter()
                .map(|p| ast::Param {
                    span: self.span(p.start, p.end),
                    decorators: vec![],
                    pat: ast::Pat::Ident(self.ident(p).into()),
                })
                .collect(),
            decorators: vec![],
            span: self.span(func.start, func.end),
            ctxt: SyntaxContext::empty(),
            body: Some(ast::BlockStmt {
                span: self.span(func.body.start, func.body.end),
                ctxt: SyntaxContext::empty(),
                stmts: func.body.body.iter().map(|s| self.stmt(s)).collect(),
            }),
            is_generator: func.generator,
            is_async: func.is_async,
            type_params: None,
            return_type: None,
        }
    }

    fn ident(&self, ident: &Identifier) -> ast::Ident {
        ast::Ident::new_no_ctxt(
            ident.name.as_str().into(),
            self.span(ident.start, ident.end),
        )
    }

    fn expr(&self, expr: &Expression) -> ast::Expr {
        match expr {
            Expression::Identifier(ident) => ast::Expr::Ident(self.ident(ident)),
            Expression::Literal(lit) => self.literal(lit),
            Expression::CallExpression(call) => ast::Expr::Call(ast::CallExpr {
                span: self.span(call.start, call.end),
                callee: ast::Callee::Expr(Box::new(self.expr(&call.callee))),
                args: call
                    .arguments
                    .iter()
                    .map(|arg| ast::ExprOrSpread {
                        spread: None,
                        expr: Box::new(self.expr(arg)),
                    })
                    .collect(),
                type_args: None,
                ..Default::default()
            }),
            Expression::MemberExpression(member) => ast::Expr::Member(ast::MemberExpr {
                span: self.span(member.start, member.end),
                obj: Box::new(self.expr(&member.object)),
                prop: ast::MemberProp::Ident(ast::IdentName::new(
                    member.property.name.as_str().into(),
                    self.span(member.property.start, member.property.end),
                )),
            }),
        }
    }

    fn literal(&self, lit: &Literal) -> ast::Expr {
        let span = self.span(lit.start, lit.end);
        match &lit.value {
            LiteralValue::Null => ast::Expr::Lit(ast::Lit::Null(ast::Null { span })),
            LiteralValue::Bool(value) => {
                ast::Expr::Lit(ast::Lit::Bool(ast::Bool { span, value: *value }))
            }
            // ESTree keeps `-5` as one literal; JavaScript has no negative
            // numeric literal, so SWC gets a unary minus.
            LiteralValue::Number(value) if *value < 0.0 => ast::Expr::Unary(ast::UnaryExpr {
                span,
                op: ast::UnaryOp::Minus,
                arg: Box::new(ast::Expr::Lit(ast::Lit::Num(ast::Number {
                    span: self.span(lit.start + 1, lit.end),
                    value: -*value,
                    raw: Some(lit.raw.trim_start_matches('-').into()),
                }))),
            }),
            LiteralValue::Number(value) => ast::Expr::Lit(ast::Lit::Num(ast::Number {
                span,
                value: *value,
                raw: Some(lit.raw.as_str().into()),
            })),
            LiteralValue::String(value) => ast::Expr::Lit(ast::Lit::Str(ast::Str {
                span,
                value: value.as_str().into(),
                raw: Some(lit.raw.as_str().into()),
            })),
        }
    }
}
