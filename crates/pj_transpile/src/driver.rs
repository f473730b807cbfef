//! Program Driver.
//!
//! Pulls statements from the configured front-end, maps builtins, and feeds
//! the AST builder until the source is exhausted. Statements that cannot be
//! translated are recorded as [`Diagnostic`]s and left out of the tree; in
//! strict mode an unrecognised statement ends the run instead.

use std::ops::Range;

use pj_ast::{FrontendKind, Mode, PjOptions, Program};
use pj_parser::{frontend_for, Frontend, ReadError, ScanError, Statement, StatementRecord};
use tracing::{debug, info, warn};

use crate::builder::{AstBuilder, Lowered};
use crate::builtins::{check_identifier, js_literal, map_call, Callee, MapError, TargetArg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnrecognizedStatement,
    UnsupportedBuiltinArgument,
    UnsupportedTopLevelConstruct,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UnrecognizedStatement => write!(f, "unrecognized statement"),
            DiagnosticKind::UnsupportedBuiltinArgument => write!(f, "unsupported builtin argument"),
            DiagnosticKind::UnsupportedTopLevelConstruct => write!(f, "unsupported construct"),
        }
    }
}

/// A statement left out of the output, with the source bytes it covered.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Range<usize>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at bytes {}..{}: {}",
            self.kind, self.span.start, self.span.end, self.message
        )
    }
}

impl From<ScanError> for Diagnostic {
    fn from(err: ScanError) -> Self {
        let kind = match err {
            ScanError::UnrecognizedStatement { .. } => DiagnosticKind::UnrecognizedStatement,
            ScanError::UnsupportedConstruct { .. } => DiagnosticKind::UnsupportedTopLevelConstruct,
        };
        Diagnostic {
            kind,
            span: err.span(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranspileError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("{0}")]
    Unrecognized(ScanError),
}

/// Per-kind counts of the top-level statements in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub variables: usize,
    pub calls: usize,
    pub functions: usize,
    pub skipped: usize,
}

/// Result of one run.
#[derive(Debug, Clone)]
pub struct Transpiled {
    pub program: Program,
    /// Target text the program's offsets refer to.
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: Summary,
}

/// The unconsumed part of the source, as a position into immutable text.
struct SourceBuffer<'src> {
    source: &'src str,
    consumed: usize,
}

impl<'src> SourceBuffer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            consumed: 0,
        }
    }

    /// Drop everything up to the end of `span`.
    fn consume(&mut self, span: &Range<usize>) {
        debug_assert!(
            span.start >= self.consumed,
            "statement at {span:?} overlaps consumed input (..{})",
            self.consumed
        );
        self.consumed = span.end.max(self.consumed);
    }

    fn is_exhausted(&self) -> bool {
        self.source[self.consumed..].trim().is_empty()
    }
}

pub struct Transpiler {
    frontend: Box<dyn Frontend>,
    mode: Mode,
}

impl Transpiler {
    pub fn new(options: PjOptions) -> Self {
        Self::with_frontend(frontend_for(options.frontend), options.mode)
    }

    pub fn with_frontend(frontend: Box<dyn Frontend>, mode: Mode) -> Self {
        Self { frontend, mode }
    }

    pub fn frontend(&self) -> FrontendKind {
        self.frontend.kind()
    }

    /// Transpile one source file.
    #[tracing::instrument(skip_all, fields(frontend = %self.frontend.kind(), mode = ?self.mode))]
    pub fn transpile(&self, source: &str) -> Result<Transpiled, TranspileError> {
        let mut buffer = SourceBuffer::new(source);
        let mut statements = self.frontend.statements(source)?;
        let mut builder = AstBuilder::new();
        let mut diagnostics = Vec::new();
        let mut summary = Summary::default();

        while !buffer.is_exhausted() {
            let Some(item) = statements.next() else {
                break;
            };

            match item {
                Ok(record) => {
                    buffer.consume(&record.span);
                    debug!(
                        kind = %record.statement.kind(),
                        start = record.span.start,
                        end = record.span.end,
                        cursor = builder.cursor(),
                        "consumed statement"
                    );
                    match self.lower(&record, &mut diagnostics)? {
                        Some(lowered) => {
                            match lowered {
                                Lowered::Variable { .. } => summary.variables += 1,
                                Lowered::Call(_) => summary.calls += 1,
                                Lowered::Function { .. } => summary.functions += 1,
                            }
                            builder.append(&lowered);
                        }
                        None => summary.skipped += 1,
                    }
                }
                Err(err) => {
                    buffer.consume(&err.span());
                    self.report(err, &mut diagnostics)?;
                    summary.skipped += 1;
                }
            }
        }

        let (program, text) = builder.finish();
        info!(
            variables = summary.variables,
            calls = summary.calls,
            functions = summary.functions,
            skipped = summary.skipped,
            output_bytes = text.len(),
            "transpiled program"
        );

        Ok(Transpiled {
            program,
            text,
            diagnostics,
            summary,
        })
    }

    /// Map builtins and render literals. `None` means the statement was
    /// dropped and a diagnostic recorded.
    fn lower(
        &self,
        record: &StatementRecord,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Option<Lowered>, TranspileError> {
        let mapped = match &record.statement {
            Statement::VariableAssignment { name, value } => check_identifier(name)
                .and_then(|()| js_literal(value))
                .map(|value| Lowered::Variable {
                    name: name.clone(),
                    value,
                }),
            Statement::FunctionCall { callee, args } => {
                map_call(callee, args).and_then(|call| {
                    if let Callee::Name(name) = &call.callee {
                        check_identifier(name)?;
                    }
                    for arg in &call.args {
                        if let TargetArg::Identifier(name) = arg {
                            check_identifier(name)?;
                        }
                    }
                    Ok(Lowered::Call(call))
                })
            }
            Statement::FunctionDeclaration {
                name,
                params,
                body_statements,
                ..
            } => match std::iter::once(name).chain(params).try_for_each(|n| check_identifier(n)) {
                Err(err) => Err(err),
                Ok(()) => {
                    let mut body = Vec::with_capacity(body_statements.len());
                    for item in body_statements {
                        match item {
                            Ok(inner) => body.extend(self.lower(inner, diagnostics)?),
                            Err(err) => self.report(err.clone(), diagnostics)?,
                        }
                    }
                    Ok(Lowered::Function {
                        name: name.clone(),
                        params: params.clone(),
                        body,
                    })
                }
            },
        };

        match mapped {
            Ok(lowered) => Ok(Some(lowered)),
            Err(err) => {
                self.skip(unsupported_argument(record, &err), diagnostics);
                Ok(None)
            }
        }
    }

    fn report(&self, err: ScanError, diagnostics: &mut Vec<Diagnostic>) -> Result<(), TranspileError> {
        if self.mode == Mode::Strict && matches!(err, ScanError::UnrecognizedStatement { .. }) {
            return Err(TranspileError::Unrecognized(err));
        }
        self.skip(err.into(), diagnostics);
        Ok(())
    }

    fn skip(&self, diagnostic: Diagnostic, diagnostics: &mut Vec<Diagnostic>) {
        warn!(%diagnostic, "skipping statement");
        diagnostics.push(diagnostic);
    }
}

fn unsupported_argument(record: &StatementRecord, err: &MapError) -> Diagnostic {
    let kind = match err {
        MapError::ReservedWord(_) => DiagnosticKind::UnsupportedTopLevelConstruct,
        _ => DiagnosticKind::UnsupportedBuiltinArgument,
    };
    Diagnostic {
        kind,
        span: record.span.clone(),
        message: format!("{err} in `{}`", record.raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pj_ast::{Expression, Statement as Node};

    fn run(source: &str) -> Transpiled {
        Transpiler::new(PjOptions::default())
            .transpile(source)
            .expect("lenient run should not fail")
    }

    #[test]
    fn string_assignment_becomes_var_declaration() {
        let out = run(r#"$x = "hello";"#);
        assert_eq!(out.program.body.len(), 1);
        let Node::VariableDeclaration(decl) = &out.program.body[0] else {
            panic!("expected a variable declaration");
        };
        let declarator = &decl.declarations[0];
        assert_eq!(declarator.id.name, "x");
        let Some(Expression::Literal(lit)) = &declarator.init else {
            panic!("expected a literal");
        };
        assert_eq!(lit.value, pj_ast::LiteralValue::String("hello".into()));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn echo_after_assignment_is_second_statement() {
        let out = run("$x = \"hi\";\necho($x);\n");
        assert_eq!(out.program.body.len(), 2);
        let Node::ExpressionStatement(stmt) = &out.program.body[1] else {
            panic!("expected an expression statement");
        };
        let Expression::CallExpression(call) = &stmt.expression else {
            panic!("expected a call");
        };
        let Expression::MemberExpression(member) = &call.callee else {
            panic!("expected a member callee");
        };
        assert_eq!(member.property.name, "log");
        assert_eq!(call.arguments.len(), 1);
        let Expression::Identifier(arg) = &call.arguments[0] else {
            panic!("expected an identifier argument");
        };
        assert_eq!(arg.name, "x");
    }

    #[test]
    fn function_declaration_keeps_param_order() {
        let out = run("function add($a, $b) { }");
        let Node::FunctionDeclaration(func) = &out.program.body[0] else {
            panic!("expected a function declaration");
        };
        assert_eq!(func.id.name, "add");
        let names: Vec<_> = func.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn unrecognized_statement_is_skipped_with_diagnostic() {
        let out = run("$a = \"1\";\nwhile (true) { echo($a); }\necho($a);");
        assert_eq!(out.program.body.len(), 2);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnrecognizedStatement);
        assert_eq!(
            out.summary,
            Summary {
                variables: 1,
                calls: 1,
                functions: 0,
                skipped: 1,
            }
        );
    }

    #[test]
    fn unsupported_argument_drops_only_that_call() {
        let out = run("echo([1, 2]);\n$y = \"kept\";");
        assert_eq!(out.program.body.len(), 1);
        assert_eq!(out.program.body[0].kind(), "VariableDeclaration");
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnsupportedBuiltinArgument);
        assert_eq!(out.diagnostics[0].span, 0..13);
        // Nothing was emitted for the dropped call.
        assert_eq!(out.program.body[0].start(), 0);
    }

    #[test]
    fn strict_mode_stops_at_unrecognized_statement() {
        let transpiler = Transpiler::new(PjOptions {
            mode: Mode::Strict,
            ..PjOptions::default()
        });
        let err = transpiler
            .transpile("$a = \"1\";\nfor (;;) {}\n")
            .unwrap_err();
        assert!(matches!(err, TranspileError::Unrecognized(_)), "{err}");
    }

    #[test]
    fn strict_mode_still_skips_unsupported_arguments() {
        let transpiler = Transpiler::new(PjOptions {
            mode: Mode::Strict,
            ..PjOptions::default()
        });
        let out = transpiler.transpile("echo($a . $b);").unwrap();
        assert!(out.program.body.is_empty());
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn nested_unsupported_statement_is_reported() {
        let out = run("function f($x) { if ($x) { } echo($x); }");
        let Node::FunctionDeclaration(func) = &out.program.body[0] else {
            panic!("expected a function declaration");
        };
        assert_eq!(func.body.body.len(), 1);
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn empty_source_produces_empty_program() {
        let out = run("<?php\n\n");
        assert!(out.program.body.is_empty());
        assert_eq!(out.program.end, 0);
        assert!(out.text.is_empty());
    }

    #[test]
    fn cursor_matches_synthesized_text() {
        let out = run("$a = \"x\";\necho($a);\nabs(-4);\nfunction g() { }\n");
        let expected: usize = out
            .program
            .body
            .iter()
            .map(|s| s.end() - s.start() + 1)
            .sum();
        assert_eq!(out.program.end, expected);
        assert_eq!(out.text.len(), expected);
    }

    #[test]
    fn emitted_variables_read_back_identically() {
        let first = run("$a = \"one\";\n$b = \"two\";\n");
        let second = run(&first.text);

        let shape = |out: &Transpiled| -> Vec<(&'static str, String)> {
            out.program
                .body
                .iter()
                .map(|s| match s {
                    Node::VariableDeclaration(d) => (s.kind(), d.declarations[0].id.name.clone()),
                    other => (other.kind(), String::new()),
                })
                .collect()
        };
        assert_eq!(shape(&first), shape(&second));
        assert_eq!(first.text, second.text);
    }

    #[test]
    fn overflowing_number_drops_the_call() {
        let out = run("round(1e999);
abs(-2);");
        assert_eq!(out.program.body.len(), 1);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnsupportedBuiltinArgument);
        assert_eq!(out.text, "Math.abs(-2);\n");
    }

    #[test]
    fn reserved_word_names_are_skipped() {
        let out = run(
            "$new = \"x\";\necho($new);\nfunction run($class) { }\ndelete(\"k\");\n$ok = \"y\";",
        );
        assert_eq!(out.text, "var ok = \"y\";\n");
        assert_eq!(out.diagnostics.len(), 4);
        assert!(out
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::UnsupportedTopLevelConstruct));
        assert!(out.diagnostics[0].message.contains("`new` is a reserved word"));
        assert_eq!(out.summary.skipped, 4);
    }

    #[test]
    fn hex_escape_is_decoded_before_printing() {
        let transpiler = Transpiler::new(PjOptions {
            frontend: FrontendKind::TreeSitter,
            ..PjOptions::default()
        });
        let out = transpiler.transpile("<?php echo \"a\\x41\";").unwrap();
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.text, "console.log(\"aA\");\n");
    }
}
