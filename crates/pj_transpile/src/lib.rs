//! The pj transpilation engine.
//!
//! Turns front-end statement records into an ESTree JavaScript program:
//!
//! - [`builtins`]: PHP builtin names and argument shapes → JavaScript
//! - [`builder`]: offset-tracking AST builder over the synthesized text
//! - [`driver`]: the loop tying a front-end, the mapper and the builder
//! - [`emit`]: printing through the SWC code generator

pub mod builder;
pub mod builtins;
pub mod driver;
pub mod emit;

pub use builder::{AstBuilder, Lowered};
pub use driver::{Diagnostic, DiagnosticKind, Summary, Transpiled, TranspileError, Transpiler};
pub use emit::{emit_js, Emitted};
