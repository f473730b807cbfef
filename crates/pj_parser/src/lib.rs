//! Statement front-ends for pj.
//!
//! A front-end turns PHP source into an ordered stream of
//! [`StatementRecord`]s, one per recognised top-level statement, or a
//! [`ScanError`] for each chunk it could not read. Two implementations sit
//! behind the [`Frontend`] trait:
//!
//! - [`PatternFrontend`]: a token scanner that recognises exactly three
//!   statement shapes (variable assignment, function call, function
//!   declaration).
//! - [`TreeSitterFrontend`]: a full PHP parse via tree-sitter, dispatched on
//!   node kinds into the same records.

pub mod pattern;
pub mod record;
pub mod syntax_tree;

pub use pattern::{classify, extract, PatternFrontend};
pub use record::{
    parse_php_number, ScalarLiteral, ScanError, Scanned, Statement, StatementKind,
    StatementRecord,
};
pub use syntax_tree::TreeSitterFrontend;

use pj_ast::FrontendKind;

/// Failure to set up a front-end for a whole source file.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to load PHP grammar: {0}")]
    Language(String),

    #[error("parser produced no tree")]
    NoTree,
}

/// Ordered statement results for one source file.
pub type StatementStream<'src> = Box<dyn Iterator<Item = Scanned> + 'src>;

/// A Classifier/Extractor implementation.
pub trait Frontend {
    fn kind(&self) -> FrontendKind;

    /// Read `source` into statement results in source order. Spans in the
    /// results are byte ranges into `source` and never overlap.
    fn statements<'src>(&self, source: &'src str) -> Result<StatementStream<'src>, ReadError>;
}

/// Construct the front-end selected by `kind`.
pub fn frontend_for(kind: FrontendKind) -> Box<dyn Frontend> {
    match kind {
        FrontendKind::Pattern => Box::new(PatternFrontend),
        FrontendKind::TreeSitter => Box::new(TreeSitterFrontend),
    }
}
