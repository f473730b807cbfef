//! Target AST for pj.
//!
//! The transpiler builds an ESTree-shaped JavaScript tree whose `start`/`end`
//! offsets point into the *synthesized* target text, not into the PHP source.
//! The tree serializes to the usual ESTree JSON and can be lowered to
//! `swc_ecma_ast` so the SWC code generator can print it.
//!
//! Also home to [`PjOptions`], the settings shared by the front-ends and the
//! driver.

pub mod estree;
pub mod lower;

pub use estree::*;
pub use lower::lower_program;
pub use swc_ecma_ast as swc;

use serde::{Deserialize, Serialize};

/// Which Classifier/Extractor implementation reads the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontendKind {
    /// Hand-rolled token scanner recognising the three statement patterns.
    #[default]
    Pattern,
    /// Full PHP parse through tree-sitter, dispatched on node kinds.
    TreeSitter,
}

impl std::fmt::Display for FrontendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrontendKind::Pattern => write!(f, "pattern"),
            FrontendKind::TreeSitter => write!(f, "tree-sitter"),
        }
    }
}

/// What the driver does with a statement no front-end pattern recognises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Record a diagnostic, skip the statement and keep going.
    #[default]
    Lenient,
    /// Stop the run at the first unrecognised statement.
    Strict,
}

/// Settings for one transpilation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PjOptions {
    pub frontend: FrontendKind,
    pub mode: Mode,
}
