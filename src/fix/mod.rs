//! Code fixes
//!
//! A [`CodeAction`] is a candidate edit for one finding: a semantic
//! [`FixOperation`] anchored on the registration's chain, plus the concrete
//! [`TextEdit`]s it resolves to in the analyzed snapshot. Applying an action
//! never mutates a document; it produces a new [`Compilation`].
//!
//! [`Compilation`]: crate::compilation::Compilation

mod apply;
pub mod conversions;
mod synthesize;

pub use apply::{apply_action, apply_edits, fix_all, FixApplicationResult, FixOptions};
pub use synthesize::{synthesize_fixes, FixContext};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence level for a fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum FixConfidence {
    /// Safe to auto-apply
    High,
    /// Likely correct, review recommended
    Medium,
    /// Suggestion only, requires human judgment
    Low,
}

impl fmt::Display for FixConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FixConfidence::High => "high",
            FixConfidence::Medium => "medium",
            FixConfidence::Low => "low",
        };
        write!(f, "{}", s)
    }
}

/// Where and how a fix changes the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum FixOperation {
    /// Add a call after the last forward-map call (before `ReverseMap()`)
    AppendCall { registration: usize, call: String },
    /// Rewrite one call of the chain
    ReplaceCall {
        registration: usize,
        call_index: usize,
        call: String,
    },
    /// Drop one call from the chain
    RemoveCall { registration: usize, call_index: usize },
    /// Add statements after the statement holding the chain
    InsertStatements {
        registration: usize,
        statements: Vec<String>,
    },
    /// Delete the statement holding the chain
    RemoveStatement { registration: usize },
}

/// Replace `start_byte..end_byte` of `file` with `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TextEdit {
    pub file: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub replacement: String,
}

/// One candidate fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeAction {
    pub rule_id: String,
    pub title: String,
    /// `AM001:ignore:CreateMap<Person, PersonDto>.Age`; equal keys are the same fix
    pub equivalence_key: String,
    pub confidence: FixConfidence,
    pub operation: FixOperation,
    pub edits: Vec<TextEdit>,
}

impl CodeAction {
    /// Files the action touches
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.edits.iter().map(|e| e.file.as_str()).collect();
        files.sort_unstable();
        files.dedup();
        files
    }
}
