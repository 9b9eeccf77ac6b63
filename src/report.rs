//! Reports for the command line
//!
//! A [`CheckReport`] is the serializable summary of one analysis pass; a
//! [`FixReport`] adds what a fix run applied. Both render as text with
//! `to_report()` or as JSON through serde.

use crate::compilation::Compilation;
use crate::diagnostic::{Finding, Severity};
use crate::fix::FixApplicationResult;
use crate::rules::Analysis;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One analyzed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSummary {
    pub path: String,
    /// `sha256:` prefix of the analyzed text
    pub hash: String,
    pub registrations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckReport {
    pub version: String,
    pub documents: Vec<DocumentSummary>,
    pub findings: Vec<Finding>,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl CheckReport {
    pub fn new(compilation: &Compilation, analysis: &Analysis) -> CheckReport {
        let documents = compilation
            .documents()
            .iter()
            .enumerate()
            .map(|(index, doc)| DocumentSummary {
                path: doc.path.clone(),
                hash: doc.parsed.source_hash.clone(),
                registrations: analysis
                    .registrations
                    .iter()
                    .filter(|r| r.file_index == index)
                    .count(),
            })
            .collect();
        CheckReport {
            version: crate::VERSION.to_string(),
            documents,
            findings: analysis.findings.clone(),
            errors: analysis.count(Severity::Error),
            warnings: analysis.count(Severity::Warning),
            infos: analysis.count(Severity::Info),
        }
    }

    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    pub fn to_report(&self) -> String {
        let mut out = String::new();
        let registrations: usize = self.documents.iter().map(|d| d.registrations).sum();
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!(
            "Mapping analysis: {} document(s), {} registration(s)\n",
            self.documents.len(),
            registrations
        ));
        out.push_str("═══════════════════════════════════════════════════════════════\n");

        if self.findings.is_empty() {
            out.push_str("\n✓ No findings\n");
            return out;
        }

        out.push('\n');
        for finding in &self.findings {
            out.push_str(&format!("  • {}\n", finding));
        }

        let status = if self.passed() { "✓" } else { "✗" };
        out.push_str(&format!(
            "\n{} {} error(s), {} warning(s), {} info\n",
            status, self.errors, self.warnings, self.infos
        ));
        out
    }
}

/// Outcome of a fix run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FixReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
    /// Documents whose text changed
    pub changed: Vec<String>,
    /// Findings left after fixing
    pub remaining: CheckReport,
}

impl FixReport {
    pub fn new(result: FixApplicationResult, changed: Vec<String>, remaining: CheckReport) -> FixReport {
        FixReport {
            applied: result.applied,
            skipped: result.skipped,
            errors: result.errors,
            changed,
            remaining,
        }
    }

    pub fn to_report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Fixes applied: {}\n", self.applied.len()));
        for key in &self.applied {
            out.push_str(&format!("  ✓ {}\n", key));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!("\nSkipped: {}\n", self.skipped.len()));
            for key in &self.skipped {
                out.push_str(&format!("  - {}\n", key));
            }
        }
        if !self.errors.is_empty() {
            out.push_str(&format!("\nFailed: {}\n", self.errors.len()));
            for err in &self.errors {
                out.push_str(&format!("  ✗ {}\n", err));
            }
        }
        if !self.changed.is_empty() {
            out.push_str("\nChanged:\n");
            for path in &self.changed {
                out.push_str(&format!("  {}\n", path));
            }
        }
        out.push('\n');
        out.push_str(&self.remaining.to_report());
        out
    }
}
