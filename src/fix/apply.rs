//! Applying fixes
//!
//! Single actions produce a new compilation. `fix_all` applies one action at
//! a time and re-analyzes after each, so every fix is synthesized against the
//! current text and its preconditions are checked again.

use super::synthesize::{synthesize_fixes, FixContext};
use super::{CodeAction, FixConfidence, TextEdit};
use crate::compilation::Compilation;
use crate::error::{Error, Result};
use crate::rules::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Apply non-overlapping edits to one text
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String> {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.start_byte, e.end_byte));
    for edit in &ordered {
        if edit.start_byte > edit.end_byte || edit.end_byte > text.len() {
            return Err(Error::Fix(format!(
                "edit {}..{} is outside the document ({} bytes)",
                edit.start_byte,
                edit.end_byte,
                text.len()
            )));
        }
        if !text.is_char_boundary(edit.start_byte) || !text.is_char_boundary(edit.end_byte) {
            return Err(Error::Fix(format!(
                "edit {}..{} splits a character",
                edit.start_byte, edit.end_byte
            )));
        }
    }
    for pair in ordered.windows(2) {
        if pair[1].start_byte < pair[0].end_byte {
            return Err(Error::Fix(format!(
                "overlapping edits at {}..{} and {}..{}",
                pair[0].start_byte, pair[0].end_byte, pair[1].start_byte, pair[1].end_byte
            )));
        }
    }

    let mut out = text.to_string();
    for edit in ordered.iter().rev() {
        out.replace_range(edit.start_byte..edit.end_byte, &edit.replacement);
    }
    Ok(out)
}

/// New compilation with the action's edits applied
pub fn apply_action(compilation: &Compilation, action: &CodeAction) -> Result<Compilation> {
    let mut by_file: BTreeMap<&str, Vec<TextEdit>> = BTreeMap::new();
    for edit in &action.edits {
        by_file.entry(edit.file.as_str()).or_default().push(edit.clone());
    }
    let mut current = compilation.clone();
    for (file, edits) in by_file {
        let document = current
            .document(file)
            .ok_or_else(|| Error::Fix(format!("{} is not part of the compilation", file)))?;
        let text = apply_edits(&document.text, &edits)?;
        current = current.with_text(file, text)?;
    }
    Ok(current)
}

/// Batch fix settings
#[derive(Debug, Clone)]
pub struct FixOptions {
    /// Also apply low-confidence fixes
    pub apply_all: bool,
    /// Only fix findings of these rule ids
    pub rules: Option<Vec<String>>,
    /// Upper bound on analyze/apply rounds
    pub max_iterations: usize,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            apply_all: false,
            rules: None,
            max_iterations: 200,
        }
    }
}

impl FixOptions {
    fn selects(&self, rule_id: &str) -> bool {
        match &self.rules {
            Some(rules) => rules.iter().any(|r| r.eq_ignore_ascii_case(rule_id)),
            None => true,
        }
    }
}

/// Result of applying fixes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixApplicationResult {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

/// Apply the preferred fix of every finding until none is left
///
/// The preferred fix is the first candidate that is not low confidence, or
/// simply the first one with `apply_all`. An action that fails, or that
/// leads back to an earlier text, is recorded as an error and not attempted
/// again on the same text.
pub fn fix_all(engine: &Engine, compilation: &Compilation, options: &FixOptions) -> Result<(Compilation, FixApplicationResult)> {
    let mut result = FixApplicationResult::default();
    let mut current = compilation.clone();
    let mut seen_states: HashSet<String> = HashSet::new();
    let mut declined: HashSet<(String, String)> = HashSet::new();
    let mut state = snapshot_hash(&current);
    seen_states.insert(state.clone());

    let mut rounds = 0;
    loop {
        if rounds == options.max_iterations {
            warn!(rounds, "fix iteration limit reached");
            break;
        }
        rounds += 1;

        let analysis = engine.analyze(&current)?;
        let ctx = FixContext {
            compilation: &current,
            analysis: &analysis,
        };
        let mut next: Option<CodeAction> = None;
        for finding in analysis.findings.iter().filter(|f| options.selects(&f.rule_id)) {
            let mut candidates: Vec<CodeAction> = synthesize_fixes(finding, &ctx)
                .into_iter()
                .filter(|a| !declined.contains(&(state.clone(), a.equivalence_key.clone())))
                .collect();
            let eligible = candidates
                .iter()
                .position(|a| options.apply_all || a.confidence != FixConfidence::Low);
            match eligible {
                Some(index) => {
                    next = Some(candidates.swap_remove(index));
                    break;
                }
                None => {
                    if let Some(first) = candidates.first() {
                        let note = format!("{} (low confidence)", first.equivalence_key);
                        if !result.skipped.contains(&note) {
                            result.skipped.push(note);
                        }
                    }
                }
            }
        }
        let action = match next {
            Some(action) => action,
            None => break,
        };

        let key = action.equivalence_key.clone();
        match apply_action(&current, &action) {
            Ok(updated) => {
                let updated_state = snapshot_hash(&updated);
                if !seen_states.insert(updated_state.clone()) {
                    result.errors.push(format!("{}: fix cycle", key));
                    declined.insert((state.clone(), key));
                    continue;
                }
                debug!(key = %key, title = %action.title, "fix applied");
                result.applied.push(key);
                current = updated;
                state = updated_state;
            }
            Err(err) => {
                warn!(key = %key, %err, "fix failed");
                result.errors.push(format!("{}: {}", key, err));
                declined.insert((state.clone(), key));
            }
        }
    }
    Ok((current, result))
}

/// Digest of every document, identifying one state of the sources
fn snapshot_hash(compilation: &Compilation) -> String {
    let mut hasher = Sha256::new();
    for document in compilation.documents() {
        hasher.update(document.path.as_bytes());
        hasher.update([0]);
        hasher.update(document.text.as_bytes());
        hasher.update([0]);
    }
    hex::encode(hasher.finalize())
}
