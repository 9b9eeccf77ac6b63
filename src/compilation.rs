//! Compilation: the set of C# documents analyzed together
//!
//! Documents are immutable. Editing one produces a new compilation with that
//! document re-parsed and the symbol table rebuilt; the old snapshot stays
//! valid for anyone still holding it.

use crate::ast::ParsedFile;
use crate::error::{Error, Result};
use crate::parse::{is_csharp_path, parse_csharp};
use crate::registration::{extract_registration, MappingRegistration};
use crate::symbols::SymbolTable;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Directories never searched for sources
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "node_modules", "target"];

/// One source document
#[derive(Debug, Clone)]
pub struct Document {
    pub path: String,
    pub text: Arc<str>,
    pub parsed: ParsedFile,
}

impl Document {
    pub fn parse(path: impl Into<String>, text: impl Into<Arc<str>>) -> Result<Document> {
        let path = path.into();
        let text = text.into();
        let parsed = parse_csharp(&path, &text)?;
        if parsed.has_syntax_errors {
            warn!(file = %path, "syntax errors; analysis may be incomplete");
        }
        Ok(Document { path, text, parsed })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compilation {
    documents: Vec<Document>,
    table: SymbolTable,
}

impl Compilation {
    /// Build from in-memory `(path, text)` pairs, in the given order
    pub fn from_sources<P, T, I>(sources: I) -> Result<Compilation>
    where
        P: Into<String>,
        T: Into<Arc<str>>,
        I: IntoIterator<Item = (P, T)>,
    {
        let documents = sources
            .into_iter()
            .map(|(path, text)| Document::parse(path, text))
            .collect::<Result<Vec<_>>>()?;
        Ok(Compilation::from_documents(documents))
    }

    /// Load files and directories (searched recursively for `*.cs`)
    pub fn load(paths: &[PathBuf]) -> Result<Compilation> {
        let files = collect_sources(paths)?;
        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let text = std::fs::read_to_string(&file).map_err(Error::Io)?;
            documents.push(Document::parse(file.display().to_string(), text)?);
        }
        debug!(documents = documents.len(), "loaded compilation");
        Ok(Compilation::from_documents(documents))
    }

    fn from_documents(documents: Vec<Document>) -> Compilation {
        let parsed: Vec<ParsedFile> = documents.iter().map(|d| d.parsed.clone()).collect();
        let table = SymbolTable::build(&parsed);
        Compilation { documents, table }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, path: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.path == path)
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// New snapshot with one document's text replaced
    pub fn with_text(&self, path: &str, text: impl Into<Arc<str>>) -> Result<Compilation> {
        let index = self
            .documents
            .iter()
            .position(|d| d.path == path)
            .ok_or_else(|| Error::Other(format!("No document named {}", path)))?;
        let mut documents = self.documents.clone();
        documents[index] = Document::parse(path, text)?;
        Ok(Compilation::from_documents(documents))
    }

    /// Every mapping registration, in document order
    ///
    /// Chains that are not the mapping API (lookalike `CreateMap` methods)
    /// are skipped.
    pub fn registrations(&self) -> Vec<MappingRegistration> {
        let mut registrations = Vec::new();
        for (file_index, document) in self.documents.iter().enumerate() {
            for chain in &document.parsed.chains {
                let id = registrations.len();
                if let Some(reg) = extract_registration(chain, &document.parsed, file_index, id, &self.table) {
                    registrations.push(reg);
                }
            }
        }
        registrations
    }
}

/// Expand paths into a sorted list of C# files
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk_dir(path, &mut files)?;
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(Error::Other(format!("Path not found: {}", path.display())));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(Error::Io)?;
    for entry in entries {
        let path = entry.map_err(Error::Io)?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if path.is_dir() {
            if name.starts_with('.') || SKIPPED_DIRS.contains(&name) {
                continue;
            }
            walk_dir(&path, files)?;
        } else if is_csharp_path(&path.to_string_lossy()) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TYPES: &str = "namespace Shop { public class A { public int X { get; set; } } public class B { public int X { get; set; } } }";
    const PROFILE: &str = "using AutoMapper;\nnamespace Shop { public class P : Profile { public P() { CreateMap<A, B>(); } } }";

    #[test]
    fn test_registrations_across_documents() {
        let compilation = Compilation::from_sources([("Types.cs", TYPES), ("Profile.cs", PROFILE)]).unwrap();
        let regs = compilation.registrations();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].file, "Profile.cs");
        assert_eq!(regs[0].file_index, 1);
        assert!(compilation.table().lookup_qualified("Shop.A").is_some());
    }

    #[test]
    fn test_with_text_leaves_snapshot_untouched() {
        let before = Compilation::from_sources([("Types.cs", TYPES), ("Profile.cs", PROFILE)]).unwrap();
        let after = before
            .with_text("Profile.cs", PROFILE.replace("CreateMap<A, B>();", ""))
            .unwrap();
        assert_eq!(before.registrations().len(), 1);
        assert!(after.registrations().is_empty());
        assert!(before.with_text("Missing.cs", "").is_err());
    }

    #[test]
    fn test_collect_sources_skips_build_output() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("obj")).unwrap();
        std::fs::create_dir_all(dir.path().join("Mapping")).unwrap();
        std::fs::write(dir.path().join("obj").join("Gen.cs"), "").unwrap();
        std::fs::write(dir.path().join("Mapping").join("Profile.cs"), PROFILE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = collect_sources(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![dir.path().join("Mapping").join("Profile.cs")]);

        let compilation = Compilation::load(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(compilation.documents().len(), 1);
    }
}
