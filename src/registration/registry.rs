//! Whole-compilation mapping registry
//!
//! Built once per analysis pass, before any rule runs, and read-only
//! afterwards. Entries keep document order so duplicates can be attributed
//! to the later site.

use super::MappingRegistration;
use crate::ast::Span;
use crate::model::TypeDescriptor;
use crate::parse::TypeRef;
use crate::symbols::SymbolTable;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Identity of a (source, destination) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub source: String,
    pub destination: String,
}

impl PairKey {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> PairKey {
        PairKey {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn of(source: &TypeDescriptor, destination: &TypeDescriptor) -> PairKey {
        PairKey::new(&source.underlying().key, &destination.underlying().key)
    }

    pub fn reversed(&self) -> PairKey {
        PairKey::new(&self.destination, &self.source)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Why a pair is in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOrigin {
    /// `CreateMap<S, D>()`
    Explicit,
    /// Mirrored by `.ReverseMap()`
    Reverse,
    /// Named by `Include` / `IncludeBase`
    Implied,
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub key: PairKey,
    pub registration: usize,
    pub origin: RegistryOrigin,
    pub file: String,
    pub file_index: usize,
    /// Where the entry is established: the `CreateMap` call, or `ReverseMap()`
    pub span: Span,
}

impl RegistryEntry {
    /// Document-order position across the compilation
    pub fn position(&self) -> (usize, usize) {
        (self.file_index, self.span.start_byte)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<PairKey, Vec<usize>>,
}

impl MappingRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn contains(&self, key: &PairKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn contains_types(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
        self.contains(&PairKey::of(source, destination))
    }

    /// Entries for a pair in document order
    pub fn lookup(&self, key: &PairKey) -> Vec<&RegistryEntry> {
        let mut found: Vec<&RegistryEntry> = self
            .index
            .get(key)
            .map(|ids| ids.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default();
        found.sort_by_key(|e| e.position());
        found
    }

    /// Entries contributed by one registration
    pub fn entries_of(&self, registration: usize) -> impl Iterator<Item = &RegistryEntry> {
        self.entries
            .iter()
            .filter(move |e| e.registration == registration)
    }

    fn insert(&mut self, entry: RegistryEntry) {
        let idx = self.entries.len();
        self.index.entry(entry.key.clone()).or_default().push(idx);
        self.entries.push(entry);
    }
}

/// Canonical identity of a type reference
pub fn type_key(type_ref: &TypeRef, table: &SymbolTable, namespace: Option<&str>) -> String {
    TypeDescriptor::describe(type_ref, table, namespace)
        .underlying()
        .key
        .clone()
}

/// Single pass over every registration
pub fn build_registry(registrations: &[MappingRegistration], table: &SymbolTable) -> MappingRegistry {
    let mut registry = MappingRegistry::default();
    for reg in registrations {
        let ns = reg.namespace.as_deref();
        let key = PairKey::new(
            type_key(&reg.source, table, ns),
            type_key(&reg.destination, table, ns),
        );

        if let Some(reverse) = &reg.reverse_map {
            registry.insert(RegistryEntry {
                key: key.reversed(),
                registration: reg.id,
                origin: RegistryOrigin::Reverse,
                file: reg.file.clone(),
                file_index: reg.file_index,
                span: reverse.span,
            });
        }
        registry.insert(RegistryEntry {
            key,
            registration: reg.id,
            origin: RegistryOrigin::Explicit,
            file: reg.file.clone(),
            file_index: reg.file_index,
            span: reg.span(),
        });

        for include in &reg.includes {
            registry.insert(RegistryEntry {
                key: PairKey::new(
                    type_key(&include.source, table, ns),
                    type_key(&include.destination, table, ns),
                ),
                registration: reg.id,
                origin: RegistryOrigin::Implied,
                file: reg.file.clone(),
                file_index: reg.file_index,
                span: include.span,
            });
        }
    }
    debug!(entries = registry.len(), "built mapping registry");
    registry
}
