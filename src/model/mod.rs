//! Structural type model
//!
//! Normalized descriptors for types and their members, the convention-based
//! member matching, and type compatibility used by the rules.

pub mod compat;
mod descriptor;
mod extract;
mod matching;

pub use compat::{compare, Compatibility};
pub use descriptor::{CollectionInfo, CollectionKind, TypeDescriptor, BUILTIN_TYPES};
pub use extract::{extract_members, extract_model, MemberConstraints, MemberDescriptor, TypeModel};
pub use matching::{match_member, pascal_words, resolve_path, MatchKind, SourceMatch};
