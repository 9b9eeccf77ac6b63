//! Convention-level type compatibility
//!
//! Decides whether a member pair maps without configuration: identical
//! types, implicit numeric widening, and enum conversions the mapper handles.

use super::descriptor::{CollectionKind, TypeDescriptor};

/// Outcome of comparing a source member type with a destination member type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    /// Compatible except that a nullable source feeds a non-nullable destination
    NullableToNonNullable,
    Incompatible,
    /// Both complex and different; handled by nested mapping
    Nested,
    /// Both collections; compared by container and element
    Collection,
    /// A side could not be resolved
    Unknown,
}

/// Compare two member types
pub fn compare(source: &TypeDescriptor, dest: &TypeDescriptor) -> Compatibility {
    if source.same_underlying(dest) {
        return nullability(source, dest);
    }
    let (s, d) = (source.underlying(), dest.underlying());
    if !s.resolved || !d.resolved {
        return Compatibility::Unknown;
    }
    if s.is_collection() && d.is_collection() {
        return Compatibility::Collection;
    }
    if s.is_complex() && d.is_complex() {
        return Compatibility::Nested;
    }
    if scalar_compatible(s, d) {
        return nullability(source, dest);
    }
    Compatibility::Incompatible
}

fn nullability(source: &TypeDescriptor, dest: &TypeDescriptor) -> Compatibility {
    if source.nullable && !dest.nullable {
        Compatibility::NullableToNonNullable
    } else {
        Compatibility::Compatible
    }
}

/// Scalar pairs mapped by convention (underlying types, nullability ignored)
pub fn scalar_compatible(source: &TypeDescriptor, dest: &TypeDescriptor) -> bool {
    let (s, d) = (source.underlying(), dest.underlying());
    if s.same_underlying(d) {
        return true;
    }
    if s.is_enum && d.is_enum {
        return true;
    }
    if (s.is_enum && (d.name == "string" || is_integral(&d.name)))
        || (d.is_enum && (s.name == "string" || is_integral(&s.name)))
    {
        return true;
    }
    if d.name == "object" {
        return true;
    }
    s.builtin && d.builtin && implicit_widening(&s.name, &d.name)
}

/// C# implicit numeric (and date) conversions
pub fn implicit_widening(from: &str, to: &str) -> bool {
    let targets: &[&str] = match from {
        "sbyte" => &["short", "int", "long", "float", "double", "decimal"],
        "byte" => &[
            "short", "ushort", "int", "uint", "long", "ulong", "float", "double", "decimal",
        ],
        "short" => &["int", "long", "float", "double", "decimal"],
        "ushort" => &["int", "uint", "long", "ulong", "float", "double", "decimal"],
        "int" => &["long", "float", "double", "decimal"],
        "uint" => &["long", "ulong", "float", "double", "decimal"],
        "long" | "ulong" => &["float", "double", "decimal"],
        "char" => &[
            "ushort", "int", "uint", "long", "ulong", "float", "double", "decimal",
        ],
        "float" => &["double"],
        "DateTime" => &["DateTimeOffset"],
        _ => &[],
    };
    targets.contains(&to)
}

pub fn is_integral(name: &str) -> bool {
    matches!(
        name,
        "sbyte" | "byte" | "short" | "ushort" | "int" | "uint" | "long" | "ulong"
    )
}

pub fn is_numeric(name: &str) -> bool {
    is_integral(name) || matches!(name, "float" | "double" | "decimal")
}

/// Container pairs the mapper converts without help
pub fn containers_compatible(source: CollectionKind, dest: CollectionKind) -> bool {
    use CollectionKind::*;
    if source == dest {
        return true;
    }
    match (source, dest) {
        (Dictionary, _) | (_, Dictionary) => false,
        (_, Sequence) => true,
        (Array, List) | (List, Array) => true,
        _ => false,
    }
}
