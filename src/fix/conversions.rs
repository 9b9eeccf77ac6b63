//! Conversion tables for generated expressions
//!
//! Keyed on type descriptors: how to turn a source value into the
//! destination type, the default literal of a type, and how to materialize
//! a sequence into a container.

use super::FixConfidence;
use crate::model::compat::{is_numeric, scalar_compatible};
use crate::model::{CollectionKind, TypeDescriptor};

/// Types with a `T.Parse(string)` method
const PARSEABLE: &[&str] = &[
    "bool",
    "byte",
    "sbyte",
    "short",
    "ushort",
    "int",
    "uint",
    "long",
    "ulong",
    "float",
    "double",
    "decimal",
    "char",
    "Guid",
    "DateTime",
    "DateTimeOffset",
    "DateOnly",
    "TimeOnly",
    "TimeSpan",
];

/// `System.Convert` method producing a numeric type
fn convert_method(name: &str) -> Option<&'static str> {
    let method = match name {
        "bool" => "ToBoolean",
        "byte" => "ToByte",
        "sbyte" => "ToSByte",
        "short" => "ToInt16",
        "ushort" => "ToUInt16",
        "int" => "ToInt32",
        "uint" => "ToUInt32",
        "long" => "ToInt64",
        "ulong" => "ToUInt64",
        "float" => "ToSingle",
        "double" => "ToDouble",
        "decimal" => "ToDecimal",
        _ => return None,
    };
    Some(method)
}

/// Expression converting `expr` from `source` to `destination`
///
/// `None` when no table entry applies; [`cast`] is the fallback.
pub fn convert(expr: &str, source: &TypeDescriptor, destination: &TypeDescriptor) -> Option<(String, FixConfidence)> {
    let (s, d) = (source.underlying(), destination.underlying());
    if scalar_compatible(s, d) {
        return Some((expr.to_string(), FixConfidence::High));
    }
    if d.name == "string" && (s.builtin || s.is_enum) {
        let text = if source.nullable {
            format!("{}?.ToString()", expr)
        } else {
            format!("{}.ToString()", expr)
        };
        return Some((text, FixConfidence::High));
    }
    if s.name == "string" {
        if d.is_enum {
            return Some((format!("Enum.Parse<{}>({})", d.code_name(), expr), FixConfidence::Medium));
        }
        if PARSEABLE.contains(&d.name.as_str()) {
            return Some((format!("{}.Parse({})", d.name, expr), FixConfidence::Medium));
        }
    }
    if is_numeric(&s.name) || s.name == "bool" {
        if let Some(method) = convert_method(&d.name) {
            return Some((format!("Convert.{}({})", method, expr), FixConfidence::Medium));
        }
    }
    None
}

/// `(T)expr`, for review
pub fn cast(expr: &str, destination: &TypeDescriptor) -> (String, FixConfidence) {
    (format!("({}){}", destination.code_name(), expr), FixConfidence::Low)
}

/// Value substituted for `null`, with how safe the substitution is
///
/// Scalars get their zero literal and other value types `default`. A
/// reference type gets a new empty instance, which changes what a null
/// source means and needs review. Types with no known constructor get
/// nothing, since `default` would just be null again.
pub fn null_fallback(destination: &TypeDescriptor) -> Option<(String, FixConfidence)> {
    let d = destination.underlying();
    let literal = match d.name.as_str() {
        "string" => Some("\"\""),
        "int" | "short" | "byte" | "sbyte" | "ushort" => Some("0"),
        "long" => Some("0L"),
        "uint" => Some("0u"),
        "ulong" => Some("0UL"),
        "decimal" => Some("0m"),
        "float" => Some("0f"),
        "double" => Some("0d"),
        "bool" => Some("false"),
        "char" => Some("'\\0'"),
        "Guid" => Some("Guid.Empty"),
        "DateTime" => Some("DateTime.MinValue"),
        "DateTimeOffset" => Some("DateTimeOffset.MinValue"),
        "TimeSpan" => Some("TimeSpan.Zero"),
        _ => None,
    };
    if let Some(literal) = literal {
        return Some((literal.to_string(), FixConfidence::High));
    }

    if let Some(info) = &d.collection {
        let element = info.element.code_name();
        let empty = match info.kind {
            CollectionKind::List => format!("new List<{}>()", element),
            CollectionKind::Set => format!("new HashSet<{}>()", element),
            CollectionKind::Queue => format!("new Queue<{}>()", element),
            CollectionKind::Stack => format!("new Stack<{}>()", element),
            CollectionKind::Array => format!("Array.Empty<{}>()", element),
            CollectionKind::Sequence => format!("Enumerable.Empty<{}>()", element),
            CollectionKind::Dictionary => {
                format!("new Dictionary<{}, {}>()", info.key.as_ref()?.code_name(), element)
            }
        };
        return Some((empty, FixConfidence::Low));
    }
    if d.value_type && d.resolved {
        return Some(("default".to_string(), FixConfidence::High));
    }
    if d.is_complex() {
        return Some((format!("new {}()", d.code_name()), FixConfidence::Low));
    }
    None
}

/// Materialize a sequence expression into `kind`
///
/// Dictionaries have no generic materialization and yield `None`.
pub fn materialize(expr: &str, kind: CollectionKind, element: &str) -> Option<String> {
    let text = match kind {
        CollectionKind::List => format!("{}.ToList()", expr),
        CollectionKind::Array => format!("{}.ToArray()", expr),
        CollectionKind::Set => format!("{}.ToHashSet()", expr),
        CollectionKind::Queue => format!("new Queue<{}>({})", element, expr),
        CollectionKind::Stack => format!("new Stack<{}>({})", element, expr),
        CollectionKind::Sequence => expr.to_string(),
        CollectionKind::Dictionary => return None,
    };
    Some(text)
}

/// Element-wise projection of a collection into another
///
/// Uses the conversion table per element; an identity projection when no
/// conversion is known, which needs review.
pub fn project(
    expr: &str,
    source_element: &TypeDescriptor,
    destination_element: &TypeDescriptor,
    destination_kind: CollectionKind,
) -> Option<(String, FixConfidence)> {
    let (body, confidence) = match convert("x", source_element, destination_element) {
        Some(converted) => converted,
        None => ("x".to_string(), FixConfidence::Low),
    };
    if destination_kind == CollectionKind::Dictionary {
        let value = value_conversion(&body);
        return Some((
            format!("{}.ToDictionary(kv => kv.Key, kv => {})", expr, value),
            confidence,
        ));
    }
    let projected = format!("{}.Select(x => {})", expr, body);
    materialize(&projected, destination_kind, &destination_element.code_name()).map(|text| (text, confidence))
}

/// Rewrite a conversion of `x` into one of `kv.Value`
fn value_conversion(body: &str) -> String {
    // conversions produced by `convert` reference `x` once, as a whole token
    let mut out = String::with_capacity(body.len() + 8);
    let chars: Vec<char> = body.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let standalone = c == 'x'
            && !chars.get(i.wrapping_sub(1)).map(|p| p.is_alphanumeric() || *p == '_' || *p == '.').unwrap_or(false)
            && !chars.get(i + 1).map(|n| n.is_alphanumeric() || *n == '_').unwrap_or(false);
        if standalone {
            out.push_str("kv.Value");
        } else {
            out.push(c);
        }
    }
    out
}
