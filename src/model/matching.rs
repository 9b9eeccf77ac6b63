//! Source/destination member correspondence
//!
//! Convention-based matching: exact name, then case-insensitive name, then
//! flattening (`CustomerName` ← `Customer.Name`).

use super::extract::{extract_members, MemberConstraints, MemberDescriptor, TypeModel};
use crate::symbols::SymbolTable;

/// How a destination member found its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    /// Names equal ignoring case only
    CaseInsensitive,
    /// Reached through a chain of complex members
    Flattened,
}

/// Source side of a match
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMatch {
    /// Member names from the source root (`["Customer", "Name"]`)
    pub path: Vec<String>,
    /// The final member on the path
    pub member: MemberDescriptor,
    pub kind: MatchKind,
}

/// Flattening depth limit
const MAX_FLATTEN_DEPTH: usize = 4;

/// Find the source member a destination member maps from by convention
pub fn match_member(dest_name: &str, source: &TypeModel, table: &SymbolTable) -> Option<SourceMatch> {
    if let Some(m) = source.find_exact(dest_name) {
        return Some(SourceMatch {
            path: vec![m.name.clone()],
            member: m.clone(),
            kind: MatchKind::Exact,
        });
    }
    if let Some(m) = source.find(dest_name) {
        return Some(SourceMatch {
            path: vec![m.name.clone()],
            member: m.clone(),
            kind: MatchKind::CaseInsensitive,
        });
    }
    let words = pascal_words(dest_name);
    flatten(&words, &source.members, table, 0).map(|(path, member)| SourceMatch {
        path,
        member,
        kind: MatchKind::Flattened,
    })
}

fn flatten(
    words: &[String],
    members: &[MemberDescriptor],
    table: &SymbolTable,
    depth: usize,
) -> Option<(Vec<String>, MemberDescriptor)> {
    if words.is_empty() || depth > MAX_FLATTEN_DEPTH {
        return None;
    }
    let whole = words.concat();
    if depth > 0 {
        if let Some(m) = members.iter().find(|m| m.name.eq_ignore_ascii_case(&whole)) {
            return Some((vec![m.name.clone()], m.clone()));
        }
    }
    for split in 1..words.len() {
        let prefix = words[..split].concat();
        let head = match members.iter().find(|m| m.name.eq_ignore_ascii_case(&prefix)) {
            Some(h) => h,
            None => continue,
        };
        if !head.declared_type.underlying().is_complex() {
            continue;
        }
        let nested = extract_members(&head.declared_type, table, MemberConstraints::Readable);
        if let Some((mut rest, member)) = flatten(&words[split..], &nested, table, depth + 1) {
            let mut path = vec![head.name.clone()];
            path.append(&mut rest);
            return Some((path, member));
        }
    }
    None
}

/// Resolve a member path (`["Customer", "Name"]`) against a source model
pub fn resolve_path(path: &[String], source: &TypeModel, table: &SymbolTable) -> Option<MemberDescriptor> {
    let (first, rest) = path.split_first()?;
    let mut current = source.find(first)?.clone();
    for name in rest {
        let members = extract_members(&current.declared_type, table, MemberConstraints::Readable);
        current = members
            .into_iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))?;
    }
    Some(current)
}

/// Split a PascalCase identifier into words (`CustomerHTTPName` → `Customer`, `HTTP`, `Name`)
pub fn pascal_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        let boundary = c.is_uppercase()
            && !current.is_empty()
            && (chars[i - 1].is_lowercase()
                || chars[i - 1].is_ascii_digit()
                || chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false));
        if boundary || c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if c == '_' {
                continue;
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::extract::extract_model;
    use crate::parse::{parse_csharp, TypeRef};
    use rstest::rstest;

    #[rstest]
    #[case("CustomerName", &["Customer", "Name"])]
    #[case("Id", &["Id"])]
    #[case("HTTPStatus", &["HTTP", "Status"])]
    #[case("Line2Text", &["Line2", "Text"])]
    #[case("created_at", &["created", "at"])]
    fn test_pascal_words(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(pascal_words(input), expected);
    }

    const MODEL: &str = r#"
public class Customer { public string Name { get; set; } public Address Address { get; set; } }
public class Address { public string City { get; set; } }
public class Order { public int id { get; set; } public Customer Customer { get; set; } }
"#;

    fn order() -> (SymbolTable, TypeModel) {
        let table = SymbolTable::build(&[parse_csharp("M.cs", MODEL).unwrap()]);
        let model = extract_model(&TypeRef::named("Order"), &table, None, MemberConstraints::Readable).unwrap();
        (table, model)
    }

    #[test]
    fn test_case_insensitive_match() {
        let (table, order) = order();
        let m = match_member("Id", &order, &table).unwrap();
        assert_eq!(m.kind, MatchKind::CaseInsensitive);
        assert_eq!(m.member.name, "id");
    }

    #[test]
    fn test_flattened_match() {
        let (table, order) = order();
        let m = match_member("CustomerName", &order, &table).unwrap();
        assert_eq!(m.kind, MatchKind::Flattened);
        assert_eq!(m.path, vec!["Customer", "Name"]);

        let deep = match_member("CustomerAddressCity", &order, &table).unwrap();
        assert_eq!(deep.path, vec!["Customer", "Address", "City"]);
        assert_eq!(deep.member.declared_type.name, "string");

        assert!(match_member("CustomerPhone", &order, &table).is_none());
    }

    #[test]
    fn test_resolve_path() {
        let (table, order) = order();
        let path = vec!["Customer".to_string(), "Address".to_string()];
        let member = resolve_path(&path, &order, &table).unwrap();
        assert_eq!(member.declared_type.name, "Address");
    }
}
