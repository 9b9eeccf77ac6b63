//! AM020: complex members without a registered nested mapping

use super::pairs::convention_pairs;
use super::{Rule, RuleContext};
use crate::diagnostic::{props, Finding, RuleInfo, NESTED_MAPPING_MISSING};
use crate::model::{
    compare, extract_members, match_member, Compatibility, MemberConstraints, TypeDescriptor, TypeModel,
};
use crate::registration::{MappingRegistry, PairKey};
use crate::symbols::SymbolTable;
use crate::Result;
use std::collections::{HashSet, VecDeque};

/// How deep the closure of missing pairs is followed
const MAX_NESTING: usize = 4;

/// Both members complex, different underlying types, and no registration
/// for the pair
pub struct NestedMappingRule;

impl Rule for NestedMappingRule {
    fn name(&self) -> &'static str {
        "nested-mapping"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[NESTED_MAPPING_MISSING]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for pair in convention_pairs(ctx) {
            let source = &pair.source.member.declared_type;
            let destination = &pair.destination.declared_type;
            if compare(source, destination) != Compatibility::Nested
                || ctx.registry.contains_types(source, destination)
            {
                continue;
            }
            let missing = missing_pairs(source.underlying(), destination.underlying(), ctx.registry, ctx.table);
            findings.push(
                ctx.member_finding(
                    &NESTED_MAPPING_MISSING,
                    &pair.destination.name,
                    Some(&pair.source.member),
                    Some(pair.destination),
                )
                .with_property(props::SOURCE_MEMBER, pair.source.member.name.clone())
                .with_property(props::MISSING_PAIRS, encode_pairs(&missing)),
            );
        }
        Ok(findings)
    }
}

/// Complex element pair of two collections, when both elements are
/// different user types
pub(crate) fn complex_elements<'d>(
    source: &'d TypeDescriptor,
    destination: &'d TypeDescriptor,
) -> Option<(&'d TypeDescriptor, &'d TypeDescriptor)> {
    let s = source.innermost_element()?.underlying();
    let d = destination.innermost_element()?.underlying();
    (s.is_complex() && d.is_complex() && !s.same_underlying(d)).then_some((s, d))
}

/// Every unregistered (source, destination) pair reachable from a starting
/// pair by convention, the starting pair first
///
/// Pairs with the same identity are reported once; pairs the registry
/// already has are neither reported nor followed.
pub fn missing_pairs(
    source: &TypeDescriptor,
    destination: &TypeDescriptor,
    registry: &MappingRegistry,
    table: &SymbolTable,
) -> Vec<(TypeDescriptor, TypeDescriptor)> {
    let mut found = Vec::new();
    let mut seen: HashSet<PairKey> = HashSet::new();
    let mut queue = VecDeque::from([(source.clone(), destination.clone(), 0usize)]);

    while let Some((s, d, depth)) = queue.pop_front() {
        let key = PairKey::of(&s, &d);
        if registry.contains(&key) || !seen.insert(key) {
            continue;
        }
        found.push((s.clone(), d.clone()));
        if depth >= MAX_NESTING {
            continue;
        }

        let source_model = TypeModel {
            members: extract_members(&s, table, MemberConstraints::Readable),
            descriptor: s,
        };
        for member in extract_members(&d, table, MemberConstraints::Writable) {
            let matched = match match_member(&member.name, &source_model, table) {
                Some(m) => m,
                None => continue,
            };
            let (ms, md) = (&matched.member.declared_type, &member.declared_type);
            match compare(ms, md) {
                Compatibility::Nested => {
                    queue.push_back((ms.underlying().clone(), md.underlying().clone(), depth + 1));
                }
                Compatibility::Collection => {
                    if let Some((es, ed)) = complex_elements(ms, md) {
                        queue.push_back((es.clone(), ed.clone(), depth + 1));
                    }
                }
                _ => {}
            }
        }
    }
    found
}

/// `Address=>AddressDto;Geo=>GeoDto`
pub(crate) fn encode_pairs(pairs: &[(TypeDescriptor, TypeDescriptor)]) -> String {
    pairs
        .iter()
        .map(|(s, d)| format!("{}=>{}", s.code_name(), d.code_name()))
        .collect::<Vec<_>>()
        .join(";")
}

/// Inverse of [`encode_pairs`]
pub(crate) fn decode_pairs(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|p| p.split_once("=>"))
        .map(|(s, d)| (s.trim().to_string(), d.trim().to_string()))
        .filter(|(s, d)| !s.is_empty() && !d.is_empty())
        .collect()
}
