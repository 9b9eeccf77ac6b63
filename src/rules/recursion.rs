//! AM022: self-referencing type graphs

use super::pairs::convention_pairs;
use super::{Rule, RuleContext};
use crate::diagnostic::{props, Finding, RuleInfo, RECURSION_RISK};
use crate::model::{extract_members, MemberConstraints, TypeDescriptor};
use crate::symbols::SymbolTable;
use crate::Result;
use std::collections::HashSet;

const MAX_SEARCH_DEPTH: usize = 8;

/// A member whose type graph leads back to the registration's own types,
/// on both the source and the destination side
///
/// `MaxDepth` or `PreserveReferences` on the registration bounds the walk.
pub struct RecursionRule;

impl Rule for RecursionRule {
    fn name(&self) -> &'static str {
        "recursion"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[RECURSION_RISK]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let reg = ctx.registration;
        if reg.max_depth.is_some() || reg.preserve_references {
            return Ok(Vec::new());
        }
        let (source, destination) = match ctx.member_models() {
            Some(models) => models,
            None => return Ok(Vec::new()),
        };
        let source_root = &source.descriptor.underlying().key;
        let destination_root = &destination.descriptor.underlying().key;

        let mut findings = Vec::new();
        for pair in convention_pairs(ctx) {
            if pair.source.path.len() != 1 || !pair.via.is_empty() {
                continue;
            }
            let leads_back = reaches(&pair.source.member.declared_type, source_root, ctx.table)
                && reaches(&pair.destination.declared_type, destination_root, ctx.table);
            if leads_back {
                findings.push(
                    ctx.member_finding(
                        &RECURSION_RISK,
                        &pair.destination.name,
                        Some(&pair.source.member),
                        Some(pair.destination),
                    )
                    .with_property(props::SOURCE_MEMBER, pair.source.member.name.clone()),
                );
            }
        }
        Ok(findings)
    }
}

/// The graph of complex members reachable from `start` contains `target`
fn reaches(start: &TypeDescriptor, target: &str, table: &SymbolTable) -> bool {
    let mut visited = HashSet::new();
    search(start, target, table, &mut visited, 0)
}

fn search(
    descriptor: &TypeDescriptor,
    target: &str,
    table: &SymbolTable,
    visited: &mut HashSet<String>,
    depth: usize,
) -> bool {
    let node = match descriptor.innermost_element() {
        Some(element) => element.underlying(),
        None => descriptor.underlying(),
    };
    if !node.is_complex() {
        return false;
    }
    if node.key == target {
        return true;
    }
    if depth >= MAX_SEARCH_DEPTH || !visited.insert(node.key.clone()) {
        return false;
    }
    extract_members(node, table, MemberConstraints::Any)
        .iter()
        .any(|m| search(&m.declared_type, target, table, visited, depth + 1))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ids, profile, Fixture};
    use super::*;

    const TYPES: &str = "public class Category { public string Name { get; set; } public Category Parent { get; set; } public List<Item> Items { get; set; } }\n\
                         public class Item { public Category Owner { get; set; } }\n\
                         public class CategoryDto { public string Name { get; set; } public CategoryDto Parent { get; set; } public List<ItemDto> Items { get; set; } }\n\
                         public class ItemDto { public CategoryDto Owner { get; set; } }";

    #[test]
    fn test_direct_and_indirect_cycles() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<Category, CategoryDto>();"));
        let findings = fx.run(&RecursionRule);
        assert_eq!(ids(&findings), vec!["AM022", "AM022"]);
        assert_eq!(findings[0].property(props::MEMBER), Some("Parent"));
        assert_eq!(findings[1].property(props::MEMBER), Some("Items"));
    }

    #[test]
    fn test_bounded_registrations_pass() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<Category, CategoryDto>().MaxDepth(2);"));
        assert!(fx.run(&RecursionRule).is_empty());
        let fx = Fixture::new(&profile(TYPES, "CreateMap<Category, CategoryDto>().PreserveReferences();"));
        assert!(fx.run(&RecursionRule).is_empty());
    }

    #[test]
    fn test_acyclic_destination_is_safe() {
        let fx = Fixture::new(&profile(
            "public class Node { public Node Next { get; set; } }\npublic class NodeDto { public string Next { get; set; } }",
            "CreateMap<Node, NodeDto>();",
        ));
        assert!(fx.run(&RecursionRule).is_empty());
    }

    #[test]
    fn test_cycle_on_one_side_only_is_safe() {
        let fx = Fixture::new(&profile(
            "public class Leaf { public string Label { get; set; } }\n\
             public class Tree { public Leaf Next { get; set; } }\n\
             public class TreeDto { public TreeDto Next { get; set; } }\n\
             public class Chain { public Chain Next { get; set; } }\n\
             public class LeafDto { public string Label { get; set; } }\n\
             public class ChainDto { public LeafDto Next { get; set; } }",
            "CreateMap<Tree, TreeDto>();\nCreateMap<Chain, ChainDto>();",
        ));
        assert!(fx.run(&RecursionRule).is_empty());
    }
}
