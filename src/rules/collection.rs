//! AM003 / AM021: collection members

use super::nested::{encode_pairs, missing_pairs};
use super::pairs::convention_pairs;
use super::{Rule, RuleContext};
use crate::diagnostic::{props, Finding, RuleInfo, COLLECTION_CONTAINER, COLLECTION_ELEMENT};
use crate::model::compat::containers_compatible;
use crate::model::{compare, Compatibility, TypeDescriptor};
use crate::registration::MappingRegistry;
use crate::Result;

/// Collection members whose container or element types do not convert
///
/// An incompatible container is reported on its own; elements are only
/// compared once the containers agree. Dictionaries compare value types.
pub struct CollectionRule;

impl Rule for CollectionRule {
    fn name(&self) -> &'static str {
        "collections"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[COLLECTION_CONTAINER, COLLECTION_ELEMENT]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for pair in convention_pairs(ctx) {
            let source = &pair.source.member.declared_type;
            let destination = &pair.destination.declared_type;
            if compare(source, destination) != Compatibility::Collection {
                continue;
            }
            let (sk, dk) = match (source.collection_kind(), destination.collection_kind()) {
                (Some(sk), Some(dk)) => (sk, dk),
                _ => continue,
            };
            let (se, de) = match (source.element(), destination.element()) {
                (Some(se), Some(de)) => (se, de),
                _ => continue,
            };

            let rule = if !containers_compatible(sk, dk) {
                &COLLECTION_CONTAINER
            } else if !elements_compatible(se, de, ctx.registry) {
                &COLLECTION_ELEMENT
            } else {
                continue;
            };

            let mut finding = ctx.member_finding(
                rule,
                &pair.destination.name,
                Some(&pair.source.member),
                Some(pair.destination),
            );
            if rule.id == COLLECTION_ELEMENT.id {
                finding.args.push(se.to_string());
                finding.args.push(de.to_string());
                finding.message = crate::diagnostic::format_message(rule.template, &finding.args);
                let (su, du) = (se.underlying(), de.underlying());
                if su.is_complex() && du.is_complex() {
                    let missing = missing_pairs(su, du, ctx.registry, ctx.table);
                    finding = finding.with_property(props::MISSING_PAIRS, encode_pairs(&missing));
                }
            }
            findings.push(
                finding
                    .with_property(props::SOURCE_MEMBER, pair.source.member.name.clone())
                    .with_property(props::SOURCE_PATH, pair.source_path().join("."))
                    .with_property(props::SOURCE_CONTAINER, sk.to_string())
                    .with_property(props::DESTINATION_CONTAINER, dk.to_string())
                    .with_property(props::SOURCE_ELEMENT_TYPE, se.code_name())
                    .with_property(props::DESTINATION_ELEMENT_TYPE, de.code_name()),
            );
        }
        Ok(findings)
    }
}

/// Element types the mapper converts, given the registered pairs
fn elements_compatible(source: &TypeDescriptor, destination: &TypeDescriptor, registry: &MappingRegistry) -> bool {
    match compare(source, destination) {
        Compatibility::Compatible | Compatibility::NullableToNonNullable | Compatibility::Unknown => true,
        Compatibility::Incompatible => false,
        Compatibility::Nested => registry.contains_types(source, destination),
        Compatibility::Collection => {
            match (
                source.collection_kind(),
                destination.collection_kind(),
                source.element(),
                destination.element(),
            ) {
                (Some(sk), Some(dk), Some(se), Some(de)) => {
                    containers_compatible(sk, dk) && elements_compatible(se, de, registry)
                }
                _ => true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ids, profile, Fixture};
    use super::*;

    const TYPES: &str = "public class Item { public int Id { get; set; } }\n\
                         public class ItemDto { public int Id { get; set; } }\n\
                         public class Bag { public HashSet<string> Tags { get; set; } public List<string> Codes { get; set; } public List<int> Numbers { get; set; } public List<Item> Items { get; set; } public int[] Flat { get; set; } }\n\
                         public class BagDto { public List<string> Tags { get; set; } public List<int> Codes { get; set; } public string[] Numbers { get; set; } public List<ItemDto> Items { get; set; } public IEnumerable<long> Flat { get; set; } }";

    #[test]
    fn test_container_and_element_findings() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<Bag, BagDto>();"));
        let findings = fx.run(&CollectionRule);
        assert_eq!(ids(&findings), vec!["AM003", "AM021", "AM021", "AM021"]);

        assert_eq!(findings[0].property(props::MEMBER), Some("Tags"));
        assert_eq!(findings[0].property(props::SOURCE_CONTAINER), Some("set"));
        assert_eq!(findings[0].property(props::DESTINATION_CONTAINER), Some("list"));

        let codes = &findings[1];
        assert_eq!(codes.args[5], "string");
        assert_eq!(codes.args[6], "int");
        assert!(codes.property(props::MISSING_PAIRS).is_none());

        let items = &findings[3];
        assert_eq!(items.property(props::MISSING_PAIRS), Some("Item=>ItemDto"));
    }

    #[test]
    fn test_registered_element_pair_is_compatible() {
        let fx = Fixture::new(&profile(
            "public class Item { public int Id { get; set; } }\n\
             public class ItemDto { public int Id { get; set; } }\n\
             public class Bag { public List<Item> Items { get; set; } }\n\
             public class BagDto { public Item[] Items { get; set; } }",
            "CreateMap<Bag, BagDto>();\nCreateMap<Item, ItemDto>();",
        ));
        // Item -> Item is the same type; nothing to report
        assert!(fx.run(&CollectionRule).is_empty());
    }

    #[test]
    fn test_dictionary_pairs_need_same_container() {
        let fx = Fixture::new(&profile(
            "public class A { public Dictionary<string, int> Map { get; set; } }\n\
             public class B { public List<int> Map { get; set; } }",
            "CreateMap<A, B>();",
        ));
        assert_eq!(ids(&fx.run(&CollectionRule)), vec!["AM003"]);
    }
}
