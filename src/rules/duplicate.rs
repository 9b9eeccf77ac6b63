//! AM041: the same ordered pair registered more than once

use super::{Rule, RuleContext};
use crate::diagnostic::{props, Finding, RuleInfo, DUPLICATE_REGISTRATION};
use crate::registration::{RegistryEntry, RegistryOrigin};
use crate::Result;

/// A registration entry that is not the first for its pair
///
/// The finding sits on the later site in document order: the `CreateMap`
/// call for an explicit entry, or `ReverseMap()` for a mirrored one.
/// `Include` entries never count.
pub struct DuplicateRule;

impl Rule for DuplicateRule {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[DUPLICATE_REGISTRATION]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let reg = ctx.registration;
        let mut own: Vec<&RegistryEntry> = ctx
            .registry
            .entries_of(reg.id)
            .filter(|e| e.origin != RegistryOrigin::Implied)
            .collect();
        own.sort_by_key(|e| e.origin != RegistryOrigin::Explicit);

        let mut findings = Vec::new();
        for entry in own {
            let first = match ctx
                .registry
                .lookup(&entry.key)
                .into_iter()
                .find(|e| e.origin != RegistryOrigin::Implied)
            {
                Some(first) => first,
                None => continue,
            };
            if first.position() == entry.position() && first.origin == entry.origin {
                continue;
            }
            let earlier = format!("{}:{}", first.file, first.span.start_line);

            match entry.origin {
                RegistryOrigin::Explicit => {
                    let args = vec![reg.source.to_string(), reg.destination.to_string(), earlier];
                    let mut finding = ctx
                        .finding(&DUPLICATE_REGISTRATION, args, entry.span)
                        .with_property(props::DUPLICATE_ORIGIN, "explicit");
                    if first.origin == RegistryOrigin::Reverse && removable_reverse(ctx, first.registration) {
                        finding = finding.with_property(props::REVERSE_REGISTRATION, first.registration.to_string());
                    }
                    findings.push(finding);
                    // one finding per registration: the reverse half goes with it
                    break;
                }
                RegistryOrigin::Reverse => {
                    let args = vec![reg.destination.to_string(), reg.source.to_string(), earlier];
                    let mut finding = ctx
                        .finding(&DUPLICATE_REGISTRATION, args, entry.span)
                        .with_property(props::DUPLICATE_ORIGIN, "reverse");
                    if removable_reverse(ctx, reg.id) {
                        finding = finding.with_property(props::REVERSE_REGISTRATION, reg.id.to_string());
                    }
                    findings.push(finding);
                }
                RegistryOrigin::Implied => {}
            }
        }
        Ok(findings)
    }
}

/// `ReverseMap()` can be dropped without losing reverse configuration
fn removable_reverse(ctx: &RuleContext<'_>, registration: usize) -> bool {
    ctx.registrations
        .get(registration)
        .and_then(|r| r.reverse_map.as_ref())
        .map(|r| !r.has_trailing_calls)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ids, profile, Fixture};
    use super::*;

    const TYPES: &str = "public class A { public int X { get; set; } }\npublic class B { public int X { get; set; } }";

    #[test]
    fn test_second_occurrence_is_flagged() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<A, B>();\nCreateMap<A, B>();"));
        let findings = fx.run(&DuplicateRule);
        assert_eq!(ids(&findings), vec!["AM041"]);
        assert_eq!(findings[0].registration, Some(1));
        assert_eq!(findings[0].property(props::DUPLICATE_ORIGIN), Some("explicit"));
        assert!(findings[0].property(props::REVERSE_REGISTRATION).is_none());
        assert_eq!(findings[0].message, "Mapping A -> B is already registered at Profile.cs:10");
    }

    #[test]
    fn test_both_directions_are_not_duplicates() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<A, B>();\nCreateMap<B, A>();"));
        assert!(fx.run(&DuplicateRule).is_empty());
    }

    #[test]
    fn test_explicit_after_reverse_map() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<A, B>().ReverseMap();\nCreateMap<B, A>();"));
        let findings = fx.run(&DuplicateRule);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].registration, Some(1));
        assert_eq!(findings[0].property(props::REVERSE_REGISTRATION), Some("0"));
    }

    #[test]
    fn test_reverse_map_after_explicit() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<B, A>();\nCreateMap<A, B>().ReverseMap();"));
        let findings = fx.run(&DuplicateRule);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].registration, Some(1));
        assert_eq!(findings[0].property(props::DUPLICATE_ORIGIN), Some("reverse"));
        assert_eq!(findings[0].property(props::REVERSE_REGISTRATION), Some("1"));
        assert_eq!(findings[0].args[0], "B");
    }

    #[test]
    fn test_reverse_with_trailing_configuration_keeps_it() {
        let fx = Fixture::new(&profile(
            TYPES,
            "CreateMap<B, A>();\nCreateMap<A, B>().ReverseMap().ForMember(d => d.X, o => o.Ignore());",
        ));
        let findings = fx.run(&DuplicateRule);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].property(props::REVERSE_REGISTRATION).is_none());
    }

    #[test]
    fn test_include_is_never_a_duplicate() {
        let fx = Fixture::new(&profile(TYPES, "CreateMap<B, A>().Include<A, B>();\nCreateMap<A, B>();"));
        assert!(fx.run(&DuplicateRule).is_empty());
    }
}
