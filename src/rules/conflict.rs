//! AM042: one member configured more than once

use super::{Rule, RuleContext};
use crate::diagnostic::{props, Finding, RuleInfo, CONFLICTING_CONFIGURATION};
use crate::registration::MemberDirective;
use crate::Result;

/// Several forward directives configure the same destination member
///
/// Each directive after the first is reported at its own call.
pub struct ConflictRule;

impl Rule for ConflictRule {
    fn name(&self) -> &'static str {
        "conflicts"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[CONFLICTING_CONFIGURATION]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let configured: Vec<&MemberDirective> = ctx
            .registration
            .directives
            .iter()
            .filter(|d| d.config.is_some() && d.member().is_some())
            .collect();

        let mut findings = Vec::new();
        for (i, later) in configured.iter().enumerate() {
            let member = match later.member() {
                Some(m) => m,
                None => continue,
            };
            let earlier: Vec<&&MemberDirective> =
                configured[..i].iter().filter(|d| d.targets(member)).collect();
            let first = match earlier.first() {
                Some(first) => first,
                None => continue,
            };
            let args = vec![member.to_string(), label(first), label(later)];
            let mut finding = ctx
                .finding(&CONFLICTING_CONFIGURATION, args, later.span)
                .with_property(props::MEMBER, member);
            // a call that also holds an earlier configuration cannot be dropped alone
            if earlier.iter().all(|d| d.call_index != later.call_index) {
                finding = finding.with_property(props::CALL_INDEX, later.call_index.to_string());
            }
            findings.push(finding);
        }
        Ok(findings)
    }
}

fn label(directive: &MemberDirective) -> String {
    directive
        .config
        .as_ref()
        .map(|c| c.label())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ids, profile, Fixture};
    use super::*;

    const TYPES: &str = "public class A { public int X { get; set; } public int Y { get; set; } }\npublic class B { public int X { get; set; } public int Y { get; set; } }";

    #[test]
    fn test_ignore_then_map_from() {
        let fx = Fixture::new(&profile(
            TYPES,
            "CreateMap<A, B>()\n    .ForMember(d => d.X, o => o.Ignore())\n    .ForMember(d => d.Y, o => o.Ignore())\n    .ForMember(d => d.X, o => o.MapFrom(s => s.Y));",
        ));
        let findings = fx.run(&ConflictRule);
        assert_eq!(ids(&findings), vec!["AM042"]);
        assert_eq!(findings[0].message, "Property 'X' is configured more than once: Ignore conflicts with MapFrom");
        assert_eq!(findings[0].property(props::CALL_INDEX), Some("3"));
    }

    #[test]
    fn test_modifiers_alone_do_not_conflict() {
        let fx = Fixture::new(&profile(
            TYPES,
            "CreateMap<A, B>()\n    .ForMember(d => d.X, o => o.NullSubstitute(0))\n    .ForMember(d => d.X, o => o.MapFrom(s => s.Y));",
        ));
        assert!(fx.run(&ConflictRule).is_empty());
    }

    #[test]
    fn test_reverse_directives_are_separate() {
        let fx = Fixture::new(&profile(
            TYPES,
            "CreateMap<A, B>()\n    .ForMember(d => d.X, o => o.Ignore())\n    .ReverseMap()\n    .ForMember(d => d.X, o => o.Ignore());",
        ));
        assert!(fx.run(&ConflictRule).is_empty());
    }
}
