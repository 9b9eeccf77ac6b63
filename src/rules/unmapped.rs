//! AM004 / AM005 / AM006 / AM011: members without a counterpart

use super::pairs::{convention_pairs, explicitly_configured, find_source};
use super::{Rule, RuleContext};
use crate::diagnostic::{
    props, Finding, RuleInfo, CASE_MISMATCH, DESTINATION_UNMAPPED, REQUIRED_UNMAPPED, SOURCE_UNMAPPED,
};
use crate::model::MatchKind;
use crate::registration::{MemberConfiguration, MemberList};
use crate::Result;
use std::collections::HashSet;

/// Destination members nothing maps, source members nothing reads, and
/// matches that only work ignoring case
///
/// Honors `MemberList`: `None` validates nothing, `Source` validates only
/// the source side.
pub struct UnmappedMemberRule;

impl Rule for UnmappedMemberRule {
    fn name(&self) -> &'static str {
        "unmapped-members"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[SOURCE_UNMAPPED, CASE_MISMATCH, DESTINATION_UNMAPPED, REQUIRED_UNMAPPED]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let (source, destination) = match ctx.member_models() {
            Some(models) => models,
            None => return Ok(Vec::new()),
        };
        let reg = ctx.registration;
        let mut findings = Vec::new();

        let pairs = convention_pairs(ctx);
        for pair in &pairs {
            if pair.source.kind == MatchKind::CaseInsensitive && pair.via.is_empty() {
                let args = vec![
                    pair.destination.name.clone(),
                    ctx.source_name(),
                    pair.source.member.name.clone(),
                    ctx.destination_name(),
                ];
                findings.push(
                    ctx.finding(&CASE_MISMATCH, args, reg.span())
                        .with_property(props::MEMBER, pair.destination.name.clone())
                        .with_property(props::SOURCE_MEMBER, pair.source.member.name.clone()),
                );
            }
        }

        if reg.member_list == MemberList::Destination {
            for member in &destination.members {
                if explicitly_configured(ctx, &member.name)
                    || find_source(ctx, source, &member.name).is_some()
                {
                    continue;
                }
                let rule = if member.required {
                    &REQUIRED_UNMAPPED
                } else {
                    &DESTINATION_UNMAPPED
                };
                findings.push(ctx.member_finding(rule, &member.name, None, Some(member)));
            }
        }

        if reg.member_list != MemberList::None {
            let mut used: HashSet<String> = pairs
                .iter()
                .filter_map(|p| p.source_path().first().map(|m| m.to_ascii_lowercase()))
                .collect();
            used.extend(destination.members.iter().map(|m| m.name.to_ascii_lowercase()));
            used.extend(
                reg.include_members
                    .iter()
                    .filter_map(|p| p.first().map(|m| m.to_ascii_lowercase())),
            );
            for directive in &reg.directives {
                if let Some(MemberConfiguration::MappedFrom(expr)) = &directive.config {
                    if let Some(first) = expr.member_path.as_ref().and_then(|p| p.first()) {
                        used.insert(first.to_ascii_lowercase());
                    }
                    if let Some(summary) = &expr.summary {
                        used.extend(summary.parameter_members.iter().map(|m| m.to_ascii_lowercase()));
                    }
                }
            }
            for expression in &reg.expressions {
                used.extend(
                    expression
                        .summary
                        .parameter_members
                        .iter()
                        .map(|m| m.to_ascii_lowercase()),
                );
            }

            for member in &source.members {
                if used.contains(&member.name.to_ascii_lowercase()) || reg.source_not_validated(&member.name) {
                    continue;
                }
                findings.push(
                    ctx.member_finding(&SOURCE_UNMAPPED, &member.name, Some(member), None)
                        .with_property(props::SOURCE_MEMBER, member.name.clone()),
                );
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ids, profile, Fixture};
    use super::*;

    #[test]
    fn test_missing_required_and_unused() {
        let fx = Fixture::new(&profile(
            "public class Order { public int Id { get; set; } public string Secret { get; set; } }\n\
             public class OrderDto { public int Id { get; set; } public string Note { get; set; } public required string Code { get; set; } }",
            "CreateMap<Order, OrderDto>();",
        ));
        let findings = fx.run(&UnmappedMemberRule);
        assert_eq!(ids(&findings), vec!["AM006", "AM011", "AM004"]);
        assert_eq!(findings[0].property(props::MEMBER), Some("Note"));
        assert_eq!(findings[1].property(props::MEMBER), Some("Code"));
        assert_eq!(findings[2].property(props::SOURCE_MEMBER), Some("Secret"));
        assert_eq!(findings[0].message, "Destination property 'OrderDto.Note' is not mapped from Order");
    }

    #[test]
    fn test_member_list_none_disables_validation() {
        let fx = Fixture::new(&profile(
            "public class A { public int X { get; set; } }\npublic class B { public int Y { get; set; } }",
            "CreateMap<A, B>(MemberList.None);",
        ));
        assert!(fx.run(&UnmappedMemberRule).is_empty());
    }

    #[test]
    fn test_member_list_source_keeps_source_validation() {
        let fx = Fixture::new(&profile(
            "public class A { public int X { get; set; } }\npublic class B { public int Y { get; set; } }",
            "CreateMap<A, B>(MemberList.Source);",
        ));
        assert_eq!(ids(&fx.run(&UnmappedMemberRule)), vec!["AM004"]);
    }

    #[test]
    fn test_ignore_map_from_and_do_not_validate() {
        let fx = Fixture::new(&profile(
            "public class A { public int X { get; set; } public int Z { get; set; } }\npublic class B { public int Y { get; set; } public int W { get; set; } }",
            "CreateMap<A, B>()\n    .ForMember(d => d.Y, o => o.MapFrom(s => s.X))\n    .ForMember(d => d.W, o => o.Ignore())\n    .ForSourceMember(s => s.Z, o => o.DoNotValidate());",
        ));
        assert!(fx.run(&UnmappedMemberRule).is_empty());
    }

    #[test]
    fn test_case_only_match() {
        let fx = Fixture::new(&profile(
            "public class A { public string userName { get; set; } }\npublic class B { public string UserName { get; set; } }",
            "CreateMap<A, B>();",
        ));
        let findings = fx.run(&UnmappedMemberRule);
        assert_eq!(ids(&findings), vec!["AM005"]);
        assert_eq!(findings[0].property(props::SOURCE_MEMBER), Some("userName"));
    }

    #[test]
    fn test_flattened_source_counts_as_used() {
        let fx = Fixture::new(&profile(
            "public class Customer { public string Name { get; set; } }\n\
             public class Order { public Customer Customer { get; set; } }\n\
             public class OrderDto { public string CustomerName { get; set; } }",
            "CreateMap<Order, OrderDto>();",
        ));
        assert!(fx.run(&UnmappedMemberRule).is_empty());
    }
}
