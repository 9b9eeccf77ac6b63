//! AM050: `MapFrom` that repeats the convention

use super::{Rule, RuleContext};
use crate::diagnostic::{props, Finding, RuleInfo, REDUNDANT_MAP_FROM};
use crate::model::{match_member, MatchKind};
use crate::registration::MemberConfiguration;
use crate::Result;

/// `ForMember(d => d.X, o => o.MapFrom(s => s.X))` where both `X` have the
/// same type
pub struct RedundantMapFromRule;

impl Rule for RedundantMapFromRule {
    fn name(&self) -> &'static str {
        "redundant-map-from"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[REDUNDANT_MAP_FROM]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let (source, destination) = match ctx.member_models() {
            Some(models) => models,
            None => return Ok(Vec::new()),
        };
        let reg = ctx.registration;
        let mut findings = Vec::new();

        for directive in &reg.directives {
            let member = match directive.member() {
                Some(m) if directive.method == "ForMember" => m,
                _ => continue,
            };
            let path = match &directive.config {
                Some(MemberConfiguration::MappedFrom(expr)) => match expr.member_path.as_deref() {
                    Some([single]) => single,
                    _ => continue,
                },
                _ => continue,
            };
            if directive.condition || directive.null_substitute || reg.directives_for(member).count() > 1 {
                continue;
            }
            let target = match destination.find(member) {
                Some(t) => t,
                None => continue,
            };
            let convention = match match_member(&target.name, source, ctx.table) {
                Some(m) if m.kind != MatchKind::Flattened => m,
                _ => continue,
            };
            if !convention.member.name.eq_ignore_ascii_case(path)
                || convention.member.declared_type.key != target.declared_type.key
            {
                continue;
            }
            findings.push(
                ctx.finding(&REDUNDANT_MAP_FROM, vec![target.name.clone()], directive.span)
                    .with_property(props::MEMBER, target.name.clone())
                    .with_property(props::CALL_INDEX, directive.call_index.to_string()),
            );
        }
        Ok(findings)
    }
}
