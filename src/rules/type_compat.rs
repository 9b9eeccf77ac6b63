//! AM001 / AM002: member type compatibility

use super::pairs::convention_pairs;
use super::{Rule, RuleContext};
use crate::diagnostic::{props, Finding, RuleInfo, NULLABLE_TO_NON_NULLABLE, TYPE_MISMATCH};
use crate::model::{compare, Compatibility};
use crate::Result;

/// Convention-mapped members whose types the mapper cannot convert
///
/// Complex pairs and collections are left to the nested and collection
/// rules. A `NullSubstitute` on the member accepts a nullable source.
pub struct TypeCompatibilityRule;

impl Rule for TypeCompatibilityRule {
    fn name(&self) -> &'static str {
        "type-compatibility"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[TYPE_MISMATCH, NULLABLE_TO_NON_NULLABLE]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for pair in convention_pairs(ctx) {
            let name = &pair.destination.name;
            let rule = match compare(&pair.source.member.declared_type, &pair.destination.declared_type) {
                Compatibility::Incompatible => &TYPE_MISMATCH,
                Compatibility::NullableToNonNullable if !ctx.registration.has_null_substitute(name) => {
                    &NULLABLE_TO_NON_NULLABLE
                }
                _ => continue,
            };
            findings.push(
                ctx.member_finding(rule, name, Some(&pair.source.member), Some(pair.destination))
                    .with_property(props::SOURCE_MEMBER, pair.source.member.name.clone())
                    .with_property(props::SOURCE_PATH, pair.source_path().join(".")),
            );
        }
        Ok(findings)
    }
}
