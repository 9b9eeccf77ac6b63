//! Mapping rules
//!
//! Each rule is an independent object behind the [`Rule`] trait. The engine
//! calls [`Rule::detect`] once per registration with a [`RuleContext`] and
//! concatenates the findings; rules never see each other's output.
//!
//! | Rule object              | Ids                       |
//! |--------------------------|---------------------------|
//! | [`TypeCompatibilityRule`] | AM001, AM002             |
//! | [`UnmappedMemberRule`]    | AM004, AM005, AM006, AM011 |
//! | [`NestedMappingRule`]     | AM020                    |
//! | [`CollectionRule`]        | AM003, AM021             |
//! | [`RecursionRule`]         | AM022                    |
//! | [`PerformanceRule`]       | AM031                    |
//! | [`DuplicateRule`]         | AM041                    |
//! | [`ConflictRule`]          | AM042                    |
//! | [`RedundantMapFromRule`]  | AM050                    |

mod collection;
mod conflict;
mod duplicate;
pub mod engine;
mod nested;
mod pairs;
pub mod performance;
mod recursion;
mod redundant;
mod type_compat;
mod unmapped;

pub use collection::CollectionRule;
pub use conflict::ConflictRule;
pub use duplicate::DuplicateRule;
pub use engine::{Analysis, CancellationToken, Engine};
pub use nested::{missing_pairs, NestedMappingRule};
pub(crate) use nested::decode_pairs;
pub use pairs::{convention_pairs, MemberPair};
pub use performance::{PerformanceMode, PerformanceRule};
pub use recursion::RecursionRule;
pub use redundant::RedundantMapFromRule;
pub use type_compat::TypeCompatibilityRule;
pub use unmapped::UnmappedMemberRule;

use crate::diagnostic::{props, Finding, RuleInfo};
use crate::model::{MemberDescriptor, TypeModel};
use crate::registration::{MappingRegistration, MappingRegistry};
use crate::symbols::SymbolTable;
use crate::Result;

/// Everything a rule may look at for one registration
pub struct RuleContext<'a> {
    pub registration: &'a MappingRegistration,
    /// Every registration of the compilation, indexed by id
    pub registrations: &'a [MappingRegistration],
    /// Readable members of the source type; `None` when it cannot be analyzed
    pub source: Option<&'a TypeModel>,
    /// Writable members of the destination type
    pub destination: Option<&'a TypeModel>,
    pub registry: &'a MappingRegistry,
    pub table: &'a SymbolTable,
}

impl<'a> RuleContext<'a> {
    pub fn namespace(&self) -> Option<&'a str> {
        self.registration.namespace.as_deref()
    }

    /// Both member models, when member-level rules can run at all
    ///
    /// A registration-level `ConvertUsing` replaces member mapping entirely.
    pub fn member_models(&self) -> Option<(&'a TypeModel, &'a TypeModel)> {
        if self.registration.converter.is_some() {
            return None;
        }
        Some((self.source?, self.destination?))
    }

    /// Source type as written in the registration
    pub fn source_name(&self) -> String {
        self.registration.source.to_string()
    }

    pub fn destination_name(&self) -> String {
        self.registration.destination.to_string()
    }

    /// Finding attached to this registration
    pub fn finding(&self, rule: &RuleInfo, args: Vec<String>, span: crate::ast::Span) -> Finding {
        Finding::new(rule, args, &self.registration.file, span)
            .with_registration(self.registration.id)
            .with_property(props::SOURCE_TYPE, self.source_name())
            .with_property(props::DESTINATION_TYPE, self.destination_name())
    }

    /// Finding about a destination member, with the shared message arguments
    ///
    /// `{0}` member, `{1}` source type, `{2}` source member type,
    /// `{3}` destination type, `{4}` destination member type.
    pub fn member_finding(
        &self,
        rule: &RuleInfo,
        member: &str,
        source_member: Option<&MemberDescriptor>,
        destination_member: Option<&MemberDescriptor>,
    ) -> Finding {
        let source_type = source_member
            .map(|m| m.declared_type.to_string())
            .unwrap_or_default();
        let destination_type = destination_member
            .map(|m| m.declared_type.to_string())
            .unwrap_or_default();
        let args = vec![
            member.to_string(),
            self.source_name(),
            source_type.clone(),
            self.destination_name(),
            destination_type.clone(),
        ];
        let mut finding = self
            .finding(rule, args, self.registration.span())
            .with_property(props::MEMBER, member);
        if source_member.is_some() {
            finding = finding.with_property(props::SOURCE_MEMBER_TYPE, source_type);
        }
        if destination_member.is_some() {
            finding = finding.with_property(props::DESTINATION_MEMBER_TYPE, destination_type);
        }
        finding
    }
}

/// A mapping rule
pub trait Rule: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Finding kinds this rule can report
    fn produces(&self) -> &'static [RuleInfo];

    /// Inspect one registration
    ///
    /// Symbols that cannot be resolved produce no findings.
    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>>;
}

/// The full rule set, in id order
pub fn default_rules(performance_mode: PerformanceMode, max_projection_depth: usize) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(TypeCompatibilityRule),
        Box::new(CollectionRule),
        Box::new(UnmappedMemberRule),
        Box::new(NestedMappingRule),
        Box::new(RecursionRule),
        Box::new(PerformanceRule::new(performance_mode, max_projection_depth)),
        Box::new(DuplicateRule),
        Box::new(ConflictRule),
        Box::new(RedundantMapFromRule),
    ]
}
