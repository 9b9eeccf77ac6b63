//! Mapping registrations
//!
//! A [`MappingRegistration`] is one `CreateMap<S, D>()` chain reduced to its
//! meaning: the two types, per-member directives, reverse-map and include
//! calls, and the registration-level options. The [`MappingRegistry`] indexes
//! every registration of a compilation by (source, destination) pair.

mod extract;
mod registry;

pub use extract::extract_registration;
pub use registry::{build_registry, type_key, MappingRegistry, PairKey, RegistryEntry, RegistryOrigin};

use crate::ast::{ChainSyntax, ExpressionSummary, Span};
use crate::parse::TypeRef;

/// Which destination members the mapper validates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberList {
    #[default]
    Destination,
    Source,
    None,
}

/// What a member directive configures
#[derive(Debug, Clone, PartialEq)]
pub enum MemberConfiguration {
    /// `opt.Ignore()`
    Ignored,
    /// `opt.MapFrom(s => ...)` or `opt.MapFrom("Name")`
    MappedFrom(SourceExpression),
    /// Value converter, resolver or conversion delegate, as written
    ConvertedUsing(String),
}

impl MemberConfiguration {
    pub fn label(&self) -> &'static str {
        match self {
            MemberConfiguration::Ignored => "Ignore",
            MemberConfiguration::MappedFrom(_) => "MapFrom",
            MemberConfiguration::ConvertedUsing(_) => "ConvertUsing",
        }
    }
}

/// Source expression of a `MapFrom`
#[derive(Debug, Clone, PartialEq)]
pub struct SourceExpression {
    pub text: String,
    /// Member path when the expression is plain member access on the source
    pub member_path: Option<Vec<String>>,
    /// Body summary for lambda expressions
    pub summary: Option<ExpressionSummary>,
}

/// One `ForMember` / `ForPath` / `ForCtorParam` call
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDirective {
    /// Destination member path (`["Name"]`, or `["Address", "City"]` for `ForPath`)
    pub target: Vec<String>,
    /// Call that declared the directive
    pub method: String,
    /// Index of the call in the chain
    pub call_index: usize,
    /// `None` when the options only carry modifiers (`Condition`, `NullSubstitute`)
    pub config: Option<MemberConfiguration>,
    pub null_substitute: bool,
    pub condition: bool,
    /// Whole call, receiver excluded: `\n    .ForMember(...)`
    pub segment: Span,
    /// The call itself, for diagnostics
    pub span: Span,
}

impl MemberDirective {
    /// Destination member name for single-member directives
    pub fn member(&self) -> Option<&str> {
        match self.target.as_slice() {
            [name] => Some(name),
            _ => None,
        }
    }

    pub fn targets(&self, member: &str) -> bool {
        self.member()
            .map(|m| m.eq_ignore_ascii_case(member))
            .unwrap_or(false)
    }
}

/// `ForSourceMember(s => s.X, o => o.DoNotValidate())`
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMemberDirective {
    pub member: String,
    pub do_not_validate: bool,
    pub call_index: usize,
}

/// `Include<S, D>()` or `IncludeBase<S, D>()`
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeDirective {
    pub source: TypeRef,
    pub destination: TypeRef,
    /// `IncludeBase` rather than `Include`
    pub base: bool,
    pub span: Span,
}

/// `.ReverseMap()` in a chain
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseMapCall {
    pub call_index: usize,
    pub span: Span,
    pub segment: Span,
    /// Calls after `ReverseMap()` configure the reverse map
    pub has_trailing_calls: bool,
}

/// Any lambda body evaluated while mapping
#[derive(Debug, Clone, PartialEq)]
pub struct MappingExpression {
    /// Destination member, when the expression feeds one
    pub member: Option<String>,
    pub method: String,
    pub summary: ExpressionSummary,
}

/// One registration unit
#[derive(Debug, Clone)]
pub struct MappingRegistration {
    /// Position in the compilation, document order
    pub id: usize,
    pub file: String,
    /// Index of the file in the compilation
    pub file_index: usize,
    pub source: TypeRef,
    pub destination: TypeRef,
    /// Namespace used to resolve the type arguments
    pub namespace: Option<String>,
    /// Directives configuring the forward map
    pub directives: Vec<MemberDirective>,
    /// Directives after `ReverseMap()`
    pub reverse_directives: Vec<MemberDirective>,
    pub source_directives: Vec<SourceMemberDirective>,
    pub reverse_map: Option<ReverseMapCall>,
    pub includes: Vec<IncludeDirective>,
    /// `IncludeMembers(s => s.Inner)` paths
    pub include_members: Vec<Vec<String>>,
    /// Registration-level `ConvertUsing`
    pub converter: Option<String>,
    pub member_list: MemberList,
    pub max_depth: Option<u32>,
    pub preserve_references: bool,
    pub expressions: Vec<MappingExpression>,
    pub chain: ChainSyntax,
}

impl MappingRegistration {
    /// Span of the `CreateMap` call
    pub fn span(&self) -> Span {
        self.chain.root().span
    }

    /// Forward directives targeting `member`
    pub fn directives_for<'a>(&'a self, member: &'a str) -> impl Iterator<Item = &'a MemberDirective> + 'a {
        self.directives.iter().filter(move |d| d.targets(member))
    }

    /// First forward configuration for `member`
    pub fn configuration_for<'a>(&'a self, member: &'a str) -> Option<&'a MemberConfiguration> {
        self.directives_for(member).find_map(|d| d.config.as_ref())
    }

    pub fn has_null_substitute(&self, member: &str) -> bool {
        self.directives_for(member).any(|d| d.null_substitute)
    }

    /// Any forward directive (including `ForPath` below it) mentions `member`
    pub fn mentions(&self, member: &str) -> bool {
        self.directives.iter().any(|d| {
            d.target
                .first()
                .map(|m| m.eq_ignore_ascii_case(member))
                .unwrap_or(false)
        })
    }

    pub fn source_not_validated(&self, member: &str) -> bool {
        self.source_directives
            .iter()
            .any(|d| d.do_not_validate && d.member.eq_ignore_ascii_case(member))
    }

    /// `CreateMap<S, D>` as written
    pub fn title(&self) -> String {
        format!("CreateMap<{}, {}>", self.source, self.destination)
    }
}
