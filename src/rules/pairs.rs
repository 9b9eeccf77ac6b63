//! Destination members paired with their convention source

use super::RuleContext;
use crate::model::{
    extract_members, match_member, resolve_path, MemberConstraints, MemberDescriptor, SourceMatch,
    TypeModel,
};

/// A destination member the mapper fills by convention
#[derive(Debug, Clone)]
pub struct MemberPair<'a> {
    pub destination: &'a MemberDescriptor,
    pub source: SourceMatch,
    /// `IncludeMembers` path the match was found under; empty for the source root
    pub via: Vec<String>,
}

impl MemberPair<'_> {
    /// Full member path from the source root
    pub fn source_path(&self) -> Vec<String> {
        self.via
            .iter()
            .chain(self.source.path.iter())
            .cloned()
            .collect()
    }
}

/// Pair every destination member that has no explicit configuration with its
/// source member
///
/// Members configured by `Ignore`, `MapFrom`, a converter or a `ForPath`
/// below them are left out, as are members nothing on the source matches.
pub fn convention_pairs<'a>(ctx: &RuleContext<'a>) -> Vec<MemberPair<'a>> {
    let (source, destination) = match ctx.member_models() {
        Some(models) => models,
        None => return Vec::new(),
    };
    destination
        .members
        .iter()
        .filter(|m| !explicitly_configured(ctx, &m.name))
        .filter_map(|m| {
            let (via, found) = find_source(ctx, source, &m.name)?;
            Some(MemberPair {
                destination: m,
                source: found,
                via,
            })
        })
        .collect()
}

/// Explicit configuration decides the member's source
pub(crate) fn explicitly_configured(ctx: &RuleContext<'_>, member: &str) -> bool {
    ctx.registration.directives.iter().any(|d| {
        let first = d.target.first().map(|t| t.eq_ignore_ascii_case(member)).unwrap_or(false);
        first && (d.config.is_some() || d.target.len() > 1)
    })
}

/// Match against the source root, then each `IncludeMembers` path
pub(crate) fn find_source(
    ctx: &RuleContext<'_>,
    source: &TypeModel,
    member: &str,
) -> Option<(Vec<String>, SourceMatch)> {
    if let Some(found) = match_member(member, source, ctx.table) {
        return Some((Vec::new(), found));
    }
    ctx.registration.include_members.iter().find_map(|path| {
        let inner = resolve_path(path, source, ctx.table)?;
        let model = TypeModel {
            members: extract_members(&inner.declared_type, ctx.table, MemberConstraints::Readable),
            descriptor: inner.declared_type,
        };
        match_member(member, &model, ctx.table).map(|found| (path.clone(), found))
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::{profile, Fixture};
    use super::*;
    use crate::model::{extract_model, MatchKind};

    #[test]
    fn test_configured_members_are_left_out() {
        let fx = Fixture::new(&profile(
            "public class S { public int A { get; set; } public int B { get; set; } public Inner Inner { get; set; } }\n\
             public class Inner { public string City { get; set; } }\n\
             public class D { public int A { get; set; } public int B { get; set; } public string InnerCity { get; set; } }",
            "CreateMap<S, D>().ForMember(d => d.B, o => o.Ignore());",
        ));
        let reg = &fx.registrations[0];
        let source = extract_model(&reg.source, &fx.table, Some("Shop"), MemberConstraints::Readable);
        let dest = extract_model(&reg.destination, &fx.table, Some("Shop"), MemberConstraints::Writable);
        let ctx = RuleContext {
            registration: reg,
            registrations: &fx.registrations,
            source: source.as_ref(),
            destination: dest.as_ref(),
            registry: &fx.registry,
            table: &fx.table,
        };
        let pairs = convention_pairs(&ctx);
        let names: Vec<&str> = pairs.iter().map(|p| p.destination.name.as_str()).collect();
        assert_eq!(names, vec!["A", "InnerCity"]);
        assert_eq!(pairs[1].source.kind, MatchKind::Flattened);
        assert_eq!(pairs[1].source_path(), vec!["Inner", "City"]);
    }

    #[test]
    fn test_include_members_path() {
        let fx = Fixture::new(&profile(
            "public class S { public Inner Detail { get; set; } }\n\
             public class Inner { public string Title { get; set; } }\n\
             public class D { public string Title { get; set; } }",
            "CreateMap<S, D>().IncludeMembers(s => s.Detail);",
        ));
        let reg = &fx.registrations[0];
        let source = extract_model(&reg.source, &fx.table, Some("Shop"), MemberConstraints::Readable);
        let dest = extract_model(&reg.destination, &fx.table, Some("Shop"), MemberConstraints::Writable);
        let ctx = RuleContext {
            registration: reg,
            registrations: &fx.registrations,
            source: source.as_ref(),
            destination: dest.as_ref(),
            registry: &fx.registry,
            table: &fx.table,
        };
        let pairs = convention_pairs(&ctx);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].source_path(), vec!["Detail", "Title"]);
    }
}
