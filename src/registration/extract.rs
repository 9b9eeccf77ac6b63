//! Chain syntax → registration
//!
//! Recognizes the mapping configuration API on a `CreateMap` chain and
//! rejects lookalike APIs from unrelated libraries.

use super::{
    IncludeDirective, MappingExpression, MappingRegistration, MemberConfiguration,
    MemberDirective, MemberList, ReverseMapCall, SourceExpression, SourceMemberDirective,
};
use crate::ast::{
    ArgumentKind, ArgumentSyntax, ChainCall, ChainSyntax, LambdaSyntax, ParsedFile, Receiver,
    ReceiverBinding, Span,
};
use crate::parse::TypeRef;
use crate::symbols::{SymbolTable, FRAMEWORK_NAMESPACE};
use tracing::debug;

/// Configuration-expression types a `CreateMap` receiver may have
const CONFIG_EXPRESSION_TYPES: &[&str] = &[
    "IMapperConfigurationExpression",
    "IProfileExpression",
    "MapperConfigurationExpression",
    "Profile",
];

/// Methods and constructors whose callback parameter is a configuration expression
const CONFIG_CALLBACKS: &[&str] = &["MapperConfiguration", "AddAutoMapper", "AddMaps"];

/// Reduce a `CreateMap` chain to a registration
///
/// Returns `None` for chains that are not the mapping API (lookalikes) or
/// whose type arguments cannot be read; such units are skipped.
pub fn extract_registration(
    chain: &ChainSyntax,
    file: &ParsedFile,
    file_index: usize,
    id: usize,
    table: &SymbolTable,
) -> Option<MappingRegistration> {
    if !is_mapping_api(chain, file, table) {
        debug!(file = %file.path, line = chain.span.start_line, "skipping lookalike CreateMap");
        return None;
    }

    let root = chain.root();
    let (source, destination) = match type_pair(&root.type_args, &root.args) {
        Some(pair) => pair,
        None => {
            debug!(file = %file.path, line = chain.span.start_line, "unreadable CreateMap type arguments");
            return None;
        }
    };

    let namespace = chain
        .enclosing_type
        .as_deref()
        .and_then(|q| table.lookup_qualified(q))
        .and_then(|id| table.get(id).namespace.clone());

    let mut registration = MappingRegistration {
        id,
        file: file.path.clone(),
        file_index,
        source,
        destination,
        namespace,
        directives: Vec::new(),
        reverse_directives: Vec::new(),
        source_directives: Vec::new(),
        reverse_map: None,
        includes: Vec::new(),
        include_members: Vec::new(),
        converter: None,
        member_list: member_list(&root.args),
        max_depth: None,
        preserve_references: false,
        expressions: Vec::new(),
        chain: chain.clone(),
    };

    let mut reversed = false;
    for (index, call) in chain.calls.iter().enumerate().skip(1) {
        match call.name.as_str() {
            "ReverseMap" => {
                if registration.reverse_map.is_none() {
                    registration.reverse_map = Some(ReverseMapCall {
                        call_index: index,
                        span: call_span(call),
                        segment: call.segment,
                        has_trailing_calls: index + 1 < chain.calls.len(),
                    });
                }
                reversed = true;
            }
            "ForMember" | "ForPath" | "ForCtorParam" => {
                let directives = member_directives(call, index, &mut registration.expressions);
                if reversed {
                    registration.reverse_directives.extend(directives);
                } else {
                    registration.directives.extend(directives);
                }
            }
            "ForSourceMember" if !reversed => {
                if let Some(directive) = source_member_directive(call, index) {
                    registration.source_directives.push(directive);
                }
            }
            "Include" | "IncludeBase" => {
                if let Some((source, destination)) = type_pair(&call.type_args, &call.args) {
                    registration.includes.push(IncludeDirective {
                        source,
                        destination,
                        base: call.name == "IncludeBase",
                        span: call_span(call),
                    });
                }
            }
            "IncludeMembers" if !reversed => {
                for arg in &call.args {
                    if let ArgumentKind::Lambda(lambda) = &arg.kind {
                        if let Some(path) = &lambda.body.member_path {
                            registration.include_members.push(path.clone());
                        }
                    }
                }
            }
            "ConvertUsing" => {
                for lambda in lambdas(&call.args) {
                    registration.expressions.push(MappingExpression {
                        member: None,
                        method: call.name.clone(),
                        summary: lambda.body.clone(),
                    });
                }
                if !reversed {
                    registration.converter = Some(converter_text(call));
                }
            }
            "ConstructUsing" | "BeforeMap" | "AfterMap" => {
                for lambda in lambdas(&call.args) {
                    registration.expressions.push(MappingExpression {
                        member: None,
                        method: call.name.clone(),
                        summary: lambda.body.clone(),
                    });
                }
            }
            "MaxDepth" if !reversed => {
                registration.max_depth = call.args.first().and_then(|a| a.text.trim().parse().ok());
            }
            "PreserveReferences" if !reversed => registration.preserve_references = true,
            _ => {}
        }
    }

    Some(registration)
}

/// Whether the chain's receiver is the mapping configuration API
fn is_mapping_api(chain: &ChainSyntax, file: &ParsedFile, table: &SymbolTable) -> bool {
    match &chain.receiver {
        Receiver::Implicit | Receiver::This | Receiver::Base => chain
            .enclosing_type
            .as_deref()
            .and_then(|q| table.lookup_qualified(q))
            .map(|id| table.derives_from(id, "Profile"))
            .unwrap_or(false),
        Receiver::Identifier { binding, .. } => match binding {
            Some(ReceiverBinding::Callback(target)) => {
                let simple = target.rsplit('.').next().unwrap_or(target);
                CONFIG_CALLBACKS.contains(&simple)
            }
            Some(ReceiverBinding::Typed(ty)) => is_config_type(ty, chain, file, table),
            None => false,
        },
        Receiver::Other(_) => false,
    }
}

fn is_config_type(type_text: &str, chain: &ChainSyntax, file: &ParsedFile, table: &SymbolTable) -> bool {
    let type_ref = match TypeRef::parse(type_text) {
        Ok(r) => r,
        Err(_) => return false,
    };
    let path = type_ref.path_text().unwrap_or_default();
    if let Some(name) = path
        .strip_prefix(FRAMEWORK_NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
    {
        return CONFIG_EXPRESSION_TYPES.contains(&name);
    }
    let framework_name = CONFIG_EXPRESSION_TYPES.contains(&path.as_str());
    let namespace = chain
        .enclosing_type
        .as_deref()
        .and_then(|q| table.lookup_qualified(q))
        .and_then(|id| table.get(id).namespace.clone());
    if framework_name
        && file.imports_automapper
        && table.visible_from(&path, namespace.as_deref()).is_none()
    {
        return true;
    }
    match table.resolve_ref(&type_ref, namespace.as_deref()) {
        Some(id) => table.derives_from(id, "Profile"),
        None => framework_name,
    }
}

/// `<S, D>` generic arguments or `(typeof(S), typeof(D))`
fn type_pair(type_args: &[String], args: &[ArgumentSyntax]) -> Option<(TypeRef, TypeRef)> {
    if type_args.len() == 2 {
        return Some((TypeRef::parse(&type_args[0]).ok()?, TypeRef::parse(&type_args[1]).ok()?));
    }
    if !type_args.is_empty() {
        return None;
    }
    let typeofs: Vec<&str> = args
        .iter()
        .filter_map(|a| match &a.kind {
            ArgumentKind::TypeOf(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    match typeofs.as_slice() {
        [s, d] => Some((TypeRef::parse(s).ok()?, TypeRef::parse(d).ok()?)),
        _ => None,
    }
}

fn member_list(args: &[ArgumentSyntax]) -> MemberList {
    for arg in args {
        if let ArgumentKind::MemberAccess(text) = &arg.kind {
            if text.ends_with("MemberList.None") {
                return MemberList::None;
            }
            if text.ends_with("MemberList.Source") {
                return MemberList::Source;
            }
        }
    }
    MemberList::Destination
}

/// Span of `Name(...)` within a chain segment, dot and separator excluded
pub(crate) fn call_span(call: &ChainCall) -> Span {
    if call.separator.is_empty() && call.segment == call.span {
        return call.span;
    }
    let skip = call.separator.len() + 1;
    let mut span = call.segment;
    span.start_byte = (span.start_byte + skip).min(span.end_byte);
    match call.separator.rfind('\n') {
        Some(newline) => {
            span.start_line += call.separator.matches('\n').count();
            span.start_col = call.separator.len() - newline;
        }
        None => span.start_col += skip,
    }
    span
}

fn lambdas(args: &[ArgumentSyntax]) -> impl Iterator<Item = &LambdaSyntax> {
    args.iter().filter_map(|a| match &a.kind {
        ArgumentKind::Lambda(l) => Some(l),
        _ => None,
    })
}

/// Destination target of a directive's first argument
fn target(arg: &ArgumentSyntax) -> Option<Vec<String>> {
    match &arg.kind {
        ArgumentKind::Lambda(lambda) => lambda.body.member_path.clone().filter(|p| !p.is_empty()),
        ArgumentKind::StringLiteral(s) => Some(s.split('.').map(str::to_string).collect()),
        ArgumentKind::NameOf(n) => Some(vec![n.clone()]),
        _ => None,
    }
}

fn member_directives(
    call: &ChainCall,
    index: usize,
    expressions: &mut Vec<MappingExpression>,
) -> Vec<MemberDirective> {
    let target = match call.args.first().and_then(target) {
        Some(t) => t,
        None => return Vec::new(),
    };
    let member = target.join(".");

    let mut configs = Vec::new();
    let mut null_substitute = false;
    let mut condition = false;

    if let Some(options) = call.args.get(1).and_then(|a| match &a.kind {
        ArgumentKind::Lambda(l) => Some(l),
        _ => None,
    }) {
        for pc in &options.param_calls {
            match pc.name.as_str() {
                "Ignore" => configs.push(MemberConfiguration::Ignored),
                "MapFrom" if !pc.type_args.is_empty() => configs.push(
                    MemberConfiguration::ConvertedUsing(format!("MapFrom<{}>()", pc.type_args.join(", "))),
                ),
                "MapFrom" | "UseValue" => {
                    if let Some(arg) = pc.args.first() {
                        configs.push(map_from(arg));
                        if let ArgumentKind::Lambda(l) = &arg.kind {
                            expressions.push(MappingExpression {
                                member: Some(member.clone()),
                                method: pc.name.clone(),
                                summary: l.body.clone(),
                            });
                        }
                    }
                }
                "ConvertUsing" | "ResolveUsing" => {
                    let text = if pc.type_args.is_empty() {
                        pc.args
                            .iter()
                            .map(|a| a.text.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    } else {
                        format!("{}<{}>", pc.name, pc.type_args.join(", "))
                    };
                    configs.push(MemberConfiguration::ConvertedUsing(text));
                    for l in lambdas(&pc.args) {
                        expressions.push(MappingExpression {
                            member: Some(member.clone()),
                            method: pc.name.clone(),
                            summary: l.body.clone(),
                        });
                    }
                }
                "NullSubstitute" => null_substitute = true,
                "Condition" | "PreCondition" => {
                    condition = true;
                    for l in lambdas(&pc.args) {
                        expressions.push(MappingExpression {
                            member: Some(member.clone()),
                            method: pc.name.clone(),
                            summary: l.body.clone(),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    let span = call_span(call);
    let make = |config: Option<MemberConfiguration>| MemberDirective {
        target: target.clone(),
        method: call.name.clone(),
        call_index: index,
        config,
        null_substitute,
        condition,
        segment: call.segment,
        span,
    };

    if configs.is_empty() {
        vec![make(None)]
    } else {
        configs.into_iter().map(|c| make(Some(c))).collect()
    }
}

fn map_from(arg: &ArgumentSyntax) -> MemberConfiguration {
    match &arg.kind {
        ArgumentKind::Lambda(lambda) => MemberConfiguration::MappedFrom(SourceExpression {
            text: lambda.body.text.clone(),
            member_path: lambda.body.member_path.clone(),
            summary: Some(lambda.body.clone()),
        }),
        ArgumentKind::StringLiteral(s) => MemberConfiguration::MappedFrom(SourceExpression {
            text: arg.text.clone(),
            member_path: Some(s.split('.').map(str::to_string).collect()),
            summary: None,
        }),
        ArgumentKind::NameOf(n) => MemberConfiguration::MappedFrom(SourceExpression {
            text: arg.text.clone(),
            member_path: Some(vec![n.clone()]),
            summary: None,
        }),
        ArgumentKind::ObjectCreation(_) => MemberConfiguration::ConvertedUsing(arg.text.clone()),
        _ => MemberConfiguration::MappedFrom(SourceExpression {
            text: arg.text.clone(),
            member_path: None,
            summary: None,
        }),
    }
}

fn source_member_directive(call: &ChainCall, index: usize) -> Option<SourceMemberDirective> {
    let member = call.args.first().and_then(target)?.join(".");
    let do_not_validate = call
        .args
        .get(1)
        .and_then(|a| match &a.kind {
            ArgumentKind::Lambda(l) => Some(l),
            _ => None,
        })
        .map(|l| {
            l.param_calls
                .iter()
                .any(|pc| pc.name == "DoNotValidate" || pc.name == "Ignore")
        })
        .unwrap_or(false);
    Some(SourceMemberDirective {
        member,
        do_not_validate,
        call_index: index,
    })
}

fn converter_text(call: &ChainCall) -> String {
    if !call.type_args.is_empty() {
        return format!("ConvertUsing<{}>", call.type_args.join(", "));
    }
    call.args
        .iter()
        .map(|a| a.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_csharp;

    fn extract(src: &str) -> Vec<MappingRegistration> {
        let file = parse_csharp("Profile.cs", src).unwrap();
        let table = SymbolTable::build(std::slice::from_ref(&file));
        file.chains
            .iter()
            .enumerate()
            .filter_map(|(i, c)| extract_registration(c, &file, 0, i, &table))
            .collect()
    }

    #[test]
    fn test_directives_in_any_order() {
        let regs = extract(
            r#"
public class P : Profile {
    public P() {
        CreateMap<Order, OrderDto>(MemberList.Source)
            .ForMember(d => d.Total, o => o.Ignore())
            .IncludeBase<Entity, EntityDto>()
            .ForMember(d => d.Name, o => { o.NullSubstitute(""); o.MapFrom(s => s.FullName); })
            .ForSourceMember(s => s.Secret, o => o.DoNotValidate())
            .MaxDepth(2)
            .ReverseMap()
            .ForMember(d => d.FullName, o => o.Ignore());
    }
}
"#,
        );
        assert_eq!(regs.len(), 1);
        let r = &regs[0];
        assert_eq!(r.source.to_string(), "Order");
        assert_eq!(r.destination.to_string(), "OrderDto");
        assert_eq!(r.member_list, MemberList::Source);
        assert_eq!(r.directives.len(), 2);
        assert_eq!(r.configuration_for("total"), Some(&MemberConfiguration::Ignored));
        assert!(r.has_null_substitute("Name"));
        match r.configuration_for("Name") {
            Some(MemberConfiguration::MappedFrom(expr)) => {
                assert_eq!(expr.member_path, Some(vec!["FullName".to_string()]));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(r.includes.len(), 1);
        assert!(r.includes[0].base);
        assert!(r.source_not_validated("Secret"));
        assert_eq!(r.max_depth, Some(2));
        let reverse = r.reverse_map.as_ref().unwrap();
        assert!(reverse.has_trailing_calls);
        assert_eq!(r.reverse_directives.len(), 1);
    }

    #[test]
    fn test_typeof_registration() {
        let regs = extract(
            "public class P : Profile { P() { CreateMap(typeof(Source), typeof(Dest)); } }",
        );
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].destination.to_string(), "Dest");
    }

    #[test]
    fn test_lookalike_receivers_skipped() {
        let regs = extract(
            r#"
public class Builder { public void CreateMap<A, B>() { } }
public class NotAProfile {
    void Run(Builder builder) {
        CreateMap<A, B>();
        builder.CreateMap<A, B>();
        Factory.Get().CreateMap<A, B>();
    }
}
"#,
        );
        assert!(regs.is_empty());
    }

    #[test]
    fn test_configuration_callback_receiver() {
        let regs = extract(
            r#"
public static class Setup {
    public static void Configure(IServiceCollection services) {
        services.AddAutoMapper(cfg => cfg.CreateMap<A, B>());
        var config = new MapperConfiguration(c => { c.CreateMap<C, D>(); });
    }
    static void Typed(IMapperConfigurationExpression expr) { expr.CreateMap<E, F>(); }
}
"#,
        );
        let pairs: Vec<String> = regs.iter().map(|r| r.title()).collect();
        assert_eq!(
            pairs,
            vec!["CreateMap<A, B>", "CreateMap<C, D>", "CreateMap<E, F>"]
        );
    }

    #[test]
    fn test_domain_profile_type_keeps_typed_receivers() {
        let regs = extract(
            r#"
using AutoMapper;
namespace Shop.Domain { public class Profile { public string Bio { get; set; } } }
namespace Shop.Mapping {
    public class UserProfile : Profile { UserProfile() { CreateMap<A, B>(); } }
    public static class Setup {
        static void Typed(Profile profile) { profile.CreateMap<C, D>(); }
        static void Qualified(AutoMapper.IProfileExpression expr) { expr.CreateMap<E, F>(); }
    }
}
"#,
        );
        let pairs: Vec<String> = regs.iter().map(|r| r.title()).collect();
        assert_eq!(
            pairs,
            vec!["CreateMap<A, B>", "CreateMap<C, D>", "CreateMap<E, F>"]
        );
    }

    #[test]
    fn test_call_span_skips_separator() {
        let regs = extract(
            "public class P : Profile { P() {\n    CreateMap<A, B>()\n        .ReverseMap();\n} }",
        );
        let reverse = regs[0].reverse_map.as_ref().unwrap();
        assert_eq!(reverse.span.start_line, 3);
        assert_eq!(reverse.span.start_col, 9);
    }
}
