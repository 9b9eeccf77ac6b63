//! Candidate fixes per finding kind
//!
//! Synthesis reads the finding's properties and the registration it points
//! at, picks an operation, and resolves it against the analyzed document
//! text. A precondition that no longer holds (missing member, chain not a
//! statement, stale call index) declines the action with a warning.

use super::conversions::{cast, convert, materialize, null_fallback, project};
use super::{CodeAction, FixConfidence, FixOperation, TextEdit};
use crate::ast::ArgumentKind;
use crate::compilation::Compilation;
use crate::diagnostic::{props, Finding};
use crate::model::{extract_model, resolve_path, MemberConstraints, MemberDescriptor, TypeModel};
use crate::registration::MappingRegistration;
use crate::rules::{decode_pairs, Analysis};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Depth used by the recursion fix
const FIX_MAX_DEPTH: u32 = 3;

/// What synthesis may look at
pub struct FixContext<'a> {
    pub compilation: &'a Compilation,
    pub analysis: &'a Analysis,
}

/// Ordered candidate actions for one finding; the first is preferred
pub fn synthesize_fixes(finding: &Finding, ctx: &FixContext<'_>) -> Vec<CodeAction> {
    let site = match Site::new(finding, ctx) {
        Some(site) => site,
        None => {
            debug!(rule = %finding.rule_id, "finding has no registration; no fixes");
            return Vec::new();
        }
    };
    let actions = match finding.rule_id.as_str() {
        "AM001" => site.type_mismatch(),
        "AM002" => site.null_default(),
        "AM003" => site.materialize_container().into_iter().collect(),
        "AM004" => site.do_not_validate().into_iter().collect(),
        "AM005" => site.exact_name().into_iter().collect(),
        "AM006" => site.ignore(FixConfidence::Medium).into_iter().collect(),
        "AM011" => site.ignore(FixConfidence::Low).into_iter().collect(),
        "AM020" => site.nested_registrations().into_iter().collect(),
        "AM021" => site.project_elements(),
        "AM022" => site.limit_recursion(),
        "AM041" => site.drop_duplicate(),
        "AM042" | "AM050" => site.drop_directive().into_iter().collect(),
        _ => Vec::new(),
    };
    if actions.is_empty() {
        debug!(rule = %finding.rule_id, registration = %site.reg.title(), "no applicable fix");
    }
    actions
}

/// A finding together with the registration and document it points at
struct Site<'a> {
    finding: &'a Finding,
    reg: &'a MappingRegistration,
    ctx: &'a FixContext<'a>,
    source: Option<TypeModel>,
    destination: Option<TypeModel>,
}

impl<'a> Site<'a> {
    fn new(finding: &'a Finding, ctx: &'a FixContext<'a>) -> Option<Site<'a>> {
        let reg = ctx.analysis.registration(finding.registration?)?;
        let table = ctx.compilation.table();
        let ns = reg.namespace.as_deref();
        Some(Site {
            finding,
            reg,
            ctx,
            source: extract_model(&reg.source, table, ns, MemberConstraints::Readable),
            destination: extract_model(&reg.destination, table, ns, MemberConstraints::Writable),
        })
    }

    fn member(&self) -> Option<&'a str> {
        self.finding.property(props::MEMBER)
    }

    fn key(&self, strategy: &str, subject: &str) -> String {
        format!("{}:{}:{}", self.finding.rule_id, strategy, subject)
    }

    fn member_subject(&self, member: &str) -> String {
        format!("{}.{}", self.reg.title(), member)
    }

    /// Source path as reported, falling back to the plain source member
    fn source_path(&self) -> Option<Vec<String>> {
        let path = self
            .finding
            .property(props::SOURCE_PATH)
            .filter(|p| !p.is_empty())
            .or_else(|| self.finding.property(props::SOURCE_MEMBER))?;
        Some(path.split('.').map(str::to_string).collect())
    }

    fn source_member(&self) -> Option<MemberDescriptor> {
        resolve_path(&self.source_path()?, self.source.as_ref()?, self.ctx.compilation.table())
    }

    fn destination_member(&self) -> Option<&MemberDescriptor> {
        self.destination.as_ref()?.find(self.member()?)
    }

    /// `src.Customer.Name`
    fn source_expression(&self) -> Option<String> {
        Some(format!("src.{}", self.source_path()?.join(".")))
    }

    /// Resolve an operation into an action, or decline it
    fn action(&self, strategy: &str, subject: &str, title: String, confidence: FixConfidence, operation: FixOperation) -> Option<CodeAction> {
        let edits = match resolve_edits(&operation, self.ctx.analysis, self.ctx.compilation) {
            Some(edits) => edits,
            None => {
                warn!(rule = %self.finding.rule_id, %title, "fix declined: chain no longer matches");
                return None;
            }
        };
        Some(CodeAction {
            rule_id: self.finding.rule_id.clone(),
            title,
            equivalence_key: self.key(strategy, subject),
            confidence,
            operation,
            edits,
        })
    }

    /// Configure a destination member with `options` (`opt.Ignore()`)
    ///
    /// An existing modifier-only `ForMember` for the member is rewritten to
    /// carry the new option next to its modifiers instead of adding a
    /// second directive.
    fn member_action(&self, strategy: &str, title: String, options: &str, confidence: FixConfidence) -> Option<CodeAction> {
        let member = self.member()?;
        let subject = self.member_subject(member);
        let existing = self
            .reg
            .directives_for(member)
            .find(|d| d.config.is_none() && d.method == "ForMember");
        let operation = match existing.and_then(|d| modifiers(self.reg, d.call_index).map(|m| (d, m))) {
            Some((directive, modifiers)) => FixOperation::ReplaceCall {
                registration: self.reg.id,
                call_index: directive.call_index,
                call: format!(
                    "ForMember(dest => dest.{}, opt => {{ {}; {}; }})",
                    member,
                    modifiers.join("; "),
                    options
                ),
            },
            None => FixOperation::AppendCall {
                registration: self.reg.id,
                call: format!("ForMember(dest => dest.{}, opt => {})", member, options),
            },
        };
        self.action(strategy, &subject, title, confidence, operation)
    }

    fn ignore(&self, confidence: FixConfidence) -> Option<CodeAction> {
        let member = self.member()?;
        self.member_action("ignore", format!("Ignore '{}'", member), "opt.Ignore()", confidence)
    }

    fn type_mismatch(&self) -> Vec<CodeAction> {
        let mut actions = Vec::new();
        let converted = (|| {
            let (member, source, destination) = (self.member()?, self.source_member()?, self.destination_member()?);
            let expr = self.source_expression()?;
            let (conversion, confidence) = convert(&expr, &source.declared_type, &destination.declared_type)
                .unwrap_or_else(|| cast(&expr, &destination.declared_type));
            self.member_action(
                "map-from",
                format!("Map '{}' with {}", member, conversion),
                &format!("opt.MapFrom(src => {})", conversion),
                confidence,
            )
        })();
        actions.extend(converted);
        // ignoring drops the value, so it is never picked without review
        actions.extend(self.ignore(FixConfidence::Low));
        actions
    }

    fn null_default(&self) -> Vec<CodeAction> {
        let action = (|| {
            let (member, destination) = (self.member()?, self.destination_member()?);
            let (fallback, confidence) = null_fallback(&destination.declared_type)?;
            let expr = format!("{} ?? {}", self.source_expression()?, fallback);
            self.member_action(
                "map-from",
                format!("Map '{}' with a default for null", member),
                &format!("opt.MapFrom(src => {})", expr),
                confidence,
            )
        })();
        action.into_iter().collect()
    }

    fn materialize_container(&self) -> Option<CodeAction> {
        let (member, destination) = (self.member()?, self.destination_member()?);
        let kind = destination.declared_type.underlying().collection_kind()?;
        let element = destination.declared_type.underlying().element()?.code_name();
        let expr = materialize(&self.source_expression()?, kind, &element)?;
        self.member_action(
            "map-from",
            format!("Map '{}' with {}", member, expr),
            &format!("opt.MapFrom(src => {})", expr),
            FixConfidence::Medium,
        )
    }

    fn project_elements(&self) -> Vec<CodeAction> {
        let mut actions = Vec::new();
        let projected = (|| {
            let (member, source, destination) = (self.member()?, self.source_member()?, self.destination_member()?);
            let (source_type, destination_type) = (source.declared_type.underlying(), destination.declared_type.underlying());
            let (expr, confidence) = project(
                &self.source_expression()?,
                source_type.element()?,
                destination_type.element()?,
                destination_type.collection_kind()?,
            )?;
            self.member_action(
                "project",
                format!("Map '{}' with {}", member, expr),
                &format!("opt.MapFrom(src => {})", expr),
                confidence,
            )
        })();
        actions.extend(projected);
        actions.extend(self.nested_registrations());
        actions
    }

    fn do_not_validate(&self) -> Option<CodeAction> {
        let member = self.member()?;
        let operation = FixOperation::AppendCall {
            registration: self.reg.id,
            call: format!("ForSourceMember(src => src.{}, opt => opt.DoNotValidate())", member),
        };
        self.action(
            "do-not-validate",
            &self.member_subject(member),
            format!("Do not validate source member '{}'", member),
            FixConfidence::High,
            operation,
        )
    }

    fn exact_name(&self) -> Option<CodeAction> {
        let member = self.member()?;
        let source = self.finding.property(props::SOURCE_MEMBER)?;
        self.member_action(
            "map-from",
            format!("Map '{}' from '{}'", member, source),
            &format!("opt.MapFrom(src => src.{})", source),
            FixConfidence::High,
        )
    }

    /// One `CreateMap` statement per missing pair
    fn nested_registrations(&self) -> Option<CodeAction> {
        let encoded = self.finding.property(props::MISSING_PAIRS)?;
        let mut seen = HashSet::new();
        let pairs: Vec<(String, String)> = decode_pairs(encoded)
            .into_iter()
            .filter(|pair| seen.insert(pair.clone()))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        let prefix = self.reg.chain.receiver_prefix();
        let statements = pairs
            .iter()
            .map(|(s, d)| format!("{}CreateMap<{}, {}>();", prefix, s, d))
            .collect();
        let subject = pairs
            .iter()
            .map(|(s, d)| format!("{}=>{}", s, d))
            .collect::<Vec<_>>()
            .join(";");
        let title = if pairs.len() == 1 {
            format!("Register mapping {} -> {}", pairs[0].0, pairs[0].1)
        } else {
            format!("Register {} nested mappings", pairs.len())
        };
        let operation = FixOperation::InsertStatements {
            registration: self.reg.id,
            statements,
        };
        let key_strategy = "register-nested";
        let action = self.action(key_strategy, &subject, title, FixConfidence::High, operation)?;
        // the nested-registration alternative of AM021 shares its key with AM020
        Some(CodeAction {
            equivalence_key: format!("AM020:{}:{}", key_strategy, subject),
            ..action
        })
    }

    fn limit_recursion(&self) -> Vec<CodeAction> {
        let subject = self.reg.title();
        let max_depth = FixOperation::AppendCall {
            registration: self.reg.id,
            call: format!("MaxDepth({})", FIX_MAX_DEPTH),
        };
        let preserve = FixOperation::AppendCall {
            registration: self.reg.id,
            call: "PreserveReferences()".to_string(),
        };
        [
            self.action(
                "max-depth",
                &subject,
                format!("Limit {} to depth {}", subject, FIX_MAX_DEPTH),
                FixConfidence::Medium,
                max_depth,
            ),
            self.action(
                "preserve-references",
                &subject,
                format!("Preserve references in {}", subject),
                FixConfidence::Medium,
                preserve,
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn drop_duplicate(&self) -> Vec<CodeAction> {
        let mut actions = Vec::new();
        let reverse = self
            .finding
            .property(props::REVERSE_REGISTRATION)
            .and_then(|id| id.parse::<usize>().ok())
            .and_then(|id| self.ctx.analysis.registration(id));
        if let Some(owner) = reverse {
            if let Some(call) = &owner.reverse_map {
                let subject = format!("{}@{}:{}", owner.title(), owner.file, owner.span().start_line);
                let operation = FixOperation::RemoveCall {
                    registration: owner.id,
                    call_index: call.call_index,
                };
                actions.extend(self.action(
                    "remove-reverse-map",
                    &subject,
                    format!("Remove ReverseMap() from {}", owner.title()),
                    FixConfidence::Medium,
                    operation,
                ));
            }
        }
        if self.finding.property(props::DUPLICATE_ORIGIN) == Some("explicit") {
            // the statement may also hold the only registration of the reverse pair
            let confidence = if self.reg.reverse_map.is_some() {
                FixConfidence::Low
            } else {
                FixConfidence::Medium
            };
            let subject = format!("{}@{}:{}", self.reg.title(), self.reg.file, self.reg.span().start_line);
            let operation = FixOperation::RemoveStatement {
                registration: self.reg.id,
            };
            actions.extend(self.action(
                "remove-registration",
                &subject,
                format!("Remove duplicate {}", self.reg.title()),
                confidence,
                operation,
            ));
        }
        actions
    }

    /// Remove the directive at the reported call index
    fn drop_directive(&self) -> Option<CodeAction> {
        let member = self.member()?;
        let call_index: usize = self.finding.property(props::CALL_INDEX)?.parse().ok()?;
        let (strategy, confidence) = if self.finding.rule_id == "AM050" {
            ("remove-redundant", FixConfidence::High)
        } else {
            ("remove-conflicting", FixConfidence::Medium)
        };
        let call = self.reg.chain.calls.get(call_index)?;
        let operation = FixOperation::RemoveCall {
            registration: self.reg.id,
            call_index,
        };
        self.action(
            strategy,
            &format!("{}#{}", self.member_subject(member), call_index),
            format!("Remove {} for '{}'", call.name, member),
            confidence,
            operation,
        )
    }
}

/// `opt.Condition(...)` style calls of a modifier-only `ForMember`, as text
fn modifiers(reg: &MappingRegistration, call_index: usize) -> Option<Vec<String>> {
    let call = reg.chain.calls.get(call_index)?;
    let lambda = match &call.args.get(1)?.kind {
        ArgumentKind::Lambda(lambda) => lambda,
        _ => return None,
    };
    let calls: Vec<String> = lambda
        .param_calls
        .iter()
        .map(|c| {
            let type_args = if c.type_args.is_empty() {
                String::new()
            } else {
                format!("<{}>", c.type_args.join(", "))
            };
            let args: Vec<&str> = c.args.iter().map(|a| a.text.as_str()).collect();
            format!("opt.{}{}({})", c.name, type_args, args.join(", "))
        })
        .collect();
    if calls.is_empty() {
        None
    } else {
        Some(calls)
    }
}

/// Text edits realizing `operation` in the analyzed snapshot
///
/// `None` when the anchor no longer exists.
pub(crate) fn resolve_edits(operation: &FixOperation, analysis: &Analysis, compilation: &Compilation) -> Option<Vec<TextEdit>> {
    let registration = match operation {
        FixOperation::AppendCall { registration, .. }
        | FixOperation::ReplaceCall { registration, .. }
        | FixOperation::RemoveCall { registration, .. }
        | FixOperation::InsertStatements { registration, .. }
        | FixOperation::RemoveStatement { registration } => *registration,
    };
    let reg = analysis.registration(registration)?;
    let text: &str = compilation.document(&reg.file)?.text.as_ref();
    let chain = &reg.chain;
    let make = |start_byte: usize, end_byte: usize, replacement: String| TextEdit {
        file: reg.file.clone(),
        start_byte,
        end_byte,
        replacement,
    };

    let edit = match operation {
        FixOperation::AppendCall { call, .. } => {
            let at = forward_end(reg);
            make(at, at, format!("{}.{}", call_separator(reg), call))
        }
        FixOperation::ReplaceCall { call_index, call, .. } => {
            let target = chain.calls.get(*call_index).filter(|_| *call_index > 0)?;
            make(
                target.segment.start_byte,
                target.segment.end_byte,
                format!("{}.{}", target.separator, call),
            )
        }
        FixOperation::RemoveCall { call_index, .. } => {
            let target = chain.calls.get(*call_index).filter(|_| *call_index > 0)?;
            make(target.segment.start_byte, target.segment.end_byte, String::new())
        }
        FixOperation::InsertStatements { statements, .. } => {
            let statement = chain.statement.as_ref()?;
            let inserted: String = statements
                .iter()
                .map(|s| format!("\n{}{}", statement.indent, s))
                .collect();
            make(statement.span.end_byte, statement.span.end_byte, inserted)
        }
        FixOperation::RemoveStatement { .. } => {
            let statement = chain.statement.as_ref()?;
            let (start, end) = whole_lines(text, statement.span.start_byte, statement.span.end_byte);
            make(start, end, String::new())
        }
    };
    if edit.end_byte > text.len() {
        return None;
    }
    Some(vec![edit])
}

/// End of the last call configuring the forward map
fn forward_end(reg: &MappingRegistration) -> usize {
    match &reg.reverse_map {
        Some(reverse) if reverse.call_index > 0 => reg
            .chain
            .calls
            .get(reverse.call_index - 1)
            .map(|c| c.span.end_byte)
            .unwrap_or(reg.chain.span.end_byte),
        _ => reg.chain.span.end_byte,
    }
}

/// Layout used between calls of the chain, so appended calls line up
fn call_separator(reg: &MappingRegistration) -> &str {
    reg.chain
        .calls
        .iter()
        .skip(1)
        .map(|c| c.separator.as_str())
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// Widen a range to its own lines when nothing else shares them
fn whole_lines(text: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let rest = &text[end..];
    let line_end = rest.find('\n').map(|i| end + i + 1).unwrap_or(text.len());
    let alone = text[line_start..start].trim().is_empty() && text[end..line_end].trim().is_empty();
    if alone {
        (line_start, line_end)
    } else {
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::rules::Engine;

    fn source(types: &str, body: &str) -> String {
        crate::rules::testing::profile(types, body)
    }

    fn fixes_for(text: &str, rule: &str) -> Vec<CodeAction> {
        let compilation = Compilation::from_sources([("Profile.cs", text)]).unwrap();
        let analysis = Engine::new(AnalyzerConfig::default()).analyze(&compilation).unwrap();
        let ctx = FixContext {
            compilation: &compilation,
            analysis: &analysis,
        };
        let finding = analysis
            .findings
            .iter()
            .find(|f| f.rule_id == rule)
            .unwrap_or_else(|| panic!("no {} finding", rule));
        synthesize_fixes(finding, &ctx)
    }

    #[test]
    fn test_type_mismatch_offers_conversion_and_ignore() {
        let text = source(
            "public class Person { public string Age { get; set; } }\npublic class PersonDto { public int Age { get; set; } }",
            "            CreateMap<Person, PersonDto>();",
        );
        let actions = fixes_for(&text, "AM001");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].confidence, FixConfidence::Medium);
        assert_eq!(
            actions[0].edits[0].replacement,
            ".ForMember(dest => dest.Age, opt => opt.MapFrom(src => int.Parse(src.Age)))"
        );
        assert_eq!(actions[0].equivalence_key, "AM001:map-from:CreateMap<Person, PersonDto>.Age");
        assert_eq!(actions[1].edits[0].replacement, ".ForMember(dest => dest.Age, opt => opt.Ignore())");
        let end = text.find("CreateMap<Person, PersonDto>()").unwrap() + "CreateMap<Person, PersonDto>()".len();
        assert_eq!(actions[0].edits[0].start_byte, end);
    }

    #[test]
    fn test_appended_call_goes_before_reverse_map() {
        let text = source(
            "public class A { public string N { get; set; } }\npublic class B { public int N { get; set; } }",
            "            CreateMap<A, B>()\n                .ReverseMap();",
        );
        let actions = fixes_for(&text, "AM001");
        let edit = &actions[1].edits[0];
        assert_eq!(edit.replacement, "\n                .ForMember(dest => dest.N, opt => opt.Ignore())");
        assert_eq!(&text[edit.start_byte - 17..edit.start_byte], "CreateMap<A, B>()");
    }

    #[test]
    fn test_modifier_only_directive_is_rewritten() {
        let text = source(
            "public class A { public string N { get; set; } }\npublic class B { public int N { get; set; } }",
            "            CreateMap<A, B>().ForMember(d => d.N, o => o.Condition(s => s.N != null));",
        );
        let actions = fixes_for(&text, "AM001");
        assert!(matches!(actions[1].operation, FixOperation::ReplaceCall { call_index: 1, .. }));
        assert_eq!(
            actions[1].edits[0].replacement,
            ".ForMember(dest => dest.N, opt => { opt.Condition(s => s.N != null); opt.Ignore(); })"
        );
    }

    #[test]
    fn test_null_default_literal() {
        let text = source(
            "public class A { public int? Score { get; set; } }\npublic class B { public int Score { get; set; } }",
            "            CreateMap<A, B>();",
        );
        let actions = fixes_for(&text, "AM002");
        assert_eq!(actions.len(), 1);
        assert_eq!(
            actions[0].edits[0].replacement,
            ".ForMember(dest => dest.Score, opt => opt.MapFrom(src => src.Score ?? 0))"
        );
    }

    #[test]
    fn test_null_reference_fallback_needs_review() {
        let text = source(
            "public class Address { public string City { get; set; } }\npublic class A { public Address? Home { get; set; } public List<string>? Tags { get; set; } }\npublic class B { public Address Home { get; set; } public List<string> Tags { get; set; } }",
            "            CreateMap<A, B>();",
        );
        let compilation = Compilation::from_sources([("Profile.cs", text)]).unwrap();
        let engine = Engine::new(AnalyzerConfig::default());
        let analysis = engine.analyze(&compilation).unwrap();
        let ctx = FixContext {
            compilation: &compilation,
            analysis: &analysis,
        };
        let replacements: Vec<(String, FixConfidence)> = analysis
            .findings
            .iter()
            .filter(|f| f.rule_id == "AM002")
            .flat_map(|f| synthesize_fixes(f, &ctx))
            .map(|a| (a.edits[0].replacement.clone(), a.confidence))
            .collect();
        assert_eq!(
            replacements,
            vec![
                (
                    ".ForMember(dest => dest.Home, opt => opt.MapFrom(src => src.Home ?? new Address()))".to_string(),
                    FixConfidence::Low
                ),
                (
                    ".ForMember(dest => dest.Tags, opt => opt.MapFrom(src => src.Tags ?? new List<string>()))".to_string(),
                    FixConfidence::Low
                ),
            ]
        );

        let (fixed, result) = crate::fix::fix_all(&engine, &compilation, &crate::fix::FixOptions::default()).unwrap();
        assert!(result.applied.is_empty());
        assert_eq!(result.skipped.len(), 2);
        assert!(!fixed.documents()[0].text.contains("?? default"));
    }

    #[test]
    fn test_nested_registration_after_statement() {
        let text = source(
            "public class Address { public string City { get; set; } }\npublic class AddressDto { public string City { get; set; } }\npublic class User { public Address Address { get; set; } }\npublic class UserDto { public AddressDto Address { get; set; } }",
            "            CreateMap<User, UserDto>();",
        );
        let actions = fixes_for(&text, "AM020");
        assert_eq!(actions.len(), 1);
        let edit = &actions[0].edits[0];
        assert_eq!(edit.replacement, "\n            CreateMap<Address, AddressDto>();");
        assert_eq!(&text[..edit.start_byte].trim_end().chars().last(), &Some(';'));
    }

    #[test]
    fn test_collection_projection_and_nested_alternative() {
        let text = source(
            "public class Item { public string Sku { get; set; } }\npublic class ItemDto { public string Sku { get; set; } }\npublic class Order { public List<string> Codes { get; set; } public List<Item> Items { get; set; } }\npublic class OrderDto { public List<int> Codes { get; set; } public List<ItemDto> Items { get; set; } }",
            "            CreateMap<Order, OrderDto>();",
        );
        let actions = fixes_for(&text, "AM021");
        assert_eq!(
            actions[0].edits[0].replacement,
            ".ForMember(dest => dest.Codes, opt => opt.MapFrom(src => src.Codes.Select(x => int.Parse(x)).ToList()))"
        );
    }

    #[test]
    fn test_remove_statement_takes_its_line() {
        let text = source(
            "public class A { public int X { get; set; } }\npublic class B { public int X { get; set; } }",
            "            CreateMap<A, B>();\n            CreateMap<A, B>();",
        );
        let actions = fixes_for(&text, "AM041");
        assert_eq!(actions.len(), 1);
        let edit = &actions[0].edits[0];
        assert_eq!(&text[edit.start_byte..edit.end_byte], "            CreateMap<A, B>();\n");
        assert_eq!(actions[0].confidence, FixConfidence::Medium);
    }

    #[test]
    fn test_recursion_alternatives() {
        let text = source(
            "public class Node { public Node Parent { get; set; } }\npublic class NodeDto { public NodeDto Parent { get; set; } }",
            "            CreateMap<Node, NodeDto>();",
        );
        let actions = fixes_for(&text, "AM022");
        let calls: Vec<&str> = actions.iter().map(|a| a.edits[0].replacement.as_str()).collect();
        assert_eq!(calls, vec![".MaxDepth(3)", ".PreserveReferences()"]);
    }

    #[test]
    fn test_whole_lines() {
        let text = "a\n  b;\nc";
        assert_eq!(whole_lines(text, 4, 6), (2, 7));
        assert_eq!(whole_lines("x; b;", 3, 5), (3, 5));
    }
}
