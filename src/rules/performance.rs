//! AM031: costly work inside mapping expressions
//!
//! Every lambda evaluated while mapping (`MapFrom`, `ConvertUsing`,
//! `Condition`, `BeforeMap`, ...) is handed to a set of independent smell
//! detectors. Each detector reports at most one smell per call site.

use super::{Rule, RuleContext};
use crate::ast::{ExpressionSummary, Span};
use crate::diagnostic::{props, Finding, RuleInfo, PERFORMANCE};
use crate::model::{resolve_path, TypeDescriptor, TypeModel};
use crate::symbols::SymbolTable;
use crate::Result;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Default nesting of LINQ projections considered too deep
pub const DEFAULT_MAX_PROJECTION_DEPTH: usize = 3;

/// How many smells are reported per expression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceMode {
    /// Stop at the first smell
    #[default]
    First,
    /// Every smell from every detector
    All,
}

/// A performance problem located in an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Smell {
    pub span: Span,
    /// Completes "Mapping expression for 'X' ..."
    pub description: String,
}

/// What detectors know about an expression beyond its syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct SmellScope<'a> {
    /// Model of the type bound to the lambda's first parameter
    pub source: Option<&'a TypeModel>,
    pub table: Option<&'a SymbolTable>,
}

impl SmellScope<'_> {
    /// Declared type of a `p.A.B` receiver on the lambda parameter
    pub fn member_type(&self, expression: &ExpressionSummary, receiver: &str) -> Option<TypeDescriptor> {
        let path = parameter_path(expression, receiver)?;
        let member = resolve_path(&path, self.source?, self.table?)?;
        Some(member.declared_type)
    }
}

/// Member path of a receiver rooted at the lambda parameter (`s.A.B` → `[A, B]`)
fn parameter_path(expression: &ExpressionSummary, receiver: &str) -> Option<Vec<String>> {
    let mut segments = receiver.split('.').map(str::trim);
    if segments.next()? != expression.parameter.as_deref()? {
        return None;
    }
    let path: Vec<String> = segments.map(str::to_string).collect();
    let plain = !path.is_empty() && path.iter().all(|s| is_identifier(s));
    plain.then_some(path)
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Identifier segments of a receiver, call arguments and type arguments removed
fn receiver_segments(receiver: &str) -> Vec<&str> {
    receiver
        .split('.')
        .map(|segment| {
            let end = segment
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(segment.len());
            &segment[..end]
        })
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// One kind of performance problem
pub trait SmellDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, expression: &ExpressionSummary, scope: &SmellScope<'_>) -> Vec<Smell>;
}

pub struct PerformanceRule {
    mode: PerformanceMode,
    detectors: Vec<Box<dyn SmellDetector>>,
}

impl PerformanceRule {
    pub fn new(mode: PerformanceMode, max_projection_depth: usize) -> PerformanceRule {
        PerformanceRule {
            mode,
            detectors: vec![
                Box::new(DatabaseQuery),
                Box::new(FileSystem),
                Box::new(Network),
                Box::new(Reflection),
                Box::new(NonDeterministic),
                Box::new(BlockingAsync),
                Box::new(DoubleEnumeration),
                Box::new(DeepProjection {
                    max_depth: max_projection_depth.max(1),
                }),
            ],
        }
    }

    /// Smells in one expression, tagged with the detector that found them
    pub fn smells(&self, expression: &ExpressionSummary, scope: &SmellScope<'_>) -> Vec<(&'static str, Smell)> {
        let mut found = Vec::new();
        for detector in &self.detectors {
            for smell in detector.detect(expression, scope) {
                found.push((detector.name(), smell));
                if self.mode == PerformanceMode::First {
                    return found;
                }
            }
        }
        found
    }
}

impl Rule for PerformanceRule {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn produces(&self) -> &'static [RuleInfo] {
        &[PERFORMANCE]
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>> {
        let reg = ctx.registration;
        let scope = SmellScope {
            source: ctx.source,
            table: Some(ctx.table),
        };
        let mut findings = Vec::new();
        for expression in &reg.expressions {
            let subject = expression.member.clone().unwrap_or_else(|| reg.title());
            for (smell_name, smell) in self.smells(&expression.summary, &scope) {
                let mut finding = ctx
                    .finding(&PERFORMANCE, vec![subject.clone(), smell.description], smell.span)
                    .with_property(props::SMELL, smell_name);
                if let Some(member) = &expression.member {
                    finding = finding.with_property(props::MEMBER, member.clone());
                }
                findings.push(finding);
            }
        }
        Ok(findings)
    }
}

/// Drop smells nested inside another smell's span (`db.Orders.Where(..).Count()`
/// is one call site, not two)
fn outermost(mut smells: Vec<Smell>) -> Vec<Smell> {
    smells.sort_by_key(|s| (s.span.start_byte, std::cmp::Reverse(s.span.end_byte)));
    let mut kept: Vec<Smell> = Vec::new();
    for smell in smells {
        if kept.iter().any(|k| k.span.contains(&smell.span)) {
            continue;
        }
        kept.push(smell);
    }
    kept
}

fn last_segment(text: &str) -> &str {
    text.rsplit('.').next().unwrap_or(text).trim()
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Queries against a persistence or query context
struct DatabaseQuery;

const QUERY_METHODS: &[&str] = &[
    "FindAsync",
    "FromSqlRaw",
    "FromSqlInterpolated",
    "SqlQuery",
    "ExecuteSqlRaw",
    "SaveChanges",
    "SaveChangesAsync",
];

impl SmellDetector for DatabaseQuery {
    fn name(&self) -> &'static str {
        "database"
    }

    fn detect(&self, expression: &ExpressionSummary, _scope: &SmellScope<'_>) -> Vec<Smell> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let context = cached(&PATTERN, r"(?i)^_?(\w*(context|dbset|repository)|db|session)$");
        let smells = expression
            .calls
            .iter()
            .filter_map(|call| {
                let receiver = call.receiver.as_deref()?;
                let segments = receiver_segments(receiver);
                // members of the mapped object are data, not a captured context
                let captured = segments.first().copied() != expression.parameter.as_deref();
                let named_context = captured
                    && context
                        .map(|re| segments.iter().any(|segment| re.is_match(segment)))
                        .unwrap_or(false);
                let hit = QUERY_METHODS.contains(&call.method.as_str()) || named_context;
                hit.then(|| Smell {
                    span: call.span,
                    description: format!("queries a persistence context ({}.{})", receiver, call.method),
                })
            })
            .collect();
        outermost(smells)
    }
}

/// File system access
struct FileSystem;

impl SmellDetector for FileSystem {
    fn name(&self) -> &'static str {
        "file-system"
    }

    fn detect(&self, expression: &ExpressionSummary, _scope: &SmellScope<'_>) -> Vec<Smell> {
        let mut smells: Vec<Smell> = expression
            .calls
            .iter()
            .filter(|call| {
                call.receiver
                    .as_deref()
                    .map(|r| matches!(last_segment(r), "File" | "Directory"))
                    .unwrap_or(false)
            })
            .map(|call| Smell {
                span: call.span,
                description: format!("reads the file system ({})", call.method),
            })
            .collect();
        smells.extend(
            expression
                .creations
                .iter()
                .filter(|c| {
                    matches!(
                        last_segment(&c.type_name),
                        "FileStream" | "StreamReader" | "StreamWriter" | "FileInfo" | "DirectoryInfo"
                    )
                })
                .map(|c| Smell {
                    span: c.span,
                    description: format!("opens a file ({})", c.type_name),
                }),
        );
        outermost(smells)
    }
}

/// Network calls
struct Network;

const NETWORK_METHODS: &[&str] = &[
    "GetAsync",
    "PostAsync",
    "PutAsync",
    "DeleteAsync",
    "SendAsync",
    "GetStringAsync",
    "GetByteArrayAsync",
    "GetStreamAsync",
    "GetFromJsonAsync",
    "DownloadString",
    "DownloadData",
    "UploadString",
    "GetResponse",
];

impl SmellDetector for Network {
    fn name(&self) -> &'static str {
        "network"
    }

    fn detect(&self, expression: &ExpressionSummary, _scope: &SmellScope<'_>) -> Vec<Smell> {
        let mut smells: Vec<Smell> = expression
            .calls
            .iter()
            .filter(|call| {
                NETWORK_METHODS.contains(&call.method.as_str())
                    || call.receiver.as_deref().map(|r| last_segment(r) == "Dns").unwrap_or(false)
            })
            .map(|call| Smell {
                span: call.span,
                description: format!("makes a network call ({})", call.method),
            })
            .collect();
        smells.extend(
            expression
                .creations
                .iter()
                .filter(|c| {
                    matches!(
                        last_segment(&c.type_name),
                        "HttpClient" | "WebClient" | "TcpClient" | "UdpClient" | "Socket" | "SmtpClient"
                    )
                })
                .map(|c| Smell {
                    span: c.span,
                    description: format!("creates a network client ({})", c.type_name),
                }),
        );
        outermost(smells)
    }
}

/// Reflection lookups
struct Reflection;

const REFLECTION_METHODS: &[&str] = &[
    "GetProperty",
    "GetProperties",
    "GetMethod",
    "GetMethods",
    "GetField",
    "GetFields",
    "GetCustomAttribute",
    "GetCustomAttributes",
    "GetValue",
    "SetValue",
    "InvokeMember",
    "MakeGenericType",
];

impl SmellDetector for Reflection {
    fn name(&self) -> &'static str {
        "reflection"
    }

    fn detect(&self, expression: &ExpressionSummary, _scope: &SmellScope<'_>) -> Vec<Smell> {
        let smells = expression
            .calls
            .iter()
            .filter(|call| {
                let receiver = call.receiver.as_deref().map(last_segment).unwrap_or("");
                REFLECTION_METHODS.contains(&call.method.as_str())
                    || (receiver == "Activator" && call.method == "CreateInstance")
                    || (receiver == "Type" && call.method == "GetType")
            })
            .map(|call| Smell {
                span: call.span,
                description: format!("uses reflection ({})", call.method),
            })
            .collect();
        outermost(smells)
    }
}

/// Clock, random and identifier sources that differ per call
struct NonDeterministic;

const VOLATILE_MEMBERS: &[&str] = &[
    "DateTime.Now",
    "DateTime.UtcNow",
    "DateTime.Today",
    "DateTimeOffset.Now",
    "DateTimeOffset.UtcNow",
    "Environment.TickCount",
];

impl SmellDetector for NonDeterministic {
    fn name(&self) -> &'static str {
        "non-deterministic"
    }

    fn detect(&self, expression: &ExpressionSummary, _scope: &SmellScope<'_>) -> Vec<Smell> {
        let mut smells: Vec<Smell> = expression
            .member_accesses
            .iter()
            .filter_map(|access| {
                let hit = VOLATILE_MEMBERS
                    .iter()
                    .find(|m| access.text == **m || access.text.starts_with(&format!("{}.", m)))?;
                Some(Smell {
                    span: access.span,
                    description: format!("reads a changing value ({})", hit),
                })
            })
            .collect();
        smells.extend(
            expression
                .calls
                .iter()
                .filter(|call| {
                    let receiver = call.receiver.as_deref().unwrap_or("");
                    (last_segment(receiver) == "Guid" && call.method == "NewGuid")
                        || receiver.ends_with("Random.Shared")
                })
                .map(|call| Smell {
                    span: call.span,
                    description: format!("generates a new value on every call ({})", call.method),
                }),
        );
        smells.extend(
            expression
                .creations
                .iter()
                .filter(|c| last_segment(&c.type_name) == "Random")
                .map(|c| Smell {
                    span: c.span,
                    description: "creates a random number generator".to_string(),
                }),
        );
        outermost(smells)
    }
}

/// Synchronous waits on tasks
struct BlockingAsync;

impl SmellDetector for BlockingAsync {
    fn name(&self) -> &'static str {
        "blocking-async"
    }

    fn detect(&self, expression: &ExpressionSummary, _scope: &SmellScope<'_>) -> Vec<Smell> {
        let mut smells: Vec<Smell> = expression
            .member_accesses
            .iter()
            .filter(|a| a.text.ends_with(".Result"))
            .map(|a| Smell {
                span: a.span,
                description: format!("blocks on an asynchronous result ({})", a.text),
            })
            .collect();
        smells.extend(
            expression
                .calls
                .iter()
                .filter(|call| {
                    call.method == "Wait"
                        || (call.method == "GetResult"
                            && call.receiver.as_deref().map(|r| r.ends_with("GetAwaiter()")).unwrap_or(false))
                })
                .map(|call| Smell {
                    span: call.span,
                    description: format!("blocks on an asynchronous operation ({})", call.method),
                }),
        );
        outermost(smells)
    }
}

/// The same sequence enumerated by more than one operator
struct DoubleEnumeration;

const ENUMERATING_METHODS: &[&str] = &[
    "Count",
    "LongCount",
    "Sum",
    "Average",
    "Min",
    "Max",
    "Any",
    "All",
    "First",
    "FirstOrDefault",
    "Last",
    "LastOrDefault",
    "Single",
    "SingleOrDefault",
    "ElementAt",
    "Contains",
    "Aggregate",
    "ToList",
    "ToArray",
];

impl SmellDetector for DoubleEnumeration {
    fn name(&self) -> &'static str {
        "double-enumeration"
    }

    fn detect(&self, expression: &ExpressionSummary, scope: &SmellScope<'_>) -> Vec<Smell> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut smells = Vec::new();
        for call in &expression.calls {
            if !ENUMERATING_METHODS.contains(&call.method.as_str()) {
                continue;
            }
            let receiver = match call.receiver.as_deref() {
                Some(r) => r.split_whitespace().collect::<String>(),
                None => continue,
            };
            // `Contains` and friends on a string or other scalar enumerate nothing
            let scalar = receiver.starts_with('"')
                || scope
                    .member_type(expression, &receiver)
                    .map(|ty| !ty.underlying().is_collection())
                    .unwrap_or(false);
            if scalar {
                continue;
            }
            let count = seen.entry(receiver.clone()).or_default();
            *count += 1;
            if *count == 2 {
                smells.push(Smell {
                    span: call.span,
                    description: format!("enumerates {} more than once", receiver),
                });
            }
        }
        smells
    }
}

/// Projections nested too deep
struct DeepProjection {
    max_depth: usize,
}

impl SmellDetector for DeepProjection {
    fn name(&self) -> &'static str {
        "deep-projection"
    }

    fn detect(&self, expression: &ExpressionSummary, _scope: &SmellScope<'_>) -> Vec<Smell> {
        if expression.projection_depth < self.max_depth {
            return Vec::new();
        }
        vec![Smell {
            span: expression.span,
            description: format!("nests {} levels of projections", expression.projection_depth),
        }]
    }
}
