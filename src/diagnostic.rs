//! Findings and rule descriptors
//!
//! A [`Finding`] is what a rule reports: a stable rule id, a severity, a
//! message rendered from the rule's template and positional arguments, a
//! location, and string properties the fix synthesizer reads back.

use crate::ast::Span;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Severity of a finding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "suggestion" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Rule family, used for grouping in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TypeSafety,
    MissingProperty,
    Configuration,
    Performance,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::TypeSafety => "type safety",
            Category::MissingProperty => "missing property",
            Category::Configuration => "configuration",
            Category::Performance => "performance",
        };
        write!(f, "{}", s)
    }
}

/// Static description of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    pub id: &'static str,
    pub title: &'static str,
    /// Message with positional `{n}` placeholders
    pub template: &'static str,
    pub category: Category,
    pub default_severity: Severity,
}

pub const TYPE_MISMATCH: RuleInfo = RuleInfo {
    id: "AM001",
    title: "Property type mismatch",
    template: "Property '{0}' has incompatible types: source {1}.{0} is '{2}' but destination {3}.{0} is '{4}'",
    category: Category::TypeSafety,
    default_severity: Severity::Error,
};

pub const NULLABLE_TO_NON_NULLABLE: RuleInfo = RuleInfo {
    id: "AM002",
    title: "Nullable source mapped to non-nullable destination",
    template: "Property '{0}' maps nullable '{2}' from {1} to non-nullable '{4}' on {3}",
    category: Category::TypeSafety,
    default_severity: Severity::Warning,
};

pub const COLLECTION_CONTAINER: RuleInfo = RuleInfo {
    id: "AM003",
    title: "Incompatible collection container",
    template: "Property '{0}' maps '{2}' from {1} to '{4}' on {3}; the container is not converted automatically",
    category: Category::TypeSafety,
    default_severity: Severity::Warning,
};

pub const SOURCE_UNMAPPED: RuleInfo = RuleInfo {
    id: "AM004",
    title: "Source member not mapped",
    template: "Source property '{1}.{0}' is not mapped to {3} (potential data loss)",
    category: Category::MissingProperty,
    default_severity: Severity::Info,
};

pub const CASE_MISMATCH: RuleInfo = RuleInfo {
    id: "AM005",
    title: "Member names differ only in case",
    template: "Destination property '{3}.{0}' matches source '{1}.{2}' only when ignoring case",
    category: Category::MissingProperty,
    default_severity: Severity::Info,
};

pub const DESTINATION_UNMAPPED: RuleInfo = RuleInfo {
    id: "AM006",
    title: "Unmapped destination member",
    template: "Destination property '{3}.{0}' is not mapped from {1}",
    category: Category::MissingProperty,
    default_severity: Severity::Warning,
};

pub const REQUIRED_UNMAPPED: RuleInfo = RuleInfo {
    id: "AM011",
    title: "Required destination member not mapped",
    template: "Required destination property '{3}.{0}' is not mapped from {1}",
    category: Category::MissingProperty,
    default_severity: Severity::Error,
};

pub const NESTED_MAPPING_MISSING: RuleInfo = RuleInfo {
    id: "AM020",
    title: "Nested object mapping missing",
    template: "Property '{0}' maps '{2}' to '{4}' but no mapping is registered for {2} -> {4}",
    category: Category::Configuration,
    default_severity: Severity::Warning,
};

pub const COLLECTION_ELEMENT: RuleInfo = RuleInfo {
    id: "AM021",
    title: "Collection element type mismatch",
    template: "Property '{0}' maps '{2}' to '{4}' but elements '{5}' and '{6}' are incompatible",
    category: Category::TypeSafety,
    default_severity: Severity::Warning,
};

pub const RECURSION_RISK: RuleInfo = RuleInfo {
    id: "AM022",
    title: "Infinite recursion risk",
    template: "Property '{0}' of {3} ('{4}') can lead back to {3}; mapping may recurse without limit",
    category: Category::Configuration,
    default_severity: Severity::Warning,
};

pub const PERFORMANCE: RuleInfo = RuleInfo {
    id: "AM031",
    title: "Performance smell in mapping expression",
    template: "Mapping expression for '{0}' {1}",
    category: Category::Performance,
    default_severity: Severity::Warning,
};

pub const DUPLICATE_REGISTRATION: RuleInfo = RuleInfo {
    id: "AM041",
    title: "Duplicate mapping registration",
    template: "Mapping {0} -> {1} is already registered at {2}",
    category: Category::Configuration,
    default_severity: Severity::Warning,
};

pub const CONFLICTING_CONFIGURATION: RuleInfo = RuleInfo {
    id: "AM042",
    title: "Conflicting member configuration",
    template: "Property '{0}' is configured more than once: {1} conflicts with {2}",
    category: Category::Configuration,
    default_severity: Severity::Warning,
};

pub const REDUNDANT_MAP_FROM: RuleInfo = RuleInfo {
    id: "AM050",
    title: "Redundant MapFrom configuration",
    template: "MapFrom for '{0}' is redundant: it reads the same-named source member of the same type",
    category: Category::Configuration,
    default_severity: Severity::Info,
};

/// Every rule, in id order
pub const ALL_RULES: &[RuleInfo] = &[
    TYPE_MISMATCH,
    NULLABLE_TO_NON_NULLABLE,
    COLLECTION_CONTAINER,
    SOURCE_UNMAPPED,
    CASE_MISMATCH,
    DESTINATION_UNMAPPED,
    REQUIRED_UNMAPPED,
    NESTED_MAPPING_MISSING,
    COLLECTION_ELEMENT,
    RECURSION_RISK,
    PERFORMANCE,
    DUPLICATE_REGISTRATION,
    CONFLICTING_CONFIGURATION,
    REDUNDANT_MAP_FROM,
];

pub fn rule_info(id: &str) -> Option<&'static RuleInfo> {
    ALL_RULES.iter().find(|r| r.id.eq_ignore_ascii_case(id))
}

/// Substitute `{n}` placeholders; unknown indices render empty
pub fn format_message(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if after[..close].chars().all(|c| c.is_ascii_digit()) && close > 0 => {
                let idx: usize = after[..close].parse().unwrap_or(usize::MAX);
                if let Some(arg) = args.get(idx) {
                    out.push_str(arg);
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Property keys shared by rules and the fix synthesizer
pub mod props {
    pub const MEMBER: &str = "member";
    pub const SOURCE_MEMBER: &str = "sourceMember";
    pub const SOURCE_PATH: &str = "sourcePath";
    pub const SOURCE_TYPE: &str = "sourceType";
    pub const DESTINATION_TYPE: &str = "destinationType";
    pub const SOURCE_MEMBER_TYPE: &str = "sourceMemberType";
    pub const DESTINATION_MEMBER_TYPE: &str = "destinationMemberType";
    pub const SOURCE_CONTAINER: &str = "sourceContainer";
    pub const DESTINATION_CONTAINER: &str = "destinationContainer";
    pub const SOURCE_ELEMENT_TYPE: &str = "sourceElementType";
    pub const DESTINATION_ELEMENT_TYPE: &str = "destinationElementType";
    /// `;`-separated `Source=>Destination` pairs needing a registration
    pub const MISSING_PAIRS: &str = "missingPairs";
    pub const DUPLICATE_ORIGIN: &str = "duplicateOrigin";
    /// Registration whose `ReverseMap()` produced the duplicate pair
    pub const REVERSE_REGISTRATION: &str = "reverseRegistration";
    pub const CALL_INDEX: &str = "callIndex";
    pub const SMELL: &str = "smell";
}

/// One reported rule violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// Positional message arguments
    pub args: Vec<String>,
    pub file: String,
    pub span: Span,
    /// Key/value data for the fix synthesizer
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub properties: BTreeMap<String, String>,
    /// Registration the finding belongs to
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub registration: Option<usize>,
}

impl Finding {
    pub fn new(rule: &RuleInfo, args: Vec<String>, file: &str, span: Span) -> Finding {
        Finding {
            rule_id: rule.id.to_string(),
            severity: rule.default_severity,
            message: format_message(rule.template, &args),
            args,
            file: file.to_string(),
            span,
            properties: BTreeMap::new(),
            registration: None,
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Finding {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn with_registration(mut self, id: usize) -> Finding {
        self.registration = Some(id);
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// `file:line:col` for reports
    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.span.start_line, self.span.start_col + 1)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.location(),
            self.severity,
            self.rule_id,
            self.message
        )
    }
}
