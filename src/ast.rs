//! Syntax types for C# mapping code
//!
//! Pure-data view of the parts of a C# file that matter for mapping analysis:
//! type declarations with their members, and `CreateMap` invocation chains.
//! Parsed from source code via tree-sitter; no tree-sitter node outlives the
//! parse, so everything here is `Send + Sync` and cheap to share.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Source location
///
/// Lines are 1-based, columns 0-based; byte offsets index the file text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Span {
    /// Byte range covered by this span
    pub fn range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    /// True when `other` lies entirely inside this span
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn is_multiline(&self) -> bool {
        self.end_line > self.start_line
    }
}

/// Parsed C# file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    /// Path as given to the parser
    pub path: String,

    /// Declared classes, records, structs, interfaces and enums
    pub types: Vec<TypeDecl>,

    /// Invocation chains rooted at a `CreateMap` call
    pub chains: Vec<ChainSyntax>,

    /// `using AutoMapper;` is present
    pub imports_automapper: bool,

    /// Tree-sitter reported ERROR/MISSING nodes
    pub has_syntax_errors: bool,

    /// Hash of source for change detection
    pub source_hash: String,
}

/// Kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDeclKind {
    Class,
    Record,
    RecordStruct,
    Struct,
    Interface,
    Enum,
}

/// A type declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,

    /// Enclosing namespace, if any
    pub namespace: Option<String>,

    /// Enclosing type names for nested declarations, outermost first
    pub containers: Vec<String>,

    pub kind: TypeDeclKind,

    /// Generic parameter names (`T`, `TKey`, ...)
    pub type_params: Vec<String>,

    /// Base list entries as written (`Profile`, `List<Order>`, `IEntity`)
    pub bases: Vec<String>,

    pub modifiers: Vec<String>,

    /// Properties, fields and positional record parameters in declaration order
    pub members: Vec<MemberDecl>,

    pub span: Span,
}

impl TypeDecl {
    /// Namespace- and container-qualified name, without generic arity
    pub fn qualified_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(ns) = &self.namespace {
            parts.push(ns);
        }
        parts.extend(self.containers.iter().map(String::as_str));
        parts.push(&self.name);
        parts.join(".")
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// Where a member came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberDeclKind {
    Property,
    Field,
    /// Positional record parameter (`record Person(string Name)`)
    RecordParameter,
}

/// A property or field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,

    /// Declared type as written
    pub type_syntax: String,

    pub kind: MemberDeclKind,

    pub modifiers: Vec<String>,

    /// Publicly readable (public getter, public field, record parameter)
    pub readable: bool,

    /// Publicly writable (public `set`/`init`, non-readonly public field)
    pub writable: bool,

    pub span: Span,
}

impl MemberDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier("static") || self.has_modifier("const")
    }

    pub fn is_public(&self) -> bool {
        self.kind == MemberDeclKind::RecordParameter || self.has_modifier("public")
    }

    pub fn is_required(&self) -> bool {
        self.has_modifier("required")
    }
}

/// A `CreateMap` invocation chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSyntax {
    /// Calls in evaluation order; `calls[0]` is the `CreateMap` call
    pub calls: Vec<ChainCall>,

    /// Receiver of the `CreateMap` call
    pub receiver: Receiver,

    /// Qualified name of the type whose body contains the chain
    pub enclosing_type: Option<String>,

    /// Statement wrapping the chain, when the chain is a whole statement
    pub statement: Option<StatementSyntax>,

    /// Span of the outermost invocation (the whole chain)
    pub span: Span,
}

impl ChainSyntax {
    pub fn root(&self) -> &ChainCall {
        &self.calls[0]
    }

    /// Text placed before `CreateMap` in the chain (`cfg.`, `this.`, or empty)
    pub fn receiver_prefix(&self) -> String {
        match &self.receiver {
            Receiver::Implicit => String::new(),
            Receiver::This => "this.".to_string(),
            Receiver::Base => "base.".to_string(),
            Receiver::Identifier { name, .. } => format!("{}.", name),
            Receiver::Other(text) => format!("{}.", text),
        }
    }
}

/// Receiver of a `CreateMap` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receiver {
    /// `CreateMap<A, B>()` inside a type body
    Implicit,
    This,
    Base,
    /// `cfg.CreateMap<A, B>()`
    Identifier {
        name: String,
        binding: Option<ReceiverBinding>,
    },
    /// Any other receiver expression, kept as text
    Other(String),
}

/// How an identifier receiver was introduced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverBinding {
    /// Lambda parameter of a callback passed to the named method or constructor
    /// (`new MapperConfiguration(cfg => ...)`, `services.AddAutoMapper(cfg => ...)`)
    Callback(String),
    /// Parameter, local or field declared with this type
    Typed(String),
}

/// Statement containing a chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementSyntax {
    pub span: Span,
    /// Leading whitespace of the statement's first line
    pub indent: String,
}

/// One call in a chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainCall {
    pub name: String,

    /// Generic arguments as written
    pub type_args: Vec<String>,

    pub args: Vec<ArgumentSyntax>,

    /// Whole invocation including its receiver chain
    pub span: Span,

    /// From the end of the receiver to the end of this call (`\n    .ReverseMap()`);
    /// equals the call's own span for the chain root
    pub segment: Span,

    /// Whitespace between the receiver and the `.` of this call
    pub separator: String,
}

/// An invocation argument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentSyntax {
    pub text: String,
    pub span: Span,
    pub kind: ArgumentKind,
}

/// Shape of an argument expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArgumentKind {
    Lambda(LambdaSyntax),
    /// String literal, unquoted
    StringLiteral(String),
    /// `typeof(T)`, with the type as written
    TypeOf(String),
    /// `nameof(X.Y)`, with the last segment
    NameOf(String),
    /// `new T(...)`, with the type as written
    ObjectCreation(String),
    /// `MemberList.None` style enum member access, with the full text
    MemberAccess(String),
    Other,
}

/// A lambda argument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaSyntax {
    pub params: Vec<String>,
    pub body: ExpressionSummary,
    /// Invocations made directly on the first parameter (`opt.MapFrom(...)`)
    pub param_calls: Vec<ParamCall>,
}

impl LambdaSyntax {
    pub fn first_param(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }
}

/// Invocation on a lambda parameter, such as `opt.Ignore()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamCall {
    pub name: String,
    pub type_args: Vec<String>,
    pub args: Vec<ArgumentSyntax>,
    pub span: Span,
}

/// Summary of an expression body, used by redundancy and performance checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionSummary {
    pub text: String,
    pub span: Span,

    /// Name of the lambda's first parameter
    pub parameter: Option<String>,

    /// `p.A.B` member path when the body is nothing but member access on the
    /// lambda's first parameter
    pub member_path: Option<Vec<String>>,

    /// Members read from the first parameter anywhere in the body (`p.X` → `X`)
    pub parameter_members: Vec<String>,

    pub calls: Vec<CallSite>,
    pub member_accesses: Vec<MemberAccessSite>,
    pub creations: Vec<CreationSite>,

    /// Deepest nesting of LINQ projection operators (`Select` inside `Select` ...)
    pub projection_depth: usize,
}

/// A method invocation inside an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    /// Receiver expression text (`File`, `_context.Orders`, `src.Items`)
    pub receiver: Option<String>,
    pub method: String,
    pub span: Span,
}

/// A member access that is not the target of an invocation (`DateTime.Now`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAccessSite {
    pub text: String,
    pub span: Span,
}

/// An object creation (`new HttpClient()`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationSite {
    pub type_name: String,
    pub span: Span,
}
