//! C# parser - extracts type declarations and `CreateMap` chains

use crate::ast::*;
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use tracing::trace;
use tree_sitter::Node;

use super::{new_parser, node_span, node_text, trailing_span};

/// Keywords tree-sitter may surface as bare tokens instead of `modifier` nodes
const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "internal",
    "static",
    "readonly",
    "const",
    "required",
    "abstract",
    "sealed",
    "virtual",
    "override",
    "new",
    "partial",
    "volatile",
];

/// LINQ operators counted for projection nesting
const PROJECTION_METHODS: &[&str] = &[
    "Select",
    "SelectMany",
    "GroupBy",
    "ToDictionary",
    "ToLookup",
    "Join",
    "GroupJoin",
];

const TYPE_DECL_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
    "record_struct_declaration",
    "enum_declaration",
];

pub fn parse_csharp(path: &str, source: &str) -> Result<ParsedFile> {
    let mut parser = new_parser()?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::CodeParse(format!("Failed to parse {}", path)))?;

    let root = tree.root_node();
    let mut walker = Walker {
        source,
        types: Vec::new(),
        chains: Vec::new(),
        imports_automapper: false,
    };
    walker.visit_children(root, &Scope::default());

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let source_hash = format!("sha256:{}", hex::encode(&hasher.finalize()[..8]));

    trace!(
        path,
        types = walker.types.len(),
        chains = walker.chains.len(),
        "parsed C# file"
    );

    Ok(ParsedFile {
        path: path.to_string(),
        types: walker.types,
        chains: walker.chains,
        imports_automapper: walker.imports_automapper,
        has_syntax_errors: root.has_error(),
        source_hash,
    })
}

#[derive(Debug, Clone, Default)]
struct Scope {
    namespace: Option<String>,
    containers: Vec<String>,
}

impl Scope {
    fn enclosing_type(&self) -> Option<String> {
        if self.containers.is_empty() {
            return None;
        }
        let mut parts: Vec<&str> = Vec::new();
        if let Some(ns) = &self.namespace {
            parts.push(ns);
        }
        parts.extend(self.containers.iter().map(String::as_str));
        Some(parts.join("."))
    }

    fn with_namespace(&self, name: &str) -> Scope {
        let namespace = match &self.namespace {
            Some(outer) => format!("{}.{}", outer, name),
            None => name.to_string(),
        };
        Scope {
            namespace: Some(namespace),
            containers: self.containers.clone(),
        }
    }
}

/// Namespace brought in by a plain `using N;`, ignoring aliases and `using static`
fn imported_namespace(directive: &str) -> Option<&str> {
    let rest = directive.trim().strip_prefix("global").unwrap_or(directive.trim()).trim_start();
    let target = rest.strip_prefix("using")?.trim().strip_suffix(';')?.trim();
    if target.starts_with("static ") || target.contains('=') {
        return None;
    }
    Some(target)
}

struct Walker<'s> {
    source: &'s str,
    types: Vec<TypeDecl>,
    chains: Vec<ChainSyntax>,
    imports_automapper: bool,
}

impl<'s> Walker<'s> {
    fn visit_children(&mut self, node: Node, scope: &Scope) {
        let mut scope = scope.clone();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            if child.kind() == "file_scoped_namespace_declaration" {
                if let Some(name) = field_text(child, "name", self.source) {
                    scope = scope.with_namespace(name);
                }
                self.visit_children(child, &scope);
                continue;
            }
            self.visit(child, &scope);
        }
    }

    fn visit(&mut self, node: Node, scope: &Scope) {
        match node.kind() {
            "using_directive" => {
                if imported_namespace(node_text(node, self.source)) == Some("AutoMapper") {
                    self.imports_automapper = true;
                }
                return;
            }
            "namespace_declaration" => {
                let inner = match field_text(node, "name", self.source) {
                    Some(name) => scope.with_namespace(name),
                    None => scope.clone(),
                };
                self.visit_children(node, &inner);
                return;
            }
            kind if TYPE_DECL_KINDS.contains(&kind) => {
                if let Some(decl) = self.parse_type_decl(node, scope) {
                    let mut inner = scope.clone();
                    inner.containers.push(decl.name.clone());
                    self.types.push(decl);
                    self.visit_children(node, &inner);
                    return;
                }
            }
            "invocation_expression" => {
                if let Some(chain) = self.try_chain(node, scope) {
                    self.chains.push(chain);
                }
            }
            _ => {}
        }
        self.visit_children(node, scope);
    }

    // ------------------------------------------------------------------
    // Type declarations
    // ------------------------------------------------------------------

    fn parse_type_decl(&self, node: Node, scope: &Scope) -> Option<TypeDecl> {
        let source = self.source;
        let name = field_text(node, "name", source)
            .map(str::to_string)
            .or_else(|| first_child_text(node, "identifier", source))?;

        let text = node_text(node, source);
        let kind = match node.kind() {
            "class_declaration" => TypeDeclKind::Class,
            "struct_declaration" => TypeDeclKind::Struct,
            "interface_declaration" => TypeDeclKind::Interface,
            "enum_declaration" => TypeDeclKind::Enum,
            "record_struct_declaration" => TypeDeclKind::RecordStruct,
            _ if has_token(node, "struct") || text_before_name(text, &name).contains("struct") => {
                TypeDeclKind::RecordStruct
            }
            _ => TypeDeclKind::Record,
        };

        let mut type_params = Vec::new();
        let mut bases = Vec::new();
        let mut members = Vec::new();

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in &children {
            match child.kind() {
                "type_parameter_list" => {
                    let mut tp_cursor = child.walk();
                    for tp in child.named_children(&mut tp_cursor) {
                        if tp.kind() == "type_parameter" {
                            let tp_name = field_text(tp, "name", source)
                                .map(str::to_string)
                                .or_else(|| first_child_text(tp, "identifier", source))
                                .unwrap_or_else(|| node_text(tp, source).to_string());
                            type_params.push(tp_name);
                        }
                    }
                }
                "base_list" => {
                    let mut base_cursor = child.walk();
                    for base in child.named_children(&mut base_cursor) {
                        match base.kind() {
                            "primary_constructor_base_type" => {
                                let mut inner_cursor = base.walk();
                                let ty = base
                                    .named_children(&mut inner_cursor)
                                    .find(|n| n.kind() != "argument_list");
                                if let Some(ty) = ty {
                                    bases.push(node_text(ty, source).to_string());
                                }
                            }
                            "argument_list" | "comment" => {}
                            _ => bases.push(node_text(base, source).to_string()),
                        }
                    }
                }
                "parameter_list"
                    if matches!(kind, TypeDeclKind::Record | TypeDeclKind::RecordStruct) =>
                {
                    members.extend(self.parse_record_parameters(*child));
                }
                _ => {}
            }
        }

        let body = node.child_by_field_name("body").or_else(|| {
            children
                .iter()
                .copied()
                .find(|c| c.kind() == "declaration_list")
        });
        if let Some(body) = body {
            let mut body_cursor = body.walk();
            let body_children: Vec<Node> = body.named_children(&mut body_cursor).collect();
            for member in body_children {
                match member.kind() {
                    "property_declaration" => {
                        if let Some(decl) = self.parse_property(member) {
                            // A property can re-declare a positional record parameter
                            members.retain(|m: &MemberDecl| m.name != decl.name);
                            members.push(decl);
                        }
                    }
                    "field_declaration" => members.extend(self.parse_fields(member)),
                    _ => {}
                }
            }
        }

        Some(TypeDecl {
            name,
            namespace: scope.namespace.clone(),
            containers: scope.containers.clone(),
            kind,
            type_params,
            bases,
            modifiers: modifiers(node, source),
            members,
            span: node_span(node),
        })
    }

    fn parse_record_parameters(&self, list: Node) -> Vec<MemberDecl> {
        let source = self.source;
        let mut members = Vec::new();
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            if param.kind() != "parameter" {
                continue;
            }
            let name = match field_text(param, "name", source) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let type_syntax = match field_text(param, "type", source) {
                Some(ty) => ty.to_string(),
                None => continue,
            };
            members.push(MemberDecl {
                name,
                type_syntax,
                kind: MemberDeclKind::RecordParameter,
                modifiers: vec!["public".to_string()],
                readable: true,
                writable: true,
                span: node_span(param),
            });
        }
        members
    }

    fn parse_property(&self, node: Node) -> Option<MemberDecl> {
        let source = self.source;
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();

        // Explicit interface implementations are never public members
        if children
            .iter()
            .any(|c| c.kind() == "explicit_interface_specifier")
        {
            return None;
        }

        let name = field_text(node, "name", source)
            .map(str::to_string)
            .or_else(|| {
                children
                    .iter()
                    .rev()
                    .find(|c| c.kind() == "identifier")
                    .map(|c| node_text(*c, source).to_string())
            })?;
        let type_syntax = field_text(node, "type", source)
            .map(str::to_string)
            .or_else(|| {
                children
                    .iter()
                    .find(|c| c.is_named() && c.kind() != "modifier" && c.kind() != "attribute_list")
                    .map(|c| node_text(*c, source).to_string())
            })?;

        let mods = modifiers(node, source);
        let is_public = mods.iter().any(|m| m == "public");

        let mut readable = false;
        let mut writable = false;

        let accessors = node.child_by_field_name("accessors").or_else(|| {
            children
                .iter()
                .copied()
                .find(|c| c.kind() == "accessor_list")
        });
        if let Some(list) = accessors {
            let mut acc_cursor = list.walk();
            for accessor in list.named_children(&mut acc_cursor) {
                if accessor.kind() != "accessor_declaration" {
                    continue;
                }
                let restricted = modifiers(accessor, source)
                    .iter()
                    .any(|m| m == "private" || m == "protected" || m == "internal");
                match accessor_keyword(accessor, source).as_deref() {
                    Some("get") => readable = !restricted,
                    Some("set") | Some("init") => writable = !restricted,
                    _ => {}
                }
            }
        }
        if children
            .iter()
            .any(|c| c.kind() == "arrow_expression_clause")
        {
            readable = true;
        }

        Some(MemberDecl {
            name,
            type_syntax,
            kind: MemberDeclKind::Property,
            modifiers: mods,
            readable: is_public && readable,
            writable: is_public && writable,
            span: node_span(node),
        })
    }

    fn parse_fields(&self, node: Node) -> Vec<MemberDecl> {
        let source = self.source;
        let mods = modifiers(node, source);
        let is_public = mods.iter().any(|m| m == "public");
        let is_fixed = mods.iter().any(|m| m == "readonly" || m == "const");

        let mut cursor = node.walk();
        let declaration = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "variable_declaration");
        let declaration = match declaration {
            Some(d) => d,
            None => return Vec::new(),
        };
        let type_syntax = match field_text(declaration, "type", source) {
            Some(ty) => ty.to_string(),
            None => return Vec::new(),
        };

        let mut members = Vec::new();
        let mut decl_cursor = declaration.walk();
        for declarator in declaration.named_children(&mut decl_cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let name = field_text(declarator, "name", source)
                .map(str::to_string)
                .or_else(|| first_child_text(declarator, "identifier", source));
            if let Some(name) = name {
                members.push(MemberDecl {
                    name,
                    type_syntax: type_syntax.clone(),
                    kind: MemberDeclKind::Field,
                    modifiers: mods.clone(),
                    readable: is_public,
                    writable: is_public && !is_fixed,
                    span: node_span(declarator),
                });
            }
        }
        members
    }

    // ------------------------------------------------------------------
    // CreateMap chains
    // ------------------------------------------------------------------

    fn try_chain(&self, node: Node, scope: &Scope) -> Option<ChainSyntax> {
        let source = self.source;
        let root = callee(node, source)?;
        if root.name != "CreateMap" {
            return None;
        }

        let receiver = match root.receiver {
            None => Receiver::Implicit,
            Some(recv) => {
                let text = node_text(recv, source);
                match recv.kind() {
                    "this_expression" | "this" => Receiver::This,
                    "base_expression" | "base" => Receiver::Base,
                    "identifier" if text == "this" => Receiver::This,
                    "identifier" if text == "base" => Receiver::Base,
                    "identifier" => Receiver::Identifier {
                        name: text.to_string(),
                        binding: receiver_binding(node, text, source),
                    },
                    _ => Receiver::Other(text.to_string()),
                }
            }
        };

        let mut calls = vec![self.build_call(
            node,
            root.name,
            root.type_args,
            node_span(node),
            String::new(),
        )];

        // Walk up through `.Next(...)` invocations
        let mut current = node;
        loop {
            let access = match current.parent() {
                Some(p) if p.kind() == "member_access_expression" => p,
                _ => break,
            };
            let is_receiver = access
                .child_by_field_name("expression")
                .or_else(|| access.named_child_first())
                .map(|e| e.id() == current.id())
                .unwrap_or(false);
            if !is_receiver {
                break;
            }
            let invocation = match access.parent() {
                Some(p) if p.kind() == "invocation_expression" => p,
                _ => break,
            };
            let next = match callee(invocation, source) {
                Some(c) => c,
                None => break,
            };
            let separator = dot_separator(access, current, source);
            calls.push(self.build_call(
                invocation,
                next.name,
                next.type_args,
                trailing_span(current, invocation),
                separator,
            ));
            current = invocation;
        }

        let statement = current
            .parent()
            .filter(|p| p.kind() == "expression_statement")
            .map(|stmt| StatementSyntax {
                span: node_span(stmt),
                indent: line_indent(source, stmt.start_byte()),
            });

        Some(ChainSyntax {
            calls,
            receiver,
            enclosing_type: scope.enclosing_type(),
            statement,
            span: node_span(current),
        })
    }

    fn build_call(
        &self,
        invocation: Node,
        name: String,
        type_args: Vec<String>,
        segment: Span,
        separator: String,
    ) -> ChainCall {
        ChainCall {
            name,
            type_args,
            args: self.arguments(invocation),
            span: node_span(invocation),
            segment,
            separator,
        }
    }

    fn arguments(&self, invocation: Node) -> Vec<ArgumentSyntax> {
        let list = invocation.child_by_field_name("arguments").or_else(|| {
            let mut cursor = invocation.walk();
            let found = invocation
                .named_children(&mut cursor)
                .find(|c| c.kind() == "argument_list");
            found
        });
        let list = match list {
            Some(l) => l,
            None => return Vec::new(),
        };

        let mut args = Vec::new();
        let mut cursor = list.walk();
        for arg in list.named_children(&mut cursor) {
            if arg.kind() != "argument" {
                continue;
            }
            let mut arg_cursor = arg.walk();
            let expr = arg
                .named_children(&mut arg_cursor)
                .filter(|c| c.kind() != "name_colon")
                .last();
            if let Some(expr) = expr {
                args.push(self.argument(expr));
            }
        }
        args
    }

    fn argument(&self, expr: Node) -> ArgumentSyntax {
        let source = self.source;
        let text = node_text(expr, source);
        let kind = match expr.kind() {
            "lambda_expression" => match self.lambda(expr) {
                Some(lambda) => ArgumentKind::Lambda(lambda),
                None => ArgumentKind::Other,
            },
            "string_literal" | "verbatim_string_literal" | "raw_string_literal" => {
                ArgumentKind::StringLiteral(unquote(text))
            }
            "typeof_expression" => {
                let mut cursor = expr.walk();
                let ty = expr
                    .named_children(&mut cursor)
                    .next()
                    .map(|t| node_text(t, source).to_string())
                    .unwrap_or_default();
                ArgumentKind::TypeOf(ty)
            }
            "object_creation_expression" => {
                let ty = field_text(expr, "type", source)
                    .map(str::to_string)
                    .unwrap_or_else(|| creation_type_from_text(text));
                ArgumentKind::ObjectCreation(ty)
            }
            "member_access_expression" => ArgumentKind::MemberAccess(text.to_string()),
            "invocation_expression" => match callee(expr, source) {
                Some(c) if c.name == "nameof" && c.receiver.is_none() => {
                    let inner = text
                        .trim_start_matches("nameof")
                        .trim()
                        .trim_start_matches('(')
                        .trim_end_matches(')');
                    let last = inner.rsplit('.').next().unwrap_or(inner).trim();
                    ArgumentKind::NameOf(last.to_string())
                }
                _ => ArgumentKind::Other,
            },
            _ => ArgumentKind::Other,
        };
        ArgumentSyntax {
            text: text.to_string(),
            span: node_span(expr),
            kind,
        }
    }

    fn lambda(&self, node: Node) -> Option<LambdaSyntax> {
        let source = self.source;
        let (params, body) = lambda_parts(node, source)?;
        let params: Vec<String> = params.into_iter().map(|(_, name)| name).collect();
        let first = params.first().cloned();
        let summary = summarize(body, first.as_deref(), source);

        let mut param_calls = Vec::new();
        if let Some(param) = first.as_deref() {
            walk(body, &mut |n| {
                if n.kind() != "invocation_expression" {
                    return;
                }
                if let Some(c) = callee(n, source) {
                    let on_param = c
                        .receiver
                        .map(|r| r.kind() == "identifier" && node_text(r, source) == param)
                        .unwrap_or(false);
                    if on_param {
                        param_calls.push(ParamCall {
                            name: c.name,
                            type_args: c.type_args,
                            args: self.arguments(n),
                            span: node_span(n),
                        });
                    }
                }
            });
        }

        Some(LambdaSyntax {
            params,
            body: summary,
            param_calls,
        })
    }
}

/// Method name, generic arguments and receiver of an invocation
struct Callee<'t> {
    name: String,
    type_args: Vec<String>,
    receiver: Option<Node<'t>>,
}

fn callee<'t>(invocation: Node<'t>, source: &str) -> Option<Callee<'t>> {
    let function = invocation
        .child_by_field_name("function")
        .or_else(|| invocation.named_child_first())?;
    match function.kind() {
        "identifier" => Some(Callee {
            name: node_text(function, source).to_string(),
            type_args: Vec::new(),
            receiver: None,
        }),
        "generic_name" => {
            let (name, type_args) = generic_parts(function, source)?;
            Some(Callee {
                name,
                type_args,
                receiver: None,
            })
        }
        "member_access_expression" => {
            let receiver = function
                .child_by_field_name("expression")
                .or_else(|| function.named_child_first())?;
            let name_node = function.child_by_field_name("name").or_else(|| {
                let mut cursor = function.walk();
                let last = function.named_children(&mut cursor).last();
                last
            })?;
            let (name, type_args) = match name_node.kind() {
                "generic_name" => generic_parts(name_node, source)?,
                _ => (node_text(name_node, source).to_string(), Vec::new()),
            };
            Some(Callee {
                name,
                type_args,
                receiver: Some(receiver),
            })
        }
        _ => None,
    }
}

fn generic_parts(node: Node, source: &str) -> Option<(String, Vec<String>)> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    let name = children
        .iter()
        .find(|c| c.kind() == "identifier")
        .map(|c| node_text(*c, source).to_string())?;
    let mut args = Vec::new();
    if let Some(list) = children.iter().find(|c| c.kind() == "type_argument_list") {
        let mut list_cursor = list.walk();
        for arg in list.named_children(&mut list_cursor) {
            args.push(node_text(arg, source).to_string());
        }
    }
    Some((name, args))
}

/// Whitespace between a receiver and the `.` that follows it
fn dot_separator(access: Node, receiver: Node, source: &str) -> String {
    let mut cursor = access.walk();
    let dot = access
        .children(&mut cursor)
        .find(|c| !c.is_named() && node_text(*c, source) == ".");
    match dot {
        Some(dot) if dot.start_byte() >= receiver.end_byte() => {
            let between = &source[receiver.end_byte()..dot.start_byte()];
            if between.chars().all(char::is_whitespace) {
                between.to_string()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

/// Leading whitespace of the line containing `byte`
fn line_indent(source: &str, byte: usize) -> String {
    let line_start = source[..byte].rfind('\n').map(|i| i + 1).unwrap_or(0);
    source[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Parameters (type, name) and body of a lambda expression
fn lambda_parts<'t>(node: Node<'t>, source: &str) -> Option<(Vec<(Option<String>, String)>, Node<'t>)> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    let arrow = children.iter().position(|c| c.kind() == "=>")?;
    let body = node
        .child_by_field_name("body")
        .or_else(|| children[arrow + 1..].iter().copied().find(|c| c.is_named()))?;

    let mut params_text = String::new();
    for child in &children[..arrow] {
        match child.kind() {
            "modifier" | "attribute_list" | "async" | "static" => {}
            _ => params_text.push_str(node_text(*child, source)),
        }
    }
    let inner = params_text
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    let mut params = Vec::new();
    for piece in inner.split(',') {
        let words: Vec<&str> = piece.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            [name] => params.push((None, name.to_string())),
            [ty @ .., name] => params.push((Some(ty.join(" ")), name.to_string())),
        }
    }
    Some((params, body))
}

/// Find how an identifier receiver was bound
fn receiver_binding(start: Node, name: &str, source: &str) -> Option<ReceiverBinding> {
    let mut node = start;
    while let Some(parent) = node.parent() {
        match parent.kind() {
            "lambda_expression" => {
                if let Some((params, _)) = lambda_parts(parent, source) {
                    if let Some((ty, _)) = params.iter().find(|(_, p)| p == name) {
                        if let Some(ty) = ty {
                            return Some(ReceiverBinding::Typed(ty.clone()));
                        }
                        return Some(ReceiverBinding::Callback(callback_target(parent, source)));
                    }
                }
            }
            "method_declaration" | "constructor_declaration" | "local_function_statement" => {
                if let Some(ty) = parameter_type(parent, name, source) {
                    return Some(ReceiverBinding::Typed(ty));
                }
            }
            "block" => {
                if let Some(ty) = local_type(parent, name, start.start_byte(), source) {
                    return Some(ReceiverBinding::Typed(ty));
                }
            }
            "declaration_list" => {
                if let Some(ty) = field_type(parent, name, source) {
                    return Some(ReceiverBinding::Typed(ty));
                }
            }
            _ => {}
        }
        node = parent;
    }
    None
}

/// Name of the method or constructed type a lambda is passed to
fn callback_target(lambda: Node, source: &str) -> String {
    let argument = match lambda.parent() {
        Some(p) if p.kind() == "argument" => p,
        _ => return String::new(),
    };
    let owner = argument.parent().and_then(|list| list.parent());
    match owner {
        Some(o) if o.kind() == "invocation_expression" => {
            callee(o, source).map(|c| c.name).unwrap_or_default()
        }
        Some(o) if o.kind() == "object_creation_expression" => field_text(o, "type", source)
            .map(str::to_string)
            .unwrap_or_else(|| creation_type_from_text(node_text(o, source))),
        _ => String::new(),
    }
}

fn parameter_type(method: Node, name: &str, source: &str) -> Option<String> {
    let list = method.child_by_field_name("parameters").or_else(|| {
        let mut cursor = method.walk();
        let found = method
            .named_children(&mut cursor)
            .find(|c| c.kind() == "parameter_list");
        found
    })?;
    let mut cursor = list.walk();
    let found = list
        .named_children(&mut cursor)
        .filter(|p| p.kind() == "parameter")
        .find(|p| field_text(*p, "name", source) == Some(name))
        .and_then(|p| field_text(p, "type", source).map(str::to_string));
    found
}

fn local_type(block: Node, name: &str, before: usize, source: &str) -> Option<String> {
    let mut result = None;
    walk(block, &mut |n| {
        if result.is_some() || n.start_byte() >= before || n.kind() != "variable_declaration" {
            return;
        }
        let ty = match field_text(n, "type", source) {
            Some(t) => t,
            None => return,
        };
        let mut cursor = n.walk();
        for declarator in n.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let decl_name = field_text(declarator, "name", source)
                .map(str::to_string)
                .or_else(|| first_child_text(declarator, "identifier", source));
            if decl_name.as_deref() == Some(name) {
                if ty == "var" {
                    // `var cfg = new MapperConfigurationExpression();`
                    let mut creation = None;
                    walk(declarator, &mut |d| {
                        if creation.is_none() && d.kind() == "object_creation_expression" {
                            creation = field_text(d, "type", source).map(str::to_string);
                        }
                    });
                    result = Some(creation.unwrap_or_else(|| "var".to_string()));
                } else {
                    result = Some(ty.to_string());
                }
                return;
            }
        }
    });
    result
}

fn field_type(declarations: Node, name: &str, source: &str) -> Option<String> {
    let mut cursor = declarations.walk();
    let children: Vec<Node> = declarations.named_children(&mut cursor).collect();
    for member in children {
        let declaration = match member.kind() {
            "field_declaration" => {
                let mut c = member.walk();
                let found = member
                    .named_children(&mut c)
                    .find(|d| d.kind() == "variable_declaration");
                found
            }
            "property_declaration" => {
                if field_text(member, "name", source) == Some(name) {
                    return field_text(member, "type", source).map(str::to_string);
                }
                None
            }
            _ => None,
        };
        let declaration = match declaration {
            Some(d) => d,
            None => continue,
        };
        let mut c = declaration.walk();
        let matches = declaration
            .named_children(&mut c)
            .filter(|d| d.kind() == "variable_declarator")
            .any(|d| {
                field_text(d, "name", source)
                    .map(str::to_string)
                    .or_else(|| first_child_text(d, "identifier", source))
                    .as_deref()
                    == Some(name)
            });
        if matches {
            return field_text(declaration, "type", source).map(str::to_string);
        }
    }
    None
}

/// Summarize a lambda body for redundancy and performance checks
fn summarize(body: Node, param: Option<&str>, source: &str) -> ExpressionSummary {
    let mut summary = ExpressionSummary {
        text: node_text(body, source).to_string(),
        span: node_span(body),
        parameter: param.map(str::to_string),
        member_path: param.and_then(|p| member_path(body, p, source)),
        projection_depth: projection_depth(body, source),
        ..Default::default()
    };

    walk(body, &mut |n| match n.kind() {
        "invocation_expression" => {
            if let Some(c) = callee(n, source) {
                summary.calls.push(CallSite {
                    receiver: c.receiver.map(|r| node_text(r, source).to_string()),
                    method: c.name,
                    span: node_span(n),
                });
            }
        }
        "member_access_expression" => {
            let is_callee = n
                .parent()
                .filter(|p| p.kind() == "invocation_expression")
                .and_then(|p| p.child_by_field_name("function"))
                .map(|f| f.id() == n.id())
                .unwrap_or(false);
            if !is_callee {
                summary.member_accesses.push(MemberAccessSite {
                    text: node_text(n, source).to_string(),
                    span: node_span(n),
                });
            }
            if let Some(p) = param {
                let on_param = n
                    .child_by_field_name("expression")
                    .map(|e| e.kind() == "identifier" && node_text(e, source) == p)
                    .unwrap_or(false);
                if on_param {
                    if let Some(member) = field_text(n, "name", source) {
                        if !summary.parameter_members.iter().any(|m| m == member) {
                            summary.parameter_members.push(member.to_string());
                        }
                    }
                }
            }
        }
        "object_creation_expression" => {
            let ty = field_text(n, "type", source)
                .map(str::to_string)
                .unwrap_or_else(|| creation_type_from_text(node_text(n, source)));
            summary.creations.push(CreationSite {
                type_name: ty,
                span: node_span(n),
            });
        }
        _ => {}
    });

    summary
}

/// `p.A.B` → `["A", "B"]` when rooted at `param`
fn member_path(node: Node, param: &str, source: &str) -> Option<Vec<String>> {
    match node.kind() {
        "member_access_expression" => {
            let expr = node.child_by_field_name("expression")?;
            let name = field_text(node, "name", source)?;
            let mut path = member_path(expr, param, source)?;
            path.push(name.to_string());
            Some(path)
        }
        "identifier" if node_text(node, source) == param => Some(Vec::new()),
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next()?;
            member_path(inner, param, source)
        }
        _ => None,
    }
    .filter(|p| node.kind() == "identifier" || !p.is_empty())
}

fn projection_depth(node: Node, source: &str) -> usize {
    if node.kind() == "invocation_expression" {
        if let Some(c) = callee(node, source) {
            if PROJECTION_METHODS.contains(&c.name.as_str()) {
                let receiver_depth = c.receiver.map(|r| projection_depth(r, source)).unwrap_or(0);
                let args_depth = node
                    .child_by_field_name("arguments")
                    .map(|a| projection_depth(a, source))
                    .unwrap_or(0);
                return receiver_depth.max(1 + args_depth);
            }
        }
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .map(|c| projection_depth(c, source))
        .max()
        .unwrap_or(0)
}

/// Pre-order walk over named and anonymous descendants
fn walk<'t>(node: Node<'t>, f: &mut dyn FnMut(Node<'t>)) {
    f(node);
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    for child in children {
        walk(child, f);
    }
}

fn modifiers(node: Node, source: &str) -> Vec<String> {
    let mut mods = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifier" {
            mods.push(node_text(child, source).trim().to_string());
        } else if !child.is_named() && MODIFIER_KEYWORDS.contains(&child.kind()) {
            mods.push(child.kind().to_string());
        }
    }
    mods
}

fn accessor_keyword(accessor: Node, source: &str) -> Option<String> {
    if let Some(name) = field_text(accessor, "name", source) {
        return Some(name.to_string());
    }
    let mut cursor = accessor.walk();
    let found = accessor
        .children(&mut cursor)
        .map(|c| c.kind())
        .find(|k| matches!(*k, "get" | "set" | "init"))
        .map(str::to_string);
    found
}

fn field_text<'a>(node: Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| node_text(n, source))
}

fn first_child_text(node: Node, kind: &str, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == kind)
        .map(|c| node_text(c, source).to_string());
    found
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

fn text_before_name<'a>(text: &'a str, name: &str) -> &'a str {
    match text.find(name) {
        Some(idx) => &text[..idx],
        None => "",
    }
}

/// `new Foo<Bar>(x)` → `Foo<Bar>`
fn creation_type_from_text(text: &str) -> String {
    let rest = text.trim().trim_start_matches("new").trim_start();
    let end = rest.find(['(', '{']).unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

fn unquote(text: &str) -> String {
    text.trim_start_matches('@')
        .trim_start_matches('$')
        .trim_matches('"')
        .to_string()
}

/// First named child; stands in for a missing field name
trait NamedChildFirst<'t> {
    fn named_child_first(&self) -> Option<Node<'t>>;
}

impl<'t> NamedChildFirst<'t> for Node<'t> {
    fn named_child_first(&self) -> Option<Node<'t>> {
        let mut cursor = self.walk();
        let first = self.named_children(&mut cursor).next();
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
using AutoMapper;

namespace Shop.Mapping;

public class Order
{
    public int Id { get; set; }
    public string? Note { get; private set; }
    public required string Name { get; init; }
    public static int Counter { get; set; }
    public readonly int Version;
}

public record OrderDto(int Id, string Name);

public class OrderProfile : Profile
{
    public OrderProfile()
    {
        CreateMap<Order, OrderDto>()
            .ForMember(d => d.Name, opt => opt.MapFrom(s => s.Name))
            .ReverseMap();
    }
}
"#;

    #[test]
    fn test_primary_constructor_base() {
        let file = parse_csharp(
            "Admin.cs",
            "public record User(string Name);\npublic record Admin(string Name) : User(Name), IAudited;",
        )
        .unwrap();
        let admin = file.types.iter().find(|t| t.name == "Admin").unwrap();
        assert_eq!(admin.bases, vec!["User".to_string(), "IAudited".to_string()]);
    }

    #[test]
    fn test_imported_namespace() {
        assert_eq!(imported_namespace("using AutoMapper;"), Some("AutoMapper"));
        assert_eq!(imported_namespace("global using AutoMapper ;"), Some("AutoMapper"));
        assert_eq!(imported_namespace("using AutoMapper.QueryableExtensions;"), Some("AutoMapper.QueryableExtensions"));
        assert_eq!(imported_namespace("using AM = AutoMapper;"), None);
        assert_eq!(imported_namespace("using static AutoMapper.Mapper;"), None);
    }

    #[test]
    fn test_parse_types_and_members() {
        let file = parse_csharp("OrderProfile.cs", PROFILE).unwrap();
        assert!(file.imports_automapper);

        let order = file.types.iter().find(|t| t.name == "Order").unwrap();
        assert_eq!(order.namespace.as_deref(), Some("Shop.Mapping"));
        assert_eq!(order.qualified_name(), "Shop.Mapping.Order");

        let note = order.members.iter().find(|m| m.name == "Note").unwrap();
        assert!(note.readable);
        assert!(!note.writable);
        assert_eq!(note.type_syntax, "string?");

        let name = order.members.iter().find(|m| m.name == "Name").unwrap();
        assert!(name.is_required());
        assert!(name.writable);

        let counter = order.members.iter().find(|m| m.name == "Counter").unwrap();
        assert!(counter.is_static());

        let version = order.members.iter().find(|m| m.name == "Version").unwrap();
        assert!(version.readable);
        assert!(!version.writable);

        let dto = file.types.iter().find(|t| t.name == "OrderDto").unwrap();
        assert_eq!(dto.kind, TypeDeclKind::Record);
        assert_eq!(dto.members.len(), 2);
        assert_eq!(dto.members[0].kind, MemberDeclKind::RecordParameter);

        let profile = file.types.iter().find(|t| t.name == "OrderProfile").unwrap();
        assert_eq!(profile.bases, vec!["Profile".to_string()]);
    }

    #[test]
    fn test_parse_chain() {
        let file = parse_csharp("OrderProfile.cs", PROFILE).unwrap();
        assert_eq!(file.chains.len(), 1);
        let chain = &file.chains[0];
        assert_eq!(chain.receiver, Receiver::Implicit);
        assert_eq!(
            chain.enclosing_type.as_deref(),
            Some("Shop.Mapping.OrderProfile")
        );
        let names: Vec<&str> = chain.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CreateMap", "ForMember", "ReverseMap"]);
        assert_eq!(chain.root().type_args, vec!["Order", "OrderDto"]);
        assert!(chain.calls[2].separator.contains('\n'));

        let statement = chain.statement.as_ref().unwrap();
        assert_eq!(statement.indent, "        ");

        let for_member = &chain.calls[1];
        assert_eq!(for_member.args.len(), 2);
        match &for_member.args[1].kind {
            ArgumentKind::Lambda(opt) => {
                assert_eq!(opt.param_calls.len(), 1);
                assert_eq!(opt.param_calls[0].name, "MapFrom");
                match &opt.param_calls[0].args[0].kind {
                    ArgumentKind::Lambda(src) => {
                        assert_eq!(src.body.member_path, Some(vec!["Name".to_string()]));
                    }
                    other => panic!("expected lambda, got {:?}", other),
                }
            }
            other => panic!("expected lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_callback_receiver_binding() {
        let code = r#"
var config = new MapperConfiguration(cfg =>
{
    cfg.CreateMap<A, B>();
});
"#;
        let file = parse_csharp("Startup.cs", code).unwrap();
        assert_eq!(file.chains.len(), 1);
        match &file.chains[0].receiver {
            Receiver::Identifier { name, binding } => {
                assert_eq!(name, "cfg");
                assert_eq!(
                    binding,
                    &Some(ReceiverBinding::Callback("MapperConfiguration".to_string()))
                );
            }
            other => panic!("unexpected receiver {:?}", other),
        }
    }

    #[test]
    fn test_expression_summary() {
        let code = r#"
class P : Profile {
    P() {
        CreateMap<A, B>()
            .ForMember(d => d.Total, o => o.MapFrom(s => s.Items.Count() + s.Items.Sum(i => i.Price)))
            .ForMember(d => d.Stamp, o => o.MapFrom(s => DateTime.Now));
    }
}
"#;
        let file = parse_csharp("P.cs", code).unwrap();
        let chain = &file.chains[0];
        let lambda = match &chain.calls[1].args[1].kind {
            ArgumentKind::Lambda(l) => l,
            _ => panic!("expected lambda"),
        };
        let map_from = match &lambda.param_calls[0].args[0].kind {
            ArgumentKind::Lambda(l) => l,
            _ => panic!("expected lambda"),
        };
        let methods: Vec<&str> = map_from.body.calls.iter().map(|c| c.method.as_str()).collect();
        assert!(methods.contains(&"Count"));
        assert!(methods.contains(&"Sum"));
        assert_eq!(map_from.body.parameter_members, vec!["Items".to_string()]);
        assert!(map_from.body.member_path.is_none());

        let stamp = match &chain.calls[2].args[1].kind {
            ArgumentKind::Lambda(l) => match &l.param_calls[0].args[0].kind {
                ArgumentKind::Lambda(inner) => inner,
                _ => panic!("expected lambda"),
            },
            _ => panic!("expected lambda"),
        };
        assert!(stamp.body.member_accesses.iter().any(|m| m.text == "DateTime.Now"));
    }

    #[test]
    fn test_creation_type_from_text() {
        assert_eq!(creation_type_from_text("new List<int>(items)"), "List<int>");
        assert_eq!(creation_type_from_text("new Foo { A = 1 }"), "Foo");
    }
}
