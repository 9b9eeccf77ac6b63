//! Member extraction
//!
//! Walks a type's inheritance chain (most derived first) and collects the
//! public instance members the mapping rules consider.

use super::descriptor::TypeDescriptor;
use crate::ast::Span;
use crate::parse::TypeRef;
use crate::symbols::{SymbolTable, TypeId};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Which side of a mapping the members are extracted for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberConstraints {
    /// Mapping source: members must be publicly readable
    Readable,
    /// Mapping destination: members must be publicly writable
    Writable,
    /// Every public instance member
    Any,
}

/// A member as the rules see it
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub name: String,
    /// Type the members were extracted for
    pub owner: TypeId,
    /// Type that declares the member (an ancestor of `owner` or itself)
    pub declaring: TypeId,
    pub declared_type: TypeDescriptor,
    pub readable: bool,
    pub writable: bool,
    pub required: bool,
    pub span: Span,
}

/// A type together with its extracted members
#[derive(Debug, Clone)]
pub struct TypeModel {
    pub descriptor: TypeDescriptor,
    pub members: Vec<MemberDescriptor>,
}

impl TypeModel {
    /// Case-insensitive member lookup
    pub fn find(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn find_exact(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Describe a type and extract its members
///
/// Returns `None` when the type cannot be analyzed: unresolvable names,
/// unbound generic parameters, built-ins and collections.
pub fn extract_model(
    type_ref: &TypeRef,
    table: &SymbolTable,
    namespace: Option<&str>,
    constraints: MemberConstraints,
) -> Option<TypeModel> {
    let descriptor = TypeDescriptor::describe(type_ref, table, namespace);
    if !descriptor.resolved || !descriptor.underlying().is_complex() {
        return None;
    }
    let members = extract_members(&descriptor, table, constraints);
    Some(TypeModel {
        descriptor,
        members,
    })
}

/// Collect public, non-static members in declaration order, inherited
/// members appended base-ward
///
/// A member redeclared in a derived type hides the base declaration. An
/// unresolvable type yields an empty sequence.
pub fn extract_members(
    descriptor: &TypeDescriptor,
    table: &SymbolTable,
    constraints: MemberConstraints,
) -> Vec<MemberDescriptor> {
    let descriptor = descriptor.underlying();
    let owner = match descriptor.type_id {
        Some(id) if descriptor.resolved => id,
        _ => return Vec::new(),
    };

    let mut members = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut seen_declaring: HashSet<TypeId> = HashSet::new();

    let mut current = owner;
    let mut bindings = bind(table, owner, descriptor.type_ref.generic_args());

    loop {
        if !seen_declaring.insert(current) {
            break;
        }
        let info = table.get(current);
        for member in &info.members {
            if member.is_static() || !member.is_public() {
                continue;
            }
            if !seen_names.insert(member.name.clone()) {
                continue;
            }
            let ok = match constraints {
                MemberConstraints::Readable => member.readable,
                MemberConstraints::Writable => member.writable,
                MemberConstraints::Any => true,
            };
            if !ok {
                continue;
            }
            let declared = match TypeRef::parse(&member.type_syntax) {
                Ok(r) => r.substitute(&bindings),
                Err(err) => {
                    trace!(member = %member.name, %err, "skipping member with unparsable type");
                    continue;
                }
            };
            members.push(MemberDescriptor {
                name: member.name.clone(),
                owner,
                declaring: current,
                declared_type: TypeDescriptor::describe(&declared, table, info.namespace.as_deref()),
                readable: member.readable,
                writable: member.writable,
                required: member.is_required(),
                span: member.span,
            });
        }

        match table.parent(current) {
            Some((parent, base_ref)) => {
                let args: Vec<TypeRef> = base_ref
                    .generic_args()
                    .iter()
                    .map(|a| a.substitute(&bindings))
                    .collect();
                bindings = bind(table, parent, &args);
                current = parent;
            }
            None => break,
        }
    }

    members
}

/// Map a declared type's generic parameters to concrete arguments
fn bind(table: &SymbolTable, id: TypeId, args: &[TypeRef]) -> HashMap<String, TypeRef> {
    table
        .get(id)
        .type_params
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect()
}
