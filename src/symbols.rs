//! Symbol table over declared C# types
//!
//! An arena of every type declared across the analyzed files. Partial
//! declarations are merged into one entry; base types are kept as parent
//! links so inheritance is walked explicitly, most derived first.

use crate::ast::{MemberDecl, ParsedFile, TypeDeclKind};
use crate::parse::TypeRef;
use std::collections::{HashMap, HashSet};

/// Namespace of the mapping framework's own types
pub const FRAMEWORK_NAMESPACE: &str = "AutoMapper";

/// Index of a type in the [`SymbolTable`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// A declared type, merged across partial declarations
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: String,
    pub qualified_name: String,
    pub namespace: Option<String>,
    pub kind: TypeDeclKind,
    pub type_params: Vec<String>,
    /// Base list entries as written
    pub bases: Vec<String>,
    pub members: Vec<MemberDecl>,
    /// Files declaring (part of) this type
    pub files: Vec<String>,
    /// A declaring file has `using AutoMapper;`
    pub imports_framework: bool,
}

impl TypeInfo {
    pub fn is_value_type(&self) -> bool {
        matches!(
            self.kind,
            TypeDeclKind::Struct | TypeDeclKind::RecordStruct | TypeDeclKind::Enum
        )
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeDeclKind::Enum
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    types: Vec<TypeInfo>,
    by_qualified: HashMap<String, Vec<TypeId>>,
    by_simple: HashMap<String, Vec<TypeId>>,
}

impl SymbolTable {
    /// Build the table from every parsed file
    pub fn build(files: &[ParsedFile]) -> SymbolTable {
        let mut table = SymbolTable::default();
        for file in files {
            for decl in &file.types {
                let qualified = decl.qualified_name();
                let arity = decl.type_params.len();
                let existing = table.by_qualified.get(&qualified).and_then(|ids| {
                    ids.iter()
                        .copied()
                        .find(|id| table.types[id.0].type_params.len() == arity)
                });

                match existing {
                    Some(id) if decl.has_modifier("partial") => {
                        let info = &mut table.types[id.0];
                        for base in &decl.bases {
                            if !info.bases.contains(base) {
                                info.bases.push(base.clone());
                            }
                        }
                        for member in &decl.members {
                            if !info.members.iter().any(|m| m.name == member.name) {
                                info.members.push(member.clone());
                            }
                        }
                        if !info.files.contains(&file.path) {
                            info.files.push(file.path.clone());
                        }
                        info.imports_framework |= file.imports_automapper;
                    }
                    _ => {
                        let id = TypeId(table.types.len());
                        table.types.push(TypeInfo {
                            name: decl.name.clone(),
                            qualified_name: qualified.clone(),
                            namespace: decl.namespace.clone(),
                            kind: decl.kind,
                            type_params: decl.type_params.clone(),
                            bases: decl.bases.clone(),
                            members: decl.members.clone(),
                            files: vec![file.path.clone()],
                            imports_framework: file.imports_automapper,
                        });
                        table.by_qualified.entry(qualified).or_default().push(id);
                        table
                            .by_simple
                            .entry(decl.name.clone())
                            .or_default()
                            .push(id);
                    }
                }
            }
        }
        table
    }

    pub fn get(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.0]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(TypeId)
    }

    /// Resolve a type name with the given generic arity
    ///
    /// `name` may be simple (`Order`) or dotted (`Shop.Order`, `Outer.Inner`).
    /// A dotted name matches a qualified-name suffix. When several candidates
    /// remain, one declared in `context_namespace` wins; otherwise the name is
    /// ambiguous and unresolved.
    pub fn resolve(&self, name: &str, arity: usize, context_namespace: Option<&str>) -> Option<TypeId> {
        let candidates: Vec<TypeId> = if let Some(ids) = self.by_qualified.get(name) {
            ids.clone()
        } else {
            let simple = name.rsplit('.').next().unwrap_or(name);
            let suffix = format!(".{}", name);
            self.by_simple
                .get(simple)
                .map(|ids| {
                    ids.iter()
                        .copied()
                        .filter(|id| {
                            let q = &self.types[id.0].qualified_name;
                            q == name || q.ends_with(&suffix)
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        let candidates: Vec<TypeId> = candidates
            .into_iter()
            .filter(|id| self.types[id.0].type_params.len() == arity)
            .collect();

        match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => {
                let ns = context_namespace?;
                let local: Vec<TypeId> = candidates
                    .into_iter()
                    .filter(|id| self.types[id.0].namespace.as_deref() == Some(ns))
                    .collect();
                if local.len() == 1 {
                    Some(local[0])
                } else {
                    None
                }
            }
        }
    }

    /// Resolve a [`TypeRef`] naming a declared type
    pub fn resolve_ref(&self, type_ref: &TypeRef, context_namespace: Option<&str>) -> Option<TypeId> {
        let path = type_ref.path_text()?;
        self.resolve(&path, type_ref.generic_args().len(), context_namespace)
    }

    /// Base class of a declared type, with generic arguments as written
    ///
    /// Interfaces and unresolvable bases (framework types) end the chain.
    pub fn parent(&self, id: TypeId) -> Option<(TypeId, TypeRef)> {
        let info = self.get(id);
        for base in &info.bases {
            let base_ref = match TypeRef::parse(base) {
                Ok(r) => r,
                Err(_) => continue,
            };
            if let Some(base_id) = self.resolve_ref(&base_ref, info.namespace.as_deref()) {
                let base_info = self.get(base_id);
                if base_info.kind != TypeDeclKind::Interface && base_id != id {
                    return Some((base_id, base_ref));
                }
            }
        }
        None
    }

    /// Ancestor chain, most derived first, starting with `id` itself
    pub fn ancestors(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = vec![id];
        let mut seen: HashSet<TypeId> = HashSet::from([id]);
        let mut current = id;
        while let Some((parent, _)) = self.parent(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// True when `id` derives, directly or transitively, from the mapping
    /// framework's `base_name` (`AutoMapper.Profile`)
    ///
    /// A qualified `AutoMapper.Profile` base is always the framework type. A
    /// bare `Profile` is the framework type unless a declared `Profile` in an
    /// enclosing namespace shadows it, or the file lacks `using AutoMapper;`
    /// and a declared `Profile` elsewhere is what the name resolves to.
    pub fn derives_from(&self, id: TypeId, base_name: &str) -> bool {
        let qualified = format!("{}.{}", FRAMEWORK_NAMESPACE, base_name);
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let info = self.get(current);
            for base in &info.bases {
                let base_ref = match TypeRef::parse(base) {
                    Ok(r) => r,
                    Err(_) => continue,
                };
                let path = base_ref.path_text();
                if path.as_deref() == Some(qualified.as_str()) {
                    return true;
                }
                let bare = path.as_deref() == Some(base_name) && base_ref.generic_args().is_empty();
                if bare {
                    if let Some(shadow) = self.visible_from(base_name, info.namespace.as_deref()) {
                        stack.push(shadow);
                        continue;
                    }
                    if info.imports_framework {
                        return true;
                    }
                }
                match self.resolve_ref(&base_ref, info.namespace.as_deref()) {
                    Some(next) => stack.push(next),
                    None if bare => return true,
                    None => {}
                }
            }
        }
        false
    }

    /// Non-generic type named `simple` declared in `namespace` or one of its
    /// enclosing namespaces, innermost first
    pub(crate) fn visible_from(&self, simple: &str, namespace: Option<&str>) -> Option<TypeId> {
        let ids = self.by_simple.get(simple)?;
        let mut scope = namespace;
        loop {
            let found = ids.iter().copied().find(|id| {
                let info = &self.types[id.0];
                info.type_params.is_empty() && info.namespace.as_deref() == scope
            });
            if found.is_some() {
                return found;
            }
            scope = match scope {
                Some(ns) => ns.rsplit_once('.').map(|(outer, _)| outer),
                None => return None,
            };
        }
    }

    /// Resolve the qualified name of an enclosing type recorded on a chain
    pub fn lookup_qualified(&self, qualified: &str) -> Option<TypeId> {
        self.by_qualified
            .get(qualified)
            .and_then(|ids| ids.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_csharp;

    fn table(sources: &[(&str, &str)]) -> SymbolTable {
        let files: Vec<ParsedFile> = sources
            .iter()
            .map(|(path, src)| parse_csharp(path, src).unwrap())
            .collect();
        SymbolTable::build(&files)
    }

    #[test]
    fn test_partial_classes_merge() {
        let t = table(&[
            ("A.cs", "namespace N { public partial class Person { public string Name { get; set; } } }"),
            ("B.cs", "namespace N { public partial class Person { public int Age { get; set; } } }"),
        ]);
        assert_eq!(t.len(), 1);
        let id = t.resolve("Person", 0, None).unwrap();
        let names: Vec<&str> = t.get(id).members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Age"]);
        assert_eq!(t.get(id).files.len(), 2);
    }

    #[test]
    fn test_ambiguous_simple_name() {
        let t = table(&[
            ("A.cs", "namespace One { public class Item {} }"),
            ("B.cs", "namespace Two { public class Item {} }"),
        ]);
        assert!(t.resolve("Item", 0, None).is_none());
        assert!(t.resolve("One.Item", 0, None).is_some());
        let two = t.resolve("Item", 0, Some("Two")).unwrap();
        assert_eq!(t.get(two).qualified_name, "Two.Item");
    }

    #[test]
    fn test_ancestors_and_profile_detection() {
        let t = table(&[(
            "P.cs",
            r#"
public class Entity { public int Id { get; set; } }
public class Order : Entity, IAuditable { }
public class BaseProfile : Profile { }
public class OrderProfile : BaseProfile { }
"#,
        )]);
        let order = t.resolve("Order", 0, None).unwrap();
        let entity = t.resolve("Entity", 0, None).unwrap();
        assert_eq!(t.ancestors(order), vec![order, entity]);

        let profile = t.resolve("OrderProfile", 0, None).unwrap();
        assert!(t.derives_from(profile, "Profile"));
        assert!(!t.derives_from(order, "Profile"));
    }

    #[test]
    fn test_declared_lookalike_base_is_not_external() {
        let t = table(&[(
            "L.cs",
            "public class Profile { } public class FakeProfile : Profile { }",
        )]);
        let fake = t.resolve("FakeProfile", 0, None).unwrap();
        assert!(!t.derives_from(fake, "Profile"));
    }

    #[test]
    fn test_domain_type_named_profile_does_not_hide_framework_base() {
        let entity = "namespace Shop.Domain { public class Profile { public string Bio { get; set; } } }";
        let t = table(&[
            ("Entity.cs", entity),
            (
                "Mapping.cs",
                "using AutoMapper;\nnamespace Shop.Mapping { public class UserProfile : Profile { } }",
            ),
            (
                "Qualified.cs",
                "namespace Shop.Other { public class OrderProfile : AutoMapper.Profile { } }",
            ),
            ("Plain.cs", "namespace Shop.Other { public class NotMapping : Profile { } }"),
        ]);
        let user = t.resolve("UserProfile", 0, None).unwrap();
        assert!(t.derives_from(user, "Profile"));
        let order = t.resolve("OrderProfile", 0, None).unwrap();
        assert!(t.derives_from(order, "Profile"));
        let plain = t.resolve("NotMapping", 0, None).unwrap();
        assert!(!t.derives_from(plain, "Profile"));
    }

    #[test]
    fn test_enclosing_namespace_profile_shadows_import() {
        let t = table(&[(
            "S.cs",
            "using AutoMapper;\nnamespace Shop { public class Profile { } }\nnamespace Shop.Mapping { public class P : Profile { } }",
        )]);
        let p = t.resolve("P", 0, None).unwrap();
        assert!(!t.derives_from(p, "Profile"));
    }

    #[test]
    fn test_generic_arity() {
        let t = table(&[(
            "G.cs",
            "public class Page<T> { public T Item { get; set; } } public class Page { }",
        )]);
        let generic = t.resolve("Page", 1, None).unwrap();
        let plain = t.resolve("Page", 0, None).unwrap();
        assert_ne!(generic, plain);
        assert_eq!(t.get(generic).type_params, vec!["T".to_string()]);
    }
}
