//! Type descriptors
//!
//! A normalized, immutable view of a type as the rules see it: nullability,
//! built-in classification, collection shape and the declared type behind it.

use crate::parse::TypeRef;
use crate::symbols::{SymbolTable, TypeId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types treated as simple scalars
pub const BUILTIN_TYPES: &[&str] = &[
    "bool",
    "byte",
    "sbyte",
    "short",
    "ushort",
    "int",
    "uint",
    "long",
    "ulong",
    "nint",
    "nuint",
    "float",
    "double",
    "decimal",
    "char",
    "string",
    "object",
    "DateTime",
    "DateTimeOffset",
    "DateOnly",
    "TimeOnly",
    "TimeSpan",
    "Guid",
    "Uri",
];

const REFERENCE_BUILTINS: &[&str] = &["string", "object", "Uri"];

/// Container shape of a collection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// `T[]`
    Array,
    /// `List<T>`, `IList<T>`, `ICollection<T>`, `IReadOnlyList<T>`, ...
    List,
    /// `IEnumerable<T>`, `IQueryable<T>`
    Sequence,
    /// `HashSet<T>`, `ISet<T>`, `SortedSet<T>`
    Set,
    /// `Dictionary<K, V>` and its interfaces
    Dictionary,
    Queue,
    Stack,
}

impl CollectionKind {
    /// Classify a generic type name, given its arity
    pub fn classify(simple_name: &str, arity: usize) -> Option<CollectionKind> {
        let kind = match simple_name {
            "List" | "IList" | "ICollection" | "IReadOnlyList" | "IReadOnlyCollection"
            | "Collection" | "ReadOnlyCollection" | "ObservableCollection" | "LinkedList"
            | "ImmutableList" | "ImmutableArray" => CollectionKind::List,
            "IEnumerable" | "IQueryable" | "IOrderedEnumerable" => CollectionKind::Sequence,
            "HashSet" | "ISet" | "SortedSet" | "IReadOnlySet" | "ImmutableHashSet" => {
                CollectionKind::Set
            }
            "Dictionary" | "IDictionary" | "IReadOnlyDictionary" | "SortedDictionary"
            | "ConcurrentDictionary" | "ImmutableDictionary" => CollectionKind::Dictionary,
            "Queue" | "ConcurrentQueue" => CollectionKind::Queue,
            "Stack" | "ConcurrentStack" => CollectionKind::Stack,
            _ => return None,
        };
        let expected = if kind == CollectionKind::Dictionary { 2 } else { 1 };
        (arity == expected).then_some(kind)
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, CollectionKind::Array | CollectionKind::List)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CollectionKind::Array => "array",
            CollectionKind::List => "list",
            CollectionKind::Sequence => "sequence",
            CollectionKind::Set => "set",
            CollectionKind::Dictionary => "dictionary",
            CollectionKind::Queue => "queue",
            CollectionKind::Stack => "stack",
        };
        write!(f, "{}", s)
    }
}

/// Collection shape and element type
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub kind: CollectionKind,
    /// Element type; the value type for dictionaries
    pub element: Box<TypeDescriptor>,
    /// Key type for dictionaries
    pub key: Option<Box<TypeDescriptor>>,
}

/// Normalized description of a type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Canonical spelling (`int?`, `List<Address>`)
    pub name: String,
    /// Identity: declared types by qualified name (`Shop.Address`)
    pub key: String,
    pub type_ref: TypeRef,
    /// `T?` for either value or annotated reference types
    pub nullable: bool,
    /// `Nullable<T>` over a value type
    pub nullable_value_type: bool,
    pub value_type: bool,
    pub builtin: bool,
    pub is_enum: bool,
    pub collection: Option<CollectionInfo>,
    /// Declared type backing this descriptor, if it is a user type
    pub type_id: Option<TypeId>,
    /// False for unbound generic parameters and names nothing declares
    pub resolved: bool,
    underlying: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// Describe a type reference in the context of a namespace
    pub fn describe(type_ref: &TypeRef, table: &SymbolTable, namespace: Option<&str>) -> TypeDescriptor {
        match type_ref {
            TypeRef::Nullable(inner) => {
                let underlying = TypeDescriptor::describe(inner, table, namespace);
                TypeDescriptor {
                    name: type_ref.to_string(),
                    key: format!("{}?", underlying.key),
                    type_ref: type_ref.clone(),
                    nullable: true,
                    nullable_value_type: underlying.value_type,
                    value_type: underlying.value_type,
                    builtin: underlying.builtin,
                    is_enum: underlying.is_enum,
                    collection: underlying.collection.clone(),
                    type_id: underlying.type_id,
                    resolved: underlying.resolved,
                    underlying: Some(Box::new(underlying)),
                }
            }
            TypeRef::Array { element, rank } => {
                let element = TypeDescriptor::describe(element, table, namespace);
                TypeDescriptor {
                    key: format!("{}[{}]", element.key, ",".repeat(rank.saturating_sub(1))),
                    resolved: element.resolved,
                    collection: Some(CollectionInfo {
                        kind: CollectionKind::Array,
                        element: Box::new(element),
                        key: None,
                    }),
                    ..TypeDescriptor::plain(type_ref)
                }
            }
            TypeRef::Tuple(items) => {
                let items: Vec<TypeDescriptor> = items
                    .iter()
                    .map(|i| TypeDescriptor::describe(i, table, namespace))
                    .collect();
                TypeDescriptor {
                    key: format!("({})", join_keys(&items)),
                    value_type: true,
                    resolved: items.iter().all(|i| i.resolved),
                    ..TypeDescriptor::plain(type_ref)
                }
            }
            TypeRef::Named { path, args } => {
                let simple = path.last().map(String::as_str).unwrap_or("");

                if args.is_empty()
                    && (path.len() == 1 || path[0] == "System")
                    && BUILTIN_TYPES.contains(&simple)
                {
                    return TypeDescriptor {
                        value_type: !REFERENCE_BUILTINS.contains(&simple),
                        builtin: true,
                        resolved: true,
                        name: simple.to_string(),
                        key: simple.to_string(),
                        ..TypeDescriptor::plain(type_ref)
                    };
                }

                let arg_descriptors: Vec<TypeDescriptor> = args
                    .iter()
                    .map(|a| TypeDescriptor::describe(a, table, namespace))
                    .collect();
                let args_resolved = arg_descriptors.iter().all(|a| a.resolved);
                let args_key = if arg_descriptors.is_empty() {
                    String::new()
                } else {
                    format!("<{}>", join_keys(&arg_descriptors))
                };

                if let Some(kind) = CollectionKind::classify(simple, args.len()) {
                    let mut arg_descriptors = arg_descriptors.into_iter();
                    let (key, element) = if kind == CollectionKind::Dictionary {
                        (arg_descriptors.next().map(Box::new), arg_descriptors.next())
                    } else {
                        (None, arg_descriptors.next())
                    };
                    let element = match element {
                        Some(e) => e,
                        None => return TypeDescriptor::plain(type_ref),
                    };
                    return TypeDescriptor {
                        key: format!("{}{}", simple, args_key),
                        resolved: args_resolved,
                        collection: Some(CollectionInfo {
                            kind,
                            element: Box::new(element),
                            key,
                        }),
                        ..TypeDescriptor::plain(type_ref)
                    };
                }

                match table.resolve_ref(type_ref, namespace) {
                    Some(id) => {
                        let info = table.get(id);
                        TypeDescriptor {
                            key: format!("{}{}", info.qualified_name, args_key),
                            value_type: info.is_value_type(),
                            is_enum: info.is_enum(),
                            type_id: Some(id),
                            resolved: args_resolved,
                            ..TypeDescriptor::plain(type_ref)
                        }
                    }
                    None => TypeDescriptor::plain(type_ref),
                }
            }
        }
    }

    fn plain(type_ref: &TypeRef) -> TypeDescriptor {
        TypeDescriptor {
            name: type_ref.to_string(),
            key: type_ref.to_string(),
            type_ref: type_ref.clone(),
            nullable: false,
            nullable_value_type: false,
            value_type: false,
            builtin: false,
            is_enum: false,
            collection: None,
            type_id: None,
            resolved: false,
            underlying: None,
        }
    }

    /// The non-nullable descriptor; `self` when not nullable
    pub fn underlying(&self) -> &TypeDescriptor {
        match &self.underlying {
            Some(inner) => inner,
            None => self,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.collection.is_some()
    }

    /// User-declared, non-enum, non-collection type
    pub fn is_complex(&self) -> bool {
        !self.builtin && !self.is_enum && self.collection.is_none() && self.type_id.is_some()
    }

    /// Element type of a collection; `None` for non-collections
    pub fn element(&self) -> Option<&TypeDescriptor> {
        self.underlying()
            .collection
            .as_ref()
            .map(|c| c.element.as_ref())
    }

    /// Innermost element of nested collections (`List<int[]>` → `int`)
    pub fn innermost_element(&self) -> Option<&TypeDescriptor> {
        let mut current = self.element()?;
        while let Some(next) = current.element() {
            current = next;
        }
        Some(current)
    }

    pub fn collection_kind(&self) -> Option<CollectionKind> {
        self.underlying().collection.as_ref().map(|c| c.kind)
    }

    /// Same underlying type, ignoring nullability
    pub fn same_underlying(&self, other: &TypeDescriptor) -> bool {
        self.underlying().key == other.underlying().key
    }

    /// Spelling used in generated code (`Address`, `int`)
    pub fn code_name(&self) -> String {
        self.type_ref.to_string()
    }
}

fn join_keys(items: &[TypeDescriptor]) -> String {
    items
        .iter()
        .map(|i| i.key.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(text: &str) -> TypeDescriptor {
        let table = SymbolTable::default();
        TypeDescriptor::describe(&TypeRef::parse(text).unwrap(), &table, None)
    }

    #[test]
    fn test_builtin_and_nullable() {
        let d = describe("int?");
        assert!(d.nullable);
        assert!(d.nullable_value_type);
        assert!(d.builtin);
        assert_eq!(d.underlying().name, "int");
        assert!(!d.underlying().nullable);

        let s = describe("string?");
        assert!(s.nullable);
        assert!(!s.nullable_value_type);

        let g = describe("System.Guid");
        assert!(g.builtin);
        assert_eq!(g.name, "Guid");
    }

    #[test]
    fn test_collections() {
        let list = describe("List<string>");
        assert_eq!(list.collection_kind(), Some(CollectionKind::List));
        assert_eq!(list.element().unwrap().name, "string");

        let nested = describe("List<int[]>");
        assert_eq!(nested.element().unwrap().collection_kind(), Some(CollectionKind::Array));
        assert_eq!(nested.innermost_element().unwrap().name, "int");

        let dict = describe("Dictionary<string, int>");
        assert_eq!(dict.collection_kind(), Some(CollectionKind::Dictionary));
        assert_eq!(dict.element().unwrap().name, "int");

        assert!(!describe("string").is_collection());
    }

    #[test]
    fn test_unknown_name_unresolved() {
        let d = describe("Widget");
        assert!(!d.resolved);
        assert!(!d.is_complex());
    }
}
