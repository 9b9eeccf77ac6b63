//! C# type syntax
//!
//! Parses type text as it appears in declarations and generic arguments
//! (`int?`, `List<Order>`, `int[][]`, `global::System.Guid`, `(int Id, string Name)`)
//! into a small tree that the symbol layer can resolve.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// A parsed type reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Possibly qualified, possibly generic name
    Named { path: Vec<String>, args: Vec<TypeRef> },
    /// `T[]`, `T[,]`
    Array { element: Box<TypeRef>, rank: usize },
    /// `T?` or `Nullable<T>`
    Nullable(Box<TypeRef>),
    /// `(A, B)`
    Tuple(Vec<TypeRef>),
}

impl TypeRef {
    pub fn parse(text: &str) -> Result<TypeRef> {
        let tokens = tokenize(text)?;
        let mut parser = TypeParser { tokens, pos: 0 };
        let ty = parser.parse_type()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::TypeSyntax(format!(
                "unexpected trailing input in '{}'",
                text
            )));
        }
        Ok(ty.normalize())
    }

    pub fn named(name: &str) -> TypeRef {
        TypeRef::Named {
            path: name.split('.').map(str::to_string).collect(),
            args: Vec::new(),
        }
    }

    /// Last path segment for named types (`Guid` for `System.Guid`)
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { path, .. } => path.last().map(String::as_str),
            _ => None,
        }
    }

    /// Dotted path for named types
    pub fn path_text(&self) -> Option<String> {
        match self {
            TypeRef::Named { path, .. } => Some(path.join(".")),
            _ => None,
        }
    }

    pub fn generic_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    /// The type without a `?` / `Nullable<>` wrapper
    pub fn strip_nullable(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Replace generic parameter names with concrete arguments
    pub fn substitute(&self, bindings: &HashMap<String, TypeRef>) -> TypeRef {
        match self {
            TypeRef::Named { path, args } if path.len() == 1 && args.is_empty() => {
                match bindings.get(&path[0]) {
                    Some(bound) => bound.clone(),
                    None => self.clone(),
                }
            }
            TypeRef::Named { path, args } => TypeRef::Named {
                path: path.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            TypeRef::Array { element, rank } => TypeRef::Array {
                element: Box::new(element.substitute(bindings)),
                rank: *rank,
            },
            TypeRef::Nullable(inner) => {
                let inner = inner.substitute(bindings);
                // `T?` with T bound to `int?` stays singly wrapped
                if inner.is_nullable() {
                    inner
                } else {
                    TypeRef::Nullable(Box::new(inner))
                }
            }
            TypeRef::Tuple(items) => {
                TypeRef::Tuple(items.iter().map(|i| i.substitute(bindings)).collect())
            }
        }
    }

    /// Canonicalize framework spellings (`System.Int32` → `int`,
    /// `Nullable<T>` → `T?`, `global::` prefixes dropped)
    fn normalize(self) -> TypeRef {
        match self {
            TypeRef::Named { path, args } => {
                let mut args: Vec<TypeRef> = args.into_iter().map(TypeRef::normalize).collect();
                let mut path: Vec<String> = path;
                if path.len() > 1 && path[0] == "global" {
                    path.remove(0);
                }
                if path.first().map(String::as_str) == Some("System") && path.len() == 2 {
                    if let Some(alias) = keyword_alias(&path[1]) {
                        path = vec![alias.to_string()];
                    }
                } else if path.len() == 1 {
                    if let Some(alias) = keyword_alias(&path[0]) {
                        path = vec![alias.to_string()];
                    }
                }
                let last = path.last().map(String::as_str).unwrap_or("");
                if last == "Nullable" && args.len() == 1 {
                    let inner = args.remove(0);
                    return TypeRef::Nullable(Box::new(inner));
                }
                TypeRef::Named { path, args }
            }
            TypeRef::Array { element, rank } => TypeRef::Array {
                element: Box::new(element.normalize()),
                rank,
            },
            TypeRef::Nullable(inner) => TypeRef::Nullable(Box::new(inner.normalize())),
            TypeRef::Tuple(items) => {
                TypeRef::Tuple(items.into_iter().map(TypeRef::normalize).collect())
            }
        }
    }
}

/// `Int32` → `int` and friends
fn keyword_alias(name: &str) -> Option<&'static str> {
    Some(match name {
        "String" => "string",
        "Boolean" => "bool",
        "Byte" => "byte",
        "SByte" => "sbyte",
        "Int16" => "short",
        "UInt16" => "ushort",
        "Int32" => "int",
        "UInt32" => "uint",
        "Int64" => "long",
        "UInt64" => "ulong",
        "Single" => "float",
        "Double" => "double",
        "Decimal" => "decimal",
        "Char" => "char",
        "Object" => "object",
        _ => return None,
    })
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { path, args } => {
                write!(f, "{}", path.join("."))?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::Array { element, rank } => {
                write!(f, "{}[{}]", element, ",".repeat(rank.saturating_sub(1)))
            }
            TypeRef::Nullable(inner) => write!(f, "{}?", inner),
            TypeRef::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Dot,
    Lt,
    Gt,
    Comma,
    Question,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Star,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                // global::System.Int32: the alias qualifier acts like a dot
                tokens.push(Token::Dot);
                i += 2;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            c if c.is_alphanumeric() || c == '_' || c == '@' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '@')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.trim_start_matches('@').to_string()));
            }
            other => {
                return Err(Error::TypeSyntax(format!(
                    "unexpected character '{}' in '{}'",
                    other, text
                )))
            }
        }
    }
    Ok(tokens)
}

struct TypeParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl TypeParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            other => Err(Error::TypeSyntax(format!(
                "expected {:?}, found {:?}",
                expected, other
            ))),
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        let mut ty = match self.peek() {
            Some(Token::LParen) => self.parse_tuple()?,
            Some(Token::Ident(_)) => self.parse_named()?,
            other => {
                return Err(Error::TypeSyntax(format!(
                    "expected type, found {:?}",
                    other
                )))
            }
        };

        loop {
            match self.peek() {
                Some(Token::Question) => {
                    self.pos += 1;
                    if !ty.is_nullable() {
                        ty = TypeRef::Nullable(Box::new(ty));
                    }
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let mut rank = 1;
                    while let Some(Token::Comma) = self.peek() {
                        self.pos += 1;
                        rank += 1;
                    }
                    self.expect(Token::RBracket)?;
                    ty = TypeRef::Array {
                        element: Box::new(ty),
                        rank,
                    };
                }
                Some(Token::Star) => {
                    // Pointers are opaque for mapping purposes
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Ok(ty)
    }

    fn parse_named(&mut self) -> Result<TypeRef> {
        let mut path = Vec::new();
        let mut args = Vec::new();
        loop {
            match self.next() {
                Some(Token::Ident(name)) => path.push(name),
                other => {
                    return Err(Error::TypeSyntax(format!(
                        "expected identifier, found {:?}",
                        other
                    )))
                }
            }
            if let Some(Token::Lt) = self.peek() {
                self.pos += 1;
                loop {
                    // Open generic `List<>` has no arguments
                    if let Some(Token::Gt) = self.peek() {
                        break;
                    }
                    if let Some(Token::Comma) = self.peek() {
                        self.pos += 1;
                        continue;
                    }
                    args.push(self.parse_type()?);
                    match self.peek() {
                        Some(Token::Comma) => self.pos += 1,
                        _ => break,
                    }
                }
                self.expect(Token::Gt)?;
            }
            match self.peek() {
                Some(Token::Dot) => self.pos += 1,
                _ => break,
            }
        }
        Ok(TypeRef::Named { path, args })
    }

    fn parse_tuple(&mut self) -> Result<TypeRef> {
        self.expect(Token::LParen)?;
        let mut items = Vec::new();
        loop {
            items.push(self.parse_type()?);
            // Optional element name: `(int Id, string Name)`
            if let Some(Token::Ident(_)) = self.peek() {
                self.pos += 1;
            }
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                other => {
                    return Err(Error::TypeSyntax(format!(
                        "expected ',' or ')' in tuple, found {:?}",
                        other
                    )))
                }
            }
        }
        Ok(TypeRef::Tuple(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generic_nullable() {
        let ty = TypeRef::parse("List<int?>").unwrap();
        assert_eq!(ty.simple_name(), Some("List"));
        assert!(ty.generic_args()[0].is_nullable());
        assert_eq!(ty.to_string(), "List<int?>");
    }

    #[test]
    fn test_normalize_framework_names() {
        assert_eq!(TypeRef::parse("System.Int32").unwrap().to_string(), "int");
        assert_eq!(
            TypeRef::parse("Nullable<System.Guid>").unwrap().to_string(),
            "System.Guid?"
        );
        assert_eq!(
            TypeRef::parse("global::System.String").unwrap().to_string(),
            "string"
        );
        assert_eq!(
            TypeRef::parse("global::AutoMapper.Profile").unwrap().path_text().as_deref(),
            Some("AutoMapper.Profile")
        );
    }

    #[test]
    fn test_parse_arrays_and_tuples() {
        let jagged = TypeRef::parse("int[][]").unwrap();
        assert_eq!(jagged.to_string(), "int[][]");
        let multi = TypeRef::parse("string[,]").unwrap();
        assert!(matches!(multi, TypeRef::Array { rank: 2, .. }));
        let tuple = TypeRef::parse("(int Id, string Name)").unwrap();
        assert_eq!(tuple.to_string(), "(int, string)");
    }

    #[test]
    fn test_substitute_generic_parameter() {
        let ty = TypeRef::parse("List<T>").unwrap();
        let mut bindings = HashMap::new();
        bindings.insert("T".to_string(), TypeRef::named("Order"));
        assert_eq!(ty.substitute(&bindings).to_string(), "List<Order>");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(TypeRef::parse("List<int").is_err());
        assert!(TypeRef::parse("=>").is_err());
    }
}
