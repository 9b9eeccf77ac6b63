//! Code parsing via tree-sitter
//!
//! Parses C# source into the pure-data syntax model in [`crate::ast`]:
//! type declarations and `CreateMap` invocation chains.

mod csharp;
mod typeref;

use crate::ast::Span;
use crate::error::{Error, Result};
use tree_sitter::{Node, Parser};

pub use csharp::parse_csharp;
pub use typeref::TypeRef;

/// Get raw tree-sitter S-expression for C# source code
///
/// Useful for debugging what tree-sitter sees vs what mapcheck extracts.
pub fn to_sexp(source: &str) -> Result<String> {
    let mut parser = new_parser()?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::CodeParse("Failed to parse source".into()))?;
    Ok(tree.root_node().to_sexp())
}

/// True for paths mapcheck should analyze
pub fn is_csharp_path(path: &str) -> bool {
    path.rsplit('.').next() == Some("cs") && path.contains('.')
}

pub(crate) fn new_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|e| Error::CodeParse(format!("Failed to set language: {}", e)))?;
    Ok(parser)
}

/// Convert tree-sitter Node position to Span
pub(crate) fn node_span(node: Node) -> Span {
    Span {
        start_line: node.start_position().row + 1,
        start_col: node.start_position().column,
        end_line: node.end_position().row + 1,
        end_col: node.end_position().column,
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

/// Span from the end of `receiver` to the end of `call`
pub(crate) fn trailing_span(receiver: Node, call: Node) -> Span {
    Span {
        start_line: receiver.end_position().row + 1,
        start_col: receiver.end_position().column,
        end_line: call.end_position().row + 1,
        end_col: call.end_position().column,
        start_byte: receiver.end_byte(),
        end_byte: call.end_byte(),
    }
}

pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sexp_contains_invocation() {
        let sexp = to_sexp("class P { P() { CreateMap<A, B>(); } }").unwrap();
        assert!(sexp.contains("invocation_expression"));
    }

    #[test]
    fn test_is_csharp_path() {
        assert!(is_csharp_path("src/Profiles/OrderProfile.cs"));
        assert!(!is_csharp_path("README.md"));
        assert!(!is_csharp_path("cs"));
    }
}
