//! Tree-sitter parse glue for the analyzed Java sources.

use std::path::Path;

use tree_sitter::{Language, Parser};

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// The tree and source are kept together so later passes can extract
/// node text without re-parsing.
pub struct SourceFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl SourceFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// The Java grammar used for all parsing in this crate.
pub fn java_language() -> Language {
    tree_sitter_java::LANGUAGE.into()
}

/// Parse Java source into a [`SourceFile`].
///
/// Returns an error only if parsing fails completely. Partial parse
/// errors still yield a valid tree with ERROR nodes; extraction degrades
/// to best-effort on those.
pub fn parse_java(path: &Path, source: &[u8]) -> anyhow::Result<SourceFile> {
    let mut parser = Parser::new();
    parser.set_language(&java_language())?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("failed to parse Java source: {}", path.display()))?;

    Ok(SourceFile {
        tree,
        source: source.to_vec(),
        path: path.to_string_lossy().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_java() {
        let source = b"public class Foo { void bar() {} }";
        let parsed = parse_java(Path::new("Foo.java"), source).unwrap();
        assert_eq!(parsed.tree.root_node().kind(), "program");
        assert!(!parsed.tree.root_node().has_error());
    }

    #[test]
    fn test_parse_broken_java_still_yields_tree() {
        let source = b"public class Foo { void bar( {";
        let parsed = parse_java(Path::new("Foo.java"), source).unwrap();
        assert!(parsed.tree.root_node().has_error());
    }
}
