//! Symbol table construction: string constants and the logger function.
//!
//! A single pass over each file collects every string-constant binding and
//! the name of the method annotated with the logger marker. Bindings are
//! global across all analyzed files: a constant declared in one file can be
//! referenced as a parameter key in another, so the full table is built
//! before call-site extraction begins.

use std::collections::HashMap;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor};

use super::source::{java_language, SourceFile};

/// The marker annotation identifying the event-logging function.
pub const LOGGER_ANNOTATION: &str = "EventLogger";

/// String constants: any declarator initialized with a plain string literal.
/// Declarators initialized with expressions or concatenations do not match;
/// references to those fall back to their raw text at resolution time.
const CONSTANT_QUERY: &str = r#"
(variable_declarator
  name: (identifier) @const_name
  value: (string_literal) @const_value)
"#;

/// Methods carrying an annotation; the annotation name is filtered in code.
const ANNOTATED_METHOD_QUERY: &str = r#"
(method_declaration
  (modifiers
    [
      (marker_annotation name: (identifier) @annotation_name)
      (annotation name: (identifier) @annotation_name)
    ])
  name: (identifier) @method_name)
"#;

/// Symbols collected from one file or merged across many.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Name of the method annotated with [`LOGGER_ANNOTATION`], if any.
    pub logger_fn: Option<String>,
    /// Constant name -> quote-stripped literal value.
    pub constants: HashMap<String, String>,
}

impl SymbolTable {
    /// Merge `other` into `self` with last-seen-wins semantics.
    ///
    /// Later files overwrite earlier ones for both duplicate constant names
    /// and duplicate logger annotations.
    pub fn merge(&mut self, other: SymbolTable) {
        if let Some(name) = other.logger_fn {
            if std::env::var("EVENTSYNC_DEBUG").is_ok() {
                if let Some(prev) = &self.logger_fn {
                    if *prev != name {
                        eprintln!("[debug] logger function {:?} overridden by {:?}", prev, name);
                    }
                }
            }
            self.logger_fn = Some(name);
        }
        self.constants.extend(other.constants);
    }

    /// Resolve a constant reference, falling back to the reference text.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.constants.get(name).map(String::as_str).unwrap_or(name)
    }
}

/// Strip every double-quote character from literal text.
pub fn strip_quotes(text: &str) -> String {
    text.replace('"', "")
}

/// Collect the symbol table for one parsed file.
pub fn collect(file: &SourceFile) -> anyhow::Result<SymbolTable> {
    let mut table = SymbolTable::default();
    let language = java_language();
    let root = file.tree.root_node();

    let const_query = Query::new(&language, CONSTANT_QUERY)?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&const_query, root, &file.source[..]);

    while let Some(m) = matches.next() {
        let mut name = None;
        let mut value = None;

        for capture in m.captures {
            let capture_name = const_query.capture_names()[capture.index as usize];
            match capture_name {
                "const_name" => name = Some(file.node_text(capture.node).to_string()),
                "const_value" => value = Some(strip_quotes(file.node_text(capture.node))),
                _ => {}
            }
        }

        if let (Some(name), Some(value)) = (name, value) {
            table.constants.insert(name, value);
        }
    }

    let method_query = Query::new(&language, ANNOTATED_METHOD_QUERY)?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&method_query, root, &file.source[..]);

    while let Some(m) = matches.next() {
        let mut annotation = None;
        let mut method = None;

        for capture in m.captures {
            let capture_name = method_query.capture_names()[capture.index as usize];
            match capture_name {
                "annotation_name" => annotation = Some(file.node_text(capture.node)),
                "method_name" => method = Some(file.node_text(capture.node).to_string()),
                _ => {}
            }
        }

        if annotation == Some(LOGGER_ANNOTATION) {
            if let Some(method) = method {
                table.logger_fn = Some(method);
            }
        }
    }

    Ok(table)
}
