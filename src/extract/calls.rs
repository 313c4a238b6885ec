//! Call-site extraction: logger invocations -> [`EventRecord`]s.
//!
//! Finds every invocation of the logger function, takes the literal first
//! argument as the event name, and searches the remaining argument subtrees
//! for nested parameter-setter calls. Parameter keys that are bare
//! references resolve through the global constant table.
//!
//! Extraction is best-effort: a call site with a missing or non-literal
//! event name is skipped, never an error. Only the total absence of a
//! logger function is fatal, and that is the orchestrator's concern.

use tree_sitter::Node;

use super::source::SourceFile;
use super::symbols::{strip_quotes, SymbolTable};
use super::EventRecord;

/// The closed set of parameter-setter names. One entry per value type the
/// event payload supports; the set is not user-configurable.
pub const SETTER_NAMES: &[&str] = &["putString", "putInt", "putDouble", "putLong"];

/// Extract every logger call site in `file`, in source order.
pub fn extract_calls(
    file: &SourceFile,
    logger_fn: &str,
    symbols: &SymbolTable,
) -> Vec<EventRecord> {
    let mut call_sites = Vec::new();
    collect_logger_calls(file, file.tree.root_node(), logger_fn, &mut call_sites);

    call_sites
        .into_iter()
        .filter_map(|call| extract_call_site(file, call, symbols))
        .collect()
}

/// Depth-first walk collecting invocations of the logger function.
fn collect_logger_calls<'a>(
    file: &SourceFile,
    node: Node<'a>,
    logger_fn: &str,
    out: &mut Vec<Node<'a>>,
) {
    if node.kind() == "method_invocation" && callee_name(file, node) == Some(logger_fn) {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_logger_calls(file, child, logger_fn, out);
    }
}

/// The simple name an invocation calls, regardless of receiver.
fn callee_name<'a>(file: &'a SourceFile, call: Node) -> Option<&'a str> {
    call.child_by_field_name("name")
        .map(|name| file.node_text(name))
}

/// Build one [`EventRecord`] from a logger invocation, or `None` if the
/// first argument is absent or not a plain string literal.
fn extract_call_site(
    file: &SourceFile,
    call: Node,
    symbols: &SymbolTable,
) -> Option<EventRecord> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let arg_nodes: Vec<Node> = args
        .named_children(&mut cursor)
        .filter(|n| !matches!(n.kind(), "line_comment" | "block_comment"))
        .collect();

    let first = arg_nodes.first()?;
    if first.kind() != "string_literal" {
        return None;
    }
    let name = strip_quotes(file.node_text(*first));
    if name.is_empty() {
        return None;
    }

    // Setters are keyed by the position of their name token so that both
    // chained-builder and initializer-block styles report parameters in
    // declaration order.
    let mut keyed: Vec<(usize, String)> = Vec::new();
    for arg in arg_nodes.iter().skip(1) {
        collect_setters(file, *arg, symbols, &mut keyed);
    }
    keyed.sort_by_key(|(pos, _)| *pos);

    Some(EventRecord {
        name,
        parameters: keyed.into_iter().map(|(_, key)| key).collect(),
    })
}

/// Recursively find setter invocations anywhere inside `node`.
fn collect_setters(
    file: &SourceFile,
    node: Node,
    symbols: &SymbolTable,
    out: &mut Vec<(usize, String)>,
) {
    if node.kind() == "method_invocation" {
        if let Some(name_node) = node.child_by_field_name("name") {
            if SETTER_NAMES.contains(&file.node_text(name_node)) {
                if let Some(args) = node.child_by_field_name("arguments") {
                    let mut cursor = args.walk();
                    let first = args.named_children(&mut cursor).next();
                    if let Some(key) = first {
                        out.push((name_node.start_byte(), resolve_key(file, key, symbols)));
                    }
                }
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_setters(file, child, symbols, out);
    }
}

/// Resolve a setter's key expression to the parameter name it declares.
///
/// A bare identifier resolves through the constant table, falling back to
/// its own text; anything else is captured as quote-stripped literal text.
fn resolve_key(file: &SourceFile, key: Node, symbols: &SymbolTable) -> String {
    if key.kind() == "identifier" {
        symbols.resolve(file.node_text(key)).to_string()
    } else {
        strip_quotes(file.node_text(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::source::parse_java;
    use crate::extract::symbols;
    use std::path::Path;

    fn extract(source: &str) -> Vec<EventRecord> {
        let parsed = parse_java(Path::new("Test.java"), source.as_bytes()).unwrap();
        let table = symbols::collect(&parsed).unwrap();
        let logger = table.logger_fn.clone().expect("fixture declares a logger");
        extract_calls(&parsed, &logger, &table)
    }

    #[test]
    fn test_builder_chain_parameters_in_source_order() {
        let events = extract(
            r#"
public class Screen {
    private static final String SOME_PARAM_NAME = "example_reference";

    void track(String a, int b, double c, long d) {
        logEvent(
            "your_event_name",
            new EventParams()
                .putString(SOME_PARAM_NAME, a)
                .putString("example_string", a)
                .putInt("example_int", b)
                .putDouble("example_double", c)
                .putLong("example_long", d));
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "your_event_name");
        assert_eq!(
            events[0].parameters,
            vec![
                "example_reference",
                "example_string",
                "example_int",
                "example_double",
                "example_long"
            ]
        );
    }

    #[test]
    fn test_initializer_block_style() {
        let events = extract(
            r#"
public class Screen {
    void track(String a, int b) {
        logEvent("block_event", new EventParams() {{
            putString("first", a);
            putInt("second", b);
        }});
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].parameters, vec!["first", "second"]);
    }

    #[test]
    fn test_zero_parameter_event_yields_empty_list() {
        let events = extract(
            r#"
public class Screen {
    void track() {
        logEvent("bare_event", new EventParams());
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "bare_event");
        assert!(events[0].parameters.is_empty());
    }

    #[test]
    fn test_non_literal_event_name_skips_call_site() {
        let events = extract(
            r#"
public class Screen {
    void track(String dynamic) {
        logEvent(dynamic, new EventParams().putString("ignored", dynamic));
        logEvent("kept_event", new EventParams());
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "kept_event");
    }

    #[test]
    fn test_unresolved_reference_falls_back_to_identifier_text() {
        let events = extract(
            r#"
public class Screen {
    void track(String a) {
        logEvent("fallback_event", new EventParams().putString(NOT_DECLARED_HERE, a));
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        assert_eq!(events[0].parameters, vec!["NOT_DECLARED_HERE"]);
    }

    #[test]
    fn test_qualified_reference_is_captured_as_text() {
        let events = extract(
            r#"
public class Screen {
    void track(String a) {
        logEvent("qualified_event", new EventParams().putString(Keys.SCREEN, a));
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        assert_eq!(events[0].parameters, vec!["Keys.SCREEN"]);
    }

    #[test]
    fn test_multiple_call_sites_in_source_order() {
        let events = extract(
            r#"
public class Screen {
    void first() {
        logEvent("event_one", new EventParams().putString("a", "x"));
    }

    void second() {
        logEvent("event_two", new EventParams().putInt("b", 1));
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["event_one", "event_two"]);
    }

    #[test]
    fn test_unrelated_calls_are_ignored() {
        let events = extract(
            r#"
public class Screen {
    void track(java.util.Map<String, String> map) {
        map.put("not_a_setter", "x");
        otherCall("not_an_event");
        logEvent("real_event", new EventParams());
    }

    void otherCall(String s) {}

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "real_event");
    }
}
