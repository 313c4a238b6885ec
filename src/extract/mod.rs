//! Static extraction of analytics events from Java sources.
//!
//! Extraction runs in two passes. The first pass builds a symbol table
//! across every file: string-constant bindings plus the name of the one
//! method annotated with `@EventLogger`. The second pass walks each file's
//! call sites with the merged table, so constants declared in one file
//! resolve when referenced from another.

mod calls;
mod source;
mod symbols;

pub use calls::{extract_calls, SETTER_NAMES};
pub use source::{parse_java, SourceFile};
pub use symbols::{strip_quotes, SymbolTable, LOGGER_ANNOTATION};

use rayon::prelude::*;

/// One extracted analytics event.
///
/// Identity is the event name; parameter keys keep declaration order and
/// may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub name: String,
    pub parameters: Vec<String>,
}

/// Pluggable extraction seam.
///
/// [`DefaultExtractor`] is the concrete implementation; callers that parse
/// events out of other shapes of source can supply their own.
pub trait EventExtractor {
    fn extract(&self, files: &[SourceFile]) -> anyhow::Result<Vec<EventRecord>>;
}

/// The standard two-pass extractor.
#[derive(Debug, Default)]
pub struct DefaultExtractor;

impl EventExtractor for DefaultExtractor {
    fn extract(&self, files: &[SourceFile]) -> anyhow::Result<Vec<EventRecord>> {
        let mut table = SymbolTable::default();
        for file in files {
            table.merge(symbols::collect(file)?);
        }

        let logger_fn = table.logger_fn.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "no method annotated with @{} was found; annotate the method that \
                 logs analytics events with @{}",
                LOGGER_ANNOTATION,
                LOGGER_ANNOTATION
            )
        })?;

        if std::env::var("EVENTSYNC_DEBUG").is_ok() {
            eprintln!(
                "[debug] logger function {:?}, {} constant bindings",
                logger_fn,
                table.constants.len()
            );
        }

        // Per-file extraction is independent once the table is built; the
        // order-preserving collect keeps file-then-call-site order.
        let events: Vec<Vec<EventRecord>> = files
            .par_iter()
            .map(|file| extract_calls(file, &logger_fn, &table))
            .collect();

        Ok(events.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(name: &str, source: &str) -> SourceFile {
        parse_java(Path::new(name), source.as_bytes()).unwrap()
    }

    #[test]
    fn test_extraction_without_logger_is_an_error() {
        let files = vec![parse(
            "Plain.java",
            "public class Plain { void f() { helper(\"x\"); } void helper(String s) {} }",
        )];

        let err = DefaultExtractor.extract(&files).unwrap_err();
        assert!(err.to_string().contains("@EventLogger"));
    }

    #[test]
    fn test_constants_resolve_across_files() {
        let constants = parse(
            "Keys.java",
            r#"
public class Keys {
    static final String SHARED_KEY = "shared_value";
}
"#,
        );
        let usage = parse(
            "Screen.java",
            r#"
public class Screen {
    void track(String a) {
        logEvent("cross_file_event", new EventParams().putString(SHARED_KEY, a));
    }

    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );

        let events = DefaultExtractor.extract(&[constants, usage]).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].parameters, vec!["shared_value"]);
    }

    #[test]
    fn test_logger_found_in_one_file_applies_to_all() {
        let logger = parse(
            "Analytics.java",
            r#"
public class Analytics {
    @EventLogger
    void logEvent(String eventName, EventParams params) {}
}
"#,
        );
        let caller = parse(
            "Screen.java",
            r#"
public class Screen {
    void track() {
        logEvent("remote_logger_event", new EventParams());
    }
}
"#,
        );

        let events = DefaultExtractor.extract(&[logger, caller]).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "remote_logger_event");
    }

    #[test]
    fn test_full_scenario_single_file() {
        let file = parse(
            "Sample.java",
            r#"
public class Sample {
    private static final String SOME_PARAM_NAME = "example_reference";

    void example(String example1, int example2, double example3, long example4) {
        sampleEventLogger(
            "your_event_name",
            new EventParams()
                .putString(SOME_PARAM_NAME, example1)
                .putString("example_string", example1)
                .putInt("example_int", example2)
                .putDouble("example_double", example3)
                .putLong("example_long", example4));
    }

    void someOtherExample(String example) {
        sampleEventLogger(
            "your_other_event_name",
            new EventParams().putString("another_param_name", example));
    }

    void exampleWithNoParameters() {
        sampleEventLogger("your_no_params_event_name", new EventParams());
    }

    @EventLogger
    private void sampleEventLogger(String eventName, EventParams params) {}
}
"#,
        );

        let events = DefaultExtractor.extract(&[file]).unwrap();

        assert_eq!(
            events,
            vec![
                EventRecord {
                    name: "your_event_name".to_string(),
                    parameters: vec![
                        "example_reference".to_string(),
                        "example_string".to_string(),
                        "example_int".to_string(),
                        "example_double".to_string(),
                        "example_long".to_string(),
                    ],
                },
                EventRecord {
                    name: "your_other_event_name".to_string(),
                    parameters: vec!["another_param_name".to_string()],
                },
                EventRecord {
                    name: "your_no_params_event_name".to_string(),
                    parameters: vec![],
                },
            ]
        );
    }
}
