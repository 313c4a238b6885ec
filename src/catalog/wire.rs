//! Request and response shapes for the Notion wire format.
//!
//! Only the slices of the API the reconciler depends on are modeled:
//! database query pagination, page creation, page patching, and archival.
//! Rows are decoded through the *configured* column names, so the
//! property maps stay untyped until lookup.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CatalogError, RemoteEntry};
use crate::extract::EventRecord;

#[derive(Debug, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<PageResult>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageResult {
    pub id: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TitleProperty {
    pub title: Vec<RichText>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextProperty {
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct InsertPageRequest {
    pub parent: Parent,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct Parent {
    pub database_id: String,
}

#[derive(Debug, Serialize)]
pub struct PatchPageRequest {
    pub properties: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ArchivePageRequest {
    pub archived: bool,
}

/// Build the properties map for inserting or updating `record`.
///
/// The event name becomes the title property; parameters render as one
/// `- <key>` line each in a single rich-text block.
pub fn event_properties(
    record: &EventRecord,
    event_column: &str,
    parameters_column: &str,
) -> Map<String, Value> {
    let title = TitleProperty {
        title: vec![RichText {
            text: TextContent {
                content: record.name.clone(),
            },
        }],
    };

    let lines = record
        .parameters
        .iter()
        .map(|key| format!("- {}", key))
        .collect::<Vec<_>>()
        .join("\n");
    let parameters = TextProperty {
        rich_text: vec![RichText {
            text: TextContent { content: lines },
        }],
    };

    let mut properties = Map::new();
    properties.insert(
        event_column.to_string(),
        serde_json::to_value(title).unwrap_or(Value::Null),
    );
    properties.insert(
        parameters_column.to_string(),
        serde_json::to_value(parameters).unwrap_or(Value::Null),
    );
    properties
}

/// Decode one fetched row into a [`RemoteEntry`].
///
/// A row missing either configured column, or carrying a differently typed
/// property under them, is malformed: the remote state cannot be trusted
/// for diffing, so the error aborts the whole fetch.
pub fn decode_entry(
    page: PageResult,
    event_column: &str,
    parameters_column: &str,
) -> Result<RemoteEntry, CatalogError> {
    let event_value = page.properties.get(event_column).ok_or_else(|| {
        CatalogError::Malformed(format!(
            "page {} has no {:?} column",
            page.id, event_column
        ))
    })?;
    let event: TitleProperty = serde_json::from_value(event_value.clone()).map_err(|e| {
        CatalogError::Malformed(format!(
            "page {} column {:?} is not a title property: {}",
            page.id, event_column, e
        ))
    })?;

    let parameters_value = page.properties.get(parameters_column).ok_or_else(|| {
        CatalogError::Malformed(format!(
            "page {} has no {:?} column",
            page.id, parameters_column
        ))
    })?;
    let parameters: TextProperty =
        serde_json::from_value(parameters_value.clone()).map_err(|e| {
            CatalogError::Malformed(format!(
                "page {} column {:?} is not a rich text property: {}",
                page.id, parameters_column, e
            ))
        })?;

    let name = event
        .title
        .first()
        .map(|t| t.text.content.clone())
        .unwrap_or_default();
    let parameter_lines = parameters
        .rich_text
        .first()
        .map(|rt| rt.text.content.lines().map(str::to_string).collect())
        .unwrap_or_default();

    Ok(RemoteEntry {
        id: page.id,
        name,
        parameter_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, parameters: &[&str]) -> EventRecord {
        EventRecord {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn page(id: &str, properties: Value) -> PageResult {
        serde_json::from_value(json!({ "id": id, "properties": properties })).unwrap()
    }

    #[test]
    fn test_event_properties_renders_parameter_lines() {
        let properties = event_properties(&record("signup", &["plan", "origin"]), "Event", "Parameters");

        let content = &properties["Parameters"]["rich_text"][0]["text"]["content"];
        assert_eq!(content, "- plan\n- origin");
        let title = &properties["Event"]["title"][0]["text"]["content"];
        assert_eq!(title, "signup");
    }

    #[test]
    fn test_event_properties_empty_parameters() {
        let properties = event_properties(&record("signup", &[]), "Event", "Parameters");
        let content = &properties["Parameters"]["rich_text"][0]["text"]["content"];
        assert_eq!(content, "");
    }

    #[test]
    fn test_query_request_omits_absent_cursor() {
        let body = serde_json::to_string(&QueryRequest { start_cursor: None }).unwrap();
        assert_eq!(body, "{}");

        let body =
            serde_json::to_string(&QueryRequest { start_cursor: Some("abc".to_string()) }).unwrap();
        assert!(body.contains("start_cursor"));
    }

    #[test]
    fn test_decode_entry_roundtrip() {
        let entry = decode_entry(
            page(
                "page-1",
                json!({
                    "Event": { "id": "t", "type": "title",
                               "title": [{ "text": { "content": "signup" } }] },
                    "Parameters": { "id": "r", "type": "rich_text",
                                    "rich_text": [{ "text": { "content": "- plan\n- origin" } }] },
                }),
            ),
            "Event",
            "Parameters",
        )
        .unwrap();

        assert_eq!(entry.id, "page-1");
        assert_eq!(entry.name, "signup");
        assert_eq!(entry.parameter_lines, vec!["- plan", "- origin"]);
    }

    #[test]
    fn test_decode_entry_empty_title() {
        let entry = decode_entry(
            page(
                "page-2",
                json!({
                    "Event": { "title": [] },
                    "Parameters": { "rich_text": [] },
                }),
            ),
            "Event",
            "Parameters",
        )
        .unwrap();

        assert_eq!(entry.name, "");
        assert!(entry.parameter_lines.is_empty());
    }

    #[test]
    fn test_decode_entry_missing_column_is_malformed() {
        let err = decode_entry(
            page("page-3", json!({ "Wrong": { "title": [] } })),
            "Event",
            "Parameters",
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::Malformed(_)));
        assert!(err.to_string().contains("page-3"));
    }

    #[test]
    fn test_decode_entry_mistyped_column_is_malformed() {
        let err = decode_entry(
            page(
                "page-4",
                json!({
                    "Event": { "title": "not-a-list" },
                    "Parameters": { "rich_text": [] },
                }),
            ),
            "Event",
            "Parameters",
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::Malformed(_)));
    }
}
