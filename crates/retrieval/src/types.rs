//! Typed retrieval hit model.
//!
//! The retrieval service returns loosely structured hits; this module pins
//! them to explicit optional fields at deserialization time so the rest of
//! the pipeline never reaches into dynamic maps.

use serde::{Deserialize, Serialize};

/// Label used when a hit carries no document identifier.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Section value meaning "the whole document"; it is omitted from labels.
const FULL_SECTION: &str = "full";

/// One retrieval result, scoped to a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// Snippet text, when the retriever inlines it at the top level
    #[serde(default)]
    pub text: Option<String>,

    /// Source metadata
    #[serde(default)]
    pub meta: HitMeta,
}

/// Metadata attached to a hit by the retrieval service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HitMeta {
    /// Identifier of the source document
    #[serde(default)]
    pub doc_id: Option<String>,

    /// Section within the document, if the document was split
    #[serde(default)]
    pub section: Option<String>,

    /// Snippet text, when the retriever stores it in metadata instead
    #[serde(default)]
    pub text: Option<String>,
}

impl Hit {
    /// The snippet text used for prompt assembly and the char budget:
    /// inline `text`, falling back to `meta.text`, falling back to empty.
    pub fn snippet_text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.meta.text.as_deref())
            .unwrap_or("")
    }

    /// The citation label identifying this hit's source.
    ///
    /// `doc_id` alone, or `doc_id#section` when a section is present and is
    /// not the `"full"` sentinel. A hit without a `doc_id` maps to
    /// [`UNKNOWN_LABEL`]. Labels are the dedup key for evidence and the unit
    /// shown to the end user.
    pub fn label(&self) -> String {
        let doc_id = match self.meta.doc_id.as_deref().filter(|d| !d.is_empty()) {
            Some(doc_id) => doc_id,
            None => return UNKNOWN_LABEL.to_string(),
        };

        match self.meta.section.as_deref() {
            Some(section) if !section.is_empty() && section != FULL_SECTION => {
                format!("{}#{}", doc_id, section)
            }
            _ => doc_id.to_string(),
        }
    }
}

/// The label + text projection of an evidence hit, surfaced by `/dryrun`
/// and the `/chat` debug payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsedSnippet {
    pub label: String,
    pub text: String,
}

impl From<&Hit> for UsedSnippet {
    fn from(hit: &Hit) -> Self {
        Self {
            label: hit.label(),
            text: hit.snippet_text().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc_id: Option<&str>, section: Option<&str>, text: Option<&str>) -> Hit {
        Hit {
            text: text.map(String::from),
            meta: HitMeta {
                doc_id: doc_id.map(String::from),
                section: section.map(String::from),
                text: None,
            },
        }
    }

    #[test]
    fn test_label_doc_id_only() {
        assert_eq!(hit(Some("A"), None, None).label(), "A");
    }

    #[test]
    fn test_label_with_section() {
        assert_eq!(hit(Some("A"), Some("intro"), None).label(), "A#intro");
    }

    #[test]
    fn test_label_full_section_is_dropped() {
        assert_eq!(hit(Some("B"), Some("full"), None).label(), "B");
    }

    #[test]
    fn test_label_empty_section_is_dropped() {
        assert_eq!(hit(Some("B"), Some(""), None).label(), "B");
    }

    #[test]
    fn test_label_missing_doc_id() {
        assert_eq!(hit(None, Some("intro"), None).label(), UNKNOWN_LABEL);
        assert_eq!(hit(Some(""), None, None).label(), UNKNOWN_LABEL);
    }

    #[test]
    fn test_snippet_text_fallback_chain() {
        let inline = hit(Some("A"), None, Some("inline"));
        assert_eq!(inline.snippet_text(), "inline");

        let mut meta_only = hit(Some("A"), None, None);
        meta_only.meta.text = Some("from meta".to_string());
        assert_eq!(meta_only.snippet_text(), "from meta");

        let empty = hit(Some("A"), None, None);
        assert_eq!(empty.snippet_text(), "");
    }

    #[test]
    fn test_deserialize_sparse_hit() {
        let hit: Hit = serde_json::from_str(r#"{"meta": {"doc_id": "A"}}"#).unwrap();
        assert_eq!(hit.label(), "A");
        assert_eq!(hit.snippet_text(), "");

        let bare: Hit = serde_json::from_str("{}").unwrap();
        assert_eq!(bare.label(), UNKNOWN_LABEL);
    }

    #[test]
    fn test_used_snippet_projection() {
        let snippet = UsedSnippet::from(&hit(Some("A"), Some("intro"), Some("hello")));
        assert_eq!(snippet.label, "A#intro");
        assert_eq!(snippet.text, "hello");
    }
}
