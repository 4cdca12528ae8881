//! Hit normalization and citation extraction.
//!
//! Turns a raw ranked hit list into the bounded, deduplicated evidence set
//! shown to the model, and derives the ordered citation labels from it.
//! Both functions are pure; ordering is a contract, not an accident.

use std::collections::HashSet;

use crate::types::Hit;

/// Doc-id prefix (case-insensitive) marking operational telemetry that must
/// never be used as grounding content.
const NOISE_DOC_PREFIX: &str = "recent_queries.jsonl";

/// Normalize raw retrieval hits into the evidence set.
///
/// In order:
/// 1. Drop hits whose `doc_id` starts with the reserved noise prefix.
/// 2. Stable-sort hits with inline `text` before hits without; ties keep
///    their relative input order.
/// 3. Dedup by citation label, first occurrence wins.
/// 4. Trim to at most `max_snippets` hits whose cumulative snippet length
///    (in characters) stays within `max_chars`. A hit that would overflow the char budget is
///    skipped without counting toward the snippet limit; admission stops as
///    soon as the snippet limit is reached, even if a later, smaller snippet
///    would still fit the char budget.
pub fn normalize_hits(hits: Vec<Hit>, max_snippets: usize, max_chars: usize) -> Vec<Hit> {
    let mut filtered: Vec<Hit> = hits
        .into_iter()
        .filter(|h| {
            !h.meta
                .doc_id
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .starts_with(NOISE_DOC_PREFIX)
        })
        .collect();

    // sort_by_key is stable, which is what keeps ranking order within each
    // group intact.
    filtered.sort_by_key(|h| h.text.is_none());

    let mut seen = HashSet::new();
    let deduped: Vec<Hit> = filtered
        .into_iter()
        .filter(|h| seen.insert(h.label()))
        .collect();

    let mut total_chars = 0;
    let mut trimmed = Vec::new();
    for hit in deduped {
        if trimmed.len() >= max_snippets {
            break;
        }
        // Budget is in characters, not bytes; multi-byte text counts once
        // per code point.
        let len = hit.snippet_text().chars().count();
        if total_chars + len <= max_chars {
            total_chars += len;
            trimmed.push(hit);
        }
    }

    trimmed
}

/// Collect the ordered, unique citation labels across the evidence set.
///
/// Must be computed from the same sequence used to build the prompt, so
/// every citation surfaced to the caller is among the text the model
/// actually received.
pub fn collect_citations(evidence: &[Hit]) -> Vec<String> {
    let mut seen = HashSet::new();
    evidence
        .iter()
        .map(Hit::label)
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HitMeta;

    fn hit(doc_id: &str, section: Option<&str>, text: Option<&str>) -> Hit {
        Hit {
            text: text.map(String::from),
            meta: HitMeta {
                doc_id: Some(doc_id.to_string()),
                section: section.map(String::from),
                text: None,
            },
        }
    }

    #[test]
    fn test_noise_filter_and_example_from_service_contract() {
        let hits = vec![
            hit("recent_queries.jsonl.gz", None, Some("noise")),
            hit("A", Some("intro"), Some("hello")),
        ];

        let evidence = normalize_hits(hits, 3, 2400);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].label(), "A#intro");
        assert_eq!(evidence[0].snippet_text(), "hello");
        assert_eq!(collect_citations(&evidence), vec!["A#intro"]);
    }

    #[test]
    fn test_noise_filter_is_case_insensitive() {
        let hits = vec![
            hit("RECENT_QUERIES.JSONL", None, Some("noise")),
            hit("A", None, Some("kept")),
        ];
        let evidence = normalize_hits(hits, 3, 2400);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].label(), "A");
    }

    #[test]
    fn test_text_first_sort_is_stable() {
        let hits = vec![
            hit("A", None, None),
            hit("B", None, Some("b")),
            hit("C", None, None),
            hit("D", None, Some("d")),
        ];
        let evidence = normalize_hits(hits, 4, 2400);
        let labels: Vec<String> = evidence.iter().map(Hit::label).collect();
        // Hits with text come first, each group in input order.
        assert_eq!(labels, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let hits = vec![
            hit("A", None, Some("first")),
            hit("A", None, Some("second, different content")),
            hit("B", Some("full"), Some("b-full")),
            hit("B", None, Some("b-plain")),
        ];
        let evidence = normalize_hits(hits, 4, 2400);
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].snippet_text(), "first");
        // "B#full" and "B" share the label "B"; only the first survives.
        assert_eq!(evidence[1].snippet_text(), "b-full");
        assert_eq!(collect_citations(&evidence), vec!["A", "B"]);
    }

    #[test]
    fn test_snippet_limit() {
        let hits = vec![
            hit("A", None, Some("a")),
            hit("B", None, Some("b")),
            hit("C", None, Some("c")),
            hit("D", None, Some("d")),
        ];
        let evidence = normalize_hits(hits, 3, 2400);
        assert_eq!(evidence.len(), 3);
        let labels: Vec<String> = evidence.iter().map(Hit::label).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_char_budget_skips_overflowing_hit_but_continues() {
        let hits = vec![
            hit("A", None, Some("aaaa")),     // 4 chars, admitted
            hit("B", None, Some("bbbbbbbb")), // 8 chars, would exceed 10
            hit("C", None, Some("cccc")),     // 4 chars, still fits
        ];
        let evidence = normalize_hits(hits, 3, 10);
        let labels: Vec<String> = evidence.iter().map(Hit::label).collect();
        assert_eq!(labels, vec!["A", "C"]);
    }

    #[test]
    fn test_char_budget_counts_code_points_not_bytes() {
        // "ééééé" is 5 chars but 10 bytes in UTF-8; a 5-char budget admits it.
        let hits = vec![hit("A", None, Some("ééééé"))];
        let evidence = normalize_hits(hits, 3, 5);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].label(), "A");
    }

    #[test]
    fn test_stops_at_snippet_limit_even_if_budget_remains() {
        let hits = vec![
            hit("A", None, Some("aa")),
            hit("B", None, Some("bb")),
            hit("C", None, Some("cc")),
        ];
        let evidence = normalize_hits(hits, 2, 2400);
        assert_eq!(evidence.len(), 2);
    }

    #[test]
    fn test_budget_invariants_hold() {
        let hits: Vec<Hit> = (0..20)
            .map(|i| {
                let text = "x".repeat(100 * (i + 1));
                hit(&format!("doc-{}", i), None, Some(text.as_str()))
            })
            .collect();

        for (max_snippets, max_chars) in [(3, 2400), (1, 50), (10, 1000), (5, 0)] {
            let evidence = normalize_hits(hits.clone(), max_snippets, max_chars);
            assert!(evidence.len() <= max_snippets);
            let total: usize = evidence.iter().map(|h| h.snippet_text().chars().count()).sum();
            assert!(total <= max_chars);
        }
    }

    #[test]
    fn test_citations_are_distinct_and_first_occurrence_ordered() {
        let evidence = vec![
            hit("B", Some("intro"), Some("1")),
            hit("A", None, Some("2")),
            hit("B", Some("intro"), Some("3")),
        ];
        assert_eq!(collect_citations(&evidence), vec!["B#intro", "A"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_hits(Vec::new(), 3, 2400).is_empty());
        assert!(collect_citations(&[]).is_empty());
    }
}
