//! Answer postprocessing.
//!
//! The backend sometimes echoes a fabricated source line of its own; the
//! gateway strips any such line and appends the authoritative citation
//! footer derived from the evidence that was actually sent.

/// Prefix (matched case-insensitively after trimming) identifying a source
/// line, both for stripping model output and for the footer we append.
const SOURCE_PREFIX: &str = "source:";

/// Strip hallucinated source lines and append the citation footer.
///
/// Idempotent: the appended footer itself starts with `Source:`, so a second
/// pass strips it and re-adds an identical line.
pub fn finalize(content: &str, citations: &[String]) -> String {
    let body = strip_source_lines(content);
    let footer = if citations.is_empty() {
        "Source: (none)".to_string()
    } else {
        format!("Source: {}", citations.join("; "))
    };
    format!("{}\n{}", body, footer)
}

/// Remove every line whose trimmed lowercase form starts with `source:`.
fn strip_source_lines(text: &str) -> String {
    text.trim_end()
        .lines()
        .filter(|line| !line.trim().to_lowercase().starts_with(SOURCE_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
