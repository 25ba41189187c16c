//! Response text extraction.
//!
//! Model responses interleave tool-invocation events with the final textual
//! answer. The answer is usually, but not always, the last event, so the
//! extractor scans newest-first and settles on the first event that carries
//! any text at all.

use crate::domain::response::{Part, ResponseEvent};

/// Pull the textual answer out of an ordered event sequence.
///
/// Scans events in reverse chronological order. The first event (newest
/// first) with at least one non-blank text part wins; that event's text
/// parts are joined in their original order with single spaces. Tool-call
/// parts never contribute. `None` when no event carries text.
pub fn extract_text(events: &[ResponseEvent]) -> Option<String> {
    for event in events.iter().rev() {
        let Some(content) = &event.content else {
            continue;
        };

        let texts: Vec<&str> = content
            .parts
            .iter()
            .filter_map(Part::as_text)
            .filter(|text| !text.trim().is_empty())
            .collect();

        if !texts.is_empty() {
            return Some(texts.join(" "));
        }
    }

    None
}

/// Strip a Markdown code-fence wrapper when present.
///
/// ` ```json\n{...}\n``` ` becomes `{...}`; unfenced text passes through
/// trimmed. Only the outermost fence is touched, and a leading `json`
/// language tag is dropped.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };

    let body = body.strip_prefix("json").unwrap_or(body);
    body.trim()
}
