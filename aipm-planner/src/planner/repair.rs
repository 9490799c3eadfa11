//! Best-effort JSON extraction from LLM response text
//!
//! Providers are instructed to emit pure JSON but routinely wrap the
//! payload in conversational text ("Sure! Here is your plan: {...}").
//! Repair is a boundary adapter, not business logic: slice between the
//! first opening and last closing delimiter and let the JSON parser be the
//! judge of what came out.

/// Extract the JSON object embedded in `text`.
///
/// Returns the trimmed input unchanged when it already starts with `{`, or
/// when no `{`/`}` pair exists (the caller's parse will then fail with a
/// diagnostic on the original text).
pub fn extract_json_object(text: &str) -> &str {
    slice_between(text, '{', '}')
}

/// Extract the JSON array embedded in `text`. Same contract as
/// [`extract_json_object`] with `[`/`]` delimiters.
pub fn extract_json_array(text: &str) -> &str {
    slice_between(text, '[', ']')
}

fn slice_between(text: &str, open: char, close: char) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with(open) {
        return trimmed;
    }
    match (trimmed.find(open), trimmed.rfind(close)) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
