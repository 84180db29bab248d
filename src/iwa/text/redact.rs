//! Placeholder Text Redaction
//!
//! Template text such as "Double-click to edit" is marked by smart field
//! attributes whose object is a placeholder field. The span from such a
//! marker up to the next marker (or the end of the text) is replaced with
//! [`REDACTION_CHAR`], one for one, so offsets into the text stay valid.

use crate::iwa::object::ObjectId;
use crate::iwa::text::block::TextMarker;

/// Replacement for each redacted code unit
pub const REDACTION_CHAR: char = '_';

/// Redact the spans of `text` opened by ignorable markers.
///
/// Markers are sorted by character index in place (stable, so equal indices
/// keep table order). Indices count UTF-16 code units and are clamped to the
/// text length. Returns `None` when nothing was replaced.
pub fn redact_placeholders(
    text: &str,
    markers: &mut [TextMarker],
    is_ignorable: impl Fn(ObjectId) -> bool,
) -> Option<String> {
    markers.sort_by_key(|marker| marker.character_index);

    let mut units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();
    let mut span_start: Option<usize> = None;
    let mut changed = false;

    for marker in markers.iter() {
        let index = (marker.character_index as usize).min(len);
        if let Some(start) = span_start {
            changed |= mask(&mut units, start, index);
        }
        span_start = marker.object.filter(|&object| is_ignorable(object)).map(|_| index);
    }
    if let Some(start) = span_start {
        changed |= mask(&mut units, start, len);
    }

    changed.then(|| String::from_utf16_lossy(&units))
}

fn mask(units: &mut [u16], start: usize, end: usize) -> bool {
    if start >= end {
        return false;
    }
    units[start..end].fill(REDACTION_CHAR as u16);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: ObjectId = 77;

    fn marker(character_index: u32, object: Option<ObjectId>) -> TextMarker {
        TextMarker {
            character_index,
            object,
        }
    }

    fn redact(text: &str, mut markers: Vec<TextMarker>) -> String {
        redact_placeholders(text, &mut markers, |id| id == PLACEHOLDER).unwrap_or_else(|| text.to_string())
    }

    #[test]
    fn test_span_between_markers() {
        let result = redact("ABCDEF", vec![marker(2, Some(PLACEHOLDER)), marker(4, None)]);
        assert_eq!(result, "AB__EF");
    }

    #[test]
    fn test_span_runs_to_end_of_text() {
        assert_eq!(redact("Title here", vec![marker(6, Some(PLACEHOLDER))]), "Title ____");
    }

    #[test]
    fn test_unsorted_markers() {
        let result = redact("ABCDEF", vec![marker(4, None), marker(1, Some(PLACEHOLDER))]);
        assert_eq!(result, "A___EF");
    }

    #[test]
    fn test_non_ignorable_object_ends_span() {
        let result = redact("ABCDEF", vec![marker(0, Some(PLACEHOLDER)), marker(3, Some(5))]);
        assert_eq!(result, "___DEF");
    }

    #[test]
    fn test_nothing_to_redact() {
        let mut markers = vec![marker(1, Some(5)), marker(2, None)];
        assert_eq!(redact_placeholders("ABC", &mut markers, |id| id == PLACEHOLDER), None);
    }

    #[test]
    fn test_index_past_end_is_clamped() {
        let result = redact("ABC", vec![marker(1, Some(PLACEHOLDER)), marker(40, None)]);
        assert_eq!(result, "A__");
    }

    #[test]
    fn test_length_preserved_with_non_ascii() {
        let text = "Zoë 日本語";
        let result = redact(text, vec![marker(4, Some(PLACEHOLDER))]);
        assert_eq!(result, "Zoë ___");
        assert_eq!(result.encode_utf16().count(), text.encode_utf16().count());
    }
}
