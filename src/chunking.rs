//! Sentence-aware text chunking for long-form sources.
//!
//! Long reports and policy texts are split into bounded, overlapping
//! chunks. Cut points prefer the last sentence or paragraph break inside
//! the window; a hard cut at the length limit is used only when no break
//! lies past the midpoint of the window.

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// The cut point for each chunk is the last `". "` or `"\n\n"` occurrence
/// inside the window, provided it lies past 50% of the window; otherwise
/// the chunk is cut at the hard length limit. Consecutive chunks overlap
/// by `chunk_overlap` characters so that context spanning a cut survives
/// in the next chunk. Chunks are trimmed and never empty.
///
/// Returns an empty `Vec` for empty input or a zero `chunk_size`.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + chunk_size).min(text.len()));

        if end < text.len() {
            let window = &text[start..end];
            let sentence_break = window.rfind(". ");
            let paragraph_break = window.rfind("\n\n");
            let break_point = match (sentence_break, paragraph_break) {
                (Some(s), Some(p)) => Some(s.max(p)),
                (Some(s), None) => Some(s),
                (None, Some(p)) => Some(p),
                (None, None) => None,
            };

            // Only honor a break point past the midpoint of the window;
            // earlier breaks would produce degenerate short chunks.
            if let Some(bp) = break_point {
                if bp > chunk_size / 2 {
                    // ". " and "\n\n" are ASCII, so bp + 1 stays on a
                    // char boundary.
                    end = start + bp + 1;
                }
            }
        }

        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= text.len() {
            break;
        }

        // Step back by the overlap, but always make forward progress even
        // when the overlap is as large as the step.
        let next = floor_char_boundary(text, end.saturating_sub(chunk_overlap));
        start = if next > start { next } else { end };
    }

    chunks
}

/// Snap a byte index down to the nearest char boundary.
fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("One short sentence.", 100, 10);
        assert_eq!(chunks, vec!["One short sentence.".to_string()]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 100, 10).is_empty());
    }

    #[test]
    fn cuts_at_sentence_boundary_past_midpoint() {
        // The sentence break sits past 50% of the 40-char window, so the
        // first chunk ends at the period rather than at the hard limit.
        let text = "The first sentence ends here. The second sentence continues on.";
        let chunks = chunk_text(text, 40, 5);
        assert_eq!(chunks[0], "The first sentence ends here.");
    }

    #[test]
    fn hard_cut_when_no_break_past_midpoint() {
        let text = "a".repeat(250);
        let chunks = chunk_text(&text, 100, 20);
        assert!(chunks.iter().all(|c| c.len() <= 100));
        assert!(chunks.len() > 1);
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let text = "€100/tonne CO₂ pricing. ".repeat(50);
        let chunks = chunk_text(&text, 90, 15);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.len() <= 90));
    }

    #[test]
    fn overlap_larger_than_step_still_terminates() {
        let text = "word ".repeat(100);
        let chunks = chunk_text(&text, 20, 20);
        assert!(!chunks.is_empty());
    }
}
