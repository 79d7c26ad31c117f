//! Chunking bounds and coverage properties.

use proptest::prelude::*;
use tco_knowledge::chunk_text;

#[test]
fn consecutive_hard_cut_chunks_share_the_overlap() {
    // No whitespace and no sentence breaks, so every cut is a hard cut
    // and trimming changes nothing.
    let text: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let chunks = chunk_text(&text, 100, 20);

    assert!(chunks.len() > 1);
    for window in chunks.windows(2) {
        let tail = &window[0][window[0].len() - 20..];
        assert!(window[1].starts_with(tail));
    }
}

#[test]
fn sentence_breaks_are_preferred_over_hard_cuts() {
    let text = "Energy prices drive fabrication cost. Carbon taxes add to it. \
                Subsidies offset both over the plant lifetime."
        .to_string();
    let chunks = chunk_text(&text, 70, 10);

    assert!(chunks.len() > 1);
    // Each non-final chunk ends at a sentence boundary rather than
    // mid-word, because a break exists past the window midpoint.
    for chunk in &chunks[..chunks.len() - 1] {
        assert!(chunk.ends_with('.'), "chunk {chunk:?} not cut at a sentence break");
    }
}

/// Every word of the input survives into at least one chunk, and no
/// chunk exceeds the size limit. Words are kept shorter than the overlap
/// so a word split by a hard cut reappears whole in the next chunk.
mod prop_chunk_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(150))]

        #[test]
        fn words_are_covered_and_chunks_bounded(
            words in proptest::collection::vec("[a-z]{1,4}", 1..120),
            chunk_size in 40usize..120,
            chunk_overlap in 6usize..18,
        ) {
            prop_assume!(chunk_size >= 2 * chunk_overlap + 8);
            let text = words.join(" ");
            let chunks = chunk_text(&text, chunk_size, chunk_overlap);

            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(!chunk.is_empty());
                prop_assert!(chunk.len() <= chunk_size);
            }
            for word in &words {
                prop_assert!(
                    chunks.iter().any(|c| c.contains(word.as_str())),
                    "word {word:?} lost by chunking",
                );
            }
        }
    }
}
