use reel_models::{CaptionBlock, TranscriptSegment};

/// Longest a multi-word block may last, in seconds.
pub const MAX_BLOCK_SECS: f64 = 7.0;

/// Absolute time window captions are filtered and clamped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionWindow {
    pub start: f64,
    pub end: f64,
}

impl CaptionWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Window from raw bounds; a non-positive `end` means no window.
    pub fn from_bounds(start: f64, end: f64) -> Option<Self> {
        (end > 0.0).then(|| Self::new(start, end))
    }

    fn excludes(&self, start: f64, end: f64) -> bool {
        end < self.start || start > self.end
    }

    /// True when a chunk would have no time left inside the window.
    fn misses(&self, start: f64, end: f64) -> bool {
        end <= self.start || start >= self.end
    }

    fn clamp(&self, t: f64) -> f64 {
        t.clamp(self.start, self.end.max(self.start))
    }
}

/// Chunk transcript segments into caption blocks of at most `max_words`
/// words (0 means 3).
///
/// Time inside a segment is split evenly per word. With a window, segments
/// entirely outside it and chunks that only touch its edges are dropped;
/// the rest are clamped into it. Multi-word chunks longer than [`MAX_BLOCK_SECS`] are shortened.
pub fn build_blocks(
    segments: &[TranscriptSegment],
    max_words: usize,
    window: Option<CaptionWindow>,
) -> Vec<CaptionBlock> {
    let max_words = if max_words == 0 { 3 } else { max_words };
    let mut blocks = Vec::new();

    for seg in segments {
        if let Some(w) = window {
            if w.excludes(seg.start_time, seg.end_time) {
                continue;
            }
        }

        let words: Vec<&str> = seg.text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let seg_duration = (seg.end_time - seg.start_time).max(0.0);
        let word_duration = seg_duration / words.len() as f64;

        for (chunk_index, chunk) in words.chunks(max_words).enumerate() {
            let first_word = chunk_index * max_words;
            let last_word = first_word + chunk.len();
            let mut start = seg.start_time + first_word as f64 * word_duration;
            let mut end = seg.start_time + last_word as f64 * word_duration;

            if let Some(w) = window {
                if w.misses(start, end) {
                    continue;
                }
                start = w.clamp(start);
                end = w.clamp(end);
            }

            if chunk.len() > 1 && end - start > MAX_BLOCK_SECS {
                end = start + MAX_BLOCK_SECS;
            }

            blocks.push(CaptionBlock::new(start, end, chunk.join(" ")));
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    #[test]
    fn test_even_split_two_chunks() {
        let blocks = build_blocks(&[seg(0.0, 6.0, "This is a longer test sentence")], 3, None);
        assert_eq!(
            blocks,
            vec![
                CaptionBlock::new(0.0, 3.0, "This is a"),
                CaptionBlock::new(3.0, 6.0, "longer test sentence"),
            ]
        );
    }

    #[test]
    fn test_window_clamps_both_chunks() {
        let blocks = build_blocks(
            &[seg(0.0, 6.0, "This is a longer test sentence")],
            3,
            Some(CaptionWindow::new(2.0, 5.0)),
        );
        assert_eq!(
            blocks,
            vec![
                CaptionBlock::new(2.0, 3.0, "This is a"),
                CaptionBlock::new(3.0, 5.0, "longer test sentence"),
            ]
        );
    }

    #[test]
    fn test_segments_outside_window_dropped() {
        let segments = [
            seg(0.0, 1.0, "before"),
            seg(2.0, 4.0, "inside words"),
            seg(9.0, 10.0, "after"),
        ];
        let blocks = build_blocks(&segments, 3, Some(CaptionWindow::new(1.5, 5.0)));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "inside words");
    }

    #[test]
    fn test_chunk_outside_window_dropped() {
        // Six words over [0,6]; window [4,6] drops the first chunk [0,3].
        let blocks = build_blocks(
            &[seg(0.0, 6.0, "one two three four five six")],
            3,
            Some(CaptionWindow::new(4.0, 6.0)),
        );
        assert_eq!(blocks, vec![CaptionBlock::new(4.0, 6.0, "four five six")]);
    }

    #[test]
    fn test_chunk_touching_window_edge_dropped() {
        let blocks = build_blocks(
            &[seg(0.0, 6.0, "one two three four five six")],
            3,
            Some(CaptionWindow::new(3.0, 5.0)),
        );
        assert_eq!(blocks, vec![CaptionBlock::new(3.0, 5.0, "four five six")]);
    }

    #[test]
    fn test_long_multi_word_chunk_capped() {
        let blocks = build_blocks(&[seg(10.0, 30.0, "slow spoken words")], 3, None);
        assert_eq!(blocks, vec![CaptionBlock::new(10.0, 17.0, "slow spoken words")]);
    }

    #[test]
    fn test_single_long_word_not_capped() {
        let blocks = build_blocks(&[seg(0.0, 12.0, "Hmmmmmm")], 3, None);
        assert_eq!(blocks, vec![CaptionBlock::new(0.0, 12.0, "Hmmmmmm")]);
    }

    #[test]
    fn test_empty_text_and_zero_duration() {
        let blocks = build_blocks(&[seg(0.0, 2.0, "   "), seg(5.0, 5.0, "a b c d")], 2, None);
        assert_eq!(
            blocks,
            vec![CaptionBlock::new(5.0, 5.0, "a b"), CaptionBlock::new(5.0, 5.0, "c d")]
        );
    }

    #[test]
    fn test_zero_max_words_defaults_to_three() {
        let blocks = build_blocks(&[seg(0.0, 4.0, "w1 w2 w3 w4")], 0, None);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "w1 w2 w3");
    }

    #[test]
    fn test_blocks_respect_word_limit_and_order() {
        let segments = [
            seg(0.0, 5.0, "a b c d e f g h i j k"),
            seg(5.0, 9.0, "l m n o p q r"),
        ];
        for max in 1..=5 {
            let blocks = build_blocks(&segments, max, Some(CaptionWindow::new(1.0, 8.0)));
            let mut prev_start = f64::MIN;
            for b in &blocks {
                assert!(b.word_count() <= max);
                assert!(b.start >= prev_start);
                assert!(b.end >= b.start);
                assert!(b.start >= 1.0 && b.end <= 8.0);
                prev_start = b.start;
            }
        }
    }

    #[test]
    fn test_from_bounds() {
        assert!(CaptionWindow::from_bounds(0.0, 0.0).is_none());
        assert_eq!(CaptionWindow::from_bounds(2.0, 5.0), Some(CaptionWindow::new(2.0, 5.0)));
    }
}
