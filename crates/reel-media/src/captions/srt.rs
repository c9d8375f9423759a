use reel_models::CaptionBlock;

use super::format_millis;

/// Render blocks as SubRip text.
pub fn to_srt(blocks: &[CaptionBlock]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_millis(block.start, ','),
            format_millis(block.end, ',')
        ));
        out.push_str(&block.text);
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srt_output() {
        let blocks = vec![
            CaptionBlock::new(0.0, 2.5, "Hello there"),
            CaptionBlock::new(2.5, 61.25, "General Kenobi"),
        ];
        assert_eq!(
            to_srt(&blocks),
            "1\n00:00:00,000 --> 00:00:02,500\nHello there\n\n\
             2\n00:00:02,500 --> 00:01:01,250\nGeneral Kenobi\n\n"
        );
    }

    #[test]
    fn test_srt_empty() {
        assert_eq!(to_srt(&[]), "");
    }
}
