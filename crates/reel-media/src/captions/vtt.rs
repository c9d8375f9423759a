use reel_models::CaptionBlock;

use super::format_millis;

/// Render blocks as WebVTT text. Cues carry 1-based identifiers.
pub fn to_vtt(blocks: &[CaptionBlock]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for (i, block) in blocks.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_millis(block.start, '.'),
            format_millis(block.end, '.')
        ));
        out.push_str(&block.text);
        out.push_str("\n\n");
    }
    out
}
