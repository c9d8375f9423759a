use reel_models::{CaptionBlock, CaptionPosition, ClipStyle};

use super::split_timestamp;

const DEFAULT_PRIMARY: &str = "&H00FFFFFF";
const DEFAULT_BACK: &str = "&H80000000";
const OUTLINE: &str = "&H80000000";
const SECONDARY: &str = "&H000000FF";

/// Convert `#RRGGBB` or `#AARRGGBB` to ASS `&HAABBGGRR`. Anything else is white.
pub fn ass_color(hex: &str) -> String {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return DEFAULT_PRIMARY.to_string();
    }
    let hex = hex.to_ascii_uppercase();
    match hex.len() {
        6 => format!("&H00{}{}{}", &hex[4..6], &hex[2..4], &hex[0..2]),
        8 => format!("&H{}{}{}{}", &hex[0..2], &hex[6..8], &hex[4..6], &hex[2..4]),
        _ => DEFAULT_PRIMARY.to_string(),
    }
}

/// Numpad alignment for a caption position.
pub fn ass_alignment(position: CaptionPosition) -> u8 {
    match position {
        CaptionPosition::Top => 8,
        CaptionPosition::Center => 5,
        CaptionPosition::Bottom => 2,
    }
}

/// Format as `H:MM:SS.cc`.
fn format_ass_time(secs: f64) -> String {
    let (h, m, s, cs) = split_timestamp(secs, 100);
    format!("{h}:{m:02}:{s:02}.{cs:02}")
}

fn escape_text(text: &str) -> String {
    text.replace('{', "\\{").replace('}', "\\}")
}

/// Render blocks as an ASS script with one `Default` style derived from `style`.
pub fn to_ass(blocks: &[CaptionBlock], style: &ClipStyle) -> String {
    let primary = if style.caption_color.trim().is_empty() {
        DEFAULT_PRIMARY.to_string()
    } else {
        ass_color(&style.caption_color)
    };
    let back = match style.caption_bg_color.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => ass_color(c),
        _ => DEFAULT_BACK.to_string(),
    };

    let mut out = String::new();
    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n\n");
    out.push_str("[V4+ Styles]\n");
    out.push_str("Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n");
    out.push_str(&format!(
        "Style: Default,{},{},{},{},{},{},0,0,0,0,100,100,0,0,1,2,1,{},10,10,30,1\n\n",
        style.resolved_font(),
        style.effective_size(),
        primary,
        SECONDARY,
        OUTLINE,
        back,
        ass_alignment(style.caption_position)
    ));
    out.push_str("[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");

    for block in blocks {
        out.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            format_ass_time(block.start),
            format_ass_time(block.end),
            escape_text(&block.text)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::ClipId;

    fn style() -> ClipStyle {
        ClipStyle::new(ClipId::from("clip-1")).with_captions(true)
    }

    #[test]
    fn test_ass_color() {
        assert_eq!(ass_color("#FF8800"), "&H000088FF");
        assert_eq!(ass_color("#80112233"), "&H80332211");
        assert_eq!(ass_color("ff8800"), "&H000088FF");
        assert_eq!(ass_color("#FFF"), "&H00FFFFFF");
        assert_eq!(ass_color("#GGGGGG"), "&H00FFFFFF");
    }

    #[test]
    fn test_alignment() {
        assert_eq!(ass_alignment(CaptionPosition::Top), 8);
        assert_eq!(ass_alignment(CaptionPosition::Center), 5);
        assert_eq!(ass_alignment(CaptionPosition::Bottom), 2);
    }

    #[test]
    fn test_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(3661.5), "1:01:01.50");
        assert_eq!(format_ass_time(2.349), "0:00:02.35");
    }

    #[test]
    fn test_style_line_resolution() {
        let mut s = style();
        s.caption_font = "Comic Sans".into();
        s.caption_size = 300;
        s.caption_color = "#00FF00".into();
        s.caption_bg_color = Some("#40000000".into());
        s.caption_position = CaptionPosition::Top;

        let script = to_ass(&[], &s);
        assert!(script.contains(
            "Style: Default,Arial,120,&H0000FF00,&H000000FF,&H80000000,&H40000000,0,0,0,0,100,100,0,0,1,2,1,8,10,10,30,1\n\n"
        ));
        assert!(script.ends_with(
            "[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n"
        ));
    }

    #[test]
    fn test_dialogue_escapes_braces() {
        let blocks = vec![CaptionBlock::new(1.0, 2.5, "use {braces}")];
        let script = to_ass(&blocks, &style());
        assert!(script.ends_with("Dialogue: 0,0:00:01.00,0:00:02.50,Default,,0,0,0,,use \\{braces\\}\n"));
    }

    #[test]
    fn test_default_style_line() {
        let script = to_ass(&[], &style());
        assert!(script.starts_with("[Script Info]\nScriptType: v4.00+\n\n[V4+ Styles]\n"));
        assert!(script.contains(
            "Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H80000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,2,10,10,30,1\n"
        ));
    }
}
