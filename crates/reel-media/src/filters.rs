//! FFmpeg filter graph builders for the transform stages.

/// Center crop to a `w:h` ratio without upscaling; dimensions kept even.
pub fn aspect_crop_filter(ratio_w: u32, ratio_h: u32) -> String {
    format!(
        "crop=trunc(min(iw\\,ih*{w}/{h})/2)*2:trunc(min(ih\\,iw*{h}/{w})/2)*2,setsar=1",
        w = ratio_w,
        h = ratio_h
    )
}

/// Scale to cover `width`x`height`, then center crop to exactly that size.
pub fn cover_crop_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
        w = width,
        h = height
    )
}

/// Composite input 1 centered on input 0 during `[start, end]`.
///
/// The overlay is shifted so its first frame appears at `start`, scaled by
/// `scale` relative to its own size and alpha-multiplied by `opacity`.
/// Produces the `[v]` label.
pub fn overlay_filter(start: f64, end: f64, scale: f64, opacity: f64) -> String {
    format!(
        "[1:v]setpts=PTS-STARTPTS+{start:.3}/TB,scale=trunc(iw*{scale:.3}/2)*2:-2,format=rgba,colorchannelmixer=aa={opacity:.2}[ov];\
         [0:v][ov]overlay=(W-w)/2:(H-h)/2:eof_action=pass:enable='between(t,{start:.3},{end:.3})'[v]",
        start = start,
        end = end,
        scale = scale,
        opacity = opacity
    )
}

/// Burn an ASS subtitle file.
pub fn ass_filter(subtitle_path: &str) -> String {
    format!("ass='{}'", escape_filter_path(subtitle_path))
}

/// Escape a path for use inside a quoted filter argument.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\").replace('\'', "\\'").replace(':', "\\:")
}
