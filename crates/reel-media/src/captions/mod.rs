//! Caption chunking and subtitle serialization.
//!
//! [`build_blocks`] turns transcript segments into short timed chunks; the
//! serializers render those chunks as SRT, WebVTT or styled ASS text. All
//! functions here are pure.

mod ass;
mod builder;
mod srt;
mod vtt;

pub use ass::{ass_alignment, ass_color, to_ass};
pub use builder::{build_blocks, CaptionWindow, MAX_BLOCK_SECS};
pub use srt::to_srt;
pub use vtt::to_vtt;

/// Split non-negative seconds into (hours, minutes, seconds, fraction) where
/// the fraction is in units of `1/per_second`.
fn split_timestamp(secs: f64, per_second: u64) -> (u64, u64, u64, u64) {
    let units = if secs.is_finite() && secs > 0.0 {
        (secs * per_second as f64).round() as u64
    } else {
        0
    };
    let total_secs = units / per_second;
    (
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        units % per_second,
    )
}

/// Format as `HH:MM:SS{sep}mmm`.
fn format_millis(secs: f64, sep: char) -> String {
    let (h, m, s, ms) = split_timestamp(secs, 1000);
    format!("{h:02}:{m:02}:{s:02}{sep}{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0.0, ','), "00:00:00,000");
        assert_eq!(format_millis(2.5, ','), "00:00:02,500");
        assert_eq!(format_millis(3725.042, '.'), "01:02:05.042");
        assert_eq!(format_millis(-1.0, ','), "00:00:00,000");
        assert_eq!(format_millis(2.9999999, ','), "00:00:03,000");
    }
}
