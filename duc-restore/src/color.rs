//! 颜色归一化：输出统一为小写十六进制（`#rgb`/`#rgba`/`#rrggbb`/`#rrggbbaa`）
//! 或关键字 `transparent`，其余形态一律回退。

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-f]{3}|[0-9a-f]{4}|[0-9a-f]{6}|[0-9a-f]{8})$")
        .expect("颜色正则是固定字面量")
});

pub const TRANSPARENT: &str = "transparent";

/// 判断字符串是否为可归一化的颜色形态（十六进制或 transparent 关键字）。
/// 样式载荷的 `src` 允许携带非颜色的资源引用，调用方据此决定是否归一化。
pub fn looks_like_color(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.eq_ignore_ascii_case(TRANSPARENT) || HEX_COLOR.is_match(&trimmed.to_ascii_lowercase())
}

/// 归一化颜色字符串。大小写不敏感，首尾空白被忽略。
pub fn normalize(raw: Option<&str>, fallback: &str) -> String {
    let Some(raw) = raw else {
        return fallback.to_string();
    };
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(TRANSPARENT) {
        return TRANSPARENT.to_string();
    }
    let lowered = trimmed.to_ascii_lowercase();
    if HEX_COLOR.is_match(&lowered) {
        lowered
    } else {
        fallback.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_are_lowercased() {
        assert_eq!(normalize(Some("#FF8800"), "#000000"), "#ff8800");
        assert_eq!(normalize(Some("  #AbC  "), "#000000"), "#abc");
        assert_eq!(normalize(Some("#aabbccdd"), "#000000"), "#aabbccdd");
    }

    #[test]
    fn transparent_keyword_passes_through() {
        assert_eq!(normalize(Some("Transparent"), "#000000"), "transparent");
        assert_eq!(normalize(Some("transparent"), "#000000"), "transparent");
    }

    #[test]
    fn invalid_colors_fall_back() {
        assert_eq!(normalize(Some("red"), "#123456"), "#123456");
        assert_eq!(normalize(Some("#12345"), "#123456"), "#123456");
        assert_eq!(normalize(Some("rgb(1,2,3)"), "#123456"), "#123456");
        assert_eq!(normalize(None, "transparent"), "transparent");
    }

    #[test]
    fn color_likeness_detects_hex_and_keyword() {
        assert!(looks_like_color("#A1B2C3"));
        assert!(looks_like_color(" transparent "));
        assert!(!looks_like_color("url(#gradient-1)"));
        assert!(!looks_like_color(""));
    }
}
