//! 字段级校验器。全部遵循“永不报错”的契约：输入不合法时返回给定的
//! 回退值或丢弃标记（`None`），绝不向上抛出。值的解释规则见各函数注释。

use std::f64::consts::TAU;

use duc_core::document::{
    BezierMirroring, BooleanOperation, ImageStatus, LineHead, StrokePlacement, TextAlign,
    VerticalAlign,
};
use duc_core::precision::{PrecisionValue, Zoom};
use duc_core::scope::Scope;

use crate::raw::{RawCode, RawValue, RawZoom};

#[inline]
pub fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

#[inline]
pub fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(fallback)
}

#[inline]
pub fn non_negative_or(value: Option<f64>, fallback: f64) -> f64 {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(fallback)
}

/// 百分比归一化：[0, 1] 原样通过，(1, 100] 按百分数除以 100，
/// 大于 100 截断到 1，负数截断到 0，非有限或缺失回退。
pub fn normalized_percentage(value: Option<f64>, fallback: f64) -> f64 {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return fallback;
    };
    if (0.0..=1.0).contains(&v) {
        v
    } else if v > 1.0 && v <= 100.0 {
        v / 100.0
    } else if v > 100.0 {
        1.0
    } else {
        0.0
    }
}

/// 截断到 [0, 1] 闭区间，缺失或非有限回退。
#[inline]
pub fn unit_interval_or(value: Option<f64>, fallback: f64) -> f64 {
    match value.filter(|v| v.is_finite()) {
        Some(v) => v.clamp(0.0, 1.0),
        None => fallback,
    }
}

/// 截断到 [-1, 1] 闭区间，缺失或非有限回退。
#[inline]
pub fn symmetric_unit_or(value: Option<f64>, fallback: f64) -> f64 {
    match value.filter(|v| v.is_finite()) {
        Some(v) => v.clamp(-1.0, 1.0),
        None => fallback,
    }
}

/// 弧度取模约束到 (-2π, 2π)，保留符号；非法输入归零。
#[inline]
pub fn bounded_radians(value: Option<f64>) -> f64 {
    match value.filter(|v| v.is_finite()) {
        Some(v) => v % TAU,
        None => 0.0,
    }
}

/// 字节域：四舍五入后截断到 [0, 255]。
#[inline]
pub fn byte_or(value: Option<f64>, fallback: u8) -> u8 {
    match value.filter(|v| v.is_finite()) {
        Some(v) => v.round().clamp(0.0, 255.0) as u8,
        None => fallback,
    }
}

/// 非负整数计数，至少为 `min`；小数与非法值回退。
pub fn count_at_least(value: Option<f64>, min: u32, fallback: u32) -> u32 {
    match value.filter(|v| v.is_finite() && v.fract() == 0.0 && *v >= 0.0) {
        Some(v) if v <= f64::from(u32::MAX) => (v as u32).max(min),
        _ => fallback.max(min),
    }
}

/// 带符号整数（层叠序号等），必须是精确整数，否则回退。
pub fn int_or(value: Option<f64>, fallback: i32) -> i32 {
    match value.filter(|v| v.is_finite() && v.fract() == 0.0) {
        Some(v) if v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX) => v as i32,
        _ => fallback,
    }
}

/// 版本计数器与随机数，非负整数，否则回退。
pub fn counter_or(value: Option<f64>, fallback: u64) -> u64 {
    match value.filter(|v| v.is_finite() && v.fract() == 0.0 && *v >= 0.0) {
        Some(v) if v <= u64::MAX as f64 => v as u64,
        _ => fallback,
    }
}

/// 毫秒时间戳，非负，否则回退。
pub fn epoch_millis_or(value: Option<f64>, fallback: i64) -> i64 {
    match value.filter(|v| v.is_finite() && *v >= 0.0) {
        Some(v) => v as i64,
        None => fallback,
    }
}

/// 尺度字符串解析，目录外的值换成回退尺度。
#[inline]
pub fn scope_or(raw: Option<&str>, fallback: Scope) -> Scope {
    raw.and_then(|text| text.parse().ok()).unwrap_or(fallback)
}

/// 数组索引：必须是 [0, len) 内的精确整数，否则丢弃。
pub fn in_bounds_index(value: Option<f64>, len: usize) -> Option<usize> {
    let v = value.filter(|v| v.is_finite() && v.fract() == 0.0 && *v >= 0.0)?;
    let index = v as usize;
    (index < len).then_some(index)
}

/// 缺失或全空白的字符串归一化为 `None`。
pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|text| !text.trim().is_empty())
}

#[inline]
pub fn text_or(raw: Option<String>, fallback: &str) -> String {
    raw.unwrap_or_else(|| fallback.to_string())
}

/// 双表示精度量：裸数值按自身尺度原始量解释；对象形态优先取
/// `value`，其次以 `scoped` 反推；两者皆失效时采用回退原始量。
pub fn precision_from_raw(
    raw: Option<&RawValue>,
    fallback_value: f64,
    own: Scope,
    current: Scope,
) -> PrecisionValue {
    if let Some(raw) = raw {
        if let Some(value) = raw.candidate_value().filter(|v| v.is_finite()) {
            return PrecisionValue::from_value(value, own, current);
        }
        if let Some(scoped) = raw.candidate_scoped().filter(|v| v.is_finite()) {
            return PrecisionValue::from_scoped(scoped, own, current);
        }
    }
    PrecisionValue::from_value(fallback_value, own, current)
}

/// 缩放三元组，非法输入按 1.0 处理，随后按区间截断。
pub fn zoom_from_raw(raw: Option<&RawZoom>, current: Scope) -> Zoom {
    let magnification = raw.and_then(RawZoom::magnification).unwrap_or(1.0);
    Zoom::new(magnification, current)
}

/// 镜像标记：字符串或历史数字码（1 = angle，2 = angle_length），其余视为无。
pub fn mirroring_from(code: Option<&RawCode>) -> Option<BezierMirroring> {
    let code = code?;
    if let Some(text) = code.as_text() {
        return match text {
            "angle" => Some(BezierMirroring::Angle),
            "angle_length" => Some(BezierMirroring::AngleLength),
            _ => None,
        };
    }
    match code.as_number().map(|number| number as i64) {
        Some(1) => Some(BezierMirroring::Angle),
        Some(2) => Some(BezierMirroring::AngleLength),
        _ => None,
    }
}

/// 描边位置：字符串或历史数字码（10/11/12 = inside/center/outside）。
pub fn stroke_placement_or(code: Option<&RawCode>, fallback: StrokePlacement) -> StrokePlacement {
    let Some(code) = code else {
        return fallback;
    };
    if let Some(text) = code.as_text() {
        return match text {
            "inside" => StrokePlacement::Inside,
            "center" => StrokePlacement::Center,
            "outside" => StrokePlacement::Outside,
            _ => fallback,
        };
    }
    match code.as_number().map(|number| number as i64) {
        Some(10) => StrokePlacement::Inside,
        Some(11) => StrokePlacement::Center,
        Some(12) => StrokePlacement::Outside,
        _ => fallback,
    }
}

/// 水平对齐：字符串或历史数字码（1/2/3 = left/center/right）。
pub fn text_align_or(code: Option<&RawCode>, fallback: TextAlign) -> TextAlign {
    let Some(code) = code else {
        return fallback;
    };
    if let Some(text) = code.as_text() {
        return match text {
            "left" => TextAlign::Left,
            "center" => TextAlign::Center,
            "right" => TextAlign::Right,
            _ => fallback,
        };
    }
    match code.as_number().map(|number| number as i64) {
        Some(1) => TextAlign::Left,
        Some(2) => TextAlign::Center,
        Some(3) => TextAlign::Right,
        _ => fallback,
    }
}

/// 垂直对齐：字符串或历史数字码（1/2/3 = top/middle/bottom）。
pub fn vertical_align_or(code: Option<&RawCode>, fallback: VerticalAlign) -> VerticalAlign {
    let Some(code) = code else {
        return fallback;
    };
    if let Some(text) = code.as_text() {
        return match text {
            "top" => VerticalAlign::Top,
            "middle" => VerticalAlign::Middle,
            "bottom" => VerticalAlign::Bottom,
            _ => fallback,
        };
    }
    match code.as_number().map(|number| number as i64) {
        Some(1) => VerticalAlign::Top,
        Some(2) => VerticalAlign::Middle,
        Some(3) => VerticalAlign::Bottom,
        _ => fallback,
    }
}

pub fn image_status_or(code: Option<&RawCode>, fallback: ImageStatus) -> ImageStatus {
    match code.and_then(RawCode::as_text) {
        Some("pending") => ImageStatus::Pending,
        Some("saved") => ImageStatus::Saved,
        Some("error") => ImageStatus::Error,
        _ => fallback,
    }
}

pub fn line_head_from(code: Option<&RawCode>) -> Option<LineHead> {
    match code?.as_text()? {
        "arrow" => Some(LineHead::Arrow),
        "bar" => Some(LineHead::Bar),
        "circle" => Some(LineHead::Circle),
        "circle_outlined" => Some(LineHead::CircleOutlined),
        "triangle" => Some(LineHead::Triangle),
        "triangle_outlined" => Some(LineHead::TriangleOutlined),
        "diamond" => Some(LineHead::Diamond),
        "diamond_outlined" => Some(LineHead::DiamondOutlined),
        _ => None,
    }
}

pub fn boolean_operation_or(
    code: Option<&RawCode>,
    fallback: BooleanOperation,
) -> BooleanOperation {
    match code.and_then(RawCode::as_text) {
        Some("union") => BooleanOperation::Union,
        Some("subtract") => BooleanOperation::Subtract,
        Some("intersect") => BooleanOperation::Intersect,
        Some("exclude") => BooleanOperation::Exclude,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_keeps_unit_interval_values() {
        assert!((normalized_percentage(Some(0.5), 0.0) - 0.5).abs() < 1e-12);
        assert!((normalized_percentage(Some(1.0), 0.0) - 1.0).abs() < 1e-12);
        assert!((normalized_percentage(Some(0.0), 1.0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn percentage_reinterprets_percent_window() {
        // 50 落在 0-100 窗口，按百分数解释。
        assert!((normalized_percentage(Some(50.0), 0.0) - 0.5).abs() < 1e-12);
        assert!((normalized_percentage(Some(100.0), 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn percentage_clamps_out_of_window() {
        assert!((normalized_percentage(Some(150.0), 1.0) - 1.0).abs() < 1e-12);
        assert!((normalized_percentage(Some(-3.0), 1.0) - 0.0).abs() < 1e-12);
        assert!((normalized_percentage(Some(f64::NAN), 0.25) - 0.25).abs() < 1e-12);
        assert!((normalized_percentage(None, 0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn radians_wrap_preserving_sign() {
        assert!((bounded_radians(Some(3.0 * TAU + 0.5)) - 0.5).abs() < 1e-9);
        assert!((bounded_radians(Some(-TAU - 0.5)) + 0.5).abs() < 1e-9);
        assert!(bounded_radians(Some(f64::INFINITY)).abs() < 1e-12);
        assert!(bounded_radians(None).abs() < 1e-12);
    }

    #[test]
    fn byte_rounds_and_clamps() {
        assert_eq!(byte_or(Some(127.6), 0), 128);
        assert_eq!(byte_or(Some(-4.0), 0), 0);
        assert_eq!(byte_or(Some(999.0), 0), 255);
        assert_eq!(byte_or(None, 7), 7);
    }

    #[test]
    fn int_rejects_fractions_and_overflow() {
        assert_eq!(int_or(Some(-3.0), 0), -3);
        assert_eq!(int_or(Some(2.5), 0), 0);
        assert_eq!(int_or(Some(1e12), 7), 7);
        assert_eq!(int_or(None, 7), 7);
    }

    #[test]
    fn index_requires_exact_integer_in_bounds() {
        assert_eq!(in_bounds_index(Some(2.0), 3), Some(2));
        assert_eq!(in_bounds_index(Some(3.0), 3), None);
        assert_eq!(in_bounds_index(Some(1.5), 3), None);
        assert_eq!(in_bounds_index(Some(-1.0), 3), None);
        assert_eq!(in_bounds_index(None, 3), None);
    }

    #[test]
    fn precision_prefers_value_over_scoped() {
        let raw = RawValue::Pair {
            value: Some(2500.0),
            scoped: Some(999.0),
        };
        let value = precision_from_raw(Some(&raw), 0.0, Scope::Millimeter, Scope::Meter);
        assert!((value.value - 2500.0).abs() < 1e-12);
        assert!((value.scoped - 2.5).abs() < 1e-12, "scoped 必须重新派生");
    }

    #[test]
    fn precision_reinterprets_scoped_when_value_missing() {
        let raw = RawValue::Pair {
            value: Some(f64::NAN),
            scoped: Some(2.5),
        };
        let value = precision_from_raw(Some(&raw), 0.0, Scope::Millimeter, Scope::Meter);
        assert!((value.value - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn scope_falls_back_on_unknown() {
        assert_eq!(scope_or(Some("mm"), Scope::Meter), Scope::Millimeter);
        assert_eq!(scope_or(Some("parsec"), Scope::Meter), Scope::Meter);
        assert_eq!(scope_or(None, Scope::Foot), Scope::Foot);
    }

    #[test]
    fn enum_codes_accept_text_and_numbers() {
        assert_eq!(
            mirroring_from(Some(&RawCode::Number(2.0))),
            Some(BezierMirroring::AngleLength)
        );
        assert_eq!(
            mirroring_from(Some(&RawCode::Text("angle".to_string()))),
            Some(BezierMirroring::Angle)
        );
        assert_eq!(mirroring_from(Some(&RawCode::Number(9.0))), None);
        assert_eq!(
            text_align_or(Some(&RawCode::Number(2.0)), TextAlign::Left),
            TextAlign::Center
        );
        assert_eq!(
            stroke_placement_or(Some(&RawCode::Text("outside".to_string())), StrokePlacement::Center),
            StrokePlacement::Outside
        );
    }
}
