use serde::{Deserialize, Serialize};

use crate::scope::{Scope, UnitSystem};

/// 缩放系数的合法区间。超出后的数值在显示上已无意义，统一截断。
pub const MIN_ZOOM: f64 = 1e-32;
pub const MAX_ZOOM: f64 = 1e32;

const DEFAULT_ZOOM: f64 = 1.0;

/// 引力井软化量：有效阈值 = 配置阈值 - 该常数。
/// 使切换发生在两档尺度的交界附近，而不是严格的几何中点。
const GRAVITY_WELL_MARGIN: f64 = 0.95;

/// 双表示精度量：`value` 以自身尺度计，`scoped` 以当前显示尺度计。
/// 不变量：`scoped = value * scale(own) / scale(current)`。
/// 两个字段只能经由本模块的构造函数成对产生，调用方不得单独改写其一。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionValue {
    pub value: f64,
    pub scoped: f64,
}

impl PrecisionValue {
    /// 以自身尺度下的原始量构造，派生显示量。
    #[inline]
    pub fn from_value(value: f64, own: Scope, current: Scope) -> Self {
        Self {
            value,
            scoped: value * translation_factor(own, current),
        }
    }

    /// 以显示尺度下的量构造，反推自身尺度下的原始量。
    #[inline]
    pub fn from_scoped(scoped: f64, own: Scope, current: Scope) -> Self {
        Self {
            value: scoped * translation_factor(current, own),
            scoped,
        }
    }

    /// 零值在任何尺度组合下都是 (0, 0)。
    #[inline]
    pub fn zero() -> Self {
        Self {
            value: 0.0,
            scoped: 0.0,
        }
    }

    /// 当前显示尺度变化后，以同一原始量重新派生显示量。
    #[inline]
    pub fn rescope(self, own: Scope, current: Scope) -> Self {
        Self::from_value(self.value, own, current)
    }
}

/// 尺度间换算系数：`from` 下的量乘以该系数得到 `to` 下的量。
/// 目录内任何尺度的系数都非零；分母为零意味着调用方破坏了目录不变量，
/// 此处必须立刻失败而不是退化为 1。
#[inline]
pub fn translation_factor(from: Scope, to: Scope) -> f64 {
    let denominator = to.scale_factor();
    assert!(
        denominator != 0.0,
        "scope {} has a zero scale factor",
        to.as_str()
    );
    from.scale_factor() / denominator
}

/// 视口缩放的三元组：`value` 为无量纲放大倍数（像素/中性单位），
/// `scoped` 为像素/当前尺度单位，`scaled` 为当前尺度单位/像素（比例尺用）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zoom {
    pub value: f64,
    pub scoped: f64,
    pub scaled: f64,
}

impl Zoom {
    /// 由放大倍数与当前尺度派生三元组；非有限输入按 1.0 处理。
    pub fn new(value: f64, current: Scope) -> Self {
        let value = clamp_zoom(value);
        let scoped = value * current.scale_factor();
        Self {
            value,
            scoped,
            scaled: 1.0 / scoped,
        }
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM, crate::scope::NEUTRAL_SCOPE)
    }
}

#[inline]
pub fn clamp_zoom(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        DEFAULT_ZOOM
    }
}

/// 引力井尺度选择：缩放停留在主尺度附近时优先返回主尺度，
/// 离开引力井后在主尺度所属制式的升序指数表中做括号搜索。
/// 纯函数，无副作用。
pub fn scope_for_zoom(zoom: f64, main_scope: Scope, exponent_threshold: f64) -> Scope {
    let zoom = clamp_zoom(zoom);
    // 放大（zoom 大）意味着关注更小的尺度，故取负对数。
    let inverted_exponent = -zoom.log10();

    let effective_threshold = exponent_threshold - GRAVITY_WELL_MARGIN;
    if (inverted_exponent - f64::from(main_scope.exponent())).abs() < effective_threshold {
        return main_scope;
    }

    bracket_scope(main_scope.system(), inverted_exponent)
}

/// 在制式的升序指数表中定位 `exponent` 所属的半开区间 `[exp_i, exp_{i+1})`，
/// 两端越界时截断到端点尺度。
fn bracket_scope(system: UnitSystem, exponent: f64) -> Scope {
    let table = Scope::ordered(system);
    let first = table[0];
    let last = table[table.len() - 1];

    if exponent < f64::from(first.exponent()) {
        return first;
    }
    for pair in table.windows(2) {
        let low = f64::from(pair[0].exponent());
        let high = f64::from(pair[1].exponent());
        if exponent >= low && exponent < high {
            return pair[0];
        }
    }
    last
}
