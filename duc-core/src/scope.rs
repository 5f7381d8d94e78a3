use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 度量制式：米制或英制。尺度切换只在同一制式内部进行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    Metric,
    Imperial,
}

/// 文档级换算的中性参考尺度。
pub const NEUTRAL_SCOPE: Scope = Scope::Meter;

/// 封闭的尺度目录：每个尺度携带相对“米”的换算系数与十进制数量级指数。
/// 序列化形式是单位缩写本身（`"mm"`、`"ft"`……），大小写敏感（`mm` 与 `Mm` 不同）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "ym")]
    Yoctometer,
    #[serde(rename = "zm")]
    Zeptometer,
    #[serde(rename = "am")]
    Attometer,
    #[serde(rename = "fm")]
    Femtometer,
    #[serde(rename = "pm")]
    Picometer,
    #[serde(rename = "nm")]
    Nanometer,
    #[serde(rename = "um")]
    Micrometer,
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "dm")]
    Decimeter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "dam")]
    Decameter,
    #[serde(rename = "hm")]
    Hectometer,
    #[serde(rename = "km")]
    Kilometer,
    #[serde(rename = "Mm")]
    Megameter,
    #[serde(rename = "Gm")]
    Gigameter,
    #[serde(rename = "Tm")]
    Terameter,
    #[serde(rename = "Pm")]
    Petameter,
    #[serde(rename = "Em")]
    Exameter,
    #[serde(rename = "Zm")]
    Zettameter,
    #[serde(rename = "Ym")]
    Yottameter,
    #[serde(rename = "th")]
    Thou,
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "ft")]
    Foot,
    #[serde(rename = "yd")]
    Yard,
    #[serde(rename = "ch")]
    Chain,
    #[serde(rename = "fur")]
    Furlong,
    #[serde(rename = "mi")]
    Mile,
    #[serde(rename = "lea")]
    League,
}

/// 米制尺度按数量级升序排列，供引力井括号搜索使用。
pub const ORDERED_METRIC: [Scope; 21] = [
    Scope::Yoctometer,
    Scope::Zeptometer,
    Scope::Attometer,
    Scope::Femtometer,
    Scope::Picometer,
    Scope::Nanometer,
    Scope::Micrometer,
    Scope::Millimeter,
    Scope::Centimeter,
    Scope::Decimeter,
    Scope::Meter,
    Scope::Decameter,
    Scope::Hectometer,
    Scope::Kilometer,
    Scope::Megameter,
    Scope::Gigameter,
    Scope::Terameter,
    Scope::Petameter,
    Scope::Exameter,
    Scope::Zettameter,
    Scope::Yottameter,
];

/// 英制尺度按指数升序排列。指数并非严格的 10 的幂，只保证单调。
pub const ORDERED_IMPERIAL: [Scope; 8] = [
    Scope::Thou,
    Scope::Inch,
    Scope::Foot,
    Scope::Yard,
    Scope::Chain,
    Scope::Furlong,
    Scope::Mile,
    Scope::League,
];

impl Scope {
    /// 相对“米”的换算系数。目录固定，系数永不为零。
    #[inline]
    pub fn scale_factor(self) -> f64 {
        match self {
            Scope::Yoctometer => 1e-24,
            Scope::Zeptometer => 1e-21,
            Scope::Attometer => 1e-18,
            Scope::Femtometer => 1e-15,
            Scope::Picometer => 1e-12,
            Scope::Nanometer => 1e-9,
            Scope::Micrometer => 1e-6,
            Scope::Millimeter => 1e-3,
            Scope::Centimeter => 1e-2,
            Scope::Decimeter => 1e-1,
            Scope::Meter => 1.0,
            Scope::Decameter => 1e1,
            Scope::Hectometer => 1e2,
            Scope::Kilometer => 1e3,
            Scope::Megameter => 1e6,
            Scope::Gigameter => 1e9,
            Scope::Terameter => 1e12,
            Scope::Petameter => 1e15,
            Scope::Exameter => 1e18,
            Scope::Zettameter => 1e21,
            Scope::Yottameter => 1e24,
            Scope::Thou => 2.54e-5,
            Scope::Inch => 0.0254,
            Scope::Foot => 0.3048,
            Scope::Yard => 0.9144,
            Scope::Chain => 20.1168,
            Scope::Furlong => 201.168,
            Scope::Mile => 1609.344,
            Scope::League => 4828.032,
        }
    }

    /// 用于尺度排序与引力井判定的十进制指数。
    /// 米制即 `log10(scale_factor)`；英制取就近的整数档位以保持单调。
    #[inline]
    pub fn exponent(self) -> i32 {
        match self {
            Scope::Yoctometer => -24,
            Scope::Zeptometer => -21,
            Scope::Attometer => -18,
            Scope::Femtometer => -15,
            Scope::Picometer => -12,
            Scope::Nanometer => -9,
            Scope::Micrometer => -6,
            Scope::Millimeter => -3,
            Scope::Centimeter => -2,
            Scope::Decimeter => -1,
            Scope::Meter => 0,
            Scope::Decameter => 1,
            Scope::Hectometer => 2,
            Scope::Kilometer => 3,
            Scope::Megameter => 6,
            Scope::Gigameter => 9,
            Scope::Terameter => 12,
            Scope::Petameter => 15,
            Scope::Exameter => 18,
            Scope::Zettameter => 21,
            Scope::Yottameter => 24,
            Scope::Thou => -5,
            Scope::Inch => -2,
            Scope::Foot => -1,
            Scope::Yard => 0,
            Scope::Chain => 1,
            Scope::Furlong => 2,
            Scope::Mile => 3,
            Scope::League => 4,
        }
    }

    #[inline]
    pub fn system(self) -> UnitSystem {
        match self {
            Scope::Thou
            | Scope::Inch
            | Scope::Foot
            | Scope::Yard
            | Scope::Chain
            | Scope::Furlong
            | Scope::Mile
            | Scope::League => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Yoctometer => "ym",
            Scope::Zeptometer => "zm",
            Scope::Attometer => "am",
            Scope::Femtometer => "fm",
            Scope::Picometer => "pm",
            Scope::Nanometer => "nm",
            Scope::Micrometer => "um",
            Scope::Millimeter => "mm",
            Scope::Centimeter => "cm",
            Scope::Decimeter => "dm",
            Scope::Meter => "m",
            Scope::Decameter => "dam",
            Scope::Hectometer => "hm",
            Scope::Kilometer => "km",
            Scope::Megameter => "Mm",
            Scope::Gigameter => "Gm",
            Scope::Terameter => "Tm",
            Scope::Petameter => "Pm",
            Scope::Exameter => "Em",
            Scope::Zettameter => "Zm",
            Scope::Yottameter => "Ym",
            Scope::Thou => "th",
            Scope::Inch => "in",
            Scope::Foot => "ft",
            Scope::Yard => "yd",
            Scope::Chain => "ch",
            Scope::Furlong => "fur",
            Scope::Mile => "mi",
            Scope::League => "lea",
        }
    }

    /// 返回所属制式的升序尺度表。
    #[inline]
    pub fn ordered(system: UnitSystem) -> &'static [Scope] {
        match system {
            UnitSystem::Metric => &ORDERED_METRIC,
            UnitSystem::Imperial => &ORDERED_IMPERIAL,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown measurement scope: {0:?}")]
pub struct UnknownScopeError(pub String);

impl FromStr for Scope {
    type Err = UnknownScopeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let scope = match raw {
            "ym" => Scope::Yoctometer,
            "zm" => Scope::Zeptometer,
            "am" => Scope::Attometer,
            "fm" => Scope::Femtometer,
            "pm" => Scope::Picometer,
            "nm" => Scope::Nanometer,
            "um" => Scope::Micrometer,
            "mm" => Scope::Millimeter,
            "cm" => Scope::Centimeter,
            "dm" => Scope::Decimeter,
            "m" => Scope::Meter,
            "dam" => Scope::Decameter,
            "hm" => Scope::Hectometer,
            "km" => Scope::Kilometer,
            "Mm" => Scope::Megameter,
            "Gm" => Scope::Gigameter,
            "Tm" => Scope::Terameter,
            "Pm" => Scope::Petameter,
            "Em" => Scope::Exameter,
            "Zm" => Scope::Zettameter,
            "Ym" => Scope::Yottameter,
            "th" => Scope::Thou,
            "in" => Scope::Inch,
            "ft" => Scope::Foot,
            "yd" => Scope::Yard,
            "ch" => Scope::Chain,
            "fur" => Scope::Furlong,
            "mi" => Scope::Mile,
            "lea" => Scope::League,
            other => return Err(UnknownScopeError(other.to_string())),
        };
        Ok(scope)
    }
}
