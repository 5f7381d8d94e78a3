use std::collections::{HashMap, HashSet};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 二维点，内部以 `glam::DVec2` 表示。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2(pub DVec2);

impl Point2 {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }

    #[inline]
    pub fn from_vec(vec: DVec2) -> Self {
        Self(vec)
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn as_vec2(self) -> DVec2 {
        self.0
    }

    #[inline]
    pub fn distance(self, other: Point2) -> f64 {
        self.0.distance(other.0)
    }
}

impl From<DVec2> for Point2 {
    fn from(value: DVec2) -> Self {
        Self::from_vec(value)
    }
}

/// 轴对齐边界框，用于估算路径范围并回填元素宽高。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2D {
    min: Point2,
    max: Point2,
}

impl Bounds2D {
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x() > self.max.x() || self.min.y() > self.max.y()
    }

    #[inline]
    pub fn min(&self) -> Point2 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point2 {
        self.max
    }

    #[inline]
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x() - self.min.x()
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y() - self.min.y()
        }
    }

    pub fn include_point(&mut self, point: Point2) {
        if self.is_empty() {
            self.min = point;
            self.max = point;
            return;
        }
        let min_vec = self.min.as_vec2().min(point.as_vec2());
        let max_vec = self.max.as_vec2().max(point.as_vec2());
        self.min = Point2::from_vec(min_vec);
        self.max = Point2::from_vec(max_vec);
    }

    pub fn include_bounds(&mut self, other: &Bounds2D) {
        if other.is_empty() {
            return;
        }
        self.include_point(other.min);
        self.include_point(other.max);
    }
}

/// 判断两点是否可视为重合（欧氏距离不超过 `epsilon`）。
#[inline]
pub fn points_close(a: DVec2, b: DVec2, epsilon: f64) -> bool {
    a.distance_squared(b) <= epsilon * epsilon
}

/// 将一段线性/贝塞尔线段的范围并入 `bounds`。
/// 无控制柄为直线段，一个控制柄按二次贝塞尔处理，两个控制柄按三次贝塞尔处理。
/// 极值点来自导数零点，避免对曲线采样。
pub fn include_segment_bounds(
    bounds: &mut Bounds2D,
    start: DVec2,
    start_handle: Option<DVec2>,
    end_handle: Option<DVec2>,
    end: DVec2,
) {
    bounds.include_point(Point2::from_vec(start));
    bounds.include_point(Point2::from_vec(end));

    match (start_handle, end_handle) {
        (None, None) => {}
        (Some(control), None) | (None, Some(control)) => {
            for axis in 0..2 {
                if let Some(t) = quadratic_extremum(
                    component(start, axis),
                    component(control, axis),
                    component(end, axis),
                ) {
                    bounds.include_point(Point2::from_vec(quadratic_point(start, control, end, t)));
                }
            }
        }
        (Some(c1), Some(c2)) => {
            for axis in 0..2 {
                for t in cubic_extrema(
                    component(start, axis),
                    component(c1, axis),
                    component(c2, axis),
                    component(end, axis),
                ) {
                    bounds.include_point(Point2::from_vec(cubic_point(start, c1, c2, end, t)));
                }
            }
        }
    }
}

#[inline]
fn component(vec: DVec2, axis: usize) -> f64 {
    if axis == 0 { vec.x } else { vec.y }
}

#[inline]
pub fn quadratic_point(p0: DVec2, control: DVec2, p1: DVec2, t: f64) -> DVec2 {
    let u = 1.0 - t;
    p0 * (u * u) + control * (2.0 * u * t) + p1 * (t * t)
}

#[inline]
pub fn cubic_point(p0: DVec2, c1: DVec2, c2: DVec2, p1: DVec2, t: f64) -> DVec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
}

/// 二次贝塞尔单轴导数零点，落在开区间 (0, 1) 内才有效。
fn quadratic_extremum(p0: f64, control: f64, p1: f64) -> Option<f64> {
    let denominator = p0 - 2.0 * control + p1;
    if denominator.abs() <= f64::EPSILON {
        return None;
    }
    let t = (p0 - control) / denominator;
    (t > 0.0 && t < 1.0).then_some(t)
}

/// 三次贝塞尔单轴导数零点（至多两个），仅保留 (0, 1) 内的根。
fn cubic_extrema(p0: f64, c1: f64, c2: f64, p1: f64) -> Vec<f64> {
    let a = 3.0 * (-p0 + 3.0 * c1 - 3.0 * c2 + p1);
    let b = 6.0 * (p0 - 2.0 * c1 + c2);
    let c = 3.0 * (c1 - p0);

    let mut roots = Vec::new();
    if a.abs() <= f64::EPSILON {
        if b.abs() > f64::EPSILON {
            roots.push(-c / b);
        }
    } else {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant >= 0.0 {
            let sqrt = discriminant.sqrt();
            roots.push((-b + sqrt) / (2.0 * a));
            roots.push((-b - sqrt) / (2.0 * a));
        }
    }
    roots.retain(|t| *t > 0.0 && *t < 1.0);
    roots
}

/// 闭合路径判定：一组点索引对构成闭合路径，当且仅当它们组成单一环：
/// 每个被引用的顶点度恰为 2、边数等于顶点数且整体连通。自环直接判否。
pub fn forms_closed_loop(edges: &[(usize, usize)]) -> bool {
    if edges.is_empty() {
        return false;
    }

    let mut degree: HashMap<usize, usize> = HashMap::new();
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for (a, b) in edges {
        if a == b {
            return false;
        }
        *degree.entry(*a).or_default() += 1;
        *degree.entry(*b).or_default() += 1;
        adjacency.entry(*a).or_default().push(*b);
        adjacency.entry(*b).or_default().push(*a);
    }

    if degree.values().any(|count| *count != 2) {
        return false;
    }
    if edges.len() != degree.len() {
        return false;
    }

    // 从任意顶点出发，连通分量必须覆盖全部顶点。
    let Some(start) = degree.keys().next().copied() else {
        return false;
    };
    let mut visited: HashSet<usize> = HashSet::new();
    let mut stack = vec![start];
    while let Some(vertex) = stack.pop() {
        if !visited.insert(vertex) {
            continue;
        }
        if let Some(neighbors) = adjacency.get(&vertex) {
            for next in neighbors {
                if !visited.contains(next) {
                    stack.push(*next);
                }
            }
        }
    }
    visited.len() == degree.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_grow_with_points() {
        let mut bounds = Bounds2D::empty();
        assert!(bounds.is_empty());
        bounds.include_point(Point2::new(1.0, 2.0));
        bounds.include_point(Point2::new(-3.0, 5.0));
        assert!((bounds.width() - 4.0).abs() < 1e-12);
        assert!((bounds.height() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn straight_segment_bounds_are_endpoint_bounds() {
        let mut bounds = Bounds2D::empty();
        include_segment_bounds(
            &mut bounds,
            DVec2::new(0.0, 0.0),
            None,
            None,
            DVec2::new(10.0, -2.0),
        );
        assert!((bounds.width() - 10.0).abs() < 1e-12);
        assert!((bounds.height() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_segment_includes_extremum() {
        // 控制点在上方，弧顶高于两个端点。
        let mut bounds = Bounds2D::empty();
        include_segment_bounds(
            &mut bounds,
            DVec2::new(0.0, 0.0),
            Some(DVec2::new(5.0, 10.0)),
            None,
            DVec2::new(10.0, 0.0),
        );
        assert!((bounds.max().y() - 5.0).abs() < 1e-9, "顶点应在 y = 5");
        assert!((bounds.height() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn cubic_segment_includes_extrema() {
        let mut bounds = Bounds2D::empty();
        include_segment_bounds(
            &mut bounds,
            DVec2::new(0.0, 0.0),
            Some(DVec2::new(0.0, 8.0)),
            Some(DVec2::new(10.0, 8.0)),
            DVec2::new(10.0, 0.0),
        );
        // 对称三次曲线的最高点 y = 6。
        assert!((bounds.max().y() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn points_close_uses_euclidean_distance() {
        let a = DVec2::new(0.0, 0.0);
        assert!(points_close(a, DVec2::new(3e-5, 4e-5), 1e-4));
        assert!(!points_close(a, DVec2::new(3e-4, 4e-4), 1e-4));
    }

    #[test]
    fn closed_loop_accepts_single_cycle() {
        assert!(forms_closed_loop(&[(0, 1), (1, 2), (2, 0)]));
        assert!(forms_closed_loop(&[(4, 5), (6, 5), (6, 7), (7, 4)]));
    }

    #[test]
    fn closed_loop_rejects_open_chain() {
        assert!(!forms_closed_loop(&[(0, 1), (1, 2)]));
        assert!(!forms_closed_loop(&[]));
    }

    #[test]
    fn closed_loop_rejects_self_loop_and_figure_eight() {
        assert!(!forms_closed_loop(&[(0, 0)]));
        // “8”字形：中心点度为 4。
        assert!(!forms_closed_loop(&[
            (0, 1),
            (1, 2),
            (2, 0),
            (2, 3),
            (3, 4),
            (4, 2)
        ]));
    }
}
