//! 逐元素恢复：类型分派、历史形态迁移与字段域约束的落实处。
//!
//! 恢复失败的粒度是字段而不是元素：字段非法时取文档化的回退值，只有
//! 类型标签缺失或未知、块引用无法解析、几何退化这三种情况丢弃整个
//! 元素（编辑中与点名保留的元素豁免退化丢弃）。所有丢弃都有 debug 日志。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::f64::consts::TAU;

use duc_core::document::{
    self, BindingPoint, BlockInstanceElement, BoundElement, DocElement, DucElement, DucLine,
    DucLineEndpoint, DucPath, DucPoint, DucPointBinding, ElementBackground, ElementBase,
    ElementId, ElementStroke, ElementType, EllipseElement, EmbeddableElement, FrameElement,
    FreeDrawElement, ImageElement, ImageStatus, LinearElement, PdfElement, PolygonElement,
    RectangleElement, StrokePlacement, StyleContent, TableCell, TableColumn, TableElement,
    TableRow, TextAlign, TextElement, VerticalAlign,
};
use duc_core::geometry::{self, Point2};
use duc_core::id;
use duc_core::precision::PrecisionValue;
use duc_core::scope::Scope;
use glam::DVec2;
use tracing::debug;

use crate::color;
use crate::raw::{
    RawBackground, RawBinding, RawBindingPoint, RawBoundElement, RawElement, RawLine,
    RawLineEndpoint, RawPath, RawPoint, RawStroke, RawStyleContent, RawValue,
};
use crate::validate;

/// 近邻点合并阈值，以元素自身尺度的原始量计。
pub const POINT_MERGE_EPSILON: f64 = 1e-4;

const DEFAULT_STROKE_COLOR: &str = "#000000";
const DEFAULT_STROKE_WIDTH: f64 = 1.0;
const DEFAULT_FONT_SIZE: f64 = 16.0;
const DEFAULT_FONT_FAMILY: &str = "sans-serif";
const DEFAULT_LINE_HEIGHT: f64 = 1.25;
/// 文本宽度估算用的平均字宽系数（相对字号）。
const GLYPH_WIDTH_RATIO: f64 = 0.6;
const DEFAULT_COLUMN_WIDTH: f64 = 100.0;
const DEFAULT_ROW_HEIGHT: f64 = 40.0;
const DIAMOND_SIDES: u32 = 4;
const DEFAULT_POLYGON_SIDES: u32 = 4;

/// 单个元素恢复所需的环境。
pub struct RestoreContext<'a> {
    /// 当前显示尺度，精度量的 `scoped` 分量据此派生。
    pub current_scope: Scope,
    /// 元素未携带合法尺度时采用的回退尺度（文档主尺度）。
    pub fallback_scope: Scope,
    /// 已恢复块的标识到其声明属性标签集的映射。
    pub blocks: &'a HashMap<String, HashSet<String>>,
    /// 正在编辑的元素豁免退化丢弃。
    pub editing_element_id: Option<&'a str>,
    /// 调用方点名保留的元素集合，同样豁免退化丢弃。
    pub pass_through: Option<&'a HashSet<ElementId>>,
    /// 是否按文本内容重算文本元素的宽高。
    pub refresh_dimensions: bool,
}

impl RestoreContext<'_> {
    fn is_exempt(&self, element_id: &str) -> bool {
        self.editing_element_id == Some(element_id)
            || self
                .pass_through
                .is_some_and(|ids| ids.contains(element_id))
    }
}

/// 恢复单个元素。`None` 表示元素被整体丢弃：类型标签缺失或不在目录内、
/// 块实例指向不存在的块、或几何退化且不在豁免名单上。
pub fn restore_element(raw: &RawElement, ctx: &RestoreContext<'_>) -> Option<DucElement> {
    let tag = raw.element_type.as_deref();
    let Some(kind) = element_kind(tag) else {
        debug!(tag = tag.unwrap_or("<缺失>"), "未知类型的元素被丢弃");
        return None;
    };

    let base = restore_base(raw, ctx);
    let element = match kind {
        ElementType::Rectangle => DucElement::Rectangle(RectangleElement { base }),
        ElementType::Polygon => {
            // 历史 diamond 类型固定迁移为四边形。
            let sides = if tag == Some("diamond") {
                DIAMOND_SIDES
            } else {
                validate::count_at_least(raw.sides, 3, DEFAULT_POLYGON_SIDES)
            };
            DucElement::Polygon(PolygonElement { base, sides })
        }
        ElementType::Ellipse => DucElement::Ellipse(EllipseElement {
            base,
            ratio: validate::positive_or(raw.ratio, 1.0).min(1.0),
            start_angle: validate::bounded_radians(raw.start_angle),
            end_angle: validate::finite_or(raw.end_angle, TAU).clamp(-TAU, TAU),
        }),
        ElementType::Embeddable => DucElement::Embeddable(EmbeddableElement {
            base,
            link: validate::text_or(raw.link.clone(), ""),
        }),
        ElementType::Pdf => DucElement::Pdf(PdfElement {
            base,
            file_id: validate::non_blank(raw.file_id.clone()),
        }),
        ElementType::Image => DucElement::Image(ImageElement {
            base,
            file_id: validate::non_blank(raw.file_id.clone()),
            status: validate::image_status_or(raw.status.as_ref(), ImageStatus::Pending),
            scale: flip_scale(raw.scale.as_deref()),
        }),
        ElementType::Text => DucElement::Text(restore_text(raw, base, ctx)),
        ElementType::Line => DucElement::Linear(restore_linear(raw, base, ctx)),
        ElementType::Freedraw => DucElement::FreeDraw(restore_freedraw(raw, base, ctx)),
        ElementType::Frame => DucElement::Frame(FrameElement {
            base,
            is_collapsed: raw.is_collapsed.unwrap_or(false),
            clip: raw.clip.unwrap_or(false),
        }),
        ElementType::Table => DucElement::Table(restore_table(raw, base, ctx)),
        ElementType::Doc => DucElement::Doc(DocElement {
            base,
            content: validate::text_or(raw.content.clone(), ""),
        }),
        ElementType::Blockinstance => {
            DucElement::BlockInstance(restore_block_instance(raw, base, ctx)?)
        }
    };

    if is_degenerate(&element) && !ctx.is_exempt(element.id()) {
        debug!(id = element.id(), "退化元素被丢弃");
        return None;
    }
    Some(element)
}

/// 类型标签解析，含历史别名迁移：`diamond` 按多边形、`arrow` 按线处理。
fn element_kind(tag: Option<&str>) -> Option<ElementType> {
    match tag? {
        "diamond" => Some(ElementType::Polygon),
        "arrow" => Some(ElementType::Line),
        other => ElementType::parse(other),
    }
}

/// 退化判定：线性与手绘元素看恢复后的点数，其余看宽高是否同时为零。
fn is_degenerate(element: &DucElement) -> bool {
    match element {
        DucElement::Linear(linear) => linear.points.len() < 2,
        DucElement::FreeDraw(freedraw) => freedraw.points.len() < 2,
        _ => {
            let base = element.base();
            base.width.value == 0.0 && base.height.value == 0.0
        }
    }
}

fn restore_base(raw: &RawElement, ctx: &RestoreContext<'_>) -> ElementBase {
    let own = validate::scope_or(raw.scope.as_deref(), ctx.fallback_scope);
    let current = ctx.current_scope;
    ElementBase {
        id: validate::non_blank(raw.id.clone()).unwrap_or_else(id::new_id),
        x: validate::precision_from_raw(raw.x.as_ref(), 0.0, own, current),
        y: validate::precision_from_raw(raw.y.as_ref(), 0.0, own, current),
        width: dimension_precision(raw.width.as_ref(), own, current),
        height: dimension_precision(raw.height.as_ref(), own, current),
        angle: validate::bounded_radians(raw.angle),
        scope: own,
        label: validate::text_or(raw.label.clone(), ""),
        is_visible: raw.is_visible.unwrap_or(true),
        opacity: validate::normalized_percentage(raw.opacity, 1.0),
        stroke: restore_stroke_stack(raw, own, current),
        background: restore_background_stack(raw),
        group_ids: raw
            .group_ids
            .clone()
            .unwrap_or_default()
            .into_iter()
            .filter(|group_id| !group_id.trim().is_empty())
            .collect(),
        frame_id: validate::non_blank(raw.frame_id.clone()),
        bound_elements: restore_bound_elements(raw.bound_elements.as_deref()),
        z_index: validate::int_or(raw.z_index, 0),
        index: validate::non_blank(raw.index.clone()),
        version: validate::counter_or(raw.version, 1),
        version_nonce: validate::counter_or(raw.version_nonce, 0),
        updated: validate::epoch_millis_or(raw.updated, 0),
        is_deleted: raw.is_deleted.unwrap_or(false),
        locked: raw.locked.unwrap_or(false),
    }
}

fn restore_bound_elements(raw: Option<&[RawBoundElement]>) -> Vec<BoundElement> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(|entry| {
            let id = validate::non_blank(entry.id.clone())?;
            let element_type = element_kind(entry.element_type.as_deref())?;
            Some(BoundElement { id, element_type })
        })
        .collect()
}

/// 结构化描边栈优先；缺失时由历史扁平颜色（或默认色）合成单项栈。
/// 显式空数组保持为空。
fn restore_stroke_stack(raw: &RawElement, own: Scope, current: Scope) -> Vec<ElementStroke> {
    if let Some(strokes) = raw.stroke.as_ref() {
        return strokes
            .iter()
            .map(|stroke| restore_stroke(stroke, own, current))
            .collect();
    }
    let src = style_src(raw.stroke_color.as_deref(), DEFAULT_STROKE_COLOR);
    vec![ElementStroke {
        content: StyleContent {
            src,
            visible: true,
            opacity: 1.0,
        },
        width: PrecisionValue::from_value(DEFAULT_STROKE_WIDTH, own, current),
        placement: StrokePlacement::Center,
    }]
}

fn restore_background_stack(raw: &RawElement) -> Vec<ElementBackground> {
    if let Some(backgrounds) = raw.background.as_ref() {
        return backgrounds.iter().map(restore_background).collect();
    }
    let src = style_src(raw.background_color.as_deref(), color::TRANSPARENT);
    vec![ElementBackground {
        content: StyleContent {
            src,
            visible: true,
            opacity: 1.0,
        },
    }]
}

pub(crate) fn restore_stroke(raw: &RawStroke, own: Scope, current: Scope) -> ElementStroke {
    ElementStroke {
        content: restore_style_content(raw.content.as_ref(), DEFAULT_STROKE_COLOR),
        width: non_negative_precision(raw.width.as_ref(), DEFAULT_STROKE_WIDTH, own, current),
        placement: validate::stroke_placement_or(raw.placement.as_ref(), StrokePlacement::Center),
    }
}

pub(crate) fn restore_background(raw: &RawBackground) -> ElementBackground {
    ElementBackground {
        content: restore_style_content(raw.content.as_ref(), color::TRANSPARENT),
    }
}

fn restore_style_content(raw: Option<&RawStyleContent>, fallback_src: &str) -> StyleContent {
    match raw {
        Some(raw) => StyleContent {
            src: style_src(raw.src.as_deref(), fallback_src),
            visible: raw.visible.unwrap_or(true),
            opacity: validate::normalized_percentage(raw.opacity, 1.0),
        },
        None => StyleContent {
            src: fallback_src.to_string(),
            visible: true,
            opacity: 1.0,
        },
    }
}

/// 样式载荷的 `src`：颜色形态归一化，非颜色的资源引用原样保留，空白回退。
fn style_src(raw: Option<&str>, fallback: &str) -> String {
    match raw.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) if color::looks_like_color(text) => color::normalize(Some(text), fallback),
        Some(text) => text.to_string(),
        None => fallback.to_string(),
    }
}

/// 宽高：负值取绝对值，非法值归零。
fn dimension_precision(raw: Option<&RawValue>, own: Scope, current: Scope) -> PrecisionValue {
    let value = validate::precision_from_raw(raw, 0.0, own, current);
    if value.value < 0.0 {
        PrecisionValue::from_value(-value.value, own, current)
    } else {
        value
    }
}

/// 非负量：负值回退到给定默认。
fn non_negative_precision(
    raw: Option<&RawValue>,
    fallback: f64,
    own: Scope,
    current: Scope,
) -> PrecisionValue {
    let value = validate::precision_from_raw(raw, fallback, own, current);
    if value.value < 0.0 {
        PrecisionValue::from_value(fallback, own, current)
    } else {
        value
    }
}

/// 严格正量：零与负值回退到给定默认。
fn positive_precision(
    raw: Option<&RawValue>,
    fallback: f64,
    own: Scope,
    current: Scope,
) -> PrecisionValue {
    let value = validate::precision_from_raw(raw, fallback, own, current);
    if value.value > 0.0 {
        value
    } else {
        PrecisionValue::from_value(fallback, own, current)
    }
}

/// 轴向翻转标记：负分量记 -1，其余一律记 +1。
fn flip_scale(raw: Option<&[f64]>) -> [f64; 2] {
    let mut scale = [1.0, 1.0];
    if let Some(values) = raw {
        for (slot, value) in scale.iter_mut().zip(values) {
            if value.is_finite() && *value < 0.0 {
                *slot = -1.0;
            }
        }
    }
    scale
}

/// 提取一个坐标分量：优先自身尺度原始量，其次显示量反推，皆无效则丢弃。
fn coordinate(raw: Option<&RawValue>, own: Scope, current: Scope) -> Option<PrecisionValue> {
    let raw = raw?;
    if let Some(value) = raw.candidate_value().filter(|v| v.is_finite()) {
        return Some(PrecisionValue::from_value(value, own, current));
    }
    let scoped = raw.candidate_scoped().filter(|v| v.is_finite())?;
    Some(PrecisionValue::from_scoped(scoped, own, current))
}

fn restore_point(raw: &RawPoint, own: Scope, current: Scope) -> Option<DucPoint> {
    match raw {
        RawPoint::Tuple(values) => {
            let x = values.first().copied().filter(|v| v.is_finite())?;
            let y = values.get(1).copied().filter(|v| v.is_finite())?;
            Some(DucPoint::new(
                PrecisionValue::from_value(x, own, current),
                PrecisionValue::from_value(y, own, current),
            ))
        }
        RawPoint::Object { x, y, mirroring } => {
            let x = coordinate(x.as_ref(), own, current)?;
            let y = coordinate(y.as_ref(), own, current)?;
            Some(DucPoint {
                x,
                y,
                mirroring: validate::mirroring_from(mirroring.as_ref()),
            })
        }
        RawPoint::Other(_) => None,
    }
}

fn restore_points(raw: Option<&[RawPoint]>, own: Scope, current: Scope) -> Vec<DucPoint> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(|point| restore_point(point, own, current))
        .collect()
}

/// 单点元素补出第二个点：第一点加上元素宽高。
fn pad_second_point(points: &mut Vec<DucPoint>, base: &ElementBase, own: Scope, current: Scope) {
    if points.len() != 1 {
        return;
    }
    let first = &points[0];
    let second = DucPoint::new(
        PrecisionValue::from_value(first.x.value + base.width.value, own, current),
        PrecisionValue::from_value(first.y.value + base.height.value, own, current),
    );
    points.push(second);
}

fn restore_line_endpoint(
    raw: &RawLineEndpoint,
    point_count: usize,
    own: Scope,
    current: Scope,
) -> Option<DucLineEndpoint> {
    match raw {
        RawLineEndpoint::Index(index) => Some(DucLineEndpoint {
            index: validate::in_bounds_index(Some(*index), point_count)?,
            handle: None,
        }),
        RawLineEndpoint::Object { index, handle } => Some(DucLineEndpoint {
            index: validate::in_bounds_index(*index, point_count)?,
            handle: handle
                .as_ref()
                .and_then(|point| restore_point(point, own, current)),
        }),
        RawLineEndpoint::Other(_) => None,
    }
}

fn restore_line(
    raw: &RawLine,
    point_count: usize,
    own: Scope,
    current: Scope,
) -> Option<DucLine> {
    match raw {
        RawLine::Tuple(endpoints) => {
            let start = restore_line_endpoint(endpoints.first()?, point_count, own, current)?;
            let end = restore_line_endpoint(endpoints.get(1)?, point_count, own, current)?;
            Some(DucLine { start, end })
        }
        RawLine::Object { start, end } => {
            let start = restore_line_endpoint(start.as_ref()?, point_count, own, current)?;
            let end = restore_line_endpoint(end.as_ref()?, point_count, own, current)?;
            Some(DucLine { start, end })
        }
        RawLine::Other(_) => None,
    }
}

/// 顺次连接所有点的默认线段表。
fn consecutive_lines(point_count: usize) -> Vec<DucLine> {
    (1..point_count)
        .map(|end| DucLine::straight(end - 1, end))
        .collect()
}

/// 合并距离不超过 [`POINT_MERGE_EPSILON`]（自身尺度）的近邻点。
/// 最早出现的点存活，线段端点重映射到幸存者，自环线段随之丢弃。
/// 返回被合并掉的点数。
fn merge_close_points(points: &mut Vec<DucPoint>, lines: &mut Vec<DucLine>) -> usize {
    let mut remap: Vec<usize> = Vec::with_capacity(points.len());
    let mut survivors: Vec<DucPoint> = Vec::with_capacity(points.len());

    for point in points.iter() {
        let position = DVec2::new(point.x.value, point.y.value);
        let merged_into = survivors.iter().position(|survivor| {
            geometry::points_close(
                DVec2::new(survivor.x.value, survivor.y.value),
                position,
                POINT_MERGE_EPSILON,
            )
        });
        match merged_into {
            Some(index) => remap.push(index),
            None => {
                remap.push(survivors.len());
                survivors.push(point.clone());
            }
        }
    }

    let merged = points.len() - survivors.len();
    if merged == 0 {
        return 0;
    }

    *points = survivors;
    for line in lines.iter_mut() {
        line.start.index = remap[line.start.index];
        line.end.index = remap[line.end.index];
    }
    lines.retain(|line| line.start.index != line.end.index);
    merged
}

/// 端点绑定。目标标识为空时只有携带标头才保留（仅标头规范形：
/// 清空落点与固定点）；间隙非负，焦点非有限归零。
fn restore_binding(
    raw: Option<&RawBinding>,
    own: Scope,
    current: Scope,
) -> Option<DucPointBinding> {
    let raw = raw?;
    let gap = non_negative_precision(raw.gap.as_ref(), 0.0, own, current);
    let focus = validate::finite_or(raw.focus, 0.0);
    let head = validate::line_head_from(raw.head.as_ref());

    let Some(element_id) = validate::non_blank(raw.element_id.clone()) else {
        return head.map(|head| DucPointBinding {
            element_id: None,
            focus,
            gap,
            fixed_point: None,
            point: None,
            head: Some(head),
        });
    };

    Some(DucPointBinding {
        element_id: Some(element_id),
        focus,
        gap,
        fixed_point: fixed_point_from(raw.fixed_point.as_ref()),
        point: binding_point_from(raw.point.as_ref()),
        head,
    })
}

fn fixed_point_from(raw: Option<&RawPoint>) -> Option<Point2> {
    match raw? {
        RawPoint::Tuple(values) => {
            let x = values.first().copied().filter(|v| v.is_finite())?;
            let y = values.get(1).copied().filter(|v| v.is_finite())?;
            Some(Point2::new(x, y))
        }
        RawPoint::Object { x, y, .. } => {
            let x = x
                .as_ref()
                .and_then(RawValue::candidate_value)
                .filter(|v| v.is_finite())?;
            let y = y
                .as_ref()
                .and_then(RawValue::candidate_value)
                .filter(|v| v.is_finite())?;
            Some(Point2::new(x, y))
        }
        RawPoint::Other(_) => None,
    }
}

/// 绑定落点：索引必须是非负精确整数。界内校验要到图修复阶段拿到
/// 目标元素的点数后才能完成。
fn binding_point_from(raw: Option<&RawBindingPoint>) -> Option<BindingPoint> {
    let raw = raw?;
    let index = raw
        .index
        .filter(|v| v.is_finite() && v.fract() == 0.0 && *v >= 0.0)? as usize;
    Some(BindingPoint {
        index,
        offset: validate::symmetric_unit_or(raw.offset, 0.0),
    })
}

fn shift_point(point: &mut DucPoint, shift: DVec2, own: Scope, current: Scope) {
    point.x = PrecisionValue::from_value(point.x.value - shift.x, own, current);
    point.y = PrecisionValue::from_value(point.y.value - shift.y, own, current);
}

/// 平移点集使首点落在原点，元素坐标吸收平移量。
/// 控制柄与最后落点一并平移。
fn normalize_origin(element: &mut LinearElement, own: Scope, current: Scope) {
    let Some(first) = element.points.first() else {
        return;
    };
    let shift = DVec2::new(first.x.value, first.y.value);
    if shift == DVec2::ZERO {
        return;
    }

    for point in &mut element.points {
        shift_point(point, shift, own, current);
    }
    for line in &mut element.lines {
        if let Some(handle) = line.start.handle.as_mut() {
            shift_point(handle, shift, own, current);
        }
        if let Some(handle) = line.end.handle.as_mut() {
            shift_point(handle, shift, own, current);
        }
    }
    if let Some(point) = element.last_committed_point.as_mut() {
        shift_point(point, shift, own, current);
    }

    element.base.x = PrecisionValue::from_value(element.base.x.value + shift.x, own, current);
    element.base.y = PrecisionValue::from_value(element.base.y.value + shift.y, own, current);
}

/// 子路径覆盖：索引必须界内、边集构成闭合环、且与已接受的覆盖
/// 不共享任何线段（先到先得）。违规者丢弃。
fn restore_path_overrides(
    raw: Option<&[RawPath]>,
    lines: &[DucLine],
    element_id: &str,
    own: Scope,
    current: Scope,
) -> Vec<DucPath> {
    let mut accepted: Vec<DucPath> = Vec::new();
    let mut claimed: HashSet<usize> = HashSet::new();

    for path in raw.unwrap_or_default() {
        let Some(raw_indices) = path.line_indices.as_ref() else {
            debug!(id = element_id, "子路径覆盖缺少线段索引，丢弃");
            continue;
        };
        let mut indices = Vec::with_capacity(raw_indices.len());
        let mut in_bounds = true;
        for raw_index in raw_indices {
            match validate::in_bounds_index(Some(*raw_index), lines.len()) {
                Some(index) => indices.push(index),
                None => {
                    in_bounds = false;
                    break;
                }
            }
        }
        if !in_bounds || indices.is_empty() {
            debug!(id = element_id, "子路径覆盖索引越界，丢弃");
            continue;
        }
        let edges: Vec<(usize, usize)> = indices
            .iter()
            .map(|index| (lines[*index].start.index, lines[*index].end.index))
            .collect();
        if !geometry::forms_closed_loop(&edges) {
            debug!(id = element_id, "子路径覆盖未构成闭合环，丢弃");
            continue;
        }
        if indices.iter().any(|index| claimed.contains(index)) {
            debug!(id = element_id, "子路径覆盖与已接受的覆盖重叠，丢弃");
            continue;
        }
        claimed.extend(indices.iter().copied());
        accepted.push(DucPath {
            line_indices: indices,
            stroke: path
                .stroke
                .as_ref()
                .map(|stroke| restore_stroke(stroke, own, current)),
            background: path.background.as_ref().map(restore_background),
        });
    }

    accepted
}

/// 线性元素的拓扑重建，固定次序：点 → 补点 → 线段 → 近邻合并 →
/// 绑定 → 子路径覆盖 → （无绑定时）原点归一与宽高回填。
fn restore_linear(raw: &RawElement, base: ElementBase, ctx: &RestoreContext<'_>) -> LinearElement {
    let own = base.scope;
    let current = ctx.current_scope;

    let mut points = restore_points(raw.points.as_deref(), own, current);
    pad_second_point(&mut points, &base, own, current);

    let mut lines = match raw.lines.as_deref() {
        Some(raw_lines) => {
            let mut lines = Vec::with_capacity(raw_lines.len());
            for line in raw_lines {
                match restore_line(line, points.len(), own, current) {
                    Some(line) => lines.push(line),
                    None => debug!(id = base.id.as_str(), "端点非法的线段被丢弃"),
                }
            }
            if lines.is_empty() {
                consecutive_lines(points.len())
            } else {
                lines
            }
        }
        None => consecutive_lines(points.len()),
    };

    let merged = merge_close_points(&mut points, &mut lines);
    if merged > 0 {
        debug!(id = base.id.as_str(), merged, "近邻点已合并");
    }

    let start_binding = restore_binding(raw.start_binding.as_ref(), own, current);
    let end_binding = restore_binding(raw.end_binding.as_ref(), own, current);
    let last_committed_point = raw
        .last_committed_point
        .as_ref()
        .and_then(|point| restore_point(point, own, current));
    let path_overrides =
        restore_path_overrides(raw.path_overrides.as_deref(), &lines, &base.id, own, current);

    let mut element = LinearElement {
        base,
        points,
        lines,
        path_overrides,
        last_committed_point,
        start_binding,
        end_binding,
    };

    // 绑定存在时位置由绑定决定，跳过归一化与宽高回填。
    if !element.has_binding() {
        normalize_origin(&mut element, own, current);
        let bounds = document::path_bounds(&element.points, &element.lines);
        element.base.width = PrecisionValue::from_value(bounds.width(), own, current);
        element.base.height = PrecisionValue::from_value(bounds.height(), own, current);
    }

    element
}

fn restore_freedraw(
    raw: &RawElement,
    base: ElementBase,
    ctx: &RestoreContext<'_>,
) -> FreeDrawElement {
    let own = base.scope;
    let current = ctx.current_scope;

    let mut points = restore_points(raw.points.as_deref(), own, current);
    pad_second_point(&mut points, &base, own, current);

    let mut pressures: Vec<f64> = raw
        .pressures
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|pressure| validate::unit_interval_or(Some(*pressure), 0.0))
        .collect();
    let mut simulate_pressure = raw
        .simulate_pressure
        .unwrap_or_else(|| pressures.is_empty());
    if !pressures.is_empty() && pressures.len() != points.len() {
        debug!(id = base.id.as_str(), "压感序列长度与点数不符，改用模拟压感");
        pressures.clear();
        simulate_pressure = true;
    }

    FreeDrawElement {
        base,
        points,
        pressures,
        simulate_pressure,
        thinning: validate::symmetric_unit_or(raw.thinning, 0.5),
        smoothing: validate::unit_interval_or(raw.smoothing, 0.5),
        streamline: validate::unit_interval_or(raw.streamline, 0.5),
    }
}

/// 历史 `"<字号> <字体>"` 组合串按首个空白拆分。
fn split_legacy_font(font: Option<&str>) -> (Option<f64>, Option<String>) {
    let Some(font) = font.map(str::trim).filter(|text| !text.is_empty()) else {
        return (None, None);
    };
    match font.split_once(char::is_whitespace) {
        Some((size, family)) => {
            let size = size
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0);
            let family = Some(family.trim().to_string()).filter(|text| !text.is_empty());
            (size, family)
        }
        None => match font.parse::<f64>() {
            Ok(size) if size.is_finite() && size > 0.0 => (Some(size), None),
            _ => (None, Some(font.to_string())),
        },
    }
}

fn restore_text(raw: &RawElement, mut base: ElementBase, ctx: &RestoreContext<'_>) -> TextElement {
    let own = base.scope;
    let current = ctx.current_scope;

    let (legacy_size, legacy_family) = split_legacy_font(raw.font.as_deref());
    // 显式字号优先，其次历史组合串，最后默认值。
    let font_size = positive_precision(
        raw.font_size.as_ref(),
        legacy_size.unwrap_or(DEFAULT_FONT_SIZE),
        own,
        current,
    );
    let text = validate::text_or(raw.text.clone(), "");
    let line_height = validate::positive_or(raw.line_height, DEFAULT_LINE_HEIGHT);

    if ctx.refresh_dimensions {
        let line_count = text.lines().count().max(1);
        let longest = text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        base.height = PrecisionValue::from_value(
            line_count as f64 * font_size.value * line_height,
            own,
            current,
        );
        base.width = PrecisionValue::from_value(
            longest as f64 * font_size.value * GLYPH_WIDTH_RATIO,
            own,
            current,
        );
    }

    TextElement {
        base,
        text,
        font_size,
        font_family: validate::non_blank(raw.font_family.clone())
            .or(legacy_family)
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        text_align: validate::text_align_or(raw.text_align.as_ref(), TextAlign::Left),
        vertical_align: validate::vertical_align_or(raw.vertical_align.as_ref(), VerticalAlign::Top),
        container_id: validate::non_blank(raw.container_id.clone()),
        line_height,
        auto_resize: raw.auto_resize.unwrap_or(true),
    }
}

/// 顺序表：过滤到已定义的键并去重（保持出现顺序），
/// 未被提及的键按映射序补在末尾。
fn restore_order<V>(raw: Option<&[String]>, defined: &BTreeMap<String, V>) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(defined.len());
    let mut seen: HashSet<&str> = HashSet::new();
    for key in raw.unwrap_or_default() {
        if defined.contains_key(key) && seen.insert(key.as_str()) {
            order.push(key.clone());
        }
    }
    for key in defined.keys() {
        if !seen.contains(key.as_str()) {
            order.push(key.clone());
        }
    }
    order
}

fn restore_table(raw: &RawElement, base: ElementBase, ctx: &RestoreContext<'_>) -> TableElement {
    let own = base.scope;
    let current = ctx.current_scope;

    // 映射键是权威标识，条目内的 id 字段被覆盖。
    let mut columns: BTreeMap<String, TableColumn> = BTreeMap::new();
    for (key, column) in raw.columns.as_ref().into_iter().flatten() {
        if key.trim().is_empty() {
            continue;
        }
        columns.insert(
            key.clone(),
            TableColumn {
                id: key.clone(),
                width: non_negative_precision(
                    column.width.as_ref(),
                    DEFAULT_COLUMN_WIDTH,
                    own,
                    current,
                ),
            },
        );
    }
    let mut rows: BTreeMap<String, TableRow> = BTreeMap::new();
    for (key, row) in raw.rows.as_ref().into_iter().flatten() {
        if key.trim().is_empty() {
            continue;
        }
        rows.insert(
            key.clone(),
            TableRow {
                id: key.clone(),
                height: non_negative_precision(
                    row.height.as_ref(),
                    DEFAULT_ROW_HEIGHT,
                    own,
                    current,
                ),
            },
        );
    }

    let column_order = restore_order(raw.column_order.as_deref(), &columns);
    let row_order = restore_order(raw.row_order.as_deref(), &rows);

    // 单元格坐标取自字段，缺一则回退解析 `"行id:列id"` 键；
    // 行列任何一端未定义即丢弃。
    let mut cells: BTreeMap<String, TableCell> = BTreeMap::new();
    for (key, cell) in raw.cells.as_ref().into_iter().flatten() {
        let (row_id, column_id) = match (
            validate::non_blank(cell.row_id.clone()),
            validate::non_blank(cell.column_id.clone()),
        ) {
            (Some(row_id), Some(column_id)) => (row_id, column_id),
            _ => match key.split_once(':') {
                Some((row_id, column_id)) if !row_id.is_empty() && !column_id.is_empty() => {
                    (row_id.to_string(), column_id.to_string())
                }
                _ => continue,
            },
        };
        if !rows.contains_key(&row_id) || !columns.contains_key(&column_id) {
            continue;
        }
        cells.insert(
            format!("{row_id}:{column_id}"),
            TableCell {
                row_id,
                column_id,
                data: validate::text_or(cell.data.clone(), ""),
                locked: cell.locked.unwrap_or(false),
            },
        );
    }

    TableElement {
        base,
        column_order,
        row_order,
        columns,
        rows,
        cells,
    }
}

fn restore_block_instance(
    raw: &RawElement,
    base: ElementBase,
    ctx: &RestoreContext<'_>,
) -> Option<BlockInstanceElement> {
    let Some(block_id) = validate::non_blank(raw.block_id.clone()) else {
        debug!(id = base.id.as_str(), "块实例缺少块标识，丢弃");
        return None;
    };
    let Some(declared_tags) = ctx.blocks.get(&block_id) else {
        debug!(
            id = base.id.as_str(),
            block_id = block_id.as_str(),
            "块实例指向不存在的块，丢弃"
        );
        return None;
    };

    let attribute_values: BTreeMap<String, String> = raw
        .attribute_values
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter(|(tag, _)| declared_tags.contains(tag))
        .collect();

    Some(BlockInstanceElement {
        base,
        block_id,
        attribute_values,
        element_overrides: raw.element_overrides.clone().unwrap_or_default(),
    })
}
