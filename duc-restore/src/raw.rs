//! 入站文档的宽松镜像树。
//!
//! 每个字段都允许缺失，历史形态（扁平颜色、`"<字号> <字体>"` 字符串、
//! `[x, y]` 点元组）通过别名与无标签枚举一并接收。未知字段被忽略，
//! 无法归类的片段落入 `Other` 分支，由恢复层按失效处理。

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// 入站聚合。字段名遵循宿主格式的 camelCase。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDataState {
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub version: Option<Value>,
    pub source: Option<String>,
    #[serde(alias = "documentId")]
    pub id: Option<String>,
    pub elements: Option<Vec<RawElement>>,
    pub blocks: Option<Vec<RawBlock>>,
    pub groups: Option<Vec<RawGroup>>,
    pub regions: Option<Vec<RawRegion>>,
    pub layers: Option<Vec<RawLayer>>,
    pub standards: Option<Vec<RawStandard>>,
    pub dictionary: Option<BTreeMap<String, Value>>,
    #[serde(alias = "ducGlobalState")]
    pub global_state: Option<RawGlobalState>,
    #[serde(alias = "ducLocalState", alias = "appState")]
    pub local_state: Option<RawLocalState>,
    pub files: Option<BTreeMap<String, RawFile>>,
    pub version_graph: Option<RawVersionGraph>,
}

/// 数值或 `{ value, scoped }` 对象。裸数值按自身尺度下的原始量解释。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Pair {
        value: Option<f64>,
        scoped: Option<f64>,
    },
    Other(Value),
}

impl RawValue {
    /// 自身尺度下的候选原始量。
    #[inline]
    pub fn candidate_value(&self) -> Option<f64> {
        match self {
            RawValue::Number(number) => Some(*number),
            RawValue::Pair { value, .. } => *value,
            RawValue::Other(_) => None,
        }
    }

    /// 显示尺度下的候选量，仅在原始量缺失时采用。
    #[inline]
    pub fn candidate_scoped(&self) -> Option<f64> {
        match self {
            RawValue::Number(_) => None,
            RawValue::Pair { scoped, .. } => *scoped,
            RawValue::Other(_) => None,
        }
    }
}

/// 字符串或数字形式的枚举码。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCode {
    Number(f64),
    Text(String),
    Other(Value),
}

impl RawCode {
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawCode::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawCode::Number(number) => Some(*number),
            _ => None,
        }
    }
}

/// `[x, y]` 元组或带镜像标记的对象。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPoint {
    Tuple(Vec<f64>),
    Object {
        x: Option<RawValue>,
        y: Option<RawValue>,
        mirroring: Option<RawCode>,
    },
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLineEndpoint {
    Index(f64),
    Object {
        index: Option<f64>,
        handle: Option<RawPoint>,
    },
    Other(Value),
}

/// 线段：端点对的元组形式或 `{ start, end }` 对象形式。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLine {
    Tuple(Vec<RawLineEndpoint>),
    Object {
        start: Option<RawLineEndpoint>,
        end: Option<RawLineEndpoint>,
    },
    Other(Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPath {
    pub line_indices: Option<Vec<f64>>,
    pub stroke: Option<RawStroke>,
    pub background: Option<RawBackground>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStyleContent {
    pub src: Option<String>,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStroke {
    pub content: Option<RawStyleContent>,
    pub width: Option<RawValue>,
    pub placement: Option<RawCode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBackground {
    pub content: Option<RawStyleContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBindingPoint {
    pub index: Option<f64>,
    pub offset: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBinding {
    pub element_id: Option<String>,
    pub focus: Option<f64>,
    pub gap: Option<RawValue>,
    pub fixed_point: Option<RawPoint>,
    pub point: Option<RawBindingPoint>,
    pub head: Option<RawCode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBoundElement {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub element_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTableColumn {
    pub id: Option<String>,
    pub width: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTableRow {
    pub id: Option<String>,
    pub height: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTableCell {
    pub row_id: Option<String>,
    pub column_id: Option<String>,
    pub data: Option<String>,
    pub locked: Option<bool>,
}

/// 元素镜像：类型标签加所有变体字段的并集。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawElement {
    #[serde(rename = "type")]
    pub element_type: Option<String>,
    pub id: Option<String>,
    pub x: Option<RawValue>,
    pub y: Option<RawValue>,
    pub width: Option<RawValue>,
    pub height: Option<RawValue>,
    pub angle: Option<f64>,
    pub scope: Option<String>,
    pub label: Option<String>,
    pub is_visible: Option<bool>,
    pub opacity: Option<f64>,
    pub stroke: Option<Vec<RawStroke>>,
    pub background: Option<Vec<RawBackground>>,
    /// 历史扁平颜色，迁移为单项结构化描边。
    pub stroke_color: Option<String>,
    /// 历史扁平颜色，迁移为单项结构化填充。
    pub background_color: Option<String>,
    pub group_ids: Option<Vec<String>>,
    pub frame_id: Option<String>,
    pub bound_elements: Option<Vec<RawBoundElement>>,
    pub z_index: Option<f64>,
    pub index: Option<String>,
    pub version: Option<f64>,
    pub version_nonce: Option<f64>,
    pub updated: Option<f64>,
    pub is_deleted: Option<bool>,
    pub locked: Option<bool>,
    pub sides: Option<f64>,
    pub ratio: Option<f64>,
    pub start_angle: Option<f64>,
    pub end_angle: Option<f64>,
    pub link: Option<String>,
    pub file_id: Option<String>,
    pub status: Option<RawCode>,
    pub scale: Option<Vec<f64>>,
    pub text: Option<String>,
    pub font_size: Option<RawValue>,
    pub font_family: Option<String>,
    /// 历史 `"<字号> <字体>"` 组合串。
    pub font: Option<String>,
    pub text_align: Option<RawCode>,
    pub vertical_align: Option<RawCode>,
    pub container_id: Option<String>,
    pub line_height: Option<f64>,
    pub auto_resize: Option<bool>,
    pub points: Option<Vec<RawPoint>>,
    pub lines: Option<Vec<RawLine>>,
    pub path_overrides: Option<Vec<RawPath>>,
    pub last_committed_point: Option<RawPoint>,
    pub start_binding: Option<RawBinding>,
    pub end_binding: Option<RawBinding>,
    pub pressures: Option<Vec<f64>>,
    pub simulate_pressure: Option<bool>,
    pub thinning: Option<f64>,
    pub smoothing: Option<f64>,
    pub streamline: Option<f64>,
    pub is_collapsed: Option<bool>,
    pub clip: Option<bool>,
    pub column_order: Option<Vec<String>>,
    pub row_order: Option<Vec<String>>,
    pub columns: Option<BTreeMap<String, RawTableColumn>>,
    pub rows: Option<BTreeMap<String, RawTableRow>>,
    pub cells: Option<BTreeMap<String, RawTableCell>>,
    pub content: Option<String>,
    pub block_id: Option<String>,
    pub attribute_values: Option<BTreeMap<String, String>>,
    pub element_overrides: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAttributeDefinition {
    pub tag: Option<String>,
    pub default_value: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBlock {
    pub id: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub version: Option<f64>,
    pub elements: Option<Vec<RawElement>>,
    pub attribute_definitions: Option<BTreeMap<String, RawAttributeDefinition>>,
}

/// 堆叠属性的入站形态，在组、区域、图层与图框之间复用。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStackProperties {
    pub label: Option<String>,
    pub description: Option<String>,
    pub is_visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f64>,
    pub labeling_color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGroup {
    pub id: Option<String>,
    #[serde(flatten)]
    pub stack: RawStackProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRegion {
    pub id: Option<String>,
    #[serde(flatten)]
    pub stack: RawStackProperties,
    pub boolean_operation: Option<RawCode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLayerOverrides {
    pub stroke: Option<RawStroke>,
    pub background: Option<RawBackground>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLayer {
    pub id: Option<String>,
    #[serde(flatten)]
    pub stack: RawStackProperties,
    pub readonly: Option<bool>,
    pub overrides: Option<RawLayerOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUnitPrecision {
    pub linear: Option<f64>,
    pub angular: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStandardOverrides {
    pub main_scope: Option<String>,
    pub unit_precision: Option<RawUnitPrecision>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStandard {
    pub id: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub version: Option<f64>,
    pub readonly: Option<bool>,
    pub overrides: Option<RawStandardOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDisplayPrecision {
    pub linear: Option<f64>,
    pub angular: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGlobalState {
    pub view_background_color: Option<String>,
    pub main_scope: Option<String>,
    pub dash_spacing_scale: Option<f64>,
    pub is_dash_spacing_affected_by_viewport_scale: Option<bool>,
    pub scope_exponent_threshold: Option<f64>,
    pub dimensions_associated_by_default: Option<bool>,
    pub use_annotative_scaling: Option<bool>,
    pub display_precision: Option<RawDisplayPrecision>,
    pub pruning_level: Option<f64>,
}

/// 缩放：裸数值或 `{ value }` 对象。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawZoom {
    Number(f64),
    Object { value: Option<f64> },
    Other(Value),
}

impl RawZoom {
    #[inline]
    pub fn magnification(&self) -> Option<f64> {
        match self {
            RawZoom::Number(number) => Some(*number),
            RawZoom::Object { value } => *value,
            RawZoom::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLocalState {
    pub scope: Option<String>,
    pub active_standard_id: Option<String>,
    pub scroll_x: Option<RawValue>,
    pub scroll_y: Option<RawValue>,
    pub zoom: Option<RawZoom>,
    pub is_binding_enabled: Option<bool>,
    pub pen_mode: Option<bool>,
    pub view_mode_enabled: Option<bool>,
    /// 正在编辑的元素可以豁免退化丢弃。
    pub editing_element_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCheckpoint {
    pub id: Option<String>,
    pub parent_id: Option<String>,
    pub timestamp: Option<f64>,
    pub description: Option<String>,
    pub is_manual_save: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDelta {
    pub id: Option<String>,
    pub parent_id: Option<String>,
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVersionGraph {
    pub user_checkpoint_version_id: Option<String>,
    pub latest_version_id: Option<String>,
    pub checkpoints: Option<Vec<RawCheckpoint>>,
    pub deltas: Option<Vec<RawDelta>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFile {
    pub id: Option<String>,
    pub mime_type: Option<String>,
    #[serde(alias = "dataURL")]
    pub data_url: Option<String>,
    pub created: Option<f64>,
    pub last_retrieved: Option<f64>,
}
