use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Bounds2D, Point2};
use crate::precision::{PrecisionValue, Zoom};
use crate::scope::{NEUTRAL_SCOPE, Scope};

/// 元素标识符。外部输入可携带任意字符串，新生成的取自 [`crate::id::new_id`]。
pub type ElementId = String;

/// 受支持的元素种类。`diamond`、`arrow` 等历史类型不在目录内，
/// 由恢复层迁移为目录内的种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Rectangle,
    Polygon,
    Ellipse,
    Embeddable,
    Pdf,
    Image,
    Text,
    Line,
    Freedraw,
    Frame,
    Table,
    Doc,
    Blockinstance,
}

impl ElementType {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Rectangle => "rectangle",
            ElementType::Polygon => "polygon",
            ElementType::Ellipse => "ellipse",
            ElementType::Embeddable => "embeddable",
            ElementType::Pdf => "pdf",
            ElementType::Image => "image",
            ElementType::Text => "text",
            ElementType::Line => "line",
            ElementType::Freedraw => "freedraw",
            ElementType::Frame => "frame",
            ElementType::Table => "table",
            ElementType::Doc => "doc",
            ElementType::Blockinstance => "blockinstance",
        }
    }

    /// 严格按目录解析；历史别名的映射发生在恢复层。
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = match raw {
            "rectangle" => ElementType::Rectangle,
            "polygon" => ElementType::Polygon,
            "ellipse" => ElementType::Ellipse,
            "embeddable" => ElementType::Embeddable,
            "pdf" => ElementType::Pdf,
            "image" => ElementType::Image,
            "text" => ElementType::Text,
            "line" => ElementType::Line,
            "freedraw" => ElementType::Freedraw,
            "frame" => ElementType::Frame,
            "table" => ElementType::Table,
            "doc" => ElementType::Doc,
            "blockinstance" => ElementType::Blockinstance,
            _ => return None,
        };
        Some(kind)
    }
}

/// 贝塞尔控制柄镜像方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BezierMirroring {
    Angle,
    AngleLength,
}

/// 元素局部坐标系内的点。两个分量都是双表示精度量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucPoint {
    pub x: PrecisionValue,
    pub y: PrecisionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirroring: Option<BezierMirroring>,
}

impl DucPoint {
    #[inline]
    pub fn new(x: PrecisionValue, y: PrecisionValue) -> Self {
        Self {
            x,
            y,
            mirroring: None,
        }
    }
}

/// 线段端点：指向点数组的索引，外加可选的贝塞尔控制柄。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucLineEndpoint {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<DucPoint>,
}

/// 连接两个点索引的线段。无控制柄为直线，一个为二次贝塞尔，两个为三次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucLine {
    pub start: DucLineEndpoint,
    pub end: DucLineEndpoint,
}

impl DucLine {
    #[inline]
    pub fn straight(start: usize, end: usize) -> Self {
        Self {
            start: DucLineEndpoint {
                index: start,
                handle: None,
            },
            end: DucLineEndpoint {
                index: end,
                handle: None,
            },
        }
    }
}

/// 线性元素上的子路径覆盖：一组线段索引圈出的闭合子环，可带独立样式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucPath {
    pub line_indices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<ElementStroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<ElementBackground>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokePlacement {
    Inside,
    Center,
    Outside,
}

/// 描边与填充共享的内容载荷：颜色或资源引用、可见性与不透明度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleContent {
    pub src: String,
    pub visible: bool,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStroke {
    pub content: StyleContent,
    pub width: PrecisionValue,
    pub placement: StrokePlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBackground {
    pub content: StyleContent,
}

/// 线端标头样式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineHead {
    Arrow,
    Bar,
    Circle,
    CircleOutlined,
    Triangle,
    TriangleOutlined,
    Diamond,
    DiamondOutlined,
}

/// 线-线绑定的落点：目标点索引与沿该点的归一化偏移（[-1, 1]）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingPoint {
    pub index: usize,
    pub offset: f64,
}

/// 线性元素端点与其他元素的绑定关系。
/// `element_id` 为空且 `head` 存在时是合法的“仅标头”绑定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucPointBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<ElementId>,
    pub focus: f64,
    pub gap: PrecisionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_point: Option<Point2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<BindingPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<LineHead>,
}

impl DucPointBinding {
    #[inline]
    pub fn is_head_only(&self) -> bool {
        self.element_id.is_none() && self.head.is_some()
    }
}

/// 元素反向引用表里的一项：谁绑在我身上，以及它的种类。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: ElementId,
    pub element_type: ElementType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Pending,
    Saved,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

/// 所有元素共享的基座。几何量全部是双表示精度量，自身尺度记在 `scope`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBase {
    pub id: ElementId,
    pub x: PrecisionValue,
    pub y: PrecisionValue,
    pub width: PrecisionValue,
    pub height: PrecisionValue,
    /// 旋转角，弧度，绝对值小于 2π。
    pub angle: f64,
    pub scope: Scope,
    pub label: String,
    pub is_visible: bool,
    pub opacity: f64,
    pub stroke: Vec<ElementStroke>,
    pub background: Vec<ElementBackground>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bound_elements: Vec<BoundElement>,
    pub z_index: i32,
    /// 分数排序键，缺失或失序时由索引同步器重排。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub version: u64,
    pub version_nonce: u64,
    pub updated: i64,
    pub is_deleted: bool,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangleElement {
    pub base: ElementBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonElement {
    pub base: ElementBase,
    /// 边数，至少为 3。历史的 diamond 类型迁移为 4。
    pub sides: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EllipseElement {
    pub base: ElementBase,
    /// 短轴与长轴之比，(0, 1]。
    pub ratio: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddableElement {
    pub base: ElementBase,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfElement {
    pub base: ElementBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub base: ElementBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub status: ImageStatus,
    /// 轴向翻转标记，分量只取 ±1。
    pub scale: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub base: ElementBase,
    pub text: String,
    pub font_size: PrecisionValue,
    pub font_family: String,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    /// 所属容器；悬空引用在图修复阶段被清除。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<ElementId>,
    /// 相对行高（字号的倍数）。
    pub line_height: f64,
    pub auto_resize: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearElement {
    pub base: ElementBase,
    pub points: Vec<DucPoint>,
    pub lines: Vec<DucLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_overrides: Vec<DucPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_committed_point: Option<DucPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_binding: Option<DucPointBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_binding: Option<DucPointBinding>,
}

impl LinearElement {
    #[inline]
    pub fn has_binding(&self) -> bool {
        self.start_binding.is_some() || self.end_binding.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeDrawElement {
    pub base: ElementBase,
    pub points: Vec<DucPoint>,
    /// 与 points 等长的压感序列；长度不符时整体丢弃并改用模拟压感。
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pressures: Vec<f64>,
    pub simulate_pressure: bool,
    pub thinning: f64,
    pub smoothing: f64,
    pub streamline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameElement {
    pub base: ElementBase,
    pub is_collapsed: bool,
    pub clip: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: String,
    pub width: PrecisionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: String,
    pub height: PrecisionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub row_id: String,
    pub column_id: String,
    pub data: String,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableElement {
    pub base: ElementBase,
    pub column_order: Vec<String>,
    pub row_order: Vec<String>,
    pub columns: BTreeMap<String, TableColumn>,
    pub rows: BTreeMap<String, TableRow>,
    /// 以 `"行id:列id"` 为键。
    pub cells: BTreeMap<String, TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocElement {
    pub base: ElementBase,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInstanceElement {
    pub base: ElementBase,
    pub block_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attribute_values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub element_overrides: BTreeMap<String, String>,
}

/// 元素联合体。恢复层保证其中的每个成员都满足各自的字段域约束。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DucElement {
    Rectangle(RectangleElement),
    Polygon(PolygonElement),
    Ellipse(EllipseElement),
    Embeddable(EmbeddableElement),
    Pdf(PdfElement),
    Image(ImageElement),
    Text(TextElement),
    Linear(LinearElement),
    FreeDraw(FreeDrawElement),
    Frame(FrameElement),
    Table(TableElement),
    Doc(DocElement),
    BlockInstance(BlockInstanceElement),
}

impl DucElement {
    #[inline]
    pub fn base(&self) -> &ElementBase {
        match self {
            DucElement::Rectangle(element) => &element.base,
            DucElement::Polygon(element) => &element.base,
            DucElement::Ellipse(element) => &element.base,
            DucElement::Embeddable(element) => &element.base,
            DucElement::Pdf(element) => &element.base,
            DucElement::Image(element) => &element.base,
            DucElement::Text(element) => &element.base,
            DucElement::Linear(element) => &element.base,
            DucElement::FreeDraw(element) => &element.base,
            DucElement::Frame(element) => &element.base,
            DucElement::Table(element) => &element.base,
            DucElement::Doc(element) => &element.base,
            DucElement::BlockInstance(element) => &element.base,
        }
    }

    #[inline]
    pub fn base_mut(&mut self) -> &mut ElementBase {
        match self {
            DucElement::Rectangle(element) => &mut element.base,
            DucElement::Polygon(element) => &mut element.base,
            DucElement::Ellipse(element) => &mut element.base,
            DucElement::Embeddable(element) => &mut element.base,
            DucElement::Pdf(element) => &mut element.base,
            DucElement::Image(element) => &mut element.base,
            DucElement::Text(element) => &mut element.base,
            DucElement::Linear(element) => &mut element.base,
            DucElement::FreeDraw(element) => &mut element.base,
            DucElement::Frame(element) => &mut element.base,
            DucElement::Table(element) => &mut element.base,
            DucElement::Doc(element) => &mut element.base,
            DucElement::BlockInstance(element) => &mut element.base,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.base().id
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        match self {
            DucElement::Rectangle(_) => ElementType::Rectangle,
            DucElement::Polygon(_) => ElementType::Polygon,
            DucElement::Ellipse(_) => ElementType::Ellipse,
            DucElement::Embeddable(_) => ElementType::Embeddable,
            DucElement::Pdf(_) => ElementType::Pdf,
            DucElement::Image(_) => ElementType::Image,
            DucElement::Text(_) => ElementType::Text,
            DucElement::Linear(_) => ElementType::Line,
            DucElement::FreeDraw(_) => ElementType::Freedraw,
            DucElement::Frame(_) => ElementType::Frame,
            DucElement::Table(_) => ElementType::Table,
            DucElement::Doc(_) => ElementType::Doc,
            DucElement::BlockInstance(_) => ElementType::Blockinstance,
        }
    }
}

/// 组、区域、图层与图框共享的堆叠属性。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackProperties {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_visible: bool,
    pub locked: bool,
    pub opacity: f64,
    pub labeling_color: String,
}

impl Default for StackProperties {
    fn default() -> Self {
        Self {
            label: String::new(),
            description: None,
            is_visible: true,
            locked: false,
            opacity: 1.0,
            labeling_color: "transparent".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucGroup {
    pub id: String,
    pub stack: StackProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOperation {
    Union,
    Subtract,
    Intersect,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucRegion {
    pub id: String,
    pub stack: StackProperties,
    pub boolean_operation: BooleanOperation,
}

/// 图层。样式覆盖里带精度量，因此图层恢复需要当前尺度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucLayer {
    pub id: String,
    pub stack: StackProperties,
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_override: Option<ElementStroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_override: Option<ElementBackground>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAttributeDefinition {
    pub tag: String,
    pub default_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// 块定义：可复用的元素集合与属性定义表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucBlock {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: u32,
    pub elements: Vec<DucElement>,
    pub attribute_definitions: BTreeMap<String, BlockAttributeDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPrecision {
    pub linear: u8,
    pub angular: u8,
}

impl Default for UnitPrecision {
    fn default() -> Self {
        Self {
            linear: 4,
            angular: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_precision: Option<UnitPrecision>,
}

/// 绘图标准。只校验结构，不解释语义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standard {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: u32,
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<StandardOverrides>,
}

/// 文档级全局状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucGlobalState {
    pub view_background_color: String,
    pub main_scope: Scope,
    pub dash_spacing_scale: f64,
    pub is_dash_spacing_affected_by_viewport_scale: bool,
    /// 引力井阈值，限制在 [1, 10]。
    pub scope_exponent_threshold: f64,
    pub dimensions_associated_by_default: bool,
    pub use_annotative_scaling: bool,
    pub display_precision_linear: u8,
    pub display_precision_angular: u8,
    /// 版本图修剪档位，字节域取值。
    pub pruning_level: u8,
}

impl Default for DucGlobalState {
    fn default() -> Self {
        Self {
            view_background_color: "#ffffff".to_string(),
            main_scope: NEUTRAL_SCOPE,
            dash_spacing_scale: 1.0,
            is_dash_spacing_affected_by_viewport_scale: false,
            scope_exponent_threshold: 2.0,
            dimensions_associated_by_default: true,
            use_annotative_scaling: false,
            display_precision_linear: 4,
            display_precision_angular: 2,
            pruning_level: 0,
        }
    }
}

/// 会话级局部状态。滚动偏移的自身尺度固定为中性尺度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucLocalState {
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_standard_id: Option<String>,
    pub scroll_x: PrecisionValue,
    pub scroll_y: PrecisionValue,
    pub zoom: Zoom,
    pub is_binding_enabled: bool,
    pub pen_mode: bool,
    pub view_mode_enabled: bool,
}

impl Default for DucLocalState {
    fn default() -> Self {
        Self {
            scope: NEUTRAL_SCOPE,
            active_standard_id: None,
            scroll_x: PrecisionValue::zero(),
            scroll_y: PrecisionValue::zero(),
            zoom: Zoom::default(),
            is_binding_enabled: true,
            pen_mode: false,
            view_mode_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_manual_save: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub timestamp: i64,
}

/// 版本图的结构件。两个根标识必须指向图内条目，否则整张图被放弃。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionGraph {
    pub user_checkpoint_version_id: String,
    pub latest_version_id: String,
    pub checkpoints: Vec<Checkpoint>,
    pub deltas: Vec<Delta>,
}

impl VersionGraph {
    /// 判断某个版本标识是否存在于检查点或增量之中。
    pub fn contains_version(&self, version_id: &str) -> bool {
        self.checkpoints
            .iter()
            .any(|checkpoint| checkpoint.id == version_id)
            || self.deltas.iter().any(|delta| delta.id == version_id)
    }
}

/// 外部文件条目。载荷是不透明的 dataURL 字符串，本层不解码。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucExternalFile {
    pub id: String,
    pub mime_type: String,
    pub data_url: String,
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_retrieved: Option<i64>,
}

/// 恢复结果聚合。调用方独占所有权，恢复引擎不保留任何内部引用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoredDataState {
    pub document_id: String,
    pub elements: Vec<DucElement>,
    pub blocks: Vec<DucBlock>,
    pub groups: Vec<DucGroup>,
    pub regions: Vec<DucRegion>,
    pub layers: Vec<DucLayer>,
    pub standards: Vec<Standard>,
    pub dictionary: BTreeMap<String, String>,
    pub global_state: DucGlobalState,
    pub local_state: DucLocalState,
    pub files: BTreeMap<String, DucExternalFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_graph: Option<VersionGraph>,
}

impl RestoredDataState {
    #[inline]
    pub fn element(&self, id: &str) -> Option<&DucElement> {
        self.elements.iter().find(|element| element.id() == id)
    }
}

/// 按自身尺度坐标计算一组点的包围盒。
pub fn points_bounds(points: &[DucPoint]) -> Bounds2D {
    let mut bounds = Bounds2D::empty();
    for point in points {
        bounds.include_point(Point2::new(point.x.value, point.y.value));
    }
    bounds
}

/// 贝塞尔感知的路径包围盒：线段端点加上控制柄推出的极值点。
/// 越界的线段索引被忽略（恢复层在调用前已剔除，这里保持防御性一致）。
pub fn path_bounds(points: &[DucPoint], lines: &[DucLine]) -> Bounds2D {
    let mut bounds = Bounds2D::empty();
    if lines.is_empty() {
        return points_bounds(points);
    }
    for line in lines {
        let (Some(start), Some(end)) = (points.get(line.start.index), points.get(line.end.index))
        else {
            continue;
        };
        let start_handle = line
            .start
            .handle
            .as_ref()
            .map(|handle| glam::DVec2::new(handle.x.value, handle.y.value));
        let end_handle = line
            .end
            .handle
            .as_ref()
            .map(|handle| glam::DVec2::new(handle.x.value, handle.y.value));
        geometry::include_segment_bounds(
            &mut bounds,
            glam::DVec2::new(start.x.value, start.y.value),
            start_handle,
            end_handle,
            glam::DVec2::new(end.x.value, end.y.value),
        );
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    fn point(x: f64, y: f64) -> DucPoint {
        DucPoint::new(
            PrecisionValue::from_value(x, Scope::Millimeter, Scope::Millimeter),
            PrecisionValue::from_value(y, Scope::Millimeter, Scope::Millimeter),
        )
    }

    #[test]
    fn element_type_round_trip() {
        for kind in [
            ElementType::Rectangle,
            ElementType::Polygon,
            ElementType::Ellipse,
            ElementType::Embeddable,
            ElementType::Pdf,
            ElementType::Image,
            ElementType::Text,
            ElementType::Line,
            ElementType::Freedraw,
            ElementType::Frame,
            ElementType::Table,
            ElementType::Doc,
            ElementType::Blockinstance,
        ] {
            assert_eq!(ElementType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ElementType::parse("diamond"), None, "历史类型不在目录内");
        assert_eq!(ElementType::parse("arrow"), None);
    }

    #[test]
    fn stack_properties_defaults() {
        let stack = StackProperties::default();
        assert!(stack.is_visible);
        assert!(!stack.locked);
        assert!((stack.opacity - 1.0).abs() < f64::EPSILON);
        assert_eq!(stack.labeling_color, "transparent");
    }

    #[test]
    fn path_bounds_covers_straight_polyline() {
        let points = vec![point(0.0, 0.0), point(10.0, 0.0), point(10.0, 4.0)];
        let lines = vec![DucLine::straight(0, 1), DucLine::straight(1, 2)];
        let bounds = path_bounds(&points, &lines);
        assert!((bounds.width() - 10.0).abs() < 1e-12);
        assert!((bounds.height() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn path_bounds_grows_with_handles() {
        let points = vec![point(0.0, 0.0), point(10.0, 0.0)];
        let mut line = DucLine::straight(0, 1);
        line.start.handle = Some(point(5.0, 10.0));
        let bounds = path_bounds(&points, &[line]);
        assert!(bounds.height() > 4.9, "控制柄必须撑大包围盒");
    }

    #[test]
    fn version_graph_membership() {
        let graph = VersionGraph {
            user_checkpoint_version_id: "c1".to_string(),
            latest_version_id: "d1".to_string(),
            checkpoints: vec![Checkpoint {
                id: "c1".to_string(),
                parent_id: None,
                timestamp: 10,
                description: None,
                is_manual_save: true,
            }],
            deltas: vec![Delta {
                id: "d1".to_string(),
                parent_id: Some("c1".to_string()),
                timestamp: 20,
            }],
        };
        assert!(graph.contains_version("c1"));
        assert!(graph.contains_version("d1"));
        assert!(!graph.contains_version("missing"));
    }
}
