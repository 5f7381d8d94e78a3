//! 文档级恢复编排。各阶段按固定次序执行且从不中止：
//! 标准 → 词典 → 全局状态 → 局部状态 → 块 → 组/区域/图层 →
//! 元素（含块实例）→ 引用修复 → 排序键同步 → 版本图 → 文档标识。
//! 失败的子阶段回退到类型默认值；唯一的全有或全无例外是版本图。

use std::collections::{BTreeMap, HashMap, HashSet};

use duc_core::document::{
    BlockAttributeDefinition, BooleanOperation, Checkpoint, Delta, DucBlock, DucElement,
    DucExternalFile, DucGlobalState, DucGroup, DucLayer, DucLocalState, DucRegion, ElementId,
    RestoredDataState, StackProperties, Standard, StandardOverrides, UnitPrecision, VersionGraph,
};
use duc_core::id;
use duc_core::scope::{NEUTRAL_SCOPE, Scope};
use serde_json::Value;
use tracing::debug;

use crate::color;
use crate::element;
use crate::index::IndexSynchronizer;
use crate::raw::{
    RawBlock, RawDataState, RawElement, RawFile, RawGlobalState, RawGroup, RawLayer,
    RawLocalState, RawRegion, RawStackProperties, RawStandard, RawStandardOverrides,
    RawVersionGraph,
};
use crate::repair;
use crate::validate;

/// 显示精度位数的上限。
const MAX_PRECISION_DIGITS: u8 = 12;

/// 文档恢复的调用方配置。
pub struct RestoreOptions<'a> {
    /// 排序键同步器是必需协作项，而不是可选的后处理。
    pub index_synchronizer: &'a dyn IndexSynchronizer,
    /// 按文本内容重算文本元素的宽高。
    pub refresh_dimensions: bool,
    /// 是否在元素恢复后执行引用图修复。
    pub repair_bindings: bool,
    /// 点名豁免退化丢弃的元素集合。
    pub pass_through_element_ids: Option<HashSet<ElementId>>,
    /// 强制采用的显示尺度，优先于入站局部状态。
    pub force_scope: Option<Scope>,
}

/// 恢复整份文档。输入再破碎也不会失败：字段级问题降级为回退值，
/// 集合级问题丢弃违规条目，调用方总能拿到一致的聚合。
pub fn restore_document(raw: RawDataState, options: &RestoreOptions<'_>) -> RestoredDataState {
    let standards = restore_standards(raw.standards);
    let dictionary = restore_dictionary(raw.dictionary);
    let global_state = restore_global_state(raw.global_state);

    let raw_local = raw.local_state.unwrap_or_default();
    let editing_element_id = validate::non_blank(raw_local.editing_element_id.clone());
    let local_state = restore_local_state(
        &raw_local,
        &global_state,
        &standards,
        options.force_scope,
    );
    let current_scope = local_state.scope;
    let fallback_scope = global_state.main_scope;

    let (blocks, block_tags) = restore_blocks(
        raw.blocks,
        current_scope,
        fallback_scope,
        options.refresh_dimensions,
    );

    let groups = restore_groups(raw.groups);
    let regions = restore_regions(raw.regions);
    let layers = restore_layers(raw.layers, current_scope);

    let ctx = element::RestoreContext {
        current_scope,
        fallback_scope,
        blocks: &block_tags,
        editing_element_id: editing_element_id.as_deref(),
        pass_through: options.pass_through_element_ids.as_ref(),
        refresh_dimensions: options.refresh_dimensions,
    };
    let mut elements = restore_element_list(raw.elements.as_deref().unwrap_or_default(), &ctx);

    if options.repair_bindings {
        repair::repair_bindings(&mut elements);
    }
    let elements = options.index_synchronizer.sync(elements, current_scope);

    let version_graph = restore_version_graph(raw.version_graph);
    let files = restore_files(raw.files);
    let document_id = validate::non_blank(raw.id).unwrap_or_else(id::new_id);

    debug!(
        document_id = document_id.as_str(),
        elements = elements.len(),
        blocks = blocks.len(),
        "文档恢复完成"
    );

    RestoredDataState {
        document_id,
        elements,
        blocks,
        groups,
        regions,
        layers,
        standards,
        dictionary,
        global_state,
        local_state,
        files,
        version_graph,
    }
}

/// 元素数组的单趟恢复。标识冲突时后到的申领者换持新生成的标识。
fn restore_element_list(
    raw: &[RawElement],
    ctx: &element::RestoreContext<'_>,
) -> Vec<DucElement> {
    let mut elements: Vec<DucElement> = Vec::with_capacity(raw.len());
    let mut seen: HashSet<String> = HashSet::new();
    for raw_element in raw {
        let Some(mut element) = element::restore_element(raw_element, ctx) else {
            continue;
        };
        if !seen.insert(element.id().to_string()) {
            let fresh = id::new_id();
            debug!(
                old = element.id(),
                new = fresh.as_str(),
                "元素标识冲突，后到者换持新标识"
            );
            element.base_mut().id = fresh.clone();
            seen.insert(fresh);
        }
        elements.push(element);
    }
    elements
}

fn restore_standards(raw: Option<Vec<RawStandard>>) -> Vec<Standard> {
    let mut standards = Vec::new();
    for raw in raw.unwrap_or_default() {
        let Some(id) = validate::non_blank(raw.id) else {
            debug!("缺少标识的标准被丢弃");
            continue;
        };
        standards.push(Standard {
            id,
            label: validate::text_or(raw.label, "Standard"),
            description: validate::non_blank(raw.description),
            version: validate::count_at_least(raw.version, 0, 1),
            readonly: raw.readonly.unwrap_or(false),
            overrides: raw.overrides.and_then(restore_standard_overrides),
        });
    }
    standards
}

/// 两个覆盖项都落空时折叠为 `None`，不留空壳。
fn restore_standard_overrides(raw: RawStandardOverrides) -> Option<StandardOverrides> {
    let main_scope = raw.main_scope.as_deref().and_then(|text| text.parse().ok());
    let unit_precision = raw.unit_precision.map(|raw| UnitPrecision {
        linear: validate::byte_or(raw.linear, 4).min(MAX_PRECISION_DIGITS),
        angular: validate::byte_or(raw.angular, 2).min(MAX_PRECISION_DIGITS),
    });
    if main_scope.is_none() && unit_precision.is_none() {
        return None;
    }
    Some(StandardOverrides {
        main_scope,
        unit_precision,
    })
}

/// 词典只保留可无损转写为文本的标量；容器与空键丢弃。
fn restore_dictionary(raw: Option<BTreeMap<String, Value>>) -> BTreeMap<String, String> {
    let mut dictionary = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        if key.trim().is_empty() {
            continue;
        }
        let text = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => {
                debug!(key = key.as_str(), "无法转写为文本的词典条目被丢弃");
                continue;
            }
        };
        dictionary.insert(key, text);
    }
    dictionary
}

fn restore_global_state(raw: Option<RawGlobalState>) -> DucGlobalState {
    let raw = raw.unwrap_or_default();
    let defaults = DucGlobalState::default();
    let display = raw.display_precision.unwrap_or_default();
    DucGlobalState {
        view_background_color: color::normalize(
            raw.view_background_color.as_deref(),
            &defaults.view_background_color,
        ),
        main_scope: validate::scope_or(raw.main_scope.as_deref(), NEUTRAL_SCOPE),
        dash_spacing_scale: validate::positive_or(
            raw.dash_spacing_scale,
            defaults.dash_spacing_scale,
        ),
        is_dash_spacing_affected_by_viewport_scale: raw
            .is_dash_spacing_affected_by_viewport_scale
            .unwrap_or(defaults.is_dash_spacing_affected_by_viewport_scale),
        scope_exponent_threshold: validate::finite_or(
            raw.scope_exponent_threshold,
            defaults.scope_exponent_threshold,
        )
        .clamp(1.0, 10.0),
        dimensions_associated_by_default: raw
            .dimensions_associated_by_default
            .unwrap_or(defaults.dimensions_associated_by_default),
        use_annotative_scaling: raw
            .use_annotative_scaling
            .unwrap_or(defaults.use_annotative_scaling),
        display_precision_linear: validate::byte_or(
            display.linear,
            defaults.display_precision_linear,
        )
        .min(MAX_PRECISION_DIGITS),
        display_precision_angular: validate::byte_or(
            display.angular,
            defaults.display_precision_angular,
        )
        .min(MAX_PRECISION_DIGITS),
        pruning_level: validate::byte_or(raw.pruning_level, defaults.pruning_level),
    }
}

/// 局部状态。显示尺度的决定次序：强制尺度 → 入站合法尺度 → 全局主尺度。
/// 滚动偏移的自身尺度固定为中性尺度；活动标准必须指向已恢复的标准。
fn restore_local_state(
    raw: &RawLocalState,
    global: &DucGlobalState,
    standards: &[Standard],
    force_scope: Option<Scope>,
) -> DucLocalState {
    let defaults = DucLocalState::default();
    let scope = force_scope
        .unwrap_or_else(|| validate::scope_or(raw.scope.as_deref(), global.main_scope));
    let active_standard_id = validate::non_blank(raw.active_standard_id.clone())
        .filter(|id| standards.iter().any(|standard| standard.id == *id));
    DucLocalState {
        scope,
        active_standard_id,
        scroll_x: validate::precision_from_raw(raw.scroll_x.as_ref(), 0.0, NEUTRAL_SCOPE, scope),
        scroll_y: validate::precision_from_raw(raw.scroll_y.as_ref(), 0.0, NEUTRAL_SCOPE, scope),
        zoom: validate::zoom_from_raw(raw.zoom.as_ref(), scope),
        is_binding_enabled: raw.is_binding_enabled.unwrap_or(defaults.is_binding_enabled),
        pen_mode: raw.pen_mode.unwrap_or(defaults.pen_mode),
        view_mode_enabled: raw.view_mode_enabled.unwrap_or(defaults.view_mode_enabled),
    }
}

/// 块定义。块内元素以逐步累积的块表为环境恢复，因此块实例只能
/// 引用先于自己声明的块；前向引用按不存在处理。
fn restore_blocks(
    raw: Option<Vec<RawBlock>>,
    current_scope: Scope,
    fallback_scope: Scope,
    refresh_dimensions: bool,
) -> (Vec<DucBlock>, HashMap<String, HashSet<String>>) {
    let mut blocks = Vec::new();
    let mut block_tags: HashMap<String, HashSet<String>> = HashMap::new();

    for raw in raw.unwrap_or_default() {
        let Some(id) = validate::non_blank(raw.id) else {
            debug!("缺少标识的块被丢弃");
            continue;
        };
        if block_tags.contains_key(&id) {
            debug!(block_id = id.as_str(), "重复标识的块被丢弃");
            continue;
        }

        // 属性定义以映射键为权威标签。
        let mut attribute_definitions = BTreeMap::new();
        for (tag, definition) in raw.attribute_definitions.unwrap_or_default() {
            if tag.trim().is_empty() {
                continue;
            }
            attribute_definitions.insert(
                tag.clone(),
                BlockAttributeDefinition {
                    tag,
                    default_value: validate::text_or(definition.default_value, ""),
                    prompt: validate::non_blank(definition.prompt),
                },
            );
        }

        let ctx = element::RestoreContext {
            current_scope,
            fallback_scope,
            blocks: &block_tags,
            editing_element_id: None,
            pass_through: None,
            refresh_dimensions,
        };
        let elements = restore_element_list(raw.elements.as_deref().unwrap_or_default(), &ctx);

        let tags: HashSet<String> = attribute_definitions.keys().cloned().collect();
        blocks.push(DucBlock {
            id: id.clone(),
            label: validate::text_or(raw.label, "Block"),
            description: validate::non_blank(raw.description),
            version: validate::count_at_least(raw.version, 0, 1),
            elements,
            attribute_definitions,
        });
        block_tags.insert(id, tags);
    }

    (blocks, block_tags)
}

/// 组、区域、图层与块共享的堆叠属性恢复。
fn restore_stack_properties(raw: RawStackProperties, default_label: &str) -> StackProperties {
    StackProperties {
        label: validate::text_or(raw.label, default_label),
        description: validate::non_blank(raw.description),
        is_visible: raw.is_visible.unwrap_or(true),
        locked: raw.locked.unwrap_or(false),
        opacity: validate::normalized_percentage(raw.opacity, 1.0),
        labeling_color: color::normalize(raw.labeling_color.as_deref(), color::TRANSPARENT),
    }
}

fn restore_groups(raw: Option<Vec<RawGroup>>) -> Vec<DucGroup> {
    let mut groups = Vec::new();
    for raw in raw.unwrap_or_default() {
        let Some(id) = validate::non_blank(raw.id) else {
            debug!("缺少标识的组被丢弃");
            continue;
        };
        groups.push(DucGroup {
            id,
            stack: restore_stack_properties(raw.stack, "Group"),
        });
    }
    groups
}

fn restore_regions(raw: Option<Vec<RawRegion>>) -> Vec<DucRegion> {
    let mut regions = Vec::new();
    for raw in raw.unwrap_or_default() {
        let Some(id) = validate::non_blank(raw.id) else {
            debug!("缺少标识的区域被丢弃");
            continue;
        };
        regions.push(DucRegion {
            id,
            stack: restore_stack_properties(raw.stack, "Region"),
            boolean_operation: validate::boolean_operation_or(
                raw.boolean_operation.as_ref(),
                BooleanOperation::Union,
            ),
        });
    }
    regions
}

/// 图层。样式覆盖里的精度量以当前尺度为自身尺度。
fn restore_layers(raw: Option<Vec<RawLayer>>, current_scope: Scope) -> Vec<DucLayer> {
    let mut layers = Vec::new();
    for raw in raw.unwrap_or_default() {
        let Some(id) = validate::non_blank(raw.id) else {
            debug!("缺少标识的图层被丢弃");
            continue;
        };
        let overrides = raw.overrides.unwrap_or_default();
        layers.push(DucLayer {
            id,
            stack: restore_stack_properties(raw.stack, "Layer"),
            readonly: raw.readonly.unwrap_or(false),
            stroke_override: overrides
                .stroke
                .as_ref()
                .map(|stroke| element::restore_stroke(stroke, current_scope, current_scope)),
            background_override: overrides
                .background
                .as_ref()
                .map(element::restore_background),
        });
    }
    layers
}

/// 版本图是唯一全有或全无的部件：先丢弃非法条目，然后两个根标识
/// 都必须命中幸存条目，否则整张图恢复为 `None`。
fn restore_version_graph(raw: Option<RawVersionGraph>) -> Option<VersionGraph> {
    let raw = raw?;

    let mut checkpoints = Vec::new();
    for checkpoint in raw.checkpoints.unwrap_or_default() {
        let Some(id) = validate::non_blank(checkpoint.id) else {
            debug!("缺少标识的检查点被丢弃");
            continue;
        };
        let Some(timestamp) = checkpoint.timestamp.filter(|v| v.is_finite() && *v >= 0.0) else {
            debug!(checkpoint = id.as_str(), "时间戳非法的检查点被丢弃");
            continue;
        };
        checkpoints.push(Checkpoint {
            id,
            parent_id: validate::non_blank(checkpoint.parent_id),
            timestamp: timestamp as i64,
            description: validate::non_blank(checkpoint.description),
            is_manual_save: checkpoint.is_manual_save.unwrap_or(false),
        });
    }

    let mut deltas = Vec::new();
    for delta in raw.deltas.unwrap_or_default() {
        let Some(id) = validate::non_blank(delta.id) else {
            debug!("缺少标识的增量被丢弃");
            continue;
        };
        let Some(timestamp) = delta.timestamp.filter(|v| v.is_finite() && *v >= 0.0) else {
            debug!(delta = id.as_str(), "时间戳非法的增量被丢弃");
            continue;
        };
        deltas.push(Delta {
            id,
            parent_id: validate::non_blank(delta.parent_id),
            timestamp: timestamp as i64,
        });
    }

    let graph = VersionGraph {
        user_checkpoint_version_id: validate::text_or(raw.user_checkpoint_version_id, ""),
        latest_version_id: validate::text_or(raw.latest_version_id, ""),
        checkpoints,
        deltas,
    };

    let roots_valid = !graph.user_checkpoint_version_id.trim().is_empty()
        && !graph.latest_version_id.trim().is_empty()
        && graph.contains_version(&graph.user_checkpoint_version_id)
        && graph.contains_version(&graph.latest_version_id);
    if !roots_valid {
        debug!("版本图根标识无法解析，整张图被放弃");
        return None;
    }
    Some(graph)
}

/// 外部文件表。映射键是权威标识；没有数据载荷的条目没有保留价值。
fn restore_files(raw: Option<BTreeMap<String, RawFile>>) -> BTreeMap<String, DucExternalFile> {
    let mut files = BTreeMap::new();
    for (key, file) in raw.unwrap_or_default() {
        if key.trim().is_empty() {
            continue;
        }
        let Some(data_url) = validate::non_blank(file.data_url) else {
            debug!(file = key.as_str(), "缺少数据载荷的外部文件被丢弃");
            continue;
        };
        files.insert(
            key.clone(),
            DucExternalFile {
                id: key,
                mime_type: validate::text_or(file.mime_type, "application/octet-stream"),
                data_url,
                created: validate::epoch_millis_or(file.created, 0),
                last_retrieved: file
                    .last_retrieved
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v as i64),
            },
        );
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SequentialIndexer;

    fn parse_state(json: &str) -> RawDataState {
        serde_json::from_str(json).expect("测试文档必须可解析")
    }

    fn options() -> RestoreOptions<'static> {
        RestoreOptions {
            index_synchronizer: &SequentialIndexer,
            refresh_dimensions: false,
            repair_bindings: true,
            pass_through_element_ids: None,
            force_scope: None,
        }
    }

    #[test]
    fn empty_document_restores_to_defaults() {
        let restored = restore_document(parse_state("{}"), &options());
        assert_eq!(restored.global_state, DucGlobalState::default());
        assert_eq!(restored.local_state, DucLocalState::default());
        assert!(restored.elements.is_empty());
        assert!(restored.version_graph.is_none());
        assert!(!restored.document_id.is_empty(), "缺失的文档标识必须新生成");
    }

    #[test]
    fn document_id_preserved_when_present() {
        let restored = restore_document(parse_state(r#"{"id": "doc-1"}"#), &options());
        assert_eq!(restored.document_id, "doc-1");
    }

    #[test]
    fn local_scope_resolution_order() {
        // 入站局部尺度合法时直接采用。
        let raw = parse_state(
            r#"{"ducGlobalState": {"mainScope": "cm"}, "ducLocalState": {"scope": "mm"}}"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.local_state.scope, Scope::Millimeter);

        // 非法局部尺度回退到全局主尺度。
        let raw = parse_state(
            r#"{"ducGlobalState": {"mainScope": "cm"}, "ducLocalState": {"scope": "parsec"}}"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.local_state.scope, Scope::Centimeter);

        // 强制尺度压过一切。
        let raw = parse_state(
            r#"{"ducGlobalState": {"mainScope": "cm"}, "ducLocalState": {"scope": "mm"}}"#,
        );
        let mut forced = options();
        forced.force_scope = Some(Scope::Inch);
        let restored = restore_document(raw, &forced);
        assert_eq!(restored.local_state.scope, Scope::Inch);
    }

    #[test]
    fn scroll_offsets_own_the_neutral_scope() {
        let raw = parse_state(r#"{"ducLocalState": {"scope": "mm", "scrollX": 2}}"#);
        let restored = restore_document(raw, &options());
        // 自身尺度为米，显示尺度为毫米：2 米 = 2000 毫米。
        assert!((restored.local_state.scroll_x.value - 2.0).abs() < 1e-12);
        assert!((restored.local_state.scroll_x.scoped - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn id_collision_renames_second_claimant() {
        let raw = parse_state(
            r#"{
                "elements": [
                    {"type": "rectangle", "id": "dup", "width": 5, "height": 5},
                    {"type": "rectangle", "id": "dup", "width": 7, "height": 7}
                ]
            }"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.elements.len(), 2);
        assert_eq!(restored.elements[0].id(), "dup", "先到者保留原标识");
        assert_ne!(restored.elements[1].id(), "dup", "后到者必须换持新标识");
        assert!((restored.elements[1].base().width.value - 7.0).abs() < 1e-12);
    }

    #[test]
    fn repair_toggle_controls_dangling_references() {
        let json = r#"{
            "elements": [
                {"type": "rectangle", "id": "r1", "width": 5, "height": 5, "frameId": "ghost"}
            ]
        }"#;
        let repaired = restore_document(parse_state(json), &options());
        assert_eq!(repaired.elements[0].base().frame_id, None);

        let mut no_repair = options();
        no_repair.repair_bindings = false;
        let untouched = restore_document(parse_state(json), &no_repair);
        assert_eq!(
            untouched.elements[0].base().frame_id.as_deref(),
            Some("ghost"),
            "关闭修复时悬空引用原样保留"
        );
    }

    #[test]
    fn version_graph_is_all_or_nothing() {
        let dangling_root = parse_state(
            r#"{
                "versionGraph": {
                    "userCheckpointVersionId": "c1",
                    "latestVersionId": "missing",
                    "checkpoints": [{"id": "c1", "timestamp": 10, "isManualSave": true}],
                    "deltas": []
                }
            }"#,
        );
        assert!(restore_document(dangling_root, &options()).version_graph.is_none());

        let valid = parse_state(
            r#"{
                "versionGraph": {
                    "userCheckpointVersionId": "c1",
                    "latestVersionId": "d1",
                    "checkpoints": [
                        {"id": "c1", "timestamp": 10, "isManualSave": true},
                        {"id": "", "timestamp": 11},
                        {"id": "c-bad", "timestamp": -5}
                    ],
                    "deltas": [{"id": "d1", "parentId": "c1", "timestamp": 20}]
                }
            }"#,
        );
        let graph = restore_document(valid, &options())
            .version_graph
            .expect("根可解析的版本图必须保留");
        assert_eq!(graph.checkpoints.len(), 1, "非法条目先行丢弃");
        assert_eq!(graph.deltas.len(), 1);
    }

    #[test]
    fn active_standard_must_resolve() {
        let raw = parse_state(
            r#"{
                "standards": [{"id": "std-a"}],
                "ducLocalState": {"activeStandardId": "std-a"}
            }"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(
            restored.local_state.active_standard_id.as_deref(),
            Some("std-a")
        );

        let raw = parse_state(r#"{"ducLocalState": {"activeStandardId": "ghost"}}"#);
        let restored = restore_document(raw, &options());
        assert_eq!(restored.local_state.active_standard_id, None);
    }

    #[test]
    fn standards_validated_and_overrides_collapse() {
        let raw = parse_state(
            r#"{
                "standards": [
                    {"label": "anonymous"},
                    {"id": "std-a", "version": 2.5, "overrides": {"mainScope": "parsec"}},
                    {"id": "std-b", "overrides": {"mainScope": "ft", "unitPrecision": {"linear": 99}}}
                ]
            }"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.standards.len(), 2, "缺标识的标准被丢弃");
        let std_a = &restored.standards[0];
        assert_eq!(std_a.version, 1, "小数版本号回退");
        assert!(std_a.overrides.is_none(), "全部落空的覆盖折叠为 None");
        let std_b = &restored.standards[1];
        let overrides = std_b.overrides.as_ref().expect("有效覆盖保留");
        assert_eq!(overrides.main_scope, Some(Scope::Foot));
        assert_eq!(
            overrides.unit_precision.map(|precision| precision.linear),
            Some(12),
            "精度位数截断到上限"
        );
    }

    #[test]
    fn dictionary_keeps_scalar_entries() {
        let raw = parse_state(
            r#"{
                "dictionary": {
                    "title": "主图",
                    "revision": 7,
                    "approved": true,
                    "nested": {"oops": 1},
                    "empty": null,
                    "  ": "blank-key"
                }
            }"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.dictionary.len(), 3);
        assert_eq!(restored.dictionary.get("title").map(String::as_str), Some("主图"));
        assert_eq!(restored.dictionary.get("revision").map(String::as_str), Some("7"));
        assert_eq!(restored.dictionary.get("approved").map(String::as_str), Some("true"));
    }

    #[test]
    fn blocks_feed_instance_validation() {
        let raw = parse_state(
            r#"{
                "blocks": [
                    {
                        "id": "door",
                        "elements": [{"type": "rectangle", "id": "leaf", "width": 2, "height": 2}],
                        "attributeDefinitions": {"TAG": {"defaultValue": "D-"}}
                    },
                    {"id": "door", "label": "duplicate"}
                ],
                "elements": [
                    {
                        "type": "blockinstance", "id": "i1", "width": 1, "height": 1,
                        "blockId": "door", "attributeValues": {"TAG": "D-01", "NOPE": "x"}
                    },
                    {
                        "type": "blockinstance", "id": "i2", "width": 1, "height": 1,
                        "blockId": "window"
                    }
                ]
            }"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.blocks.len(), 1, "重复标识的块被丢弃");
        assert_eq!(restored.blocks[0].elements.len(), 1);
        assert_eq!(restored.elements.len(), 1, "指向未知块的实例被丢弃");
        let DucElement::BlockInstance(instance) = &restored.elements[0] else {
            panic!("应为块实例");
        };
        assert_eq!(instance.attribute_values.len(), 1, "未声明的属性被过滤");
    }

    #[test]
    fn groups_layers_regions_need_ids() {
        let raw = parse_state(
            r##"{
                "groups": [{"label": "无标识"}, {"id": "g1", "opacity": 50}],
                "regions": [{"id": "rg1", "booleanOperation": "subtract"}],
                "layers": [{"id": "ly1", "overrides": {"stroke": {"content": {"src": "#FF0000"}}}}]
            }"##,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.groups.len(), 1);
        assert!((restored.groups[0].stack.opacity - 0.5).abs() < 1e-12, "百分数窗口归一");
        assert_eq!(restored.groups[0].stack.label, "Group");
        assert!(restored.groups[0].stack.is_visible, "可见性默认打开");
        assert_eq!(
            restored.groups[0].stack.labeling_color, "transparent",
            "标注色默认透明"
        );
        assert_eq!(
            restored.regions[0].boolean_operation,
            BooleanOperation::Subtract
        );
        let stroke = restored.layers[0]
            .stroke_override
            .as_ref()
            .expect("覆盖保留");
        assert_eq!(stroke.content.src, "#ff0000");
    }

    #[test]
    fn files_require_payload() {
        let raw = parse_state(
            r#"{
                "files": {
                    "f1": {"mimeType": "image/png", "dataURL": "data:image/png;base64,AAA", "created": 10},
                    "f2": {"mimeType": "image/png"}
                }
            }"#,
        );
        let restored = restore_document(raw, &options());
        assert_eq!(restored.files.len(), 1);
        let file = restored.files.get("f1").expect("有载荷的文件保留");
        assert_eq!(file.id, "f1");
        assert_eq!(file.created, 10);
    }

    #[test]
    fn index_synchronizer_runs_after_restore() {
        let raw = parse_state(
            r#"{
                "elements": [
                    {"type": "rectangle", "id": "a", "width": 5, "height": 5, "index": "zz"},
                    {"type": "rectangle", "id": "b", "width": 5, "height": 5}
                ]
            }"#,
        );
        let restored = restore_document(raw, &options());
        let keys: Vec<_> = restored
            .elements
            .iter()
            .map(|element| element.base().index.as_deref().map(str::to_string))
            .collect();
        assert_eq!(
            keys,
            vec![Some("a00000".to_string()), Some("a00001".to_string())],
            "缺键触发整体重排"
        );
    }
}
