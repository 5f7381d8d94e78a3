use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use duc_core::document::{
    DucElement, DucLine, DucPath, DucPoint, DucPointBinding, ElementBackground, ElementBase,
    ElementStroke, RestoredDataState, StackProperties,
};
use duc_core::precision::PrecisionValue;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GoldenDocument {
    document_id: String,
    main_scope: String,
    current_scope: String,
    view_background_color: String,
    scroll: [f64; 2],
    zoom: [f64; 3],
    elements: Vec<GoldenElement>,
    blocks: Vec<GoldenBlock>,
    groups: Vec<GoldenGroup>,
    regions: Vec<GoldenRegion>,
    layers: Vec<GoldenLayer>,
    standards: Vec<GoldenStandard>,
    dictionary: BTreeMap<String, String>,
    files: Vec<GoldenFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_graph: Option<GoldenVersionGraph>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenElement {
    id: String,
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<String>,
    base: Value,
    data: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenBlock {
    id: String,
    label: String,
    version: u32,
    attribute_tags: Vec<String>,
    elements: Vec<GoldenElement>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenGroup {
    id: String,
    stack: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenRegion {
    id: String,
    stack: Value,
    boolean_operation: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenLayer {
    id: String,
    stack: Value,
    readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stroke_override: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_override: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenStandard {
    id: String,
    label: String,
    version: u32,
    readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    main_scope_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit_precision_override: Option<[u8; 2]>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenFile {
    id: String,
    mime_type: String,
    data_url: String,
    created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_retrieved: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenVersionGraph {
    user_checkpoint_version_id: String,
    latest_version_id: String,
    checkpoints: Vec<Value>,
    deltas: Vec<Value>,
}

pub fn assert_golden(name: &str, state: &RestoredDataState) {
    let snapshot = GoldenDocument::from_state(state);
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/golden");
    if let Err(err) = fs::create_dir_all(&base_dir) {
        panic!("无法创建黄金数据目录 {}: {err}", base_dir.display());
    }
    let golden_path = base_dir.join(format!("{name}.json"));
    let serialized = serde_json::to_string_pretty(&snapshot).expect("序列化黄金快照失败");

    if !golden_path.exists() {
        fs::write(&golden_path, &serialized)
            .unwrap_or_else(|err| panic!("写入黄金文件 {} 失败: {err}", golden_path.display()));
        panic!(
            "黄金文件 {} 不存在，已自动生成。请确认内容后重新运行测试。",
            golden_path.display()
        );
    }

    let expected_str = fs::read_to_string(&golden_path)
        .unwrap_or_else(|err| panic!("读取黄金文件 {} 失败: {err}", golden_path.display()));
    let expected: GoldenDocument = serde_json::from_str(&expected_str)
        .unwrap_or_else(|err| panic!("解析黄金文件 {} 失败: {err}", golden_path.display()));

    if expected != snapshot {
        let diff_path = base_dir.join(format!("{name}.actual.json"));
        fs::write(&diff_path, &serialized).expect("写入差异文件失败");
        panic!(
            "黄金文件 {} 与当前恢复结果不一致。已生成对照输出 {}。",
            golden_path.display(),
            diff_path.display()
        );
    }
}

impl GoldenDocument {
    fn from_state(state: &RestoredDataState) -> Self {
        let elements = state.elements.iter().map(element_to_golden).collect();

        let blocks = state
            .blocks
            .iter()
            .map(|block| GoldenBlock {
                id: block.id.clone(),
                label: block.label.clone(),
                version: block.version,
                attribute_tags: block.attribute_definitions.keys().cloned().collect(),
                elements: block.elements.iter().map(element_to_golden).collect(),
            })
            .collect();

        let groups = state
            .groups
            .iter()
            .map(|group| GoldenGroup {
                id: group.id.clone(),
                stack: stack_to_value(&group.stack),
            })
            .collect();

        let regions = state
            .regions
            .iter()
            .map(|region| GoldenRegion {
                id: region.id.clone(),
                stack: stack_to_value(&region.stack),
                boolean_operation: format!("{:?}", region.boolean_operation),
            })
            .collect();

        let layers = state
            .layers
            .iter()
            .map(|layer| GoldenLayer {
                id: layer.id.clone(),
                stack: stack_to_value(&layer.stack),
                readonly: layer.readonly,
                stroke_override: layer.stroke_override.as_ref().map(stroke_to_value),
                background_override: layer.background_override.as_ref().map(background_to_value),
            })
            .collect();

        let standards = state
            .standards
            .iter()
            .map(|standard| GoldenStandard {
                id: standard.id.clone(),
                label: standard.label.clone(),
                version: standard.version,
                readonly: standard.readonly,
                main_scope_override: standard
                    .overrides
                    .as_ref()
                    .and_then(|overrides| overrides.main_scope)
                    .map(|scope| scope.to_string()),
                unit_precision_override: standard
                    .overrides
                    .as_ref()
                    .and_then(|overrides| overrides.unit_precision)
                    .map(|precision| [precision.linear, precision.angular]),
            })
            .collect();

        let files = state
            .files
            .values()
            .map(|file| GoldenFile {
                id: file.id.clone(),
                mime_type: file.mime_type.clone(),
                data_url: file.data_url.clone(),
                created: file.created,
                last_retrieved: file.last_retrieved,
            })
            .collect();

        let version_graph = state.version_graph.as_ref().map(|graph| GoldenVersionGraph {
            user_checkpoint_version_id: graph.user_checkpoint_version_id.clone(),
            latest_version_id: graph.latest_version_id.clone(),
            checkpoints: graph
                .checkpoints
                .iter()
                .map(|checkpoint| {
                    json!({
                        "id": checkpoint.id,
                        "parent_id": checkpoint.parent_id,
                        "timestamp": checkpoint.timestamp,
                        "description": checkpoint.description,
                        "is_manual_save": checkpoint.is_manual_save,
                    })
                })
                .collect(),
            deltas: graph
                .deltas
                .iter()
                .map(|delta| {
                    json!({
                        "id": delta.id,
                        "parent_id": delta.parent_id,
                        "timestamp": delta.timestamp,
                    })
                })
                .collect(),
        });

        Self {
            document_id: state.document_id.clone(),
            main_scope: state.global_state.main_scope.to_string(),
            current_scope: state.local_state.scope.to_string(),
            view_background_color: state.global_state.view_background_color.clone(),
            scroll: [
                state.local_state.scroll_x.scoped,
                state.local_state.scroll_y.scoped,
            ],
            zoom: [
                state.local_state.zoom.value,
                state.local_state.zoom.scoped,
                state.local_state.zoom.scaled,
            ],
            elements,
            blocks,
            groups,
            regions,
            layers,
            standards,
            dictionary: state.dictionary.clone(),
            files,
            version_graph,
        }
    }
}

fn element_to_golden(element: &DucElement) -> GoldenElement {
    let base = element.base();
    GoldenElement {
        id: base.id.clone(),
        kind: element.element_type().as_str().to_string(),
        index: base.index.clone(),
        base: base_payload(base),
        data: element_payload(element),
    }
}

fn base_payload(base: &ElementBase) -> Value {
    json!({
        "x": precision_to_array(&base.x),
        "y": precision_to_array(&base.y),
        "width": precision_to_array(&base.width),
        "height": precision_to_array(&base.height),
        "angle": base.angle,
        "scope": base.scope.to_string(),
        "label": base.label,
        "is_visible": base.is_visible,
        "opacity": base.opacity,
        "stroke": base.stroke.iter().map(stroke_to_value).collect::<Vec<_>>(),
        "background": base.background.iter().map(background_to_value).collect::<Vec<_>>(),
        "group_ids": base.group_ids,
        "frame_id": base.frame_id,
        "bound_elements": base
            .bound_elements
            .iter()
            .map(|bound| json!({"id": bound.id, "type": bound.element_type.as_str()}))
            .collect::<Vec<_>>(),
        "z_index": base.z_index,
        "version": base.version,
        "updated": base.updated,
        "is_deleted": base.is_deleted,
        "locked": base.locked,
    })
}

fn element_payload(element: &DucElement) -> Value {
    match element {
        DucElement::Rectangle(_) => json!({}),
        DucElement::Polygon(polygon) => json!({"sides": polygon.sides}),
        DucElement::Ellipse(ellipse) => json!({
            "ratio": ellipse.ratio,
            "start_angle": ellipse.start_angle,
            "end_angle": ellipse.end_angle,
        }),
        DucElement::Embeddable(embeddable) => json!({"link": embeddable.link}),
        DucElement::Pdf(pdf) => json!({"file_id": pdf.file_id}),
        DucElement::Image(image) => json!({
            "file_id": image.file_id,
            "status": format!("{:?}", image.status),
            "scale": image.scale,
        }),
        DucElement::Text(text) => json!({
            "text": text.text,
            "font_size": precision_to_array(&text.font_size),
            "font_family": text.font_family,
            "text_align": format!("{:?}", text.text_align),
            "vertical_align": format!("{:?}", text.vertical_align),
            "container_id": text.container_id,
            "line_height": text.line_height,
            "auto_resize": text.auto_resize,
        }),
        DucElement::Linear(linear) => json!({
            "points": linear.points.iter().map(point_to_array).collect::<Vec<_>>(),
            "lines": linear.lines.iter().map(line_to_value).collect::<Vec<_>>(),
            "path_overrides": linear
                .path_overrides
                .iter()
                .map(path_to_value)
                .collect::<Vec<_>>(),
            "last_committed_point": linear.last_committed_point.as_ref().map(point_to_array),
            "start_binding": linear.start_binding.as_ref().map(binding_to_value),
            "end_binding": linear.end_binding.as_ref().map(binding_to_value),
        }),
        DucElement::FreeDraw(freedraw) => json!({
            "points": freedraw.points.iter().map(point_to_array).collect::<Vec<_>>(),
            "pressures": freedraw.pressures,
            "simulate_pressure": freedraw.simulate_pressure,
            "thinning": freedraw.thinning,
            "smoothing": freedraw.smoothing,
            "streamline": freedraw.streamline,
        }),
        DucElement::Frame(frame) => json!({
            "is_collapsed": frame.is_collapsed,
            "clip": frame.clip,
        }),
        DucElement::Table(table) => json!({
            "column_order": table.column_order,
            "row_order": table.row_order,
            "columns": table
                .columns
                .values()
                .map(|column| json!({"id": column.id, "width": precision_to_array(&column.width)}))
                .collect::<Vec<_>>(),
            "rows": table
                .rows
                .values()
                .map(|row| json!({"id": row.id, "height": precision_to_array(&row.height)}))
                .collect::<Vec<_>>(),
            "cells": table
                .cells
                .iter()
                .map(|(key, cell)| {
                    json!({
                        "key": key,
                        "data": cell.data,
                        "locked": cell.locked,
                    })
                })
                .collect::<Vec<_>>(),
        }),
        DucElement::Doc(doc) => json!({"content": doc.content}),
        DucElement::BlockInstance(instance) => json!({
            "block_id": instance.block_id,
            "attribute_values": instance.attribute_values,
            "element_overrides": instance.element_overrides,
        }),
    }
}

fn stack_to_value(stack: &StackProperties) -> Value {
    json!({
        "label": stack.label,
        "description": stack.description,
        "is_visible": stack.is_visible,
        "locked": stack.locked,
        "opacity": stack.opacity,
        "labeling_color": stack.labeling_color,
    })
}

fn stroke_to_value(stroke: &ElementStroke) -> Value {
    json!({
        "src": stroke.content.src,
        "visible": stroke.content.visible,
        "opacity": stroke.content.opacity,
        "width": precision_to_array(&stroke.width),
        "placement": format!("{:?}", stroke.placement),
    })
}

fn background_to_value(background: &ElementBackground) -> Value {
    json!({
        "src": background.content.src,
        "visible": background.content.visible,
        "opacity": background.content.opacity,
    })
}

fn binding_to_value(binding: &DucPointBinding) -> Value {
    json!({
        "element_id": binding.element_id,
        "focus": binding.focus,
        "gap": precision_to_array(&binding.gap),
        "fixed_point": binding.fixed_point.map(|point| [point.x(), point.y()]),
        "point": binding
            .point
            .as_ref()
            .map(|point| json!({"index": point.index, "offset": point.offset})),
        "head": binding.head.map(|head| format!("{head:?}")),
    })
}

fn line_to_value(line: &DucLine) -> Value {
    json!({
        "start": {
            "index": line.start.index,
            "handle": line.start.handle.as_ref().map(point_to_array),
        },
        "end": {
            "index": line.end.index,
            "handle": line.end.handle.as_ref().map(point_to_array),
        },
    })
}

fn path_to_value(path: &DucPath) -> Value {
    json!({
        "line_indices": path.line_indices,
        "stroke": path.stroke.as_ref().map(stroke_to_value),
        "background": path.background.as_ref().map(background_to_value),
    })
}

fn precision_to_array(value: &PrecisionValue) -> [f64; 2] {
    [value.value, value.scoped]
}

fn point_to_array(point: &DucPoint) -> [f64; 2] {
    [point.x.value, point.y.value]
}
