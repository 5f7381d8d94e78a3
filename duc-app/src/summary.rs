use duc_core::document::{
    BooleanOperation, DucElement, DucPointBinding, ImageStatus, RestoredDataState, TextAlign,
    VerticalAlign,
};
use duc_core::precision::scope_for_zoom;
use tracing::info;

use crate::loader::DocumentSource;

/// 打印恢复结果概览。字段域与引用一致性在恢复层已经收敛，这里只做呈现。
pub fn print_summary(source: &DocumentSource, state: &RestoredDataState) {
    let element_count = state.elements.len();
    let block_count = state.blocks.len();
    let layer_count = state.layers.len();
    let standard_count = state.standards.len();
    info!(
        element_count,
        block_count, layer_count, standard_count, "恢复文档统计"
    );

    println!("Rust 版 duc 文档恢复演示");
    match source {
        DocumentSource::File(path) => println!("已从 JSON 加载文档：{}", path.display()),
        DocumentSource::Demo => println!("已载入内置示例文档。"),
    }
    println!("文档标识：{}", state.document_id);

    let global = &state.global_state;
    let local = &state.local_state;
    let zoom = &local.zoom;
    println!(
        "主尺度={}, 当前尺度={}, 视口背景={}",
        global.main_scope, local.scope, global.view_background_color
    );
    println!(
        "缩放={:.3} (像素/尺度单位={:.6}, 比例尺={:.3}), 滚动=({:.2}, {:.2})",
        zoom.value, zoom.scoped, zoom.scaled, local.scroll_x.scoped, local.scroll_y.scoped
    );
    let gravity_scope = scope_for_zoom(
        zoom.value,
        global.main_scope,
        global.scope_exponent_threshold,
    );
    println!("缩放引力井建议尺度：{gravity_scope}");
    if let Some(standard_id) = &local.active_standard_id {
        println!("活动标准：{standard_id}");
    }

    if !state.dictionary.is_empty() {
        println!("文档词典：");
        for (key, value) in &state.dictionary {
            println!("  - {key} = {value}");
        }
    }

    if !state.standards.is_empty() {
        println!("绘图标准：");
        for standard in &state.standards {
            let overrides_desc = standard
                .overrides
                .as_ref()
                .map(|overrides| {
                    let scope_part = overrides
                        .main_scope
                        .map(|scope| format!("主尺度={scope}"))
                        .unwrap_or_else(|| "主尺度=<继承>".to_string());
                    let precision_part = overrides
                        .unit_precision
                        .map(|precision| {
                            format!("精度={}/{}", precision.linear, precision.angular)
                        })
                        .unwrap_or_else(|| "精度=<继承>".to_string());
                    format!("{scope_part}, {precision_part}")
                })
                .unwrap_or_else(|| "<无覆盖>".to_string());
            println!(
                "  - {} ({}), 版本={}, 只读={}, 覆盖：{}",
                standard.label,
                standard.id,
                standard.version,
                if standard.readonly { "是" } else { "否" },
                overrides_desc
            );
        }
    }

    if !state.layers.is_empty() {
        println!("当前文档图层：");
        for layer in &state.layers {
            println!(
                "  - {} (可见: {}, 只读: {})",
                layer.stack.label, layer.stack.is_visible, layer.readonly
            );
        }
    }

    if !state.groups.is_empty() {
        println!("分组：");
        for group in &state.groups {
            println!(
                "  - {} ({}), 不透明度={:.2}",
                group.stack.label, group.id, group.stack.opacity
            );
        }
    }

    if !state.regions.is_empty() {
        println!("区域：");
        for region in &state.regions {
            println!(
                "  - {} ({}), 布尔运算={}",
                region.stack.label,
                region.id,
                boolean_operation_label(region.boolean_operation)
            );
        }
    }

    println!("当前文档元素：");
    for element in &state.elements {
        describe_element(element);
    }

    if !state.blocks.is_empty() {
        println!("块定义：");
        for block in &state.blocks {
            println!(
                "  - {} ({}), 版本={}, 元素数={}, 属性定义数={}",
                block.label,
                block.id,
                block.version,
                block.elements.len(),
                block.attribute_definitions.len()
            );
        }
    }

    if !state.files.is_empty() {
        println!("外部文件：");
        for file in state.files.values() {
            println!("  - {} ({}), 创建于={}", file.id, file.mime_type, file.created);
        }
    }

    match &state.version_graph {
        Some(graph) => println!(
            "版本图：检查点数={}, 增量数={}, 最新版本={}",
            graph.checkpoints.len(),
            graph.deltas.len(),
            graph.latest_version_id
        ),
        None => println!("无版本图。"),
    }
}

fn describe_element(element: &DucElement) {
    match element {
        DucElement::Rectangle(rectangle) => {
            let base = &rectangle.base;
            println!(
                "  - 矩形 {}, 位置=({:.2}, {:.2}), 尺寸={:.2}×{:.2}, 尺度={}",
                base.id, base.x.scoped, base.y.scoped, base.width.scoped, base.height.scoped,
                base.scope
            );
        }
        DucElement::Polygon(polygon) => {
            let base = &polygon.base;
            println!(
                "  - 多边形 {}, 边数={}, 位置=({:.2}, {:.2}), 尺寸={:.2}×{:.2}",
                base.id,
                polygon.sides,
                base.x.scoped,
                base.y.scoped,
                base.width.scoped,
                base.height.scoped
            );
        }
        DucElement::Ellipse(ellipse) => {
            let base = &ellipse.base;
            println!(
                "  - 椭圆 {}, 位置=({:.2}, {:.2}), 尺寸={:.2}×{:.2}, 比例={:.3}, 参数范围=[{:.1}°, {:.1}°]",
                base.id,
                base.x.scoped,
                base.y.scoped,
                base.width.scoped,
                base.height.scoped,
                ellipse.ratio,
                ellipse.start_angle.to_degrees(),
                ellipse.end_angle.to_degrees()
            );
        }
        DucElement::Embeddable(embeddable) => {
            println!(
                "  - 外嵌内容 {}, 链接={}",
                embeddable.base.id,
                if embeddable.link.is_empty() {
                    "<空>"
                } else {
                    &embeddable.link
                }
            );
        }
        DucElement::Pdf(pdf) => {
            println!(
                "  - PDF {}, 文件={}",
                pdf.base.id,
                pdf.file_id.as_deref().unwrap_or("<未关联>")
            );
        }
        DucElement::Image(image) => {
            println!(
                "  - 图像 {}, 文件={}, 状态={}, 翻转=({:.0}, {:.0})",
                image.base.id,
                image.file_id.as_deref().unwrap_or("<未关联>"),
                image_status_label(image.status),
                image.scale[0],
                image.scale[1]
            );
        }
        DucElement::Text(text) => {
            println!(
                "  - 文字 {}, 位置=({:.2}, {:.2}), 内容=\"{}\", 字号={:.2}, 字体={}, 对齐={}/{}, 行高={:.2}",
                text.base.id,
                text.base.x.scoped,
                text.base.y.scoped,
                text.text.replace('\n', "\\n"),
                text.font_size.scoped,
                text.font_family,
                text_align_label(text.text_align),
                vertical_align_label(text.vertical_align),
                text.line_height
            );
            if let Some(container_id) = &text.container_id {
                println!("    容器：{container_id}");
            }
        }
        DucElement::Linear(linear) => {
            let base = &linear.base;
            println!(
                "  - 线 {}, 位置=({:.2}, {:.2}), 顶点数={}, 线段数={}, 路径覆盖={}",
                base.id,
                base.x.scoped,
                base.y.scoped,
                linear.points.len(),
                linear.lines.len(),
                linear.path_overrides.len()
            );
            if let Some(binding) = &linear.start_binding {
                println!("    起点绑定：{}", binding_label(binding));
            }
            if let Some(binding) = &linear.end_binding {
                println!("    终点绑定：{}", binding_label(binding));
            }
        }
        DucElement::FreeDraw(freedraw) => {
            println!(
                "  - 手绘 {}, 顶点数={}, 压感点数={}, 模拟压感={}",
                freedraw.base.id,
                freedraw.points.len(),
                freedraw.pressures.len(),
                if freedraw.simulate_pressure {
                    "是"
                } else {
                    "否"
                }
            );
        }
        DucElement::Frame(frame) => {
            println!(
                "  - 图框 {}, 尺寸={:.2}×{:.2}, 折叠={}, 裁剪={}",
                frame.base.id,
                frame.base.width.scoped,
                frame.base.height.scoped,
                if frame.is_collapsed { "是" } else { "否" },
                if frame.clip { "是" } else { "否" }
            );
        }
        DucElement::Table(table) => {
            println!(
                "  - 表格 {}, 列数={}, 行数={}, 单元格数={}",
                table.base.id,
                table.column_order.len(),
                table.row_order.len(),
                table.cells.len()
            );
        }
        DucElement::Doc(doc) => {
            let preview: String = doc.content.chars().take(20).collect();
            println!(
                "  - 富文档 {}, 内容长度={}, 预览=\"{}\"",
                doc.base.id,
                doc.content.chars().count(),
                preview
            );
        }
        DucElement::BlockInstance(instance) => {
            let attrs = if instance.attribute_values.is_empty() {
                "无属性".to_string()
            } else {
                let preview: Vec<String> = instance
                    .attribute_values
                    .iter()
                    .take(3)
                    .map(|(tag, value)| format!("{tag}={value}"))
                    .collect();
                format!(
                    "{} ({} 项)",
                    preview.join(", "),
                    instance.attribute_values.len()
                )
            };
            println!(
                "  - 块实例 {}, 块={}, 位置=({:.2}, {:.2}), 属性={}",
                instance.base.id,
                instance.block_id,
                instance.base.x.scoped,
                instance.base.y.scoped,
                attrs
            );
        }
    }
}

fn binding_label(binding: &DucPointBinding) -> String {
    let target = binding.element_id.as_deref().unwrap_or("<固定点>");
    format!(
        "目标={}, focus={:.2}, 间距={:.2}",
        target, binding.focus, binding.gap.scoped
    )
}

fn boolean_operation_label(operation: BooleanOperation) -> &'static str {
    match operation {
        BooleanOperation::Union => "并集",
        BooleanOperation::Subtract => "差集",
        BooleanOperation::Intersect => "交集",
        BooleanOperation::Exclude => "对称差",
    }
}

fn image_status_label(status: ImageStatus) -> &'static str {
    match status {
        ImageStatus::Pending => "待载入",
        ImageStatus::Saved => "已保存",
        ImageStatus::Error => "错误",
    }
}

fn text_align_label(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "左",
        TextAlign::Center => "中",
        TextAlign::Right => "右",
    }
}

fn vertical_align_label(align: VerticalAlign) -> &'static str {
    match align {
        VerticalAlign::Top => "顶",
        VerticalAlign::Middle => "中",
        VerticalAlign::Bottom => "底",
    }
}
