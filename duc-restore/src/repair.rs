//! 引用图修复：对完整元素集合做一次收集-应用两阶段扫描，
//! 清除悬空引用并补齐缺失的反向引用。
//!
//! 收集阶段只读：以一次构建的“标识 → 下标”表判定每条引用的去留，
//! 把修正动作排进队列。应用阶段按队列写回，避免在遍历中交叉可变借用。
//! 修复从不猜测：无法验证的引用一律清除，绝不代为改写成别的目标。

use std::collections::{HashMap, HashSet};

use duc_core::document::{BoundElement, DucElement, DucPointBinding, ElementType};
use tracing::debug;

enum BindingVerdict {
    Keep,
    /// 绑定有效，但目标的反向引用表缺少宿主，需要补一条。
    KeepAndMirror(usize),
    Clear,
}

/// 修复整个集合的引用一致性：图框归属、容器-文本配对、
/// 反向引用表与线性端点绑定。
pub fn repair_bindings(elements: &mut Vec<DucElement>) {
    let mut by_id: HashMap<String, usize> = HashMap::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        by_id.entry(element.id().to_string()).or_insert(index);
    }

    let mut cleared_frames: Vec<usize> = Vec::new();
    let mut cleared_containers: Vec<usize> = Vec::new();
    let mut filtered_bounds: Vec<(usize, Vec<BoundElement>)> = Vec::new();
    let mut cleared_start: Vec<usize> = Vec::new();
    let mut cleared_end: Vec<usize> = Vec::new();
    let mut adopted_containers: Vec<(usize, String)> = Vec::new();
    let mut back_refs: Vec<(usize, BoundElement)> = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let base = element.base();

        // 图框归属：目标必须存在且确为图框。
        if let Some(frame_id) = base.frame_id.as_deref() {
            let valid = by_id
                .get(frame_id)
                .is_some_and(|target| matches!(elements[*target], DucElement::Frame(_)));
            if !valid {
                debug!(id = base.id.as_str(), frame_id, "悬空的图框引用被清除");
                cleared_frames.push(index);
            }
        }

        // 容器内文本：容器消失则断开，存在则确保容器列出该文本。
        if let DucElement::Text(text) = element {
            if let Some(container_id) = text.container_id.as_deref() {
                match by_id.get(container_id) {
                    Some(container_index) => {
                        let listed = elements[*container_index]
                            .base()
                            .bound_elements
                            .iter()
                            .any(|entry| entry.id == base.id);
                        if !listed {
                            back_refs.push((
                                *container_index,
                                BoundElement {
                                    id: base.id.clone(),
                                    element_type: ElementType::Text,
                                },
                            ));
                        }
                    }
                    None => {
                        debug!(id = base.id.as_str(), container_id, "悬空的容器引用被清除");
                        cleared_containers.push(index);
                    }
                }
            }
        }

        // 反向引用表：目标存在且未删除，按标识去重（先到先得）。
        // 指向无容器文本的条目使该文本认领宿主为容器。
        let mut seen: HashSet<&str> = HashSet::new();
        let mut filtered: Vec<BoundElement> = Vec::with_capacity(base.bound_elements.len());
        for entry in &base.bound_elements {
            let Some(target_index) = by_id.get(entry.id.as_str()) else {
                debug!(
                    id = base.id.as_str(),
                    bound = entry.id.as_str(),
                    "指向不存在元素的反向引用被移除"
                );
                continue;
            };
            if elements[*target_index].base().is_deleted {
                debug!(
                    id = base.id.as_str(),
                    bound = entry.id.as_str(),
                    "指向已删除元素的反向引用被移除"
                );
                continue;
            }
            if !seen.insert(entry.id.as_str()) {
                continue;
            }
            if let DucElement::Text(bound_text) = &elements[*target_index] {
                if bound_text.container_id.is_none() {
                    adopted_containers.push((*target_index, base.id.clone()));
                }
            }
            filtered.push(entry.clone());
        }
        if filtered != base.bound_elements {
            filtered_bounds.push((index, filtered));
        }

        // 线性端点绑定。
        if let DucElement::Linear(linear) = element {
            match assess_binding(linear.start_binding.as_ref(), &base.id, &by_id, elements) {
                BindingVerdict::Keep => {}
                BindingVerdict::KeepAndMirror(target) => back_refs.push((
                    target,
                    BoundElement {
                        id: base.id.clone(),
                        element_type: ElementType::Line,
                    },
                )),
                BindingVerdict::Clear => {
                    debug!(id = base.id.as_str(), "起点绑定失效，已清除");
                    cleared_start.push(index);
                }
            }
            match assess_binding(linear.end_binding.as_ref(), &base.id, &by_id, elements) {
                BindingVerdict::Keep => {}
                BindingVerdict::KeepAndMirror(target) => back_refs.push((
                    target,
                    BoundElement {
                        id: base.id.clone(),
                        element_type: ElementType::Line,
                    },
                )),
                BindingVerdict::Clear => {
                    debug!(id = base.id.as_str(), "终点绑定失效，已清除");
                    cleared_end.push(index);
                }
            }
        }
    }

    for index in cleared_frames {
        elements[index].base_mut().frame_id = None;
    }
    for index in cleared_containers {
        if let DucElement::Text(text) = &mut elements[index] {
            text.container_id = None;
        }
    }
    for (index, filtered) in filtered_bounds {
        elements[index].base_mut().bound_elements = filtered;
    }
    for index in cleared_start {
        if let DucElement::Linear(linear) = &mut elements[index] {
            linear.start_binding = None;
        }
    }
    for index in cleared_end {
        if let DucElement::Linear(linear) = &mut elements[index] {
            linear.end_binding = None;
        }
    }
    // 认领与补引用放在过滤写回之后，存在性检查以最终表为准。
    for (index, container_id) in adopted_containers {
        if let DucElement::Text(text) = &mut elements[index] {
            if text.container_id.is_none() {
                text.container_id = Some(container_id);
            }
        }
    }
    for (index, entry) in back_refs {
        let bound = &mut elements[index].base_mut().bound_elements;
        if !bound.iter().any(|existing| existing.id == entry.id) {
            bound.push(entry);
        }
    }
}

/// 单条端点绑定的去留。仅标头形态无条件保留；带落点的绑定要求目标
/// 是线性元素、索引界内且偏移在 [-1, 1]；普通绑定只要求目标存在。
fn assess_binding(
    binding: Option<&DucPointBinding>,
    host_id: &str,
    by_id: &HashMap<String, usize>,
    elements: &[DucElement],
) -> BindingVerdict {
    let Some(binding) = binding else {
        return BindingVerdict::Keep;
    };
    if binding.is_head_only() {
        return BindingVerdict::Keep;
    }
    let Some(target_id) = binding.element_id.as_deref() else {
        return BindingVerdict::Clear;
    };
    let Some(target_index) = by_id.get(target_id).copied() else {
        return BindingVerdict::Clear;
    };
    if let Some(point) = binding.point.as_ref() {
        let DucElement::Linear(target) = &elements[target_index] else {
            return BindingVerdict::Clear;
        };
        if point.index >= target.points.len() {
            return BindingVerdict::Clear;
        }
        if !(-1.0..=1.0).contains(&point.offset) {
            return BindingVerdict::Clear;
        }
    }

    let mirrored = elements[target_index]
        .base()
        .bound_elements
        .iter()
        .any(|entry| entry.id == host_id);
    if mirrored {
        BindingVerdict::Keep
    } else {
        BindingVerdict::KeepAndMirror(target_index)
    }
}
