//! 分数排序键的同步。恢复流程要求一个同步器协作者：默认实现只在
//! 键缺失、重复或失序时动手，一旦动手就整体重排，保持数组顺序不变。

use duc_core::document::DucElement;
use duc_core::scope::Scope;
use tracing::debug;

/// 排序键同步器。宿主应用可注入自己的分数索引方案；
/// `scope` 供需要按尺度重派生键的实现使用，默认实现忽略它。
pub trait IndexSynchronizer {
    fn sync(&self, elements: Vec<DucElement>, scope: Scope) -> Vec<DucElement>;
}

/// 零填充顺序键（`a00000`、`a00001`……），字典序与数组顺序一致。
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialIndexer;

impl IndexSynchronizer for SequentialIndexer {
    fn sync(&self, mut elements: Vec<DucElement>, _scope: Scope) -> Vec<DucElement> {
        if indices_are_ordered(&elements) {
            return elements;
        }
        debug!(count = elements.len(), "排序键失效，整体重排");
        for (position, element) in elements.iter_mut().enumerate() {
            element.base_mut().index = Some(format!("a{position:05}"));
        }
        elements
    }
}

/// 全部元素都持有键、无重复且严格字典序递增才算有序。
fn indices_are_ordered(elements: &[DucElement]) -> bool {
    let mut previous: Option<&str> = None;
    for element in elements {
        let Some(index) = element.base().index.as_deref() else {
            return false;
        };
        if index.trim().is_empty() {
            return false;
        }
        if let Some(prev) = previous {
            if index <= prev {
                return false;
            }
        }
        previous = Some(index);
    }
    true
}
