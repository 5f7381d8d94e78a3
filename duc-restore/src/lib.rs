//! “duc” 文档的恢复层。
//!
//! 入站数据是宽松的、可能带历史形态的树（见 [`raw`]），出站是字段齐备、
//! 引用一致的 [`duc_core::document::RestoredDataState`]。恢复过程绝不因
//! 内容损坏而失败：字段级问题按文档化的回退值降级（见 [`validate`]），
//! 集合级问题通过丢弃违规引用解决（见 [`repair`]），只有版本图例外地
//! 采用全有或全无策略（见 [`document`]）。

pub mod color;
pub mod document;
pub mod element;
pub mod index;
pub mod raw;
pub mod repair;
pub mod validate;

pub use document::{RestoreOptions, restore_document};
pub use index::{IndexSynchronizer, SequentialIndexer};
pub use raw::RawDataState;
