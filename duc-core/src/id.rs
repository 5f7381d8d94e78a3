use uuid::Uuid;

/// 生成新的元素或文档标识符。随机 UUID 的熵足以在恢复过程中避免再次碰撞。
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
