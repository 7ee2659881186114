//! 请求体反序列化辅助

use serde::{Deserialize, Deserializer};

/// 区分「字段缺失」与「字段为 null」
///
/// 配合 `#[serde(default, deserialize_with = "double_option")]` 使用：
/// - 缺失 => `None`
/// - `null` => `Some(None)`
/// - 有值 => `Some(Some(v))`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
