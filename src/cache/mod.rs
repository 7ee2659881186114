//! 对象缓存
//!
//! 后端以插件形式注册（moka / redis），启动时按配置选择。
//! 值统一以 JSON 字符串保存，`get`/`insert` 负责类型转换。

pub mod keys;
pub mod object_cache;
pub mod register;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    // 后端出错或值无法解析
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

impl dyn ObjectCache + '_ {
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        match self.get_raw(key).await {
            CacheResult::Found(raw) => match serde_json::from_str(&raw) {
                Ok(value) => CacheResult::Found(value),
                Err(e) => {
                    tracing::warn!("Failed to decode cached value for '{}': {}", key, e);
                    CacheResult::ExistsButNoValue
                }
            },
            CacheResult::NotFound => CacheResult::NotFound,
            CacheResult::ExistsButNoValue => CacheResult::ExistsButNoValue,
        }
    }

    pub async fn insert<T: Serialize>(&self, key: &str, value: &T, ttl: u64) {
        match serde_json::to_string(value) {
            Ok(raw) => self.insert_raw(key.to_string(), raw, ttl).await,
            Err(e) => tracing::warn!("Failed to encode value for cache key '{}': {}", key, e),
        }
    }
}

/// 声明缓存插件，进程启动时自动注册到插件表
///
/// 插件类型需提供 `fn new() -> Result<Self, String>`
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        let cache = <$ty>::new()
                            .map_err($crate::errors::CourseDeskError::cache_connection)?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                    })
                }),
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::object_cache::moka::MokaCacheWrapper;
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Sample {
        code: String,
        seq: u32,
    }

    #[tokio::test]
    async fn test_typed_round_trip_and_remove() {
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));
        let sample = Sample {
            code: "ROBOT".into(),
            seq: 3,
        };
        cache.insert("book:ROBOT", &sample, 0).await;
        assert_eq!(cache.get::<Sample>("book:ROBOT").await, CacheResult::Found(sample));

        cache.remove("book:ROBOT").await;
        assert_eq!(cache.get::<Sample>("book:ROBOT").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_undecodable_value_is_reported() {
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));
        cache
            .insert_raw("broken".into(), "not json".into(), 0)
            .await;
        assert_eq!(
            cache.get::<Sample>("broken").await,
            CacheResult::ExistsButNoValue
        );
    }

    async fn cached_seq(cache: &dyn ObjectCache, key: &str) -> Option<u32> {
        match cache.get::<Sample>(key).await {
            CacheResult::Found(sample) => Some(sample.seq),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_typed_read_through_borrowed_cache() {
        let wrapper = MokaCacheWrapper::with_settings(100, 60);
        let cache: &dyn ObjectCache = &wrapper;
        let sample = Sample {
            code: "SCRATCH".into(),
            seq: 7,
        };
        cache.insert("book:SCRATCH", &sample, 0).await;
        assert_eq!(cached_seq(cache, "book:SCRATCH").await, Some(7));
        assert_eq!(cached_seq(cache, "book:NONE").await, None);
    }

    #[test]
    fn test_plugins_are_registered() {
        assert!(register::get_object_cache_plugin("moka").is_some());
        assert!(register::get_object_cache_plugin("redis").is_some());
    }
}
