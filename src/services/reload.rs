//! 写操作成功后的缓存刷新
//!
//! 列表与单条记录在下一次读取时重新从数据库加载。

use tracing::debug;

use crate::cache::{ObjectCache, keys};

/// 教材变更后调用；`book_id` 为空时只刷新列表
pub async fn reload_books(cache: &dyn ObjectCache, book_id: Option<&str>) {
    cache.remove(keys::BOOKS_ALL).await;
    if let Some(id) = book_id {
        cache.remove(&keys::book(id)).await;
    }
    debug!("Book cache reloaded ({:?})", book_id);
}

/// 课程变更后调用，内部 ID 与对外编号两种键都会失效
pub async fn reload_course(cache: &dyn ObjectCache, course_id: &str, course_code: &str) {
    cache.remove(keys::COURSES_ALL).await;
    cache.remove(&keys::course(course_id)).await;
    cache.remove(&keys::course(course_code)).await;
    debug!("Course cache reloaded for {}", course_code);
}

pub async fn reload_areas(cache: &dyn ObjectCache) {
    cache.remove(keys::AREAS_ALL).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheResult;
    use crate::services::test_support;

    #[tokio::test]
    async fn test_reload_course_drops_both_keys() {
        let cache = test_support::cache();
        cache.insert(keys::COURSES_ALL, &vec![1], 0).await;
        cache.insert(&keys::course("uuid-1"), &1, 0).await;
        cache.insert(&keys::course("25ROBOT001"), &1, 0).await;
        cache.insert(&keys::book("ROBOT"), &1, 0).await;

        reload_course(cache.as_ref(), "uuid-1", "25ROBOT001").await;

        assert_eq!(cache.get::<Vec<i32>>(keys::COURSES_ALL).await, CacheResult::NotFound);
        assert_eq!(cache.get::<i32>(&keys::course("uuid-1")).await, CacheResult::NotFound);
        assert_eq!(cache.get::<i32>(&keys::course("25ROBOT001")).await, CacheResult::NotFound);
        assert_eq!(cache.get::<i32>(&keys::book("ROBOT")).await, CacheResult::Found(1));
    }

    #[tokio::test]
    async fn test_reload_books_keeps_other_books() {
        let cache = test_support::cache();
        cache.insert(&keys::book("A"), &1, 0).await;
        cache.insert(&keys::book("B"), &2, 0).await;

        reload_books(cache.as_ref(), Some("A")).await;

        assert_eq!(cache.get::<i32>(&keys::book("A")).await, CacheResult::NotFound);
        assert_eq!(cache.get::<i32>(&keys::book("B")).await, CacheResult::Found(2));
    }
}
