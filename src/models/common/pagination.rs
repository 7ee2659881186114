use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 分页查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationQuery {
    #[serde(
        default = "default_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page: i64,
    #[serde(
        default = "default_size",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub size: i64,
}

// 分页响应信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationQuery {
    /// 规范化后的页码与每页数量
    pub fn normalized(&self) -> (usize, usize) {
        (self.page.max(1) as usize, self.size.clamp(1, 100) as usize)
    }

    /// 对已加载的完整列表做内存分页
    pub fn paginate<T: Clone>(&self, all: &[T]) -> (Vec<T>, PaginationInfo) {
        let (page, size) = self.normalized();
        let total = all.len();
        let total_pages = total.div_ceil(size);
        let items = all
            .iter()
            .skip((page - 1) * size)
            .take(size)
            .cloned()
            .collect();
        (
            items,
            PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: total_pages as i64,
            },
        )
    }
}

// 自定义反序列化函数，支持字符串到i64的转换
fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if value <= i64::MAX as u64 {
                Ok(value as i64)
            } else {
                Err(Error::invalid_value(Unexpected::Unsigned(value), &self))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            value
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_clamps_and_slices() {
        let all: Vec<i32> = (1..=25).collect();
        let query = PaginationQuery { page: 3, size: 10 };
        let (items, info) = query.paginate(&all);
        assert_eq!(items, vec![21, 22, 23, 24, 25]);
        assert_eq!(info.total, 25);
        assert_eq!(info.total_pages, 3);

        let query = PaginationQuery { page: 0, size: 0 };
        let (items, info) = query.paginate(&all);
        assert_eq!(items, vec![1]);
        assert_eq!(info.page, 1);
        assert_eq!(info.page_size, 1);
    }

    #[test]
    fn test_page_accepts_string_numbers() {
        let query: PaginationQuery = serde_json::from_str(r#"{"page":"2","size":5}"#).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.size, 5);
    }
}
