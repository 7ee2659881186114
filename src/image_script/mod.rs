//! 课时图片脚本（Google Apps Script）
//!
//! 脚本按课程编号与上课日期生成每个课时的图片文件夹，
//! 调用失败不影响课程写入，对应课时的 Image 为空字符串。

pub mod apps_script;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::Result;
use crate::utils::validate::format_day;

pub use apps_script::AppsScriptClient;

#[async_trait]
pub trait ImageScript: Send + Sync {
    /// `topic` 为 `|` 拼接的日期，返回值与日期一一对应
    async fn generate(&self, course_code: &str, topic: &str) -> Result<Vec<String>>;
}

/// 按日期生成图片，失败时返回空列表
pub async fn generate_or_empty(
    script: &dyn ImageScript,
    course_code: &str,
    days: &[String],
) -> Vec<String> {
    let topic = days
        .iter()
        .map(|d| format_day(d))
        .collect::<Vec<_>>()
        .join("|");
    match script.generate(course_code, &topic).await {
        Ok(urls) => urls,
        Err(e) => {
            warn!("Image script failed for course {}: {}", course_code, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::errors::CourseDeskError;
    use std::sync::Mutex;

    /// 每个日期返回 `img-{序号}`；failing 时总是出错
    #[derive(Default)]
    pub struct FakeScript {
        pub failing: bool,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeScript {
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ImageScript for FakeScript {
        async fn generate(&self, course_code: &str, topic: &str) -> Result<Vec<String>> {
            self.calls
                .lock()
                .unwrap()
                .push((course_code.to_string(), topic.to_string()));
            if self.failing {
                return Err(CourseDeskError::image_script("script unavailable"));
            }
            Ok(topic
                .split('|')
                .enumerate()
                .map(|(i, _)| format!("img-{}", i + 1))
                .collect())
        }
    }
}
