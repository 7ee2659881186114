use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::ImageScript;
use crate::config::ImageScriptConfig;
use crate::errors::{CourseDeskError, Result};

#[derive(Debug, Deserialize)]
struct ScriptResponse {
    status: Option<String>,
    urls: Option<String>,
}

impl ScriptResponse {
    /// status 缺失视为成功
    fn into_urls(self) -> Result<Vec<String>> {
        if let Some(status) = self.status.as_deref()
            && status != "success"
        {
            return Err(CourseDeskError::image_script(format!(
                "Script returned status '{status}'"
            )));
        }
        Ok(self
            .urls
            .filter(|u| !u.is_empty())
            .map(|u| u.split('|').map(str::to_string).collect())
            .unwrap_or_default())
    }
}

pub struct AppsScriptClient {
    http: reqwest::Client,
    url: String,
}

impl AppsScriptClient {
    pub fn from_config(config: &ImageScriptConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl ImageScript for AppsScriptClient {
    async fn generate(&self, course_code: &str, topic: &str) -> Result<Vec<String>> {
        if self.url.is_empty() {
            return Err(CourseDeskError::image_script("Image script URL is not configured"));
        }

        let response = self
            .http
            .get(&self.url)
            .query(&[("ID", course_code), ("Topic", topic)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CourseDeskError::image_script(format!(
                "Script responded with {}",
                response.status()
            )));
        }

        let parsed: ScriptResponse = response.json().await?;
        let urls = parsed.into_urls()?;
        debug!("Image script produced {} urls for {}", urls.len(), course_code);
        Ok(urls)
    }
}
