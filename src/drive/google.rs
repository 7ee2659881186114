//! 基于服务账号的 Google Drive v3 客户端

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{DriveStorage, DriveUpload, drive_file_name};
use crate::config::DriveConfig;
use crate::errors::{CourseDeskError, Result};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&supportsAllDrives=true&fields=id";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const BOUNDARY: &str = "coursedesk_drive_boundary";
// 令牌提前刷新的秒数
const TOKEN_REFRESH_MARGIN: i64 = 60;

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: Option<String>,
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

pub struct GoogleDrive {
    http: reqwest::Client,
    client_email: String,
    encoding_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleDrive {
    pub fn from_config(config: &DriveConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(CourseDeskError::drive_operation(
                "Drive service account credentials are not configured",
            ));
        }
        let private_key = config.private_key.replace("\\n", "\n");
        let encoding_key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| CourseDeskError::drive_operation(format!("Invalid private key: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        debug!(
            "Google Drive client ready for {} (project {})",
            config.client_email, config.project_id
        );
        Ok(Self {
            http,
            client_email: config.client_email.clone(),
            encoding_key,
            token: Mutex::new(None),
        })
    }

    /// 获取访问令牌，临近过期时重新换取
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = guard.as_ref()
            && token.expires_at - TOKEN_REFRESH_MARGIN > now
        {
            return Ok(token.value.clone());
        }

        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DRIVE_SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CourseDeskError::authentication(format!(
                "Drive token exchange failed ({status}): {body}"
            )));
        }
        let token: TokenResponse = response.json().await?;

        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: now + token.expires_in,
        });
        Ok(token.access_token)
    }
}

/// 组装 multipart/related 请求体：元数据 JSON + 文件内容
fn multipart_related_body(metadata: &serde_json::Value, mime: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[async_trait]
impl DriveStorage for GoogleDrive {
    async fn upload(&self, file: DriveUpload, folder_id: &str) -> Result<String> {
        let token = self.access_token().await?;
        let name = drive_file_name(&file.name);
        let metadata = serde_json::json!({ "name": name, "parents": [folder_id] });
        let body = multipart_related_body(&metadata, &file.mime, &file.bytes);

        let response = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CourseDeskError::drive_operation(format!(
                "Upload of '{name}' failed ({status}): {body}"
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        let id = uploaded.id.ok_or_else(|| {
            CourseDeskError::drive_operation("Drive did not return a file ID after upload")
        })?;
        debug!("Uploaded '{}' to Drive folder {} as {}", name, folder_id, id);
        Ok(id)
    }

    async fn delete(&self, file_id: &str) -> Result<bool> {
        if file_id.trim().is_empty() {
            return Ok(false);
        }
        let token = self.access_token().await?;
        let response = self
            .http
            .delete(format!("{FILES_URL}/{file_id}"))
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                debug!("Deleted Drive file {}", file_id);
                Ok(true)
            }
            StatusCode::NOT_FOUND => {
                warn!("Drive file {} not found for deletion", file_id);
                Ok(false)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(CourseDeskError::drive_operation(format!(
                    "Delete of {file_id} failed ({status}): {body}"
                )))
            }
        }
    }
}
