//! multipart/form-data 读取
//!
//! 教材与媒体接口同时包含文本字段和文件，这里一次性读入内存，
//! 文件超过大小限制时立即中止。

use actix_multipart::Multipart;
use actix_web::web;
use futures_util::{StreamExt, TryStreamExt};
use std::collections::HashMap;

use super::file_magic::sniff_media_mime;

// 文本字段上限
const MAX_TEXT_FIELD: usize = 64 * 1024;
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: web::Bytes,
}

impl UploadedFile {
    /// 实际使用的 MIME：优先客户端声明，缺失时按文件头识别
    pub fn mime(&self) -> String {
        let declared = self.content_type.trim();
        if !declared.is_empty() && !declared.eq_ignore_ascii_case(OCTET_STREAM) {
            return declared.to_ascii_lowercase();
        }
        sniff_media_mime(&self.bytes)
            .unwrap_or(OCTET_STREAM)
            .to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// 去除首尾空白后的非空文本字段
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 指定字段的第一个非空文件
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .find(|f| f.field == name && !f.is_empty())
    }

    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.files.iter().filter(move |f| f.field == name)
    }
}

#[derive(Debug)]
pub enum MultipartError {
    TooLarge(String),
    TooManyFiles(usize),
    Malformed(String),
}

impl std::fmt::Display for MultipartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultipartError::TooLarge(name) => write!(f, "File '{name}' exceeds the size limit"),
            MultipartError::TooManyFiles(max) => {
                write!(f, "At most {max} files can be uploaded at once")
            }
            MultipartError::Malformed(msg) => write!(f, "Malformed multipart payload: {msg}"),
        }
    }
}

pub async fn read_multipart(
    payload: Multipart,
    max_file_size: usize,
) -> Result<MultipartForm, MultipartError> {
    read_multipart_limited(payload, max_file_size, usize::MAX).await
}

/// 同时限制文件个数，超出时在读取下一个文件内容之前中止
pub async fn read_multipart_limited(
    mut payload: Multipart,
    max_file_size: usize,
    max_files: usize,
) -> Result<MultipartForm, MultipartError> {
    let mut form = MultipartForm::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| MultipartError::Malformed(e.to_string()))?
    {
        let disposition = field.content_disposition();
        let name = disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let file_name = disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string());
        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_default();

        if file_name.is_some() && form.files.len() >= max_files {
            return Err(MultipartError::TooManyFiles(max_files));
        }

        let limit = if file_name.is_some() {
            max_file_size
        } else {
            MAX_TEXT_FIELD
        };

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| MultipartError::Malformed(e.to_string()))?;
            if data.len() + chunk.len() > limit {
                return Err(MultipartError::TooLarge(
                    file_name.clone().unwrap_or_else(|| name.clone()),
                ));
            }
            data.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) => form.files.push(UploadedFile {
                field: name,
                file_name,
                content_type,
                bytes: web::Bytes::from(data),
            }),
            None => {
                form.fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content_type: &str, bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            field: "file".into(),
            file_name: "a.bin".into(),
            content_type: content_type.into(),
            bytes: web::Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_declared_mime_wins() {
        assert_eq!(file("Image/PNG", b"xxxx").mime(), "image/png");
    }

    #[test]
    fn test_octet_stream_falls_back_to_sniffing() {
        assert_eq!(
            file("application/octet-stream", &[0xFF, 0xD8, 0xFF, 0xE1]).mime(),
            "image/jpeg"
        );
        assert_eq!(file("", b"plain text").mime(), OCTET_STREAM);
    }

    #[test]
    fn test_text_and_file_lookup() {
        let mut form = MultipartForm::default();
        form.fields.insert("Name".into(), "  Robotics  ".into());
        form.fields.insert("Badge".into(), "   ".into());
        form.files.push(file("image/png", b""));
        form.files.push(file("image/png", b"data"));

        assert_eq!(form.text("Name"), Some("Robotics"));
        assert_eq!(form.text("Badge"), None);
        assert_eq!(form.file("file").map(|f| f.bytes.len()), Some(4));
        assert_eq!(form.files_named("file").count(), 2);
    }

    fn payload(files: usize) -> Multipart {
        let mut body = String::from(
            "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"detailId\"\r\n\r\nlesson-1\r\n",
        );
        for i in 0..files {
            body.push_str(&format!(
                "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"images\"; \
                 filename=\"p{i}.png\"\r\nContent-Type: image/png\r\n\r\ndata{i}\r\n"
            ));
        }
        body.push_str("--XBOUNDARY--\r\n");

        let mut headers = actix_web::http::header::HeaderMap::new();
        headers.insert(
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::HeaderValue::from_static(
                "multipart/form-data; boundary=XBOUNDARY",
            ),
        );
        let stream = futures_util::stream::iter(vec![Ok::<_, actix_web::error::PayloadError>(
            web::Bytes::from(body),
        )]);
        Multipart::new(&headers, stream)
    }

    #[actix_web::test]
    async fn test_file_count_is_capped_while_streaming() {
        let err = read_multipart_limited(payload(3), 1024, 2).await.unwrap_err();
        assert!(matches!(err, MultipartError::TooManyFiles(2)));

        let form = read_multipart_limited(payload(3), 1024, 3).await.unwrap();
        assert_eq!(form.files_named("images").count(), 3);
        assert_eq!(form.text("detailId"), Some("lesson-1"));
        assert_eq!(form.files[2].bytes.as_ref(), b"data2");
    }
}
