pub mod create;
pub mod get;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::storage::Storage;

pub struct BookService {
    storage: Option<Arc<dyn Storage>>,
}

impl BookService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_of(request),
        }
    }

    // 创建教材（表单上传封面与徽章）
    pub async fn create_book(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        create::create_book(self, request, payload).await
    }

    // 更新教材，新图片保存成功后才删除旧图片
    pub async fn update_book(
        &self,
        request: &HttpRequest,
        book_id: String,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        update::update_book(self, request, book_id, payload).await
    }

    pub async fn list_books(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::list_books(self, request).await
    }

    pub async fn get_book(
        &self,
        request: &HttpRequest,
        book_id: String,
    ) -> ActixResult<HttpResponse> {
        get::get_book(self, request, book_id).await
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use actix_web::web::Bytes;

    use crate::utils::multipart::{MultipartForm, UploadedFile};

    /// 构造已解析的表单
    pub fn form(fields: &[(&str, &str)], files: &[(&str, &str)]) -> MultipartForm {
        let mut form = MultipartForm::default();
        for (name, value) in fields {
            form.fields.insert(name.to_string(), value.to_string());
        }
        for (field, file_name) in files {
            form.files.push(UploadedFile {
                field: field.to_string(),
                file_name: file_name.to_string(),
                content_type: "image/png".to_string(),
                bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nfake"),
            });
        }
        form
    }
}
