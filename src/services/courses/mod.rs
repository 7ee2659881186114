pub mod create;
pub mod details;
pub mod get;
pub mod roster;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::common::pagination::PaginationQuery;
use crate::models::courses::requests::{
    AttachStudentsRequest, CreateCourseRequest, DetailMutationRequest,
};
use crate::storage::Storage;

pub struct CourseService {
    storage: Option<Arc<dyn Storage>>,
}

impl CourseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_of(request),
        }
    }

    // 创建课程并分配编号
    pub async fn create_course(
        &self,
        request: &HttpRequest,
        body: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_course(self, request, body).await
    }

    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        query: PaginationQuery,
    ) -> ActixResult<HttpResponse> {
        get::list_courses(self, request, query).await
    }

    // 按内部 ID 或课程编号查询
    pub async fn get_course(
        &self,
        request: &HttpRequest,
        key: String,
    ) -> ActixResult<HttpResponse> {
        get::get_course(self, request, key).await
    }

    // 补课 / 请假 / 修改课时
    pub async fn mutate_detail(
        &self,
        request: &HttpRequest,
        body: DetailMutationRequest,
    ) -> ActixResult<HttpResponse> {
        details::mutate_detail(self, request, body).await
    }

    pub async fn attach_students(
        &self,
        request: &HttpRequest,
        course_key: String,
        body: AttachStudentsRequest,
    ) -> ActixResult<HttpResponse> {
        roster::attach_students(self, request, course_key, body).await
    }

    pub async fn detach_student(
        &self,
        request: &HttpRequest,
        course_key: String,
        student_id: String,
    ) -> ActixResult<HttpResponse> {
        roster::detach_student(self, request, course_key, student_id).await
    }
}
