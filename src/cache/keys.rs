//! 缓存键

pub const BOOKS_ALL: &str = "books:all";
pub const COURSES_ALL: &str = "courses:all";
pub const AREAS_ALL: &str = "areas:all";

pub fn book(id: &str) -> String {
    format!("book:{id}")
}

pub fn course(key: &str) -> String {
    format!("course:{key}")
}
