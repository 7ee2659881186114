//! 课程存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::course_details::{self, Entity as CourseDetails};
use crate::entity::course_sequences::{self, Entity as CourseSequences};
use crate::entity::course_students::{self, Entity as CourseStudents};
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::student_lessons::{self, Entity as StudentLessons};
use crate::errors::{CourseDeskError, Result};
use crate::models::courses::{
    entities::{Course, CourseSummary},
    requests::NewCourse,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use std::collections::HashMap;
use tracing::debug;

// 编号分配的最大重试次数
const MAX_SEQUENCE_ATTEMPTS: usize = 8;

/// `{前缀}{三位序号}`，超过 999 时按实际位数输出
pub fn format_course_code(prefix: &str, seq: i32) -> String {
    format!("{prefix}{seq:03}")
}

/// 从已有编号中解析序号，前缀之后必须全为数字
fn parse_sequence(code: &str, prefix: &str) -> Option<i32> {
    let suffix = code.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

impl SeaOrmStorage {
    /// 分配下一个课程编号
    ///
    /// 计数行不存在时，用现有课程中该前缀的最大序号作为起点；
    /// 已存在时用比较并交换递增，冲突后重读再试。
    pub async fn next_course_code_impl(&self, prefix: &str) -> Result<String> {
        for _ in 0..MAX_SEQUENCE_ATTEMPTS {
            let current = CourseSequences::find_by_id(prefix.to_string())
                .one(&self.db)
                .await
                .map_err(db_error("查询课程序号失败"))?;

            match current {
                Some(row) => {
                    let next = row.last_seq + 1;
                    let updated = CourseSequences::update_many()
                        .col_expr(course_sequences::Column::LastSeq, Expr::value(next))
                        .filter(course_sequences::Column::Prefix.eq(prefix))
                        .filter(course_sequences::Column::LastSeq.eq(row.last_seq))
                        .exec(&self.db)
                        .await
                        .map_err(db_error("更新课程序号失败"))?;
                    if updated.rows_affected == 1 {
                        return Ok(format_course_code(prefix, next));
                    }
                    debug!("Sequence for {} changed concurrently, retrying", prefix);
                }
                None => {
                    let next = self.highest_existing_sequence(prefix).await? + 1;
                    let seed = course_sequences::ActiveModel {
                        prefix: Set(prefix.to_string()),
                        last_seq: Set(next),
                    };
                    match CourseSequences::insert(seed).exec(&self.db).await {
                        Ok(_) => return Ok(format_course_code(prefix, next)),
                        Err(e) => match e.sql_err() {
                            Some(SqlErr::UniqueConstraintViolation(_)) => {
                                debug!("Sequence for {} seeded concurrently, retrying", prefix);
                            }
                            _ => return Err(db_error("初始化课程序号失败")(e)),
                        },
                    }
                }
            }
        }

        Err(CourseDeskError::conflict(format!(
            "Could not allocate a course code for prefix {prefix}"
        )))
    }

    async fn highest_existing_sequence(&self, prefix: &str) -> Result<i32> {
        // LIKE 中的 _ 是通配符，结果再按前缀精确过滤
        let codes: Vec<String> = Courses::find()
            .filter(Column::Code.starts_with(prefix))
            .all(&self.db)
            .await
            .map_err(db_error("查询课程编号失败"))?
            .into_iter()
            .map(|c| c.code)
            .collect();

        Ok(codes
            .iter()
            .filter_map(|code| parse_sequence(code, prefix))
            .max()
            .unwrap_or(0))
    }

    /// 创建课程及全部课时
    pub async fn create_course_impl(&self, req: NewCourse) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();
        let course_id = uuid::Uuid::new_v4().to_string();
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        ActiveModel {
            id: Set(course_id.clone()),
            code: Set(req.code),
            book_id: Set(req.book_id),
            area_id: Set(req.area_id),
            teacher_hr: Set(req.teacher_hr),
            course_type: Set(req.course_type),
            status: Set(req.status),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_error("创建课程失败"))?;

        let details: Vec<course_details::ActiveModel> = req
            .details
            .into_iter()
            .enumerate()
            .map(|(i, d)| course_details::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                course_id: Set(course_id.clone()),
                position: Set(i as i32),
                topic_id: Set(d.topic_id),
                day: Set(d.day.timestamp()),
                room_id: Set(d.room_id),
                time: Set(d.time),
                teacher_id: Set(d.teacher_id),
                teaching_as: Set(d.teaching_as),
                image: Set(d.image),
                detail_type: Set(d.detail_type),
                note: Set(d.note),
            })
            .collect();
        if !details.is_empty() {
            CourseDetails::insert_many(details)
                .exec(&txn)
                .await
                .map_err(db_error("创建课时失败"))?;
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;

        self.get_course_impl(&course_id)
            .await?
            .ok_or_else(|| CourseDeskError::not_found(format!("Course {course_id}")))
    }

    /// 按内部 ID 或对外编号查找
    pub async fn get_course_impl(&self, key: &str) -> Result<Option<Course>> {
        let Some(course) = self.find_course_model(key).await? else {
            return Ok(None);
        };

        let details = CourseDetails::find()
            .filter(course_details::Column::CourseId.eq(&course.id))
            .order_by_asc(course_details::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_error("查询课时失败"))?;
        let detail_ids: Vec<String> = details.iter().map(|d| d.id.clone()).collect();
        let mut media = self.media_by_detail(&detail_ids).await?;

        let students = CourseStudents::find()
            .filter(course_students::Column::CourseId.eq(&course.id))
            .order_by_asc(course_students::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询课程名单失败"))?;
        let lessons = StudentLessons::find()
            .filter(student_lessons::Column::CourseId.eq(&course.id))
            .order_by_asc(student_lessons::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询上课记录失败"))?;

        let mut learn: HashMap<String, Vec<String>> = HashMap::new();
        for lesson in lessons {
            learn.entry(lesson.student_id).or_default().push(lesson.lesson_id);
        }

        let details = details
            .into_iter()
            .map(|d| {
                let own = media.remove(&d.id).unwrap_or_default();
                d.into_detail(own)
            })
            .collect();
        let students = students
            .into_iter()
            .map(|s| {
                let own = learn.remove(&s.student_id).unwrap_or_default();
                s.into_course_student(own)
            })
            .collect();

        Ok(Some(course.into_course(details, students)))
    }

    pub async fn find_course_id_impl(&self, key: &str) -> Result<Option<String>> {
        Ok(self.find_course_model(key).await?.map(|c| c.id))
    }

    async fn find_course_model(
        &self,
        key: &str,
    ) -> Result<Option<crate::entity::courses::Model>> {
        let key = key.trim();
        Courses::find()
            .filter(
                Condition::any()
                    .add(Column::Id.eq(key))
                    .add(Column::Code.eq(key.to_uppercase())),
            )
            .one(&self.db)
            .await
            .map_err(db_error("查询课程失败"))
    }

    pub async fn list_course_summaries_impl(&self) -> Result<Vec<CourseSummary>> {
        let courses = Courses::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_asc(Column::Code)
            .all(&self.db)
            .await
            .map_err(db_error("查询课程列表失败"))?;

        Ok(courses
            .into_iter()
            .map(|c| c.into_course(Vec::new(), Vec::new()))
            .map(|c| CourseSummary::from(&c))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::courses::requests::NewDetail;

    pub(crate) fn new_course(code: &str, details: usize) -> NewCourse {
        NewCourse {
            code: code.to_string(),
            book_id: None,
            area_id: None,
            teacher_hr: None,
            course_type: "AI Robotic".to_string(),
            status: false,
            details: (0..details)
                .map(|i| NewDetail {
                    topic_id: uuid::Uuid::new_v4().to_string(),
                    day: chrono::Utc::now(),
                    room_id: None,
                    time: format!("1{i}:00"),
                    teacher_id: None,
                    teaching_as: None,
                    image: String::new(),
                    detail_type: None,
                    note: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_sequence_parsing_requires_digits() {
        assert_eq!(parse_sequence("25ROBOT007", "25ROBOT"), Some(7));
        assert_eq!(parse_sequence("25ROBOT_X01", "25ROBOT"), None);
        assert_eq!(parse_sequence("25ROBOT", "25ROBOT"), None);
        assert_eq!(format_course_code("25ROBOT", 12), "25ROBOT012");
        assert_eq!(format_course_code("25ROBOT", 1234), "25ROBOT1234");
    }

    #[tokio::test]
    async fn test_sequence_continues_from_existing_course() {
        let storage = SeaOrmStorage::in_memory().await;
        storage
            .create_course_impl(new_course("25ROBOT007", 0))
            .await
            .unwrap();
        storage
            .create_course_impl(new_course("25ROBOTX001", 0))
            .await
            .unwrap();

        assert_eq!(
            storage.next_course_code_impl("25ROBOT").await.unwrap(),
            "25ROBOT008"
        );
        assert_eq!(
            storage.next_course_code_impl("25ROBOT").await.unwrap(),
            "25ROBOT009"
        );
        assert_eq!(
            storage.next_course_code_impl("25SCRATCH").await.unwrap(),
            "25SCRATCH001"
        );
    }

    #[tokio::test]
    async fn test_course_found_by_id_or_code() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 3))
            .await
            .unwrap();
        assert_eq!(course.details.len(), 3);
        assert_eq!(course.version, 1);
        assert_eq!(course.details[2].position, 2);

        let by_code = storage.get_course_impl("25robot001").await.unwrap().unwrap();
        assert_eq!(by_code.id, course.id);
        assert!(storage.get_course_impl("missing").await.unwrap().is_none());
        assert_eq!(storage.list_course_summaries_impl().await.unwrap().len(), 1);
    }
}
