//! 课程名单与上课记录

use super::{SeaOrmStorage, db_error};
use super::details::touch_course;
use crate::entity::course_students::{self, Entity as CourseStudents};
use crate::entity::student_lessons::{self, Entity as StudentLessons};
use crate::errors::Result;
use crate::models::courses::requests::StudentInput;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::HashSet;

async fn roster_members<C: ConnectionTrait>(
    db: &C,
    course_id: &str,
    student_ids: &[String],
) -> Result<Vec<String>> {
    CourseStudents::find()
        .select_only()
        .column(course_students::Column::StudentId)
        .filter(course_students::Column::CourseId.eq(course_id))
        .filter(course_students::Column::StudentId.is_in(student_ids.iter().cloned()))
        .into_tuple()
        .all(db)
        .await
        .map_err(db_error("查询课程名单失败"))
}

impl SeaOrmStorage {
    pub async fn lesson_students_impl(
        &self,
        course_id: &str,
        detail_id: &str,
    ) -> Result<Vec<String>> {
        StudentLessons::find()
            .select_only()
            .column(student_lessons::Column::StudentId)
            .filter(student_lessons::Column::CourseId.eq(course_id))
            .filter(student_lessons::Column::LessonId.eq(detail_id))
            .order_by_asc(student_lessons::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_error("查询上课记录失败"))
    }

    /// 为课时添加上课记录，跳过名单外与已存在的学生
    pub async fn link_students_impl(
        &self,
        course_id: &str,
        detail_id: &str,
        student_ids: &[String],
    ) -> Result<usize> {
        if student_ids.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let members = roster_members(&txn, course_id, student_ids).await?;
        let linked: HashSet<String> = StudentLessons::find()
            .select_only()
            .column(student_lessons::Column::StudentId)
            .filter(student_lessons::Column::CourseId.eq(course_id))
            .filter(student_lessons::Column::LessonId.eq(detail_id))
            .into_tuple::<String>()
            .all(&txn)
            .await
            .map_err(db_error("查询上课记录失败"))?
            .into_iter()
            .collect();

        let rows: Vec<student_lessons::ActiveModel> = members
            .into_iter()
            .filter(|id| !linked.contains(id))
            .map(|student_id| student_lessons::ActiveModel {
                course_id: Set(course_id.to_string()),
                student_id: Set(student_id),
                lesson_id: Set(detail_id.to_string()),
                ..Default::default()
            })
            .collect();
        let count = rows.len();
        if count > 0 {
            StudentLessons::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(db_error("写入上课记录失败"))?;
            touch_course(&txn, course_id).await?;
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(count)
    }

    pub async fn unlink_students_impl(
        &self,
        course_id: &str,
        detail_id: &str,
        student_ids: &[String],
    ) -> Result<usize> {
        if student_ids.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;
        let result = StudentLessons::delete_many()
            .filter(student_lessons::Column::CourseId.eq(course_id))
            .filter(student_lessons::Column::LessonId.eq(detail_id))
            .filter(student_lessons::Column::StudentId.is_in(student_ids.iter().cloned()))
            .exec(&txn)
            .await
            .map_err(db_error("删除上课记录失败"))?;
        if result.rows_affected > 0 {
            touch_course(&txn, course_id).await?;
        }
        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(result.rows_affected as usize)
    }

    /// 加入课程名单，已在名单中的学生忽略
    pub async fn attach_students_impl(
        &self,
        course_id: &str,
        students: Vec<StudentInput>,
    ) -> Result<usize> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let ids: Vec<String> = students.iter().map(|s| s.id.clone()).collect();
        let mut seen: HashSet<String> = roster_members(&txn, course_id, &ids)
            .await?
            .into_iter()
            .collect();

        let now = chrono::Utc::now().timestamp();
        let rows: Vec<course_students::ActiveModel> = students
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .map(|s| course_students::ActiveModel {
                course_id: Set(course_id.to_string()),
                student_id: Set(s.id),
                name: Set(s.name.filter(|n| !n.trim().is_empty())),
                joined_at: Set(now),
                ..Default::default()
            })
            .collect();
        let count = rows.len();
        if count > 0 {
            CourseStudents::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(db_error("加入课程名单失败"))?;
            touch_course(&txn, course_id).await?;
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(count)
    }

    /// 移出名单，同时删除该学生在本课程的上课记录
    pub async fn detach_student_impl(&self, course_id: &str, student_id: &str) -> Result<bool> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        StudentLessons::delete_many()
            .filter(student_lessons::Column::CourseId.eq(course_id))
            .filter(student_lessons::Column::StudentId.eq(student_id))
            .exec(&txn)
            .await
            .map_err(db_error("删除上课记录失败"))?;
        let removed = CourseStudents::delete_many()
            .filter(course_students::Column::CourseId.eq(course_id))
            .filter(course_students::Column::StudentId.eq(student_id))
            .exec(&txn)
            .await
            .map_err(db_error("移出课程名单失败"))?;
        if removed.rows_affected > 0 {
            touch_course(&txn, course_id).await?;
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(removed.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::courses::tests::new_course;

    fn student(id: &str, name: Option<&str>) -> StudentInput {
        StudentInput {
            id: id.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_attach_ignores_duplicates() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 1))
            .await
            .unwrap();

        let added = storage
            .attach_students_impl(
                &course.id,
                vec![student("s1", Some("An")), student("s1", None), student("s2", None)],
            )
            .await
            .unwrap();
        assert_eq!(added, 2);

        let again = storage
            .attach_students_impl(&course.id, vec![student("s2", None), student("s3", None)])
            .await
            .unwrap();
        assert_eq!(again, 1);

        let loaded = storage.get_course_impl(&course.id).await.unwrap().unwrap();
        let ids: Vec<&str> = loaded.students.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
        assert_eq!(loaded.students[0].name.as_deref(), Some("An"));
    }

    #[tokio::test]
    async fn test_link_and_unlink_lessons() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 1))
            .await
            .unwrap();
        let lesson = course.details[0].id.clone();
        storage
            .attach_students_impl(&course.id, vec![student("s1", None), student("s2", None)])
            .await
            .unwrap();

        let ids = vec!["s1".to_string(), "s2".to_string(), "ghost".to_string()];
        assert_eq!(storage.link_students_impl(&course.id, &lesson, &ids).await.unwrap(), 2);
        assert_eq!(storage.link_students_impl(&course.id, &lesson, &ids).await.unwrap(), 0);

        let removed = storage
            .unlink_students_impl(&course.id, &lesson, &["s1".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            storage.lesson_students_impl(&course.id, &lesson).await.unwrap(),
            vec!["s2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_detach_removes_learn_links() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 1))
            .await
            .unwrap();
        let lesson = course.details[0].id.clone();
        storage
            .attach_students_impl(&course.id, vec![student("s1", None)])
            .await
            .unwrap();
        storage
            .link_students_impl(&course.id, &lesson, &["s1".to_string()])
            .await
            .unwrap();

        assert!(storage.detach_student_impl(&course.id, "s1").await.unwrap());
        assert!(!storage.detach_student_impl(&course.id, "s1").await.unwrap());
        assert!(
            storage
                .lesson_students_impl(&course.id, &lesson)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
