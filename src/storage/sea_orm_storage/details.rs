//! 课时存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::course_details::{ActiveModel, Column, Entity as CourseDetails, Model};
use crate::entity::course_students::{self, Entity as CourseStudents};
use crate::entity::courses::Entity as Courses;
use crate::entity::student_lessons::{self, Entity as StudentLessons};
use crate::errors::{CourseDeskError, Result};
use crate::models::courses::{
    entities::CourseDetail,
    requests::{DetailPatch, NewDetail},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 课程有改动时递增版本号
pub(super) async fn touch_course<C: ConnectionTrait>(db: &C, course_id: &str) -> Result<()> {
    let Some(course) = Courses::find_by_id(course_id.to_string())
        .one(db)
        .await
        .map_err(db_error("查询课程失败"))?
    else {
        return Err(CourseDeskError::not_found(format!("Course {course_id}")));
    };

    let version = course.version + 1;
    let mut active = course.into_active_model();
    active.version = Set(version);
    active.updated_at = Set(chrono::Utc::now().timestamp());
    active.update(db).await.map_err(db_error("更新课程版本失败"))?;
    Ok(())
}

impl SeaOrmStorage {
    /// 追加课时到末尾；只有名单内的学生会写入上课记录
    pub async fn append_detail_impl(
        &self,
        course_id: &str,
        detail: NewDetail,
        students: &[String],
    ) -> Result<CourseDetail> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let last = CourseDetails::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_desc(Column::Position)
            .one(&txn)
            .await
            .map_err(db_error("查询课时失败"))?;
        let position = last.map(|d| d.position + 1).unwrap_or(0);

        let detail_id = uuid::Uuid::new_v4().to_string();
        ActiveModel {
            id: Set(detail_id.clone()),
            course_id: Set(course_id.to_string()),
            position: Set(position),
            topic_id: Set(detail.topic_id),
            day: Set(detail.day.timestamp()),
            room_id: Set(detail.room_id),
            time: Set(detail.time),
            teacher_id: Set(detail.teacher_id),
            teaching_as: Set(detail.teaching_as),
            image: Set(detail.image),
            detail_type: Set(detail.detail_type),
            note: Set(detail.note),
        }
        .insert(&txn)
        .await
        .map_err(db_error("创建课时失败"))?;

        if !students.is_empty() {
            let members: Vec<String> = CourseStudents::find()
                .select_only()
                .column(course_students::Column::StudentId)
                .filter(course_students::Column::CourseId.eq(course_id))
                .filter(course_students::Column::StudentId.is_in(students.iter().cloned()))
                .into_tuple()
                .all(&txn)
                .await
                .map_err(db_error("查询课程名单失败"))?;

            let lessons: Vec<student_lessons::ActiveModel> = members
                .into_iter()
                .map(|student_id| student_lessons::ActiveModel {
                    course_id: Set(course_id.to_string()),
                    student_id: Set(student_id),
                    lesson_id: Set(detail_id.clone()),
                    ..Default::default()
                })
                .collect();
            if !lessons.is_empty() {
                StudentLessons::insert_many(lessons)
                    .exec(&txn)
                    .await
                    .map_err(db_error("写入上课记录失败"))?;
            }
        }

        touch_course(&txn, course_id).await?;
        txn.commit().await.map_err(db_error("提交事务失败"))?;

        self.get_detail_impl(Some(course_id), &detail_id)
            .await?
            .ok_or_else(|| CourseDeskError::not_found(format!("Detail {detail_id}")))
    }

    /// 指定 course_id 时，课时必须属于该课程
    pub async fn get_detail_impl(
        &self,
        course_id: Option<&str>,
        detail_id: &str,
    ) -> Result<Option<CourseDetail>> {
        let Some(model) = self.find_detail_model(course_id, detail_id).await? else {
            return Ok(None);
        };
        let media = self
            .media_by_detail(std::slice::from_ref(&model.id))
            .await?
            .remove(&model.id)
            .unwrap_or_default();
        Ok(Some(model.into_detail(media)))
    }

    async fn find_detail_model(
        &self,
        course_id: Option<&str>,
        detail_id: &str,
    ) -> Result<Option<Model>> {
        let mut query = CourseDetails::find().filter(Column::Id.eq(detail_id));
        if let Some(course_id) = course_id {
            query = query.filter(Column::CourseId.eq(course_id));
        }
        query.one(&self.db).await.map_err(db_error("查询课时失败"))
    }

    /// 标记课时类型（如请假），其余字段保持不变
    pub async fn set_detail_type_impl(
        &self,
        course_id: &str,
        detail_id: &str,
        detail_type: &str,
        note: &str,
    ) -> Result<Option<CourseDetail>> {
        let Some(model) = self.find_detail_model(Some(course_id), detail_id).await? else {
            return Ok(None);
        };

        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;
        let mut active = model.into_active_model();
        active.detail_type = Set(Some(detail_type.to_string()));
        active.note = Set(note.to_string());
        active.update(&txn).await.map_err(db_error("更新课时失败"))?;
        touch_course(&txn, course_id).await?;
        txn.commit().await.map_err(db_error("提交事务失败"))?;

        self.get_detail_impl(Some(course_id), detail_id).await
    }

    pub async fn update_detail_impl(
        &self,
        course_id: &str,
        detail_id: &str,
        patch: DetailPatch,
    ) -> Result<Option<CourseDetail>> {
        let Some(model) = self.find_detail_model(Some(course_id), detail_id).await? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return self.get_detail_impl(Some(course_id), detail_id).await;
        }

        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;
        let mut active = model.into_active_model();
        if let Some(room_id) = patch.room_id {
            active.room_id = Set(Some(room_id));
        }
        if let Some(teacher_id) = patch.teacher_id {
            active.teacher_id = Set(Some(teacher_id));
        }
        if let Some(teaching_as) = patch.teaching_as {
            active.teaching_as = Set(teaching_as);
        }
        active.update(&txn).await.map_err(db_error("更新课时失败"))?;
        touch_course(&txn, course_id).await?;
        txn.commit().await.map_err(db_error("提交事务失败"))?;

        self.get_detail_impl(Some(course_id), detail_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::DetailType;
    use crate::models::courses::requests::StudentInput;
    use crate::storage::sea_orm_storage::courses::tests::new_course;

    fn student(id: &str) -> StudentInput {
        StudentInput {
            id: id.to_string(),
            name: None,
        }
    }

    #[tokio::test]
    async fn test_absence_only_changes_type_and_note() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 2))
            .await
            .unwrap();
        let before = course.details[1].clone();

        let after = storage
            .set_detail_type_impl(&course.id, &before.id, DetailType::ABSENCE, "sick")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after.detail_type.as_deref(), Some(DetailType::ABSENCE));
        assert_eq!(after.note, "sick");
        assert_eq!(after.time, before.time);
        assert_eq!(after.topic_id, before.topic_id);
        assert_eq!(after.position, before.position);

        let reloaded = storage.get_course_impl(&course.id).await.unwrap().unwrap();
        assert_eq!(reloaded.version, 2);
    }

    #[tokio::test]
    async fn test_detail_scoped_to_course() {
        let storage = SeaOrmStorage::in_memory().await;
        let a = storage
            .create_course_impl(new_course("25ROBOT001", 1))
            .await
            .unwrap();
        let b = storage
            .create_course_impl(new_course("25ROBOT002", 1))
            .await
            .unwrap();

        let foreign = &b.details[0].id;
        assert!(storage.get_detail_impl(Some(&a.id), foreign).await.unwrap().is_none());
        assert!(storage.get_detail_impl(None, foreign).await.unwrap().is_some());
        assert!(
            storage
                .set_detail_type_impl(&a.id, foreign, DetailType::ABSENCE, "")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_append_links_only_roster_members() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 2))
            .await
            .unwrap();
        storage
            .attach_students_impl(&course.id, vec![student("s1"), student("s2")])
            .await
            .unwrap();

        let mut makeup = new_course("unused", 1).details.remove(0);
        makeup.detail_type = Some(DetailType::MAKEUP.to_string());
        let detail = storage
            .append_detail_impl(
                &course.id,
                makeup,
                &["s1".to_string(), "outsider".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(detail.position, 2);
        assert_eq!(
            storage.lesson_students_impl(&course.id, &detail.id).await.unwrap(),
            vec!["s1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_clears_teaching_as() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 1))
            .await
            .unwrap();
        let detail_id = course.details[0].id.clone();

        let set = DetailPatch {
            room_id: None,
            teacher_id: Some("t1".to_string()),
            teaching_as: Some(Some("t2".to_string())),
        };
        let updated = storage
            .update_detail_impl(&course.id, &detail_id, set)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.teacher_id.as_deref(), Some("t1"));
        assert_eq!(updated.teaching_as.as_deref(), Some("t2"));

        let clear = DetailPatch {
            room_id: None,
            teacher_id: None,
            teaching_as: Some(None),
        };
        let cleared = storage
            .update_detail_impl(&course.id, &detail_id, clear)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.teacher_id.as_deref(), Some("t1"));
        assert!(cleared.teaching_as.is_none());
    }
}
