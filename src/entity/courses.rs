//! 课程实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub code: String,
    pub book_id: Option<String>,
    pub area_id: Option<String>,
    pub teacher_hr: Option<String>,
    pub course_type: String,
    pub status: bool,
    pub version: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course_details::Entity")]
    Details,
    #[sea_orm(has_many = "super::course_students::Entity")]
    Students,
}

impl Related<super::course_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl Related<super::course_students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 组装完整课程（课时与名单由存储层查询后传入）
    pub fn into_course(
        self,
        details: Vec<crate::models::courses::entities::CourseDetail>,
        students: Vec<crate::models::courses::entities::CourseStudent>,
    ) -> crate::models::courses::entities::Course {
        use crate::models::courses::entities::Course;
        use chrono::{DateTime, Utc};

        Course {
            id: self.id,
            code: self.code,
            book_id: self.book_id,
            area_id: self.area_id,
            teacher_hr: self.teacher_hr,
            course_type: self.course_type,
            status: self.status,
            version: self.version,
            details,
            students,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
