//! 课程编号序列

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "course_sequences")]
pub struct Model {
    // 年份 + 教材编号，如 25ROBOT
    #[sea_orm(primary_key, auto_increment = false)]
    pub prefix: String,
    pub last_seq: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
