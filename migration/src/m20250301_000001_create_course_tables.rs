use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 教材（课程大纲）表，主键为大写后的教材编号
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Books::Name).string().not_null())
                    .col(ColumnDef::new(Books::BookType).string().not_null())
                    .col(ColumnDef::new(Books::Price).double().not_null().default(0.0))
                    .col(ColumnDef::new(Books::Describe).text().null())
                    .col(ColumnDef::new(Books::Image).string().null())
                    .col(ColumnDef::new(Books::Badge).string().null())
                    .col(ColumnDef::new(Books::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Books::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 教材主题表
        manager
            .create_table(
                Table::create()
                    .table(BookTopics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookTopics::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookTopics::BookId).string().not_null())
                    .col(ColumnDef::new(BookTopics::Name).string().not_null())
                    .col(ColumnDef::new(BookTopics::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(BookTopics::Table, BookTopics::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 校区表
        manager
            .create_table(
                Table::create()
                    .table(Areas::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Areas::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Areas::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Areas::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 教室表，名称全局唯一以便按名称解析
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rooms::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Rooms::AreaId).string().not_null())
                    .col(ColumnDef::new(Rooms::Name).string().not_null().unique_key())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Rooms::Table, Rooms::AreaId)
                            .to(Areas::Table, Areas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 课程表
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Courses::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Courses::BookId).string().null())
                    .col(ColumnDef::new(Courses::AreaId).string().null())
                    .col(ColumnDef::new(Courses::TeacherHr).string().null())
                    .col(ColumnDef::new(Courses::CourseType).string().not_null())
                    .col(
                        ColumnDef::new(Courses::Status)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Courses::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Courses::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Courses::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 课程编号计数器（按 年份+代码 前缀）
        manager
            .create_table(
                Table::create()
                    .table(CourseSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseSequences::Prefix)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CourseSequences::LastSeq)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 课时表
        manager
            .create_table(
                Table::create()
                    .table(CourseDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseDetails::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseDetails::CourseId).string().not_null())
                    .col(ColumnDef::new(CourseDetails::Position).integer().not_null())
                    .col(ColumnDef::new(CourseDetails::TopicId).string().not_null())
                    .col(ColumnDef::new(CourseDetails::Day).big_integer().not_null())
                    .col(ColumnDef::new(CourseDetails::RoomId).string().null())
                    .col(ColumnDef::new(CourseDetails::Time).string().not_null())
                    .col(ColumnDef::new(CourseDetails::TeacherId).string().null())
                    .col(ColumnDef::new(CourseDetails::TeachingAs).string().null())
                    .col(ColumnDef::new(CourseDetails::Image).string().not_null())
                    .col(ColumnDef::new(CourseDetails::DetailType).string().null())
                    .col(ColumnDef::new(CourseDetails::Note).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(CourseDetails::Table, CourseDetails::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 课时媒体表（主键为 Drive 文件 ID）
        manager
            .create_table(
                Table::create()
                    .table(DetailMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DetailMedia::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DetailMedia::DetailId).string().not_null())
                    .col(ColumnDef::new(DetailMedia::MediaType).string().not_null())
                    .col(ColumnDef::new(DetailMedia::FileName).string().not_null())
                    .col(
                        ColumnDef::new(DetailMedia::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(DetailMedia::Table, DetailMedia::DetailId)
                            .to(CourseDetails::Table, CourseDetails::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 课程学生名单
        manager
            .create_table(
                Table::create()
                    .table(CourseStudents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseStudents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseStudents::CourseId).string().not_null())
                    .col(ColumnDef::new(CourseStudents::StudentId).string().not_null())
                    .col(ColumnDef::new(CourseStudents::Name).string().null())
                    .col(
                        ColumnDef::new(CourseStudents::JoinedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CourseStudents::Table, CourseStudents::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 学生上课记录（Learn 列表）
        manager
            .create_table(
                Table::create()
                    .table(StudentLessons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentLessons::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StudentLessons::CourseId).string().not_null())
                    .col(ColumnDef::new(StudentLessons::StudentId).string().not_null())
                    .col(ColumnDef::new(StudentLessons::LessonId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentLessons::Table, StudentLessons::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentLessons::Table, StudentLessons::LessonId)
                            .to(CourseDetails::Table, CourseDetails::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_book_topics_book_id")
                    .table(BookTopics::Table)
                    .col(BookTopics::BookId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_course_details_course_id")
                    .table(CourseDetails::Table)
                    .col(CourseDetails::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_detail_media_detail_id")
                    .table(DetailMedia::Table)
                    .col(DetailMedia::DetailId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_course_students_course_student")
                    .table(CourseStudents::Table)
                    .col(CourseStudents::CourseId)
                    .col(CourseStudents::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_student_lessons_unique")
                    .table(StudentLessons::Table)
                    .col(StudentLessons::CourseId)
                    .col(StudentLessons::StudentId)
                    .col(StudentLessons::LessonId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(StudentLessons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseStudents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DetailMedia::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseSequences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Areas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BookTopics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Books {
    #[sea_orm(iden = "books")]
    Table,
    Id,
    Name,
    BookType,
    Price,
    Describe,
    Image,
    Badge,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BookTopics {
    #[sea_orm(iden = "book_topics")]
    Table,
    Id,
    BookId,
    Name,
    Position,
}

#[derive(DeriveIden)]
enum Areas {
    #[sea_orm(iden = "areas")]
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Rooms {
    #[sea_orm(iden = "rooms")]
    Table,
    Id,
    AreaId,
    Name,
}

#[derive(DeriveIden)]
enum Courses {
    #[sea_orm(iden = "courses")]
    Table,
    Id,
    Code,
    BookId,
    AreaId,
    TeacherHr,
    CourseType,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CourseSequences {
    #[sea_orm(iden = "course_sequences")]
    Table,
    Prefix,
    LastSeq,
}

#[derive(DeriveIden)]
enum CourseDetails {
    #[sea_orm(iden = "course_details")]
    Table,
    Id,
    CourseId,
    Position,
    TopicId,
    Day,
    RoomId,
    Time,
    TeacherId,
    TeachingAs,
    Image,
    DetailType,
    Note,
}

#[derive(DeriveIden)]
enum DetailMedia {
    #[sea_orm(iden = "detail_media")]
    Table,
    Id,
    DetailId,
    MediaType,
    FileName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CourseStudents {
    #[sea_orm(iden = "course_students")]
    Table,
    Id,
    CourseId,
    StudentId,
    Name,
    JoinedAt,
}

#[derive(DeriveIden)]
enum StudentLessons {
    #[sea_orm(iden = "student_lessons")]
    Table,
    Id,
    CourseId,
    StudentId,
    LessonId,
}
