//! 预导入模块，方便使用

pub use super::areas::{ActiveModel as AreaActiveModel, Entity as Areas, Model as AreaModel};
pub use super::book_topics::{
    ActiveModel as BookTopicActiveModel, Entity as BookTopics, Model as BookTopicModel,
};
pub use super::books::{ActiveModel as BookActiveModel, Entity as Books, Model as BookModel};
pub use super::course_details::{
    ActiveModel as CourseDetailActiveModel, Entity as CourseDetails, Model as CourseDetailModel,
};
pub use super::course_sequences::{
    ActiveModel as CourseSequenceActiveModel, Entity as CourseSequences,
    Model as CourseSequenceModel,
};
pub use super::course_students::{
    ActiveModel as CourseStudentActiveModel, Entity as CourseStudents,
    Model as CourseStudentModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::detail_media::{
    ActiveModel as DetailMediaActiveModel, Entity as DetailMedia, Model as DetailMediaModel,
};
pub use super::rooms::{ActiveModel as RoomActiveModel, Entity as Rooms, Model as RoomModel};
pub use super::student_lessons::{
    ActiveModel as StudentLessonActiveModel, Entity as StudentLessons,
    Model as StudentLessonModel,
};
