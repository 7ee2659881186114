pub mod areas;

pub mod books;

pub mod courses;

pub mod media;

pub mod system;

pub use areas::configure_area_routes;
pub use books::configure_book_routes;
pub use courses::configure_course_routes;
pub use media::configure_media_routes;
pub use system::configure_system_routes;
