pub mod pagination;
pub mod response;
pub mod serde_ext;

pub use pagination::{PaginationInfo, PaginationQuery};
pub use response::ApiResponse;
