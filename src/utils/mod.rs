pub mod file_magic;
pub mod jwt;
pub mod multipart;
pub mod parameter_error_handler;
pub mod validate;

pub use file_magic::sniff_media_mime;
pub use multipart::{MultipartForm, UploadedFile, read_multipart, read_multipart_limited};
pub use parameter_error_handler::{json_error_handler, query_error_handler};
pub use validate::{is_valid_object_id, normalize_code};
