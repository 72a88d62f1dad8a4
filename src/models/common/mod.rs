pub mod pagination;
pub mod response;

pub use pagination::{Page, PageRequest, PageSize, paginate_after, paginate_offset};
pub use response::{ApiResponse, ErrorCode};
