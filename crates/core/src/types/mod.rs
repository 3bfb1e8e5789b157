pub mod object_id;
pub mod pagination;

pub use object_id::ObjectId;
pub use pagination::Pagination;
