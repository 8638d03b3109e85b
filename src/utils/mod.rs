pub mod error;
pub mod string_ext;

pub use error::{AnalysisError, ApiError, ApiResult, DatabaseError};
pub use string_ext::StringExt;
