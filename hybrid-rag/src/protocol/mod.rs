pub mod error;
pub mod request;
pub mod response;

pub use error::QueryError;
pub use request::QueryRequest;
pub use response::{HealthResponse, QueryResponse};
