pub mod assignments;
pub mod auth;
pub mod error;
pub mod links;
pub mod middleware;
pub mod users;

pub use error::ApiError;
