pub mod cancel;
pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use cancel::CancelToken;
pub use error::{FoundryError, Result};
pub use models::Manager;
