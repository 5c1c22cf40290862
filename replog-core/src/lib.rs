pub mod dashboard;
pub mod db;
pub mod error;
pub mod session;

pub use error::{Error, Result};
