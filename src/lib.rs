pub mod algo;
pub mod document;
pub mod error;
pub mod ops;

#[cfg(feature = "cli")]
pub mod logging;

pub use error::{Error, Result};
