pub mod cli;
pub mod managers;
pub mod backends;
pub mod store;
pub mod config;
pub mod context;
pub mod clock;
pub mod display;
pub mod logging;
pub mod error;

pub use error::{Error, Result};
