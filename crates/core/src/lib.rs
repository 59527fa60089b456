#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod model;
pub mod time;

pub use config::SessionConfig;
pub use error::Error;
pub use time::Clock;
