pub mod axis;
pub mod config;

pub use axis::*;
pub use config::*;
