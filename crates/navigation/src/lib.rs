pub mod capture;
pub mod config;
pub mod input;
pub mod navigator;

pub use capture::*;
pub use config::*;
pub use input::*;
pub use navigator::*;
