pub mod frame;
pub mod quat;
pub mod vec;

pub use frame::*;
pub use quat::*;
pub use vec::*;
