pub mod catalog;
pub mod key;
pub mod url;

pub use catalog::*;
pub use key::*;
pub use url::*;
