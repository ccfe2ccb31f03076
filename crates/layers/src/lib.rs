pub mod layer;
pub mod overlay;
pub mod readiness;
pub mod symbology;

pub use layer::*;
pub use overlay::*;
pub use readiness::*;
pub use symbology::*;
