pub mod error;
pub mod normalize;
pub mod spec;
pub mod types;

pub use error::*;
pub use normalize::*;
pub use spec::*;
pub use types::*;
