pub mod traits;
pub mod rest;
pub mod connectivity;

pub use traits::*;
pub use rest::*;
pub use connectivity::*;
