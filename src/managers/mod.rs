pub mod timer;
pub mod queue;
pub mod replay;
pub mod dispatch;

pub use timer::*;
pub use queue::*;
pub use replay::*;
pub use dispatch::*;
