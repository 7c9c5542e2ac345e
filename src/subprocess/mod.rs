//! Subprocess supervision: spawn a child, stream its output line by line,
//! enforce a timeout, allow external kill.

mod error;
mod handle;
mod outcome;
mod process;
mod scanner;
mod sink;

pub use error::*;
pub use handle::*;
pub use outcome::*;
pub use process::*;
pub use scanner::*;
pub use sink::*;
