//! # Thread Management
//!
//! Thread control blocks, their lifecycle, and the fixed pool that owns them.

pub mod pool;
pub mod states;
pub mod thread;

pub use pool::*;
pub use states::*;
pub use thread::*;
