// crates/core/src/lib.rs
pub mod artifact;
pub mod board;
pub mod classify;
pub mod decoder;
pub mod event;
pub mod markdown;
pub mod report;
pub mod types;

pub use artifact::*;
pub use board::*;
pub use classify::*;
pub use decoder::*;
pub use event::*;
pub use report::*;
pub use types::*;
