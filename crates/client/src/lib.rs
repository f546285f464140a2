// crates/client/src/lib.rs
pub mod api;
pub mod error;
pub mod message;
pub mod run;
pub mod stream;

pub use api::*;
pub use error::*;
pub use message::*;
pub use run::*;
pub use stream::*;
