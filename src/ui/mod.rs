//! Output side of the key echo loop.
//!
//! - **echo**: formats each raw byte and recognises the quit byte

pub mod echo;

pub use echo::{Flow, KeyEcho};
