//! Wire types shared between the satvis backend and its clients.

pub mod types;

pub use types::*;
