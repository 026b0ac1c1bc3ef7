//! Core types for pairloop.

pub mod keyword;
pub mod message;

pub use keyword::*;
pub use message::*;
