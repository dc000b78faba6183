//! # Yatube Shared
//!
//! The documents Yatube renders: feed pages, forms and error bodies.
//! Kept free of server types so a client can deserialize them as-is.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
