//! Use-case services sitting between the HTTP adapters and the domain logic.

pub mod error;
pub mod ping;
pub mod posts;
pub mod upstream;
