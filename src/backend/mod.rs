pub mod http;
pub mod traits;

#[cfg(test)]
pub(crate) mod scripted;

pub use http::HttpBackend;
pub use traits::{ChunkStream, ThoughtBackend};
