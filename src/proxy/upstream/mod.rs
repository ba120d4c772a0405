pub mod blob;
pub mod client;

pub use blob::BlobStore;
pub use client::{UpstreamClient, UpstreamReply, UpstreamRequest};
