//! Indexing pipeline
//!
//! Tree scanning, ignore rules, chunking and change detection.

mod cancel;
mod change;
mod chunker;
pub mod hash;
mod ignore;
mod pipeline;
mod scanner;
mod types;

pub use cancel::*;
pub use change::*;
pub use chunker::*;
pub use hash::{compute_chunk_hash, hash_content, hash_file};
pub use ignore::*;
pub use pipeline::*;
pub use scanner::*;
pub use types::*;
