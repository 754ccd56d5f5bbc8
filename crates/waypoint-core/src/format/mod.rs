//! Component E: the binary grammar format (spec §4.E) — a single
//! contiguous, little-endian byte buffer addressable by a fixed header and
//! table directory, loadable without a parse pass.

pub mod codec;
pub mod header;
pub mod legacy;
pub mod read;
pub mod write;

pub use header::SourceTag;
pub use read::load_from_bytes;
