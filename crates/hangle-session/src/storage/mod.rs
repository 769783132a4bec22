//! History storage implementations.

#[cfg(feature = "file")]
pub mod file;
pub mod memory;

#[cfg(feature = "file")]
pub use file::FileHistory;
pub use memory::MemoryHistory;
