//! Data model: entries, delta batches and the directory lookup seam

pub mod batch;
pub mod directory;
pub mod entry;

pub use batch::{base_name, AttrValue, DeltaBatch, KeyForm, MutationKey};
pub use directory::{Directory, MemDirectory, UnreachableDirectory};
pub use entry::{Entry, EntryKind, MemEntry};
