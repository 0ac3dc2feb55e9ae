//! In-memory indices: the global candidate trie and the per-parent
//! partitions used for leaf levels.

mod cache;
mod partition;
mod trie;

pub use cache::PartitionCache;
pub use partition::PartitionTree;
pub use trie::{CandidateIndex, IndexStub};
