//! Sort-key allocation and lane sequencing

mod allocator;
mod sequence;

pub use allocator::{Allocation, SortKeyAllocator, DEFAULT_GAP};
pub use sequence::{compare_in_lane, sort_lane, BoardSnapshot};
