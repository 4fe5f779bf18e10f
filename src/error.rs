use thiserror::Error;

/// Failure of the slot-index accessors (`bucket`, `bucket_mut`,
/// `bucket_cloned`).
///
/// The two variants are kept apart so callers can tell a bad index from a
/// slot that simply holds no entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BucketError {
    #[error("slot index {index} is out of range for capacity {capacity}")]
    OutOfRange { index: usize, capacity: usize },
    #[error("slot {index} is empty")]
    EmptySlot { index: usize },
}
