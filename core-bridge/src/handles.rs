//! Handle virtualization.
//!
//! The isolated side never sees a host identifier. It gets a small integer
//! instead, resolved through an append-only arena: `handle - 1` indexes the
//! slot, deleted slots become tombstones, and nothing is ever compacted. `0`
//! is reserved for "no stream".

use tracing::trace;

use crate::error::HandleError;

/// Handle value meaning "no stream was created".
pub const NO_HANDLE: u64 = 0;

/// Append-only table mapping handles to host identifiers.
#[derive(Debug)]
pub struct HandleTable<T> {
    /// Handles issued before the last `destroy_all`.
    base: u64,
    slots: Vec<Option<T>>,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            base: 0,
            slots: Vec::new(),
        }
    }
}

impl<T: Copy> HandleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` and return its handle. Never returns [`NO_HANDLE`].
    pub fn allocate(&mut self, id: T) -> u64 {
        self.slots.push(Some(id));
        let handle = self.issued();
        trace!(handle, "handle allocated");
        handle
    }

    pub fn resolve(&self, handle: u64) -> Result<T, HandleError> {
        self.index(handle)
            .and_then(|index| self.slots.get(index).copied().flatten())
            .ok_or(HandleError::InvalidHandle(handle))
    }

    /// Tombstone `handle`, returning the identifier it held.
    ///
    /// Freeing an invalid handle does nothing.
    pub fn free(&mut self, handle: u64) -> Option<T> {
        let index = self.index(handle)?;
        let id = self.slots.get_mut(index)?.take();
        if id.is_some() {
            trace!(handle, "handle freed");
        }
        id
    }

    /// Invalidate every handle and release the slot storage.
    ///
    /// Numbering continues from where it stopped. Returns how many handles
    /// were still live.
    pub fn destroy_all(&mut self) -> usize {
        let live = self.live();
        self.base = self.issued();
        self.slots = Vec::new();
        trace!(live, next = self.base + 1, "handle table released");
        live
    }

    /// Number of handles issued over the table's lifetime.
    pub fn issued(&self) -> u64 {
        self.base + self.slots.len() as u64
    }

    /// Number of handles that currently resolve.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn index(&self, handle: u64) -> Option<usize> {
        let offset = handle.checked_sub(self.base)?.checked_sub(1)?;
        usize::try_from(offset).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_at_one_and_grow() {
        let mut table = HandleTable::new();
        assert_eq!(table.allocate('a'), 1);
        assert_eq!(table.allocate('b'), 2);
        assert_eq!(table.allocate('c'), 3);
        assert_eq!(table.issued(), 3);
    }

    #[test]
    fn test_zero_never_resolves() {
        let mut table = HandleTable::new();
        table.allocate(7u32);
        assert_eq!(table.resolve(NO_HANDLE), Err(HandleError::InvalidHandle(0)));
        assert_eq!(table.free(NO_HANDLE), None);
    }

    #[test]
    fn test_out_of_range() {
        let mut table = HandleTable::new();
        table.allocate(7u32);
        assert_eq!(table.resolve(2), Err(HandleError::InvalidHandle(2)));
        assert_eq!(table.resolve(u64::MAX), Err(HandleError::InvalidHandle(u64::MAX)));
    }

    #[test]
    fn test_free_leaves_tombstone() {
        let mut table = HandleTable::new();
        let first = table.allocate(10u32);
        let second = table.allocate(20u32);

        assert_eq!(table.free(first), Some(10));
        assert_eq!(table.free(first), None);
        assert!(table.resolve(first).is_err());
        assert_eq!(table.resolve(second), Ok(20));

        // Freed numbers are not handed out again
        assert_eq!(table.allocate(30), 3);
        assert!(table.resolve(first).is_err());
        assert_eq!(table.live(), 2);
    }

    #[test]
    fn test_destroy_all_keeps_numbering() {
        let mut table = HandleTable::new();
        table.allocate(1u32);
        let second = table.allocate(2u32);
        table.free(second);

        assert_eq!(table.destroy_all(), 1);
        assert_eq!(table.live(), 0);
        assert!(table.resolve(1).is_err());

        let next = table.allocate(3u32);
        assert_eq!(next, 3);
        assert_eq!(table.resolve(next), Ok(3));
        assert!(table.resolve(1).is_err());
        assert!(table.resolve(2).is_err());
    }
}
