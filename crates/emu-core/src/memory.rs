//! Aliasable backing storage for direct page bindings.

use std::cell::Cell;
use std::rc::Rc;

/// A RAM or ROM chip that may be visible through many pages at once.
///
/// Cloning produces another handle onto the same bytes, not a copy, so a
/// write through one page binding is seen through every mirror.
#[derive(Debug, Clone)]
pub struct SharedMemory(Rc<[Cell<u8>]>);

impl SharedMemory {
    /// Zero-filled memory of `len` bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self((0..len).map(|_| Cell::new(0)).collect())
    }

    /// Memory initialised from `bytes`.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.iter().copied().map(Cell::new).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read the byte at `offset`.
    #[must_use]
    pub fn get(&self, offset: usize) -> u8 {
        self.0[offset].get()
    }

    /// Store `value` at `offset`.
    pub fn set(&self, offset: usize, value: u8) {
        self.0[offset].set(value);
    }

    /// Overwrite every byte with values drawn from `source`.
    pub fn fill_with(&self, mut source: impl FnMut() -> u8) {
        for cell in self.0.iter() {
            cell.set(source());
        }
    }

    /// Copy the contents out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.iter().map(Cell::get).collect()
    }

    /// True when both handles refer to the same storage.
    #[must_use]
    pub fn same_storage(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
