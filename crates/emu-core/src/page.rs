//! Page-granular address decoding.
//!
//! The address space is 8 KiB, split into 128 pages of 64 bytes. Every
//! page carries one binding for reads and one for writes. A binding either
//! points straight into shared memory, which needs no device call, or
//! names the device that must handle the access.

use crate::{DeviceId, SharedMemory};

/// Address lines decoded by the bus (13 bits).
pub const ADDRESS_MASK: u16 = 0x1FFF;

/// log2 of the page size.
pub const PAGE_SHIFT: u16 = 6;

/// Bytes per page.
pub const PAGE_SIZE: u16 = 1 << PAGE_SHIFT;

/// Offset-within-page mask.
pub const PAGE_MASK: u16 = PAGE_SIZE - 1;

/// Pages in the decoded address space.
pub const PAGE_COUNT: usize = ((ADDRESS_MASK as usize) + 1) >> PAGE_SHIFT;

/// How one direction (read or write) of a page is serviced.
#[derive(Debug, Clone, Default)]
pub enum Access {
    /// Nothing answers: reads see 0, writes vanish.
    #[default]
    Unmapped,
    /// Index `memory[base + (address & PAGE_MASK)]` without involving a device.
    Direct { memory: SharedMemory, base: usize },
    /// Forward to the device's own read/write handler.
    Device(DeviceId),
}

/// The complete mapping of one page.
#[derive(Debug, Clone, Default)]
pub struct PageBinding {
    /// Device that installed this binding; `unbind` matches on it.
    pub owner: Option<DeviceId>,
    pub read: Access,
    pub write: Access,
}

impl PageBinding {
    /// Both directions handled by the device.
    #[must_use]
    pub fn device(owner: DeviceId) -> Self {
        Self {
            owner: Some(owner),
            read: Access::Device(owner),
            write: Access::Device(owner),
        }
    }

    /// Both directions go straight to memory (RAM).
    #[must_use]
    pub fn direct(owner: DeviceId, memory: &SharedMemory, base: usize) -> Self {
        Self {
            owner: Some(owner),
            read: Access::Direct {
                memory: memory.clone(),
                base,
            },
            write: Access::Direct {
                memory: memory.clone(),
                base,
            },
        }
    }

    /// Reads go straight to memory, writes reach the device (ROM).
    #[must_use]
    pub fn direct_read(owner: DeviceId, memory: &SharedMemory, base: usize) -> Self {
        Self {
            owner: Some(owner),
            read: Access::Direct {
                memory: memory.clone(),
                base,
            },
            write: Access::Device(owner),
        }
    }
}

/// Result of decoding a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// The value was produced without a device call.
    Data(u8),
    /// The access must be forwarded to this device.
    Device(DeviceId),
}

/// The page table.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    pages: Vec<PageBinding>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    /// Every page unmapped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: vec![PageBinding::default(); PAGE_COUNT],
        }
    }

    /// Page index for an address (upper address lines are ignored).
    #[must_use]
    pub const fn page_of(address: u16) -> usize {
        ((address & ADDRESS_MASK) >> PAGE_SHIFT) as usize
    }

    /// Replace the binding of `page` wholesale.
    pub fn bind(&mut self, page: usize, binding: PageBinding) {
        debug_assert!(page < PAGE_COUNT, "page {page} out of range");
        self.pages[page] = binding;
    }

    /// Return every page owned by `owner` to the unmapped state.
    pub fn unbind(&mut self, owner: DeviceId) {
        for page in &mut self.pages {
            if page.owner == Some(owner) {
                *page = PageBinding::default();
            }
        }
    }

    /// Current binding of a page.
    #[must_use]
    pub fn binding(&self, page: usize) -> &PageBinding {
        &self.pages[page]
    }

    /// Decode a read.
    #[must_use]
    pub fn route_read(&self, address: u16) -> Routed {
        match &self.pages[Self::page_of(address)].read {
            Access::Unmapped => Routed::Data(0),
            Access::Direct { memory, base } => {
                Routed::Data(memory.get(base + usize::from(address & PAGE_MASK)))
            }
            Access::Device(id) => Routed::Device(*id),
        }
    }

    /// Decode a write, performing it if the page is direct.
    ///
    /// Returns the device that still has to handle it, if any.
    pub fn route_write(&self, address: u16, value: u8) -> Option<DeviceId> {
        match &self.pages[Self::page_of(address)].write {
            Access::Unmapped => None,
            Access::Direct { memory, base } => {
                memory.set(base + usize::from(address & PAGE_MASK), value);
                None
            }
            Access::Device(id) => Some(*id),
        }
    }
}
