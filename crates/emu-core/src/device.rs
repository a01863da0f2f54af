//! Page-mapped device contract.

use crate::AddressSpace;

/// Identifies a device in the page table.
///
/// The owning bus assigns ids and dispatches indirect accesses on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u8);

/// A peripheral reachable through the page table.
///
/// `C` is whatever context the owning bus hands the device on each access:
/// the cycle counter, the data bus latch, input sources, or the page table
/// itself for devices that bank-switch.
pub trait Device<C: ?Sized> {
    /// Claim pages by binding them in `pages`.
    fn install(&mut self, pages: &mut AddressSpace, id: DeviceId);

    /// Return to power-on state.
    fn reset(&mut self, ctx: &mut C);

    /// Handle a read from an indirect page.
    fn read(&mut self, address: u16, ctx: &mut C) -> u8;

    /// Handle a write to an indirect page.
    fn write(&mut self, address: u16, value: u8, ctx: &mut C);

    /// The system cycle counter is about to drop by `cycles`; rebase any
    /// stored cycle stamps so that elapsed-time arithmetic still holds.
    fn cycles_reset(&mut self, cycles: u32) {
        let _ = cycles;
    }
}
