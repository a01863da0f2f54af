//! Cartridge ROM and bank switching.
//!
//! The cartridge owns the upper 4K of the address space (address line 12
//! high). Larger ROMs are split into 4K banks and switched by touching
//! hotspot addresses at the top of the window:
//!
//! | Scheme | Size | Banks | Hotspots       | Power-on bank |
//! |--------|------|-------|----------------|---------------|
//! | 2K     | 2K   | 1     | none (mirrored)| 0             |
//! | 4K     | 4K   | 1     | none           | 0             |
//! | F8     | 8K   | 2     | $1FF8-$1FF9    | 1             |
//! | F6     | 16K  | 4     | $1FF6-$1FF9    | 0             |
//! | F4     | 32K  | 8     | $1FF4-$1FFB    | 0             |
//! | 3F     | n*2K | n     | writes $00-$3F | 0             |
//!
//! Bank windows are direct read bindings, so ordinary instruction fetches
//! never reach this code. Only the page holding the hotspots is indirect.
//!
//! 3F cartridges split the window in two 2K halves. The upper half is fixed
//! to the last 2K of the image; the lower half shows the slice selected by
//! the value of any write to $00-$3F. That page belongs to the TIA as well,
//! so the bus hands those accesses to both.

use std::fmt;

use emu_core::{AddressSpace, Device, DeviceId, PAGE_SIZE, PageBinding, SharedMemory};
use thiserror::Error;

const BANK_SIZE: usize = 4096;

/// Bank size of 3F cartridges.
const SLICE_SIZE: usize = 2048;

/// 3F bank numbers are a full byte.
const MAX_SLICES: usize = 256;

/// First cartridge address.
const WINDOW_START: u16 = 0x1000;

/// The page containing every hotspot.
const HOTSPOT_PAGE: u16 = 0x1FC0;

/// A ROM image that cannot be mapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartridgeError {
    #[error("unsupported cartridge size: {0} bytes")]
    UnsupportedSize(usize),
    #[error("{scheme} cartridges need {expected} bytes, got {actual}")]
    SizeMismatch {
        scheme: BankScheme,
        expected: usize,
        actual: usize,
    },
}

/// How a cartridge maps its ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BankScheme {
    /// 2K, mirrored across the window.
    TwoK,
    /// 4K, no switching.
    FourK,
    /// 8K Atari standard. `swapped` images store the power-on bank first.
    F8 { swapped: bool },
    /// 16K Atari standard.
    F6,
    /// 32K Atari standard.
    F4,
    /// Tigervision: 2K slices selected by writes to $00-$3F.
    ThreeF { banks: u16 },
}

impl BankScheme {
    /// Guess the scheme from the image alone.
    pub fn detect(image: &[u8]) -> Result<Self, CartridgeError> {
        let halves_equal = |len: usize| image[..len / 2] == image[len / 2..len];
        let three_f = Self::three_f(image.len()).filter(|_| stores_to_3f(image));
        match (image.len(), three_f) {
            (2048, _) => Ok(Self::TwoK),
            (4096, _) if halves_equal(4096) => Ok(Self::TwoK),
            (4096, _) => Ok(Self::FourK),
            (8192, _) if halves_equal(8192) => Ok(Self::FourK),
            (_, Some(scheme)) => Ok(scheme),
            (8192, None) => Ok(Self::F8 { swapped: false }),
            (16384, None) => Ok(Self::F6),
            (32768, None) => Ok(Self::F4),
            (size, None) => Err(CartridgeError::UnsupportedSize(size)),
        }
    }

    /// The 3F layout for an image of `len` bytes, if one fits.
    fn three_f(len: usize) -> Option<Self> {
        let banks = len / SLICE_SIZE;
        (len > BANK_SIZE && len % SLICE_SIZE == 0 && banks <= MAX_SLICES)
            .then_some(Self::ThreeF { banks: banks as u16 })
    }

    /// Image size the scheme maps.
    #[must_use]
    pub const fn rom_size(self) -> usize {
        match self {
            Self::TwoK => 2048,
            Self::FourK => 4096,
            Self::F8 { .. } => 8192,
            Self::F6 => 16384,
            Self::F4 => 32768,
            Self::ThreeF { banks } => banks as usize * SLICE_SIZE,
        }
    }

    #[must_use]
    pub const fn bank_count(self) -> usize {
        match self {
            Self::TwoK | Self::FourK => 1,
            Self::F8 { .. } => 2,
            Self::F6 => 4,
            Self::F4 => 8,
            Self::ThreeF { banks } => banks as usize,
        }
    }

    /// Offset (`address & 0xFFF`) of the bank 0 hotspot, if the scheme switches.
    const fn first_hotspot(self) -> Option<u16> {
        match self {
            Self::TwoK | Self::FourK | Self::ThreeF { .. } => None,
            Self::F8 { .. } => Some(0xFF8),
            Self::F6 => Some(0xFF6),
            Self::F4 => Some(0xFF4),
        }
    }

    const fn reset_bank(self) -> usize {
        match self {
            Self::F8 { swapped: false } => 1,
            _ => 0,
        }
    }

    /// Bank selected by touching `offset`, if it is a hotspot.
    fn hotspot(self, offset: u16) -> Option<usize> {
        let first = self.first_hotspot()?;
        let bank = usize::from(offset.checked_sub(first)?);
        (bank < self.bank_count()).then_some(bank)
    }
}

/// `STA $3F` appears at least twice in 3F programs.
fn stores_to_3f(image: &[u8]) -> bool {
    image
        .windows(2)
        .filter(|pair| *pair == [0x85, 0x3F])
        .take(2)
        .count()
        == 2
}

impl fmt::Display for BankScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoK => "2K",
            Self::FourK => "4K",
            Self::F8 { swapped: false } => "F8",
            Self::F8 { swapped: true } => "F8 (swapped)",
            Self::F6 => "F6",
            Self::F4 => "F4",
            Self::ThreeF { .. } => "3F",
        })
    }
}

/// A cartridge plugged into the console.
pub struct Cartridge {
    rom: SharedMemory,
    scheme: BankScheme,
    bank: usize,
    /// Page table id, known once installed.
    id: Option<DeviceId>,
}

impl Cartridge {
    /// Detect the scheme and wrap the image.
    pub fn new(image: &[u8]) -> Result<Self, CartridgeError> {
        Self::with_scheme(image, BankScheme::detect(image)?)
    }

    /// Wrap an image with an explicit scheme.
    pub fn with_scheme(image: &[u8], scheme: BankScheme) -> Result<Self, CartridgeError> {
        // Single-bank images with identical halves are mapped from the first half.
        let needed = scheme.rom_size();
        let short = image.len() < needed || needed == 0;
        if short || (image.len() != needed && scheme.bank_count() > 1) {
            return Err(CartridgeError::SizeMismatch {
                scheme,
                expected: needed,
                actual: image.len(),
            });
        }
        Ok(Self {
            rom: SharedMemory::from_slice(&image[..needed]),
            scheme,
            bank: scheme.reset_bank(),
            id: None,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> BankScheme {
        self.scheme
    }

    /// Bank currently mapped into the window.
    #[must_use]
    pub fn bank(&self) -> usize {
        self.bank
    }

    /// ROM offset an address reads from in the current bank.
    fn rom_offset(&self, address: u16) -> usize {
        match self.scheme {
            BankScheme::TwoK => usize::from(address & 0x07FF),
            BankScheme::ThreeF { .. } if address & 0x0800 == 0 => {
                self.bank * SLICE_SIZE + usize::from(address & 0x07FF)
            }
            BankScheme::ThreeF { .. } => {
                self.rom.len() - SLICE_SIZE + usize::from(address & 0x07FF)
            }
            _ => self.bank * BANK_SIZE + usize::from(address & 0x0FFF),
        }
    }

    /// Map the current bank into every page of the window except the
    /// hotspot page, which stays indirect for hotspot schemes.
    fn map_bank(&self, pages: &mut AddressSpace, id: DeviceId) {
        let switching = self.scheme.first_hotspot().is_some();
        for address in (WINDOW_START..=HOTSPOT_PAGE).step_by(usize::from(PAGE_SIZE)) {
            let page = AddressSpace::page_of(address);
            let binding = if switching && address == HOTSPOT_PAGE {
                PageBinding::device(id)
            } else {
                PageBinding::direct_read(id, &self.rom, self.rom_offset(address))
            };
            pages.bind(page, binding);
        }
    }

    fn select_bank(&mut self, offset: u16, pages: &mut AddressSpace) {
        if let Some(bank) = self.scheme.hotspot(offset) {
            self.switch_to(bank, pages);
        }
    }

    fn switch_to(&mut self, bank: usize, pages: &mut AddressSpace) {
        if bank != self.bank {
            log::trace!("{} cartridge: bank {} -> {bank}", self.scheme, self.bank);
        }
        self.bank = bank;
        if let Some(id) = self.id {
            self.map_bank(pages, id);
        }
    }
}

/// Cartridges need nothing but the page table: switching a bank rebinds it.
impl Device<AddressSpace> for Cartridge {
    fn install(&mut self, pages: &mut AddressSpace, id: DeviceId) {
        self.id = Some(id);
        if let BankScheme::ThreeF { .. } = self.scheme {
            pages.bind(AddressSpace::page_of(0x0000), PageBinding::device(id));
        }
        self.map_bank(pages, id);
    }

    fn reset(&mut self, pages: &mut AddressSpace) {
        self.bank = self.scheme.reset_bank();
        if let Some(id) = self.id {
            self.map_bank(pages, id);
        }
    }

    fn read(&mut self, address: u16, pages: &mut AddressSpace) -> u8 {
        self.select_bank(address & 0x0FFF, pages);
        self.rom.get(self.rom_offset(address))
    }

    fn write(&mut self, address: u16, value: u8, pages: &mut AddressSpace) {
        match self.scheme {
            BankScheme::ThreeF { banks } => {
                if address & 0x1000 == 0 && address & 0x0FFF <= 0x003F {
                    self.switch_to(usize::from(value) % usize::from(banks), pages);
                }
            }
            _ => self.select_bank(address & 0x0FFF, pages),
        }
    }
}
