// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client-facing types for the ENC28J60 SPI driver.

#![no_std]

use core::convert::TryFrom;

pub use embedded_hal::spi::ErrorKind as SpiErrorKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Enc28j60Error {
    /// The oscillator never reported ready after a soft reset.
    ResetFailed,
    /// MISTAT read back as all ones; the chip is most likely not on the bus.
    BusFault,
    /// An MII operation was still busy when the caller's poll budget ran out.
    PhyTimeout,
    /// The chip-select line could not be driven.
    ChipSelect,
    BadPhyRegister(u8),
    BadConfig,
    SpiError(SpiErrorKind),
}

impl From<SpiErrorKind> for Enc28j60Error {
    fn from(kind: SpiErrorKind) -> Self {
        Self::SpiError(kind)
    }
}

/// Registers of the integrated 10BASE-T PHY, reached indirectly over MII.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PhyRegister {
    Phcon1 = 0x00,
    Phstat1 = 0x01,
    Phid1 = 0x02,
    Phid2 = 0x03,
    Phcon2 = 0x10,
    Phstat2 = 0x11,
    Phie = 0x12,
    Phir = 0x13,
    Phlcon = 0x14,
}

impl PhyRegister {
    pub fn addr(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PhyRegister {
    type Error = Enc28j60Error;

    fn try_from(addr: u8) -> Result<Self, Self::Error> {
        match addr {
            0x00 => Ok(Self::Phcon1),
            0x01 => Ok(Self::Phstat1),
            0x02 => Ok(Self::Phid1),
            0x03 => Ok(Self::Phid2),
            0x10 => Ok(Self::Phcon2),
            0x11 => Ok(Self::Phstat2),
            0x12 => Ok(Self::Phie),
            0x13 => Ok(Self::Phir),
            0x14 => Ok(Self::Phlcon),
            _ => Err(Enc28j60Error::BadPhyRegister(addr)),
        }
    }
}
