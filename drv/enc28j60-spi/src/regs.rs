// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ENC28J60 control register map.
//!
//! A [`Register`] packs everything the transport needs to know about an
//! address into one byte:
//!
//! ```text
//!   7      6..5    4..0
//! [MAC/MII][bank][offset]
//! ```
//!
//! Offsets 0x1B..=0x1F (EIE, EIR, ESTAT, ECON2, ECON1) are mirrored into every
//! bank and never need a bank switch. MAC and MII registers shift out one
//! dummy byte before their contents on a read (datasheet section 4.2.1).

use bitflags::bitflags;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bank {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
}

impl Bank {
    /// Decodes ECON1's BSEL1:BSEL0; other bits are ignored.
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Bank::Zero,
            1 => Bank::One,
            2 => Bank::Two,
            _ => Bank::Three,
        }
    }

    /// The BSEL1:BSEL0 pattern in ECON1 that selects this bank.
    pub(crate) fn econ1_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    const OFFSET_MASK: u8 = 0x1f;
    const BANK_MASK: u8 = 0x60;
    const BANK_SHIFT: u8 = 5;
    const DUMMY_READ: u8 = 0x80;
    const FIRST_COMMON: u8 = 0x1b;

    const fn eth(bank: u8, offset: u8) -> Self {
        Self((bank << Self::BANK_SHIFT) | offset)
    }

    const fn mac(bank: u8, offset: u8) -> Self {
        Self(Self::DUMMY_READ | (bank << Self::BANK_SHIFT) | offset)
    }

    const fn common(offset: u8) -> Self {
        Self(offset)
    }

    /// The 5-bit argument carried in the command byte.
    pub fn offset(self) -> u8 {
        self.0 & Self::OFFSET_MASK
    }

    /// Home bank, or `None` for the registers present in all banks.
    pub fn bank(self) -> Option<Bank> {
        if self.offset() >= Self::FIRST_COMMON {
            None
        } else {
            Some(Bank::from_bits((self.0 & Self::BANK_MASK) >> Self::BANK_SHIFT))
        }
    }

    pub fn needs_dummy_read(self) -> bool {
        self.0 & Self::DUMMY_READ != 0
    }

    /// The register one address up, i.e. the high half of a 16-bit pair.
    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

// Common to every bank
pub const EIE: Register = Register::common(0x1b);
pub const EIR: Register = Register::common(0x1c);
pub const ESTAT: Register = Register::common(0x1d);
pub const ECON2: Register = Register::common(0x1e);
pub const ECON1: Register = Register::common(0x1f);

// Bank 0
pub const ERDPTL: Register = Register::eth(0, 0x00);
pub const ERDPTH: Register = Register::eth(0, 0x01);
pub const EWRPTL: Register = Register::eth(0, 0x02);
pub const EWRPTH: Register = Register::eth(0, 0x03);
pub const ETXSTL: Register = Register::eth(0, 0x04);
pub const ETXSTH: Register = Register::eth(0, 0x05);
pub const ETXNDL: Register = Register::eth(0, 0x06);
pub const ETXNDH: Register = Register::eth(0, 0x07);
pub const ERXSTL: Register = Register::eth(0, 0x08);
pub const ERXSTH: Register = Register::eth(0, 0x09);
pub const ERXNDL: Register = Register::eth(0, 0x0a);
pub const ERXNDH: Register = Register::eth(0, 0x0b);
pub const ERXRDPTL: Register = Register::eth(0, 0x0c);
pub const ERXRDPTH: Register = Register::eth(0, 0x0d);
pub const ERXWRPTL: Register = Register::eth(0, 0x0e);
pub const ERXWRPTH: Register = Register::eth(0, 0x0f);
pub const EDMASTL: Register = Register::eth(0, 0x10);
pub const EDMASTH: Register = Register::eth(0, 0x11);
pub const EDMANDL: Register = Register::eth(0, 0x12);
pub const EDMANDH: Register = Register::eth(0, 0x13);
pub const EDMADSTL: Register = Register::eth(0, 0x14);
pub const EDMADSTH: Register = Register::eth(0, 0x15);
pub const EDMACSL: Register = Register::eth(0, 0x16);
pub const EDMACSH: Register = Register::eth(0, 0x17);

// Bank 1
pub const EHT0: Register = Register::eth(1, 0x00);
pub const EHT1: Register = Register::eth(1, 0x01);
pub const EHT2: Register = Register::eth(1, 0x02);
pub const EHT3: Register = Register::eth(1, 0x03);
pub const EHT4: Register = Register::eth(1, 0x04);
pub const EHT5: Register = Register::eth(1, 0x05);
pub const EHT6: Register = Register::eth(1, 0x06);
pub const EHT7: Register = Register::eth(1, 0x07);
pub const EPMM0: Register = Register::eth(1, 0x08);
pub const EPMM1: Register = Register::eth(1, 0x09);
pub const EPMM2: Register = Register::eth(1, 0x0a);
pub const EPMM3: Register = Register::eth(1, 0x0b);
pub const EPMM4: Register = Register::eth(1, 0x0c);
pub const EPMM5: Register = Register::eth(1, 0x0d);
pub const EPMM6: Register = Register::eth(1, 0x0e);
pub const EPMM7: Register = Register::eth(1, 0x0f);
pub const EPMCSL: Register = Register::eth(1, 0x10);
pub const EPMCSH: Register = Register::eth(1, 0x11);
pub const EPMOL: Register = Register::eth(1, 0x14);
pub const EPMOH: Register = Register::eth(1, 0x15);
pub const ERXFCON: Register = Register::eth(1, 0x18);
pub const EPKTCNT: Register = Register::eth(1, 0x19);

// Bank 2
pub const MACON1: Register = Register::mac(2, 0x00);
pub const MACON3: Register = Register::mac(2, 0x02);
pub const MACON4: Register = Register::mac(2, 0x03);
pub const MABBIPG: Register = Register::mac(2, 0x04);
pub const MAIPGL: Register = Register::mac(2, 0x06);
pub const MAIPGH: Register = Register::mac(2, 0x07);
pub const MACLCON1: Register = Register::mac(2, 0x08);
pub const MACLCON2: Register = Register::mac(2, 0x09);
pub const MAMXFLL: Register = Register::mac(2, 0x0a);
pub const MAMXFLH: Register = Register::mac(2, 0x0b);
pub const MICMD: Register = Register::mac(2, 0x12);
pub const MIREGADR: Register = Register::mac(2, 0x14);
pub const MIWRL: Register = Register::mac(2, 0x16);
pub const MIWRH: Register = Register::mac(2, 0x17);
pub const MIRDL: Register = Register::mac(2, 0x18);
pub const MIRDH: Register = Register::mac(2, 0x19);

// Bank 3
pub const MAADR5: Register = Register::mac(3, 0x00);
pub const MAADR6: Register = Register::mac(3, 0x01);
pub const MAADR3: Register = Register::mac(3, 0x02);
pub const MAADR4: Register = Register::mac(3, 0x03);
pub const MAADR1: Register = Register::mac(3, 0x04);
pub const MAADR2: Register = Register::mac(3, 0x05);
pub const EBSTSD: Register = Register::eth(3, 0x06);
pub const EBSTCON: Register = Register::eth(3, 0x07);
pub const EBSTCSL: Register = Register::eth(3, 0x08);
pub const EBSTCSH: Register = Register::eth(3, 0x09);
pub const MISTAT: Register = Register::mac(3, 0x0a);
pub const EREVID: Register = Register::eth(3, 0x12);
pub const ECOCON: Register = Register::eth(3, 0x15);
pub const EFLOCON: Register = Register::eth(3, 0x17);
pub const EPAUSL: Register = Register::eth(3, 0x18);
pub const EPAUSH: Register = Register::eth(3, 0x19);

/// MAADR registers in MAC byte order (first octet first).
pub const MAADR: [Register; 6] = [MAADR1, MAADR2, MAADR3, MAADR4, MAADR5, MAADR6];

bitflags! {
    pub struct Econ1: u8 {
        const TXRST = 0x80;
        const RXRST = 0x40;
        const DMAST = 0x20;
        const CSUMEN = 0x10;
        const TXRTS = 0x08;
        const RXEN = 0x04;
        const BSEL1 = 0x02;
        const BSEL0 = 0x01;
    }
}

bitflags! {
    pub struct Econ2: u8 {
        const AUTOINC = 0x80;
        const PKTDEC = 0x40;
        const PWRSV = 0x20;
        const VRPS = 0x08;
    }
}

bitflags! {
    pub struct Estat: u8 {
        const INT = 0x80;
        const BUFER = 0x40;
        const LATECOL = 0x10;
        const RXBUSY = 0x04;
        const TXABRT = 0x02;
        const CLKRDY = 0x01;
    }
}

bitflags! {
    pub struct Micmd: u8 {
        const MIISCAN = 0x02;
        const MIIRD = 0x01;
    }
}

bitflags! {
    pub struct Mistat: u8 {
        const NVALID = 0x04;
        const SCAN = 0x02;
        const BUSY = 0x01;
    }
}

bitflags! {
    pub struct Phstat2: u16 {
        const TXSTAT = 0x2000;
        const RXSTAT = 0x1000;
        const COLSTAT = 0x0800;
        const LSTAT = 0x0400;
        const DPXSTAT = 0x0200;
        const PLRITY = 0x0010;
    }
}

/// Packet buffer RAM is 8KiB; ERDPT/EWRPT only hold 13 bits.
pub const BUFFER_ADDR_MASK: u16 = 0x1fff;
