// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::regs::{self, BUFFER_ADDR_MASK};
use crate::spi_frame::SpiFrame;
use crate::{Enc28j60, Enc28j60Error, InterruptMask};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

impl<SPI, CS, IRQ, D> Enc28j60<SPI, CS, IRQ, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
    D: DelayNs,
{
    /// Fills `dst` from packet memory starting at ERDPT.
    ///
    /// The whole slice goes in one transaction after a single command byte;
    /// the chip advances ERDPT itself (ECON2.AUTOINC, set at reset). Buffer
    /// memory is not banked, so the selected bank is left alone.
    pub fn read_buffer(&mut self, dst: &mut [u8]) -> Result<(), Enc28j60Error> {
        if dst.is_empty() {
            return Ok(());
        }
        let frame = SpiFrame::read_buffer();
        self.bus.with_chip_select(|txn| {
            txn.write(frame.as_bytes())?;
            txn.read(dst)
        })
    }

    /// Streams `src` into packet memory starting at EWRPT.
    pub fn write_buffer(&mut self, src: &[u8]) -> Result<(), Enc28j60Error> {
        if src.is_empty() {
            return Ok(());
        }
        let frame = SpiFrame::write_buffer();
        self.bus.with_chip_select(|txn| {
            txn.write(frame.as_bytes())?;
            txn.write(src)
        })
    }

    /// Moves the read pointer; only the low 13 bits are meaningful.
    pub fn set_read_pointer(&mut self, addr: u16) -> Result<(), Enc28j60Error> {
        self.write_reg16(regs::ERDPTL, addr & BUFFER_ADDR_MASK)
    }

    pub fn set_write_pointer(&mut self, addr: u16) -> Result<(), Enc28j60Error> {
        self.write_reg16(regs::EWRPTL, addr & BUFFER_ADDR_MASK)
    }
}
