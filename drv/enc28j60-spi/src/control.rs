// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::regs::{self, Bank, Register};
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
    pub fn read_reg(&mut self, reg: Register) -> Result<u8, Enc28j60Error> {
        self.select_bank(reg)?;
        let mut frame = SpiFrame::read(reg);
        self.exchange(&mut frame)?;
        Ok(frame.data())
    }

    pub fn write_reg(
        &mut self,
        reg: Register,
        value: u8,
    ) -> Result<(), Enc28j60Error> {
        self.select_bank(reg)?;
        let mut frame = SpiFrame::write(reg, value);
        if reg == regs::ECON1 {
            // BSEL1:0 are rewritten along with everything else
            return self.exchange_econ1(&mut frame, Some(Bank::from_bits(value)));
        }
        self.exchange(&mut frame)
    }

    /// Reads a register pair, low byte at `low`, high byte at the next
    /// address.
    pub fn read_reg16(&mut self, low: Register) -> Result<u16, Enc28j60Error> {
        let lo = self.read_reg(low)?;
        let hi = self.read_reg(low.next())?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Writes a register pair, low byte first.
    pub fn write_reg16(
        &mut self,
        low: Register,
        value: u16,
    ) -> Result<(), Enc28j60Error> {
        let [lo, hi] = value.to_le_bytes();
        self.write_reg(low, lo)?;
        self.write_reg(low.next(), hi)
    }

    /// Sets the bits in `mask` with a single read-modify-write done by the
    /// chip itself.
    pub fn bit_field_set(
        &mut self,
        reg: Register,
        mask: u8,
    ) -> Result<(), Enc28j60Error> {
        self.select_bank(reg)?;
        let mut frame = SpiFrame::bit_field_set(reg, mask);
        if reg == regs::ECON1 {
            let next = self.bank.map(|b| Bank::from_bits(b.econ1_bits() | mask));
            return self.exchange_econ1(&mut frame, next);
        }
        self.exchange(&mut frame)
    }

    pub fn bit_field_clear(
        &mut self,
        reg: Register,
        mask: u8,
    ) -> Result<(), Enc28j60Error> {
        self.select_bank(reg)?;
        let mut frame = SpiFrame::bit_field_clear(reg, mask);
        if reg == regs::ECON1 {
            let next =
                self.bank.map(|b| Bank::from_bits(b.econ1_bits() & !mask));
            return self.exchange_econ1(&mut frame, next);
        }
        self.exchange(&mut frame)
    }

    /// Sends one frame in its own transaction; no bank handling.
    pub(crate) fn exchange(
        &mut self,
        frame: &mut SpiFrame,
    ) -> Result<(), Enc28j60Error> {
        self.bus
            .with_chip_select(|txn| txn.transfer_in_place(frame.as_mut_bytes()))
    }
}
