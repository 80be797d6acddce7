// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::regs::{self, Bank, Econ1, Register};
use crate::spi_frame::SpiFrame;
use crate::{Enc28j60, Enc28j60Error, InterruptMask};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use ringbuf::*;

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    Switch(Bank),
    None,
}

ringbuf!(Trace, 16, Trace::None);

impl<SPI, CS, IRQ, D> Enc28j60<SPI, CS, IRQ, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
    D: DelayNs,
{
    /// Points ECON1.BSEL at `reg`'s bank, unless it already is.
    ///
    /// Registers present in every bank never cause a switch. A switch costs
    /// two commands: clear both BSEL bits, then set the new ones.
    pub fn select_bank(&mut self, reg: Register) -> Result<(), Enc28j60Error> {
        let bank = match reg.bank() {
            Some(bank) => bank,
            None => return Ok(()),
        };
        if self.bank == Some(bank) {
            return Ok(());
        }

        // If either command fails we no longer know what BSEL holds.
        self.bank = None;
        // ECON1 is common to all banks, so these go straight out.
        self.exchange(&mut SpiFrame::bit_field_clear(
            regs::ECON1,
            (Econ1::BSEL1 | Econ1::BSEL0).bits(),
        ))?;
        self.exchange(&mut SpiFrame::bit_field_set(
            regs::ECON1,
            bank.econ1_bits(),
        ))?;
        self.bank = Some(bank);

        ringbuf_entry!(Trace::Switch(bank));
        Ok(())
    }

    /// Sends a command that writes ECON1 directly, leaving the cache at
    /// `next` if it went out and unknown if it did not.
    pub(crate) fn exchange_econ1(
        &mut self,
        frame: &mut SpiFrame,
        next: Option<Bank>,
    ) -> Result<(), Enc28j60Error> {
        self.bank = None;
        self.exchange(frame)?;
        self.bank = next;
        if let Some(bank) = next {
            ringbuf_entry!(Trace::Switch(bank));
        }
        Ok(())
    }

    /// The bank the handle believes is selected.
    pub fn current_bank(&self) -> Option<Bank> {
        self.bank
    }
}
