// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register and PHY access for the Microchip ENC28J60 SPI Ethernet controller.
//!
//! This is the transport layer only: control registers (8 and 16 bit), the
//! four-bank register address space, indirect access to the integrated PHY
//! over MII, and raw streaming to and from the 8KiB packet buffer. Frame
//! handling lives above this.
//!
//! Every SPI command is sent inside its own transaction, which masks
//! interrupts and holds CS low for exactly one command. The handle remembers
//! which bank ECON1 currently selects and only switches when an access needs
//! a different one; nothing else may touch ECON1.BSEL behind its back.

#![cfg_attr(not(test), no_std)]

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use ringbuf::*;

mod bank;
mod buffer;
mod bus;
mod control;
mod phy;
pub mod regs;
mod spi_frame;

#[cfg(test)]
mod mock;

pub use self::bus::{CortexM, InterruptMask};
pub use drv_enc28j60_spi_api::{Enc28j60Error, PhyRegister};

use self::bus::ChipBus;
use self::regs::{Bank, Estat};
use self::spi_frame::SpiFrame;

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    Reset,
    ClockReady(u8),
    ResetTimeout,
    None,
}

ringbuf!(Trace, 16, Trace::None);

/// How long to keep polling MISTAT.BUSY before giving up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollBudget {
    /// Poll until the busy bit clears or the bus reads as all ones.
    Unbounded,
    /// Give up with `PhyTimeout` after this many polls that saw busy.
    Polls(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Sleep between MISTAT polls.
    pub mii_poll_interval_us: u32,
    /// Default bound for MII operations; see `read_phy_within` to override
    /// it per call.
    pub mii_poll_budget: PollBudget,
    /// ESTAT.CLKRDY polls, 1ms apart, after a soft reset.
    pub reset_attempts: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mii_poll_interval_us: 15,
            mii_poll_budget: PollBudget::Unbounded,
            reset_attempts: 20,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Enc28j60Error> {
        if self.reset_attempts == 0 {
            return Err(Enc28j60Error::BadConfig);
        }
        if self.mii_poll_budget == PollBudget::Polls(0) {
            return Err(Enc28j60Error::BadConfig);
        }
        Ok(())
    }
}

pub struct Enc28j60<SPI, CS, IRQ, D> {
    bus: ChipBus<SPI, CS, IRQ>,
    delay: D,
    config: Config,
    // `None` until we have selected a bank ourselves or reset the chip
    bank: Option<Bank>,
}

impl<SPI, CS, IRQ, D> Enc28j60<SPI, CS, IRQ, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
    D: DelayNs,
{
    /// Wraps an SPI bus (mode 0) and an active-low chip select.
    ///
    /// The configuration is checked before anything is driven. No commands
    /// are sent; call [`reset`](Self::reset) to put the chip in a known state.
    pub fn new(
        spi: SPI,
        cs: CS,
        irq: IRQ,
        delay: D,
        config: Config,
    ) -> Result<Self, Enc28j60Error> {
        config.validate()?;
        Ok(Self {
            bus: ChipBus::new(spi, cs, irq)?,
            delay,
            config,
            bank: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gives the bus, chip select, interrupt mask and delay back.
    pub fn release(self) -> (SPI, CS, IRQ, D) {
        let (spi, cs, irq) = self.bus.release();
        (spi, cs, irq, self.delay)
    }

    /// Issues the system reset command and waits for the oscillator.
    pub fn reset(&mut self) -> Result<(), Enc28j60Error> {
        ringbuf_entry!(Trace::Reset);
        // the command may have reached the chip even if the transfer failed
        self.bank = None;
        self.exchange(&mut SpiFrame::system_reset())?;

        // ECON1 is back at its reset value
        self.bank = Some(Bank::Zero);

        // Errata #2: CLKRDY may read set before the oscillator is actually
        // stable, so always wait before trusting it.
        self.delay.delay_ms(1);

        for attempt in 0..self.config.reset_attempts {
            let estat = Estat::from_bits_truncate(self.read_reg(regs::ESTAT)?);
            if estat.contains(Estat::CLKRDY) {
                ringbuf_entry!(Trace::ClockReady(attempt));
                return Ok(());
            }
            self.delay.delay_ms(1);
        }

        ringbuf_entry!(Trace::ResetTimeout);
        Err(Enc28j60Error::ResetFailed)
    }

    /// Silicon revision from EREVID.
    pub fn revision(&mut self) -> Result<u8, Enc28j60Error> {
        self.read_reg(regs::EREVID)
    }

    pub fn set_mac_address(&mut self, mac: [u8; 6]) -> Result<(), Enc28j60Error> {
        for (&reg, &octet) in regs::MAADR.iter().zip(mac.iter()) {
            self.write_reg(reg, octet)?;
        }
        Ok(())
    }

    pub fn mac_address(&mut self) -> Result<[u8; 6], Enc28j60Error> {
        let mut mac = [0; 6];
        for (&reg, octet) in regs::MAADR.iter().zip(mac.iter_mut()) {
            *octet = self.read_reg(reg)?;
        }
        Ok(mac)
    }
}
