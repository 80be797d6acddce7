// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indirect access to the PHY registers through the MAC's MII management
//! interface.
//!
//! A PHY access is several control-register commands plus a wait: load
//! MIREGADR, then either write MIWR (the write starts when MIWRH is written)
//! or set MICMD.MIIRD, then poll MISTAT until BUSY clears. MISTAT lives in
//! bank 3 and everything else in bank 2, so a read bounces between the two.

use crate::regs::{self, Micmd, Mistat, Phstat2};
use crate::{Enc28j60, Enc28j60Error, InterruptMask, PhyRegister, PollBudget};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use ringbuf::*;

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    Read(PhyRegister, u16),
    Write(PhyRegister, u16),
    Polled(u32),
    BusFault,
    Timeout(u32),
    None,
}

ringbuf!(Trace, 32, Trace::None);

// A disconnected or unpowered chip leaves MISO floating high.
const BUS_FAULT_PATTERN: u8 = 0xff;

impl<SPI, CS, IRQ, D> Enc28j60<SPI, CS, IRQ, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
    D: DelayNs,
{
    /// Writes a PHY register and waits for the MII write to finish, bounded
    /// by the configured poll budget.
    pub fn write_phy(
        &mut self,
        reg: PhyRegister,
        value: u16,
    ) -> Result<(), Enc28j60Error> {
        self.write_phy_within(reg, value, self.config.mii_poll_budget)
    }

    pub fn write_phy_within(
        &mut self,
        reg: PhyRegister,
        value: u16,
        budget: PollBudget,
    ) -> Result<(), Enc28j60Error> {
        self.write_reg(regs::MIREGADR, reg.addr())?;
        // writing MIWRH kicks off the MII transaction
        self.write_reg16(regs::MIWRL, value)?;
        self.wait_mii_idle(budget)?;

        ringbuf_entry!(Trace::Write(reg, value));
        Ok(())
    }

    /// Reads a PHY register, bounded by the configured poll budget.
    ///
    /// A chip that stops answering is reported as `BusFault`, never as a
    /// register value of zero.
    pub fn read_phy(&mut self, reg: PhyRegister) -> Result<u16, Enc28j60Error> {
        self.read_phy_within(reg, self.config.mii_poll_budget)
    }

    pub fn read_phy_within(
        &mut self,
        reg: PhyRegister,
        budget: PollBudget,
    ) -> Result<u16, Enc28j60Error> {
        self.write_reg(regs::MIREGADR, reg.addr())?;
        self.bit_field_set(regs::MICMD, Micmd::MIIRD.bits())?;
        self.wait_mii_idle(budget)?;

        // Polling left bank 3 selected; MICMD and MIRD are in bank 2.
        self.select_bank(regs::MICMD)?;
        self.bit_field_clear(regs::MICMD, Micmd::MIIRD.bits())?;
        let value = self.read_reg16(regs::MIRDL)?;

        ringbuf_entry!(Trace::Read(reg, value));
        Ok(value)
    }

    /// PHID1:PHID2 as one 32-bit identifier (0x0083_1400 for an ENC28J60).
    pub fn phy_id(&mut self) -> Result<u32, Enc28j60Error> {
        let hi = self.read_phy(PhyRegister::Phid1)?;
        let lo = self.read_phy(PhyRegister::Phid2)?;
        Ok(u32::from(hi) << 16 | u32::from(lo))
    }

    /// Current link state from PHSTAT2.LSTAT.
    pub fn link_up(&mut self) -> Result<bool, Enc28j60Error> {
        let stat =
            Phstat2::from_bits_truncate(self.read_phy(PhyRegister::Phstat2)?);
        Ok(stat.contains(Phstat2::LSTAT))
    }

    /// Polls MISTAT until BUSY clears. Returns how many polls saw busy.
    ///
    /// There is no time limit unless `budget` sets one; a chip that is
    /// present but wedged busy keeps us here.
    fn wait_mii_idle(&mut self, budget: PollBudget) -> Result<u32, Enc28j60Error> {
        let mut busy_polls = 0u32;
        loop {
            let stat = self.read_reg(regs::MISTAT)?;
            if stat == BUS_FAULT_PATTERN {
                ringbuf_entry!(Trace::BusFault);
                return Err(Enc28j60Error::BusFault);
            }
            if !Mistat::from_bits_truncate(stat).contains(Mistat::BUSY) {
                ringbuf_entry!(Trace::Polled(busy_polls));
                return Ok(busy_polls);
            }

            busy_polls = busy_polls.saturating_add(1);
            if let PollBudget::Polls(max) = budget {
                if busy_polls >= max {
                    ringbuf_entry!(Trace::Timeout(busy_polls));
                    return Err(Enc28j60Error::PhyTimeout);
                }
            }
            self.delay.delay_us(self.config.mii_poll_interval_us);
        }
    }
}
