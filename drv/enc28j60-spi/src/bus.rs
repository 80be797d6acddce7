// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chip-select framed SPI transactions that interrupts cannot split.
//!
//! The ENC28J60 decodes a command from the first byte after CS falls and
//! keeps interpreting bytes until CS rises. An interrupt handler that talks
//! to the same bus in the middle of that would corrupt both transfers, so
//! every frame runs with interrupts masked. Frames are a few bytes long (a
//! buffer transfer is the long case); keep them that way, since nothing else
//! on the core runs until they finish.

use drv_enc28j60_spi_api::Enc28j60Error;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Error as _, SpiBus};
use ringbuf::*;

#[derive(Copy, Clone, PartialEq)]
enum Trace {
    SpiError(embedded_hal::spi::ErrorKind),
    ChipSelect,
    None,
}

ringbuf!(Trace, 16, Trace::None);

/// Something that can mask interrupts on the current core and later put the
/// mask back exactly as it found it.
pub trait InterruptMask {
    /// Whatever is needed to undo one `acquire`.
    type Token: Copy;

    /// Masks interrupts and returns the state from before the call.
    fn acquire(&mut self) -> Self::Token;

    /// Restores the state captured by the matching `acquire`. If interrupts
    /// were already masked then, they stay masked.
    fn release(&mut self, token: Self::Token);
}

/// PRIMASK-based masking for Cortex-M cores.
#[derive(Copy, Clone, Debug, Default)]
pub struct CortexM;

impl InterruptMask for CortexM {
    type Token = cortex_m::register::primask::Primask;

    fn acquire(&mut self) -> Self::Token {
        let primask = cortex_m::register::primask::read();
        cortex_m::interrupt::disable();
        primask
    }

    fn release(&mut self, token: Self::Token) {
        if token.is_active() {
            // Safety: interrupts were enabled when the matching `acquire`
            // ran, and the frame that needed them off is over.
            unsafe { cortex_m::interrupt::enable() }
        }
    }
}

pub(crate) struct ChipBus<SPI, CS, IRQ> {
    spi: SPI,
    cs: CS,
    irq: IRQ,
}

impl<SPI, CS, IRQ> ChipBus<SPI, CS, IRQ>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
{
    /// Takes ownership of the bus pieces and parks CS in its idle (high) state.
    pub(crate) fn new(
        spi: SPI,
        mut cs: CS,
        irq: IRQ,
    ) -> Result<Self, Enc28j60Error> {
        cs.set_high().map_err(|_| {
            ringbuf_entry!(Trace::ChipSelect);
            Enc28j60Error::ChipSelect
        })?;
        Ok(Self { spi, cs, irq })
    }

    /// Masks interrupts and asserts CS. Both are undone when the returned
    /// guard is dropped, whichever way the caller leaves.
    pub(crate) fn transaction(
        &mut self,
    ) -> Result<Transaction<'_, SPI, CS, IRQ>, Enc28j60Error> {
        let token = self.irq.acquire();
        if self.cs.set_low().is_err() {
            self.irq.release(token);
            ringbuf_entry!(Trace::ChipSelect);
            return Err(Enc28j60Error::ChipSelect);
        }
        Ok(Transaction { bus: self, token })
    }

    /// Runs `body` inside a single transaction.
    pub(crate) fn with_chip_select<R>(
        &mut self,
        body: impl FnOnce(
            &mut Transaction<'_, SPI, CS, IRQ>,
        ) -> Result<R, Enc28j60Error>,
    ) -> Result<R, Enc28j60Error> {
        let mut txn = self.transaction()?;
        body(&mut txn)
    }

    pub(crate) fn release(self) -> (SPI, CS, IRQ) {
        (self.spi, self.cs, self.irq)
    }
}

pub(crate) struct Transaction<'a, SPI, CS, IRQ>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
{
    bus: &'a mut ChipBus<SPI, CS, IRQ>,
    token: IRQ::Token,
}

impl<SPI, CS, IRQ> Transaction<'_, SPI, CS, IRQ>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
{
    pub(crate) fn transfer_in_place(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(), Enc28j60Error> {
        self.bus.spi.transfer_in_place(buf).map_err(spi_error)
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> Result<(), Enc28j60Error> {
        self.bus.spi.write(bytes).map_err(spi_error)
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<(), Enc28j60Error> {
        self.bus.spi.read(buf).map_err(spi_error)
    }
}

impl<SPI, CS, IRQ> Drop for Transaction<'_, SPI, CS, IRQ>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    IRQ: InterruptMask,
{
    fn drop(&mut self) {
        // The last byte has to be fully clocked out before CS rises.
        if let Err(e) = self.bus.spi.flush() {
            ringbuf_entry!(Trace::SpiError(e.kind()));
        }
        if self.bus.cs.set_high().is_err() {
            ringbuf_entry!(Trace::ChipSelect);
        }
        self.bus.irq.release(self.token);
    }
}

fn spi_error<E: embedded_hal::spi::Error>(e: E) -> Enc28j60Error {
    let kind = e.kind();
    ringbuf_entry!(Trace::SpiError(kind));
    Enc28j60Error::SpiError(kind)
}
