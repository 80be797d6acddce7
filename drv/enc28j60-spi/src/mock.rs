// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A simulated ENC28J60 behind mock SPI, chip-select, interrupt-mask and
//! delay implementations, all sharing one state so tests can inspect what
//! went over the wire and what the chip ended up holding.

use crate::regs::{Mistat, Register};
use crate::{Config, Enc28j60, InterruptMask, PhyRegister};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorKind, SpiBus};
use std::cell::RefCell;
use std::rc::Rc;

const BUFFER_SIZE: usize = 0x2000;
const FIRST_COMMON: u8 = 0x1b;
const ECON1: u8 = 0x1f;
const ESTAT: u8 = 0x1d;
const CLKRDY: u8 = 0x01;
// bank 2 / bank 3 offsets with side effects
const MICMD: u8 = 0x12;
const MIREGADR: u8 = 0x14;
const MIWRL: u8 = 0x16;
const MIWRH: u8 = 0x17;
const MIRDL: u8 = 0x18;
const MIRDH: u8 = 0x19;
const MISTAT: u8 = 0x0a;
// what a MAC/MII register shifts out before its contents
const DUMMY: u8 = 0xa5;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    Select,
    Deselect,
    Byte { mosi: u8, irq_enabled: bool },
}

struct State {
    banks: [[u8; FIRST_COMMON as usize]; 4],
    common: [u8; 5],
    buffer: Vec<u8>,
    phy: [u16; 32],
    cs_low: bool,
    irq_enabled: bool,
    frame: Vec<u8>,
    events: Vec<Event>,
    fail_next: Option<ErrorKind>,
    fail_cs: bool,
    stuck_high: bool,
    mii_busy_polls: u32,
    mii_busy_remaining: u32,
    mistat_reads: u32,
    clock_ready_after: u32,
    estat_reads: u32,
    delay_ns: u64,
}

impl State {
    fn new() -> Self {
        Self {
            banks: [[0; FIRST_COMMON as usize]; 4],
            common: [0; 5],
            buffer: vec![0; BUFFER_SIZE],
            phy: [0; 32],
            cs_low: false,
            irq_enabled: true,
            frame: Vec::new(),
            events: Vec::new(),
            fail_next: None,
            fail_cs: false,
            stuck_high: false,
            mii_busy_polls: 1,
            mii_busy_remaining: 0,
            mistat_reads: 0,
            clock_ready_after: 0,
            estat_reads: 0,
            delay_ns: 0,
        }
    }

    fn bank(&self) -> usize {
        usize::from(self.common[usize::from(ECON1 - FIRST_COMMON)] & 0x03)
    }

    fn slot(&mut self, bank: usize, offset: u8) -> &mut u8 {
        if offset >= FIRST_COMMON {
            &mut self.common[usize::from(offset - FIRST_COMMON)]
        } else {
            &mut self.banks[bank][usize::from(offset)]
        }
    }

    fn is_mac_or_mii(&self, offset: u8) -> bool {
        match self.bank() {
            2 => offset <= MIRDH,
            3 => offset <= 0x05 || offset == MISTAT,
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.banks = [[0; FIRST_COMMON as usize]; 4];
        self.common = [0; 5];
        // AUTOINC
        self.common[usize::from(0x1e - FIRST_COMMON)] = 0x80;
        self.estat_reads = 0;
        self.mii_busy_remaining = 0;
    }

    fn pointer(&self, low: usize) -> usize {
        usize::from(u16::from_le_bytes([self.banks[0][low], self.banks[0][low + 1]]))
            % BUFFER_SIZE
    }

    fn set_pointer(&mut self, low: usize, value: usize) {
        let [lo, hi] = ((value % BUFFER_SIZE) as u16).to_le_bytes();
        self.banks[0][low] = lo;
        self.banks[0][low + 1] = hi;
    }

    fn read_register(&mut self, offset: u8) -> u8 {
        let bank = self.bank();
        if offset == ESTAT {
            let ready = self.estat_reads >= self.clock_ready_after;
            self.estat_reads = self.estat_reads.saturating_add(1);
            let estat = *self.slot(bank, offset) & !CLKRDY;
            return if ready { estat | CLKRDY } else { estat };
        }
        if bank == 3 && offset == MISTAT {
            self.mistat_reads += 1;
            if self.mii_busy_remaining > 0 {
                self.mii_busy_remaining -= 1;
                return Mistat::BUSY.bits();
            }
            return 0;
        }
        *self.slot(bank, offset)
    }

    fn write_register(&mut self, offset: u8, value: u8) {
        let bank = self.bank();
        let old = std::mem::replace(self.slot(bank, offset), value);
        if bank != 2 {
            return;
        }
        let phy_addr = usize::from(self.banks[2][usize::from(MIREGADR)] & 0x1f);
        match offset {
            MIWRH => {
                self.phy[phy_addr] = u16::from_le_bytes([
                    self.banks[2][usize::from(MIWRL)],
                    value,
                ]);
                self.mii_busy_remaining = self.mii_busy_polls;
            }
            MICMD if value & 0x01 != 0 && old & 0x01 == 0 => {
                let [lo, hi] = self.phy[phy_addr].to_le_bytes();
                self.banks[2][usize::from(MIRDL)] = lo;
                self.banks[2][usize::from(MIRDH)] = hi;
                self.mii_busy_remaining = self.mii_busy_polls;
            }
            _ => {}
        }
    }

    fn clock(&mut self, mosi: u8) -> u8 {
        assert!(self.cs_low, "byte clocked with CS deasserted");
        self.events.push(Event::Byte {
            mosi,
            irq_enabled: self.irq_enabled,
        });
        let idx = self.frame.len();
        self.frame.push(mosi);

        if self.stuck_high {
            return 0xff;
        }
        if idx == 0 {
            if mosi == 0xff {
                self.reset();
            }
            return 0;
        }

        let cmd = self.frame[0];
        let arg = cmd & 0x1f;
        match cmd & 0xe0 {
            // read control register
            0x00 => {
                let data_idx = if self.is_mac_or_mii(arg) { 2 } else { 1 };
                if idx == data_idx {
                    self.read_register(arg)
                } else if idx < data_idx {
                    DUMMY
                } else {
                    0
                }
            }
            // read buffer memory
            0x20 => {
                let ptr = self.pointer(0);
                self.set_pointer(0, ptr + 1);
                self.buffer[ptr]
            }
            // write control register
            0x40 if idx == 1 => {
                self.write_register(arg, mosi);
                0
            }
            // write buffer memory
            0x60 => {
                let ptr = self.pointer(2);
                self.buffer[ptr] = mosi;
                self.set_pointer(2, ptr + 1);
                0
            }
            // bit field set / clear
            0x80 if idx == 1 => {
                let bank = self.bank();
                let value = *self.slot(bank, arg) | mosi;
                self.write_register(arg, value);
                0
            }
            0xa0 if idx == 1 => {
                let bank = self.bank();
                let value = *self.slot(bank, arg) & !mosi;
                self.write_register(arg, value);
                0
            }
            _ => 0,
        }
    }

    fn take_failure(&mut self) -> Result<(), ErrorKind> {
        match self.fail_next.take() {
            Some(kind) => Err(kind),
            None => Ok(()),
        }
    }

    fn take_cs_failure(&mut self) -> Result<(), digital::ErrorKind> {
        if std::mem::take(&mut self.fail_cs) {
            Err(digital::ErrorKind::Other)
        } else {
            Ok(())
        }
    }
}

/// Test-side view of the simulated chip.
#[derive(Clone)]
pub(crate) struct Sim(Rc<RefCell<State>>);

impl Sim {
    fn slot_of(state: &mut State, reg: Register) -> &mut u8 {
        match reg.bank() {
            Some(bank) => &mut state.banks[bank as usize][usize::from(reg.offset())],
            None => &mut state.common[usize::from(reg.offset() - FIRST_COMMON)],
        }
    }

    pub(crate) fn poke(&self, reg: Register, value: u8) {
        *Self::slot_of(&mut self.0.borrow_mut(), reg) = value;
    }

    pub(crate) fn peek(&self, reg: Register) -> u8 {
        *Self::slot_of(&mut self.0.borrow_mut(), reg)
    }

    pub(crate) fn bank(&self) -> u8 {
        self.0.borrow().bank() as u8
    }

    pub(crate) fn phy(&self, reg: PhyRegister) -> u16 {
        self.0.borrow().phy[usize::from(reg.addr())]
    }

    pub(crate) fn set_phy(&self, reg: PhyRegister, value: u16) {
        self.0.borrow_mut().phy[usize::from(reg.addr())] = value;
    }

    pub(crate) fn buffer(&self, start: usize, len: usize) -> Vec<u8> {
        self.0.borrow().buffer[start..start + len].to_vec()
    }

    /// How many MISTAT reads report BUSY after each MII operation starts.
    pub(crate) fn set_mii_busy_polls(&self, polls: u32) {
        self.0.borrow_mut().mii_busy_polls = polls;
    }

    pub(crate) fn mistat_reads(&self) -> u32 {
        self.0.borrow().mistat_reads
    }

    /// How many ESTAT reads after a reset show CLKRDY clear.
    pub(crate) fn set_clock_ready_after(&self, reads: u32) {
        self.0.borrow_mut().clock_ready_after = reads;
    }

    /// Every byte clocked in reads 0xff, as with nothing on the bus.
    pub(crate) fn set_stuck_high(&self, stuck: bool) {
        self.0.borrow_mut().stuck_high = stuck;
    }

    pub(crate) fn fail_next_transfer(&self, kind: ErrorKind) {
        self.0.borrow_mut().fail_next = Some(kind);
    }

    /// The next chip-select change fails and leaves the line where it was.
    pub(crate) fn fail_next_chip_select(&self) {
        self.0.borrow_mut().fail_cs = true;
    }

    pub(crate) fn cs_asserted(&self) -> bool {
        self.0.borrow().cs_low
    }

    pub(crate) fn interrupts_enabled(&self) -> bool {
        self.0.borrow().irq_enabled
    }

    pub(crate) fn set_interrupts_enabled(&self, enabled: bool) {
        self.0.borrow_mut().irq_enabled = enabled;
    }

    pub(crate) fn delay_ns(&self) -> u64 {
        self.0.borrow().delay_ns
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub(crate) fn clear_events(&self) {
        self.0.borrow_mut().events.clear();
    }

    /// MOSI bytes of each chip-select frame, in order.
    pub(crate) fn frames(&self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for ev in self.0.borrow().events.iter() {
            match ev {
                Event::Select => frames.push(Vec::new()),
                Event::Byte { mosi, .. } => {
                    if let Some(frame) = frames.last_mut() {
                        frame.push(*mosi);
                    }
                }
                Event::Deselect => {}
            }
        }
        frames
    }

    pub(crate) fn delay(&self) -> MockDelay {
        MockDelay(self.0.clone())
    }
}

pub(crate) struct MockSpi(Rc<RefCell<State>>);

impl spi::ErrorType for MockSpi {
    type Error = ErrorKind;
}

impl SpiBus<u8> for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), ErrorKind> {
        let mut state = self.0.borrow_mut();
        state.take_failure()?;
        for w in words.iter_mut() {
            *w = state.clock(0x00);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), ErrorKind> {
        let mut state = self.0.borrow_mut();
        state.take_failure()?;
        for &w in words {
            state.clock(w);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), ErrorKind> {
        let mut state = self.0.borrow_mut();
        state.take_failure()?;
        for i in 0..read.len().max(write.len()) {
            let miso = state.clock(write.get(i).copied().unwrap_or(0));
            if let Some(r) = read.get_mut(i) {
                *r = miso;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), ErrorKind> {
        let mut state = self.0.borrow_mut();
        state.take_failure()?;
        for w in words.iter_mut() {
            *w = state.clock(*w);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

pub(crate) struct MockCs(Rc<RefCell<State>>);

impl digital::ErrorType for MockCs {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockCs {
    fn set_low(&mut self) -> Result<(), digital::ErrorKind> {
        let mut state = self.0.borrow_mut();
        state.take_cs_failure()?;
        if !state.cs_low {
            state.cs_low = true;
            state.frame.clear();
            state.events.push(Event::Select);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), digital::ErrorKind> {
        let mut state = self.0.borrow_mut();
        state.take_cs_failure()?;
        if state.cs_low {
            state.cs_low = false;
            state.events.push(Event::Deselect);
        }
        Ok(())
    }
}

pub(crate) struct MockIrq(Rc<RefCell<State>>);

impl InterruptMask for MockIrq {
    type Token = bool;

    fn acquire(&mut self) -> bool {
        std::mem::replace(&mut self.0.borrow_mut().irq_enabled, false)
    }

    fn release(&mut self, token: bool) {
        self.0.borrow_mut().irq_enabled = token;
    }
}

pub(crate) struct MockDelay(Rc<RefCell<State>>);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().delay_ns += u64::from(ns);
    }
}

pub(crate) type Device = Enc28j60<MockSpi, MockCs, MockIrq, MockDelay>;

pub(crate) fn parts() -> (Sim, MockSpi, MockCs, MockIrq) {
    let state = Rc::new(RefCell::new(State::new()));
    (
        Sim(state.clone()),
        MockSpi(state.clone()),
        MockCs(state.clone()),
        MockIrq(state),
    )
}

/// A driver over a fresh simulated chip, with nothing yet sent.
pub(crate) fn device(config: Config) -> (Sim, Device) {
    let (sim, spi, cs, irq) = parts();
    let delay = sim.delay();
    let dev = Enc28j60::new(spi, cs, irq, delay, config)
        .unwrap_or_else(|e| panic!("bad test config: {:?}", e));
    sim.clear_events();
    (sim, dev)
}
