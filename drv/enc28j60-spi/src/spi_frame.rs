// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::regs::Register;

// See ENC28J60 datasheet table 4-1; every command starts with one byte
// carrying a 3-bit opcode and a 5-bit argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Opcode {
    ReadControl = 0x00,
    ReadBuffer = 0x20,
    WriteControl = 0x40,
    WriteBuffer = 0x60,
    BitFieldSet = 0x80,
    BitFieldClear = 0xa0,
    SystemReset = 0xe0,
}

impl Opcode {
    const ARG_MASK: u8 = 0x1f;
    // buffer and reset commands have a fixed argument
    const BUFFER_ARG: u8 = 0x1a;
    const RESET_ARG: u8 = 0x1f;

    pub(crate) fn command(self, arg: u8) -> u8 {
        self as u8 | (arg & Self::ARG_MASK)
    }
}

/// One chip-select framed register command, exchanged in place: the bytes
/// clocked in overwrite the bytes clocked out.
pub(crate) struct SpiFrame {
    bytes: [u8; 3],
    len: usize,
}

impl SpiFrame {
    pub(crate) fn read(reg: Register) -> Self {
        // MAC/MII registers clock out a dummy byte ahead of the data
        let len = if reg.needs_dummy_read() { 3 } else { 2 };
        Self {
            bytes: [Opcode::ReadControl.command(reg.offset()), 0, 0],
            len,
        }
    }

    pub(crate) fn write(reg: Register, data: u8) -> Self {
        Self::with_data(Opcode::WriteControl, reg, data)
    }

    pub(crate) fn bit_field_set(reg: Register, mask: u8) -> Self {
        Self::with_data(Opcode::BitFieldSet, reg, mask)
    }

    pub(crate) fn bit_field_clear(reg: Register, mask: u8) -> Self {
        Self::with_data(Opcode::BitFieldClear, reg, mask)
    }

    pub(crate) fn system_reset() -> Self {
        Self {
            bytes: [Opcode::SystemReset.command(Opcode::RESET_ARG), 0, 0],
            len: 1,
        }
    }

    /// Command byte only; the payload is streamed after it in the same frame.
    pub(crate) fn read_buffer() -> Self {
        Self::command_only(Opcode::ReadBuffer.command(Opcode::BUFFER_ARG))
    }

    pub(crate) fn write_buffer() -> Self {
        Self::command_only(Opcode::WriteBuffer.command(Opcode::BUFFER_ARG))
    }

    fn with_data(op: Opcode, reg: Register, data: u8) -> Self {
        Self {
            bytes: [op.command(reg.offset()), data, 0],
            len: 2,
        }
    }

    fn command_only(cmd: u8) -> Self {
        Self {
            bytes: [cmd, 0, 0],
            len: 1,
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    /// The byte clocked in last; for a read this is the register contents.
    pub(crate) fn data(&self) -> u8 {
        self.bytes[self.len - 1]
    }
}
