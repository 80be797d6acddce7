// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-size trace buffers for drivers.
//!
//! A module declares a buffer of some `Copy` payload type with
//!
//! ```ignore
//! ringbuf!(Trace, 32, Trace::None);
//! ```
//!
//! and records into it with `ringbuf_entry!(Trace::Something(x))`. Entries
//! are tagged with the source line that recorded them. Recording the same
//! payload from the same line twice in a row bumps a counter on the existing
//! entry instead of consuming a new slot, so a tight polling loop does not
//! wipe out the history that led up to it.
//!
//! The buffers are meant to be inspected with a debugger or, in tests, via
//! [`StaticRingbuf::with`].

#![cfg_attr(not(test), no_std)]

use spin::mutex::SpinMutex;

/// Declares a static ring buffer.
///
/// The one-name form declares `__RINGBUF`, which is what the one-argument
/// form of [`ringbuf_entry!`] records into.
#[macro_export]
macro_rules! ringbuf {
    ($t:ty, $n:expr, $init:expr) => {
        $crate::ringbuf!(__RINGBUF, $t, $n, $init);
    };
    ($name:ident, $t:ty, $n:expr, $init:expr) => {
        static $name: $crate::StaticRingbuf<$t, { $n }> =
            $crate::StaticRingbuf::new($init);
    };
}

/// Records an entry into a ring buffer declared with [`ringbuf!`].
#[macro_export]
macro_rules! ringbuf_entry {
    ($payload:expr) => {
        $crate::ringbuf_entry!(__RINGBUF, $payload);
    };
    ($buf:expr, $payload:expr) => {
        $buf.entry(line!() as u16, $payload);
    };
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RingbufEntry<T: Copy> {
    pub line: u16,
    pub generation: u16,
    pub count: u32,
    pub payload: T,
}

pub struct Ringbuf<T: Copy, const N: usize> {
    last: Option<usize>,
    buffer: [RingbufEntry<T>; N],
}

impl<T: Copy + PartialEq, const N: usize> Ringbuf<T, N> {
    pub const fn new(init: T) -> Self {
        Self {
            last: None,
            buffer: [RingbufEntry {
                line: 0,
                generation: 0,
                count: 0,
                payload: init,
            }; N],
        }
    }

    pub fn entry(&mut self, line: u16, payload: T) {
        if N == 0 {
            return;
        }

        if let Some(last) = self.last {
            let ent = &mut self.buffer[last];
            if ent.line == line && ent.payload == payload {
                ent.count = ent.count.saturating_add(1);
                return;
            }
        }

        let ndx = match self.last {
            None => 0,
            Some(last) if last + 1 >= N => 0,
            Some(last) => last + 1,
        };

        let ent = &mut self.buffer[ndx];
        ent.line = line;
        ent.payload = payload;
        ent.count = 1;
        ent.generation = ent.generation.wrapping_add(1);
        self.last = Some(ndx);
    }

    /// The most recently recorded entry, if anything was ever recorded.
    pub fn last(&self) -> Option<&RingbufEntry<T>> {
        self.last.map(|ndx| &self.buffer[ndx])
    }

    /// Recorded entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RingbufEntry<T>> + '_ {
        let start = match self.last {
            None => N,
            Some(last) => last + 1,
        };
        let (newer, older) = self.buffer.split_at(start.min(N));
        older
            .iter()
            .chain(newer.iter())
            .filter(|ent| ent.count != 0)
    }
}

/// A [`Ringbuf`] that can live in a `static`.
pub struct StaticRingbuf<T: Copy, const N: usize>(SpinMutex<Ringbuf<T, N>>);

impl<T: Copy + PartialEq, const N: usize> StaticRingbuf<T, N> {
    pub const fn new(init: T) -> Self {
        Self(SpinMutex::new(Ringbuf::new(init)))
    }

    pub fn entry(&self, line: u16, payload: T) {
        self.0.lock().entry(line, payload);
    }

    pub fn with<R>(&self, f: impl FnOnce(&Ringbuf<T, N>) -> R) -> R {
        let buf = self.0.lock();
        f(&*buf)
    }
}
