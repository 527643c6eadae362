//! Opaque resource handles and the generational arena behind them.
//!
//! A handle packs two fields into a `u64`:
//! - high [`SERIAL_BITS`] bits: per-table allocation serial, strictly
//!   increasing and starting at 1
//! - low [`SLOT_BITS`] bits: index of the slot in the arena
//!
//! Because the serial occupies the high bits, later handles always compare
//! greater than earlier ones, a handle value is never issued twice, and a
//! stale handle pointing at a reused slot is rejected by the serial check.
//! Raw value 0 is reserved ("no resource").

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub const SLOT_BITS: u32 = 24;
pub const SERIAL_BITS: u32 = 64 - SLOT_BITS;

const SLOT_MASK: u64 = (1 << SLOT_BITS) - 1;
const MAX_SERIAL: u64 = (1 << SERIAL_BITS) - 1;

/// Namespace marker for compiled geometry.
#[derive(Debug)]
pub enum GeometryKind {}

/// Namespace marker for textures.
#[derive(Debug)]
pub enum TextureKind {}

pub type GeometryHandle = Handle<GeometryKind>;
pub type TextureHandle = Handle<TextureKind>;

/// Opaque handle scoped to one resource table (`K`).
///
/// The first handle a table issues has serial 1 in slot 0, so its raw value
/// is `1 << SLOT_BITS`, not 1. Only the serial counts up from 1; callers
/// should treat the raw value as opaque and rely on it being non-zero and
/// increasing.
pub struct Handle<K> {
    raw: u64,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Handle<K> {
    /// The reserved "no resource" handle.
    pub const NONE: Self = Self::from_raw(0);

    /// Wraps an integer received from the UI engine. Any value is accepted;
    /// values never issued by a table simply fail lookup.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self { raw, _kind: PhantomData }
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.raw
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.raw == 0
    }

    /// Allocation serial; 0 only for [`Handle::NONE`] and forged values.
    #[inline]
    pub const fn serial(self) -> u64 {
        self.raw >> SLOT_BITS
    }

    #[inline]
    const fn slot(self) -> usize {
        (self.raw & SLOT_MASK) as usize
    }

    #[inline]
    const fn pack(serial: u64, slot: usize) -> Self {
        Self::from_raw((serial << SLOT_BITS) | slot as u64)
    }
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K> Eq for Handle<K> {}

impl<K> PartialOrd for Handle<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Handle<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<K> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K> Default for Handle<K> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<K> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("Handle(none)");
        }
        write!(f, "Handle(#{}@{})", self.serial(), self.slot())
    }
}

struct Slot<T> {
    serial: u64,
    value: Option<T>,
}

/// Dense slot storage addressed by [`Handle`].
///
/// Lookup is an index plus a serial compare; freed slots are recycled
/// through a free list.
pub struct HandleArena<K, T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    next_serial: u64,
    len: usize,
    _kind: PhantomData<fn() -> K>,
}

impl<K, T> Default for HandleArena<K, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            next_serial: 1,
            len: 0,
            _kind: PhantomData,
        }
    }
}

impl<K, T> HandleArena<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` and mints a fresh handle.
    ///
    /// Returns `value` back if the serial space or the slot space is
    /// exhausted.
    pub fn insert(&mut self, value: T) -> Result<Handle<K>, T> {
        if self.next_serial > MAX_SERIAL {
            return Err(value);
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = self.slots.len();
                if slot as u64 > SLOT_MASK {
                    return Err(value);
                }
                self.slots.push(Slot { serial: 0, value: None });
                slot
            }
        };

        let serial = self.next_serial;
        self.next_serial += 1;

        self.slots[slot] = Slot { serial, value: Some(value) };
        self.len += 1;

        Ok(Handle::pack(serial, slot))
    }

    #[inline]
    pub fn contains(&self, handle: Handle<K>) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle<K>) -> Option<&T> {
        if handle.is_none() {
            return None;
        }
        let slot = self.slots.get(handle.slot())?;
        if slot.serial != handle.serial() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Removes and returns the entry. Unknown or stale handles yield `None`.
    pub fn remove(&mut self, handle: Handle<K>) -> Option<T> {
        if handle.is_none() {
            return None;
        }
        let index = handle.slot();
        let slot = self.slots.get_mut(index)?;
        if slot.serial != handle.serial() {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    /// Removes every live entry, returning each with its handle.
    pub fn drain(&mut self) -> Vec<(Handle<K>, T)> {
        let mut out = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                self.free.push(index);
                out.push((Handle::pack(slot.serial, index), value));
            }
        }
        self.len = 0;
        out
    }
}
