//! Page table entries and their flags.

use crate::FrameNumber;
use crate::layout::PAGE_OFFSET_BITS;

/// Page table entry flags.
///
/// Flags are stored as a raw value with specific bits representing entry state. The
/// referenced and dirty bits are maintained on every access but nothing in the engine
/// reads them back to make a replacement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageFlags(u32);

impl PageFlags {
    /// Valid bit (bit 0).
    const VALID: u32 = 1 << 0;

    /// Referenced bit (bit 1).
    const REFERENCED: u32 = 1 << 1;

    /// Dirty bit (bit 2).
    const DIRTY: u32 = 1 << 2;

    /// All bits this type defines.
    const ALL: u32 = Self::VALID | Self::REFERENCED | Self::DIRTY;

    /// Creates empty flags (entry not valid).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates flags from a raw value, dropping undefined bits.
    const fn from_raw(raw: u32) -> Self {
        Self(raw & Self::ALL)
    }

    /// Returns the raw value of these flags.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns whether the valid bit is set.
    pub const fn is_valid(self) -> bool {
        (self.0 & Self::VALID) != 0
    }

    /// Sets or clears the valid bit.
    pub fn set_valid(&mut self, valid: bool) {
        self.set(Self::VALID, valid);
    }

    /// Returns whether the referenced bit is set.
    pub const fn is_referenced(self) -> bool {
        (self.0 & Self::REFERENCED) != 0
    }

    /// Sets or clears the referenced bit.
    pub fn set_referenced(&mut self, referenced: bool) {
        self.set(Self::REFERENCED, referenced);
    }

    /// Returns whether the dirty bit is set.
    pub const fn is_dirty(self) -> bool {
        (self.0 & Self::DIRTY) != 0
    }

    /// Sets or clears the dirty bit.
    ///
    /// Translation only ever reads addresses, so nothing in the engine sets this bit.
    /// Hosts that model writes mark the entry here and read it back with
    /// [`is_dirty`](Self::is_dirty).
    pub fn set_dirty(&mut self, dirty: bool) {
        self.set(Self::DIRTY, dirty);
    }

    fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// A single page table entry.
///
/// The entry format:
/// - Bits 0-2: Flags (valid, referenced, dirty)
/// - Bits 3-11: Reserved (zero)
/// - Bits 12-31: Frame number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct PageEntry(u32);

impl PageEntry {
    /// Flag bits mask.
    const FLAGS_MASK: u32 = 0x7;

    /// Creates an entry mapping `frame` with the given flags.
    pub const fn new(frame: FrameNumber, flags: PageFlags) -> Self {
        Self((frame.as_u32() << PAGE_OFFSET_BITS) | (flags.to_raw() & Self::FLAGS_MASK))
    }

    /// Creates the entry installed when a fault populates a slot: valid and referenced,
    /// not dirty.
    pub fn populated(frame: FrameNumber) -> Self {
        let mut flags = PageFlags::empty();
        flags.set_valid(true);
        flags.set_referenced(true);
        Self::new(frame, flags)
    }

    /// Returns the frame number stored in this entry, whether or not it is valid.
    pub const fn frame(self) -> FrameNumber {
        FrameNumber::new(self.0 >> PAGE_OFFSET_BITS)
    }

    /// Returns the flags for this entry.
    pub const fn flags(self) -> PageFlags {
        PageFlags::from_raw(self.0 & Self::FLAGS_MASK)
    }

    /// Sets the flags for this entry, preserving the frame.
    pub fn set_flags(&mut self, flags: PageFlags) {
        self.0 = (self.0 & !Self::FLAGS_MASK) | (flags.to_raw() & Self::FLAGS_MASK);
    }

    /// Returns whether this entry is valid.
    pub const fn is_valid(self) -> bool {
        self.flags().is_valid()
    }

    /// Marks this entry as referenced.
    pub fn touch(&mut self) {
        let mut flags = self.flags();
        flags.set_referenced(true);
        self.set_flags(flags);
    }

    /// Clears the valid bit, leaving the frame and the other flags in place.
    pub fn invalidate(&mut self) {
        let mut flags = self.flags();
        flags.set_valid(false);
        self.set_flags(flags);
    }

    /// Returns the raw value of this entry.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}
