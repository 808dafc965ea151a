//! Address types and bitfield decoding for the 32-bit virtual address space.
//!
//! This module provides newtype wrappers around raw physical and virtual addresses, with
//! methods to extract the fields the translation structures index by.

use core::fmt;

use crate::{
    FrameNumber, PageNumber,
    layout::{L1_BITS, L2_BITS, PAGE_OFFSET_BITS, PAGE_OFFSET_MASK},
};

/// Macro to define common address type functionality.
///
/// This macro generates the basic structure and methods common to both physical
/// and virtual address types, reducing code duplication.
macro_rules! impl_address_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new address. Every 32-bit value is a valid address.
            #[inline]
            pub const fn new(addr: u32) -> Self {
                Self(addr)
            }

            /// Returns the raw address value.
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }

            /// Returns the offset within the containing page (bits 0-11).
            #[inline]
            pub const fn page_offset(self) -> u32 {
                self.0 & PAGE_OFFSET_MASK
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#010x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#010X}", self.0)
            }
        }
    };
}

impl_address_common!(
    PhysicalAddress,
    "A simulated physical memory address.\n\n\
     Physical addresses are produced by translation as `(frame << 12) | offset`."
);

impl PhysicalAddress {
    /// Builds the physical address of `offset` within `frame`.
    ///
    /// Offset bits above the page size are discarded.
    #[inline]
    pub const fn from_frame(frame: FrameNumber, offset: u32) -> Self {
        Self((frame.as_u32() << PAGE_OFFSET_BITS) | (offset & PAGE_OFFSET_MASK))
    }

    /// Returns the frame number this address falls in.
    #[inline]
    pub const fn frame_number(self) -> FrameNumber {
        FrameNumber::new(self.0 >> PAGE_OFFSET_BITS)
    }
}

impl_address_common!(
    VirtualAddress,
    "A 32-bit virtual address.\n\n\
     Provides the fields used to index the translation cache (the page number) and the\n\
     two levels of the hierarchical page table."
);

impl VirtualAddress {
    /// Returns the virtual page number (bits 12-31).
    #[inline]
    pub const fn page_number(self) -> PageNumber {
        PageNumber::new(self.0 >> PAGE_OFFSET_BITS)
    }

    /// Returns the index into the level 1 directory (bits 22-31).
    #[inline]
    pub const fn l1_index(self) -> usize {
        ((self.0 >> (PAGE_OFFSET_BITS + L2_BITS)) & ((1 << L1_BITS) - 1)) as usize
    }

    /// Returns the index into a level 2 block (bits 12-21).
    #[inline]
    pub const fn l2_index(self) -> usize {
        ((self.0 >> PAGE_OFFSET_BITS) & ((1 << L2_BITS) - 1)) as usize
    }
}

/// All fields of a virtual address, split out at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddress {
    pub address: VirtualAddress,
    pub page_number: PageNumber,
    pub offset: u32,
    pub l1_index: usize,
    pub l2_index: usize,
}

/// Splits a virtual address into its page number, offset and table indices.
pub const fn decode(address: VirtualAddress) -> DecodedAddress {
    DecodedAddress {
        address,
        page_number: address.page_number(),
        offset: address.page_offset(),
        l1_index: address.l1_index(),
        l2_index: address.l2_index(),
    }
}

impl fmt::Display for DecodedAddress {
    /// Renders a multi-line breakdown, with the binary form split at the L1/L2 and
    /// L2/offset boundaries.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.address.as_u32();
        writeln!(f, "Address: {}", self.address)?;
        write!(f, "  Binary: ")?;
        for bit in (0..32).rev() {
            write!(f, "{}", (raw >> bit) & 1)?;
            if bit == PAGE_OFFSET_BITS || bit == PAGE_OFFSET_BITS + L2_BITS {
                write!(f, " | ")?;
            }
        }
        writeln!(f)?;
        writeln!(f, "  L1 Index: {} ({:#X})", self.l1_index, self.l1_index)?;
        writeln!(f, "  L2 Index: {} ({:#X})", self.l2_index, self.l2_index)?;
        writeln!(
            f,
            "  Page Number: {} ({:#X})",
            self.page_number,
            self.page_number.as_u32()
        )?;
        write!(f, "  Page Offset: {} ({:#X})", self.offset, self.offset)
    }
}
