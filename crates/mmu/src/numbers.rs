//! Page and frame number types.
//!
//! This module provides newtypes for physical frame numbers and virtual page numbers,
//! which key every translation structure in the engine.

use core::fmt;

/// Macro to define common page/frame number functionality.
///
/// This macro generates the basic structure and methods common to both frame
/// and page number types, reducing code duplication.
macro_rules! impl_page_number_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new page/frame number.
            #[inline]
            pub const fn new(number: u32) -> Self {
                Self(number)
            }

            /// Returns the raw page/frame number.
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }

            /// Returns the raw page/frame number as an index.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_page_number_common!(
    FrameNumber,
    "A physical frame number.\n\n\
     Frames are the physical counterpart of pages. The simulated machine has a fixed\n\
     number of them, handed out by a [`FrameAllocator`](crate::FrameAllocator)."
);

impl_page_number_common!(
    PageNumber,
    "A virtual page number.\n\n\
     The upper 20 bits of a virtual address. This is the tag stored in the translation\n\
     cache and the index into the flat page table."
);
