//! Round-robin physical frame allocation.

use crate::FrameNumber;
use crate::layout::NUM_PHYSICAL_FRAMES;

/// Hands out frame numbers in cyclic order.
///
/// The allocator is a monotonically increasing counter reduced modulo the number of
/// physical frames. Nothing is ever freed: once every frame has been handed out the
/// sequence wraps and later allocations alias earlier ones.
///
/// Every table owns its own allocator, so re-creating a table restarts at frame 0. To
/// continue a sequence across tables, move the allocator out of one table and into the
/// next explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAllocator {
    /// Number of frames handed out so far.
    next: u64,
    /// Number of physical frames to cycle through.
    frame_count: u32,
}

impl FrameAllocator {
    /// Creates an allocator cycling through `frame_count` frames.
    ///
    /// # Panics
    /// Panics if `frame_count` is zero.
    pub const fn new(frame_count: u32) -> Self {
        assert!(frame_count > 0, "frame allocator needs at least one frame");
        Self {
            next: 0,
            frame_count,
        }
    }

    /// Returns the next frame in the cycle.
    pub fn allocate(&mut self) -> FrameNumber {
        let frame = (self.next % u64::from(self.frame_count)) as u32;
        self.next += 1;
        FrameNumber::new(frame)
    }

    /// Returns the number of allocations made so far, including wrapped ones.
    pub const fn allocations(&self) -> u64 {
        self.next
    }

    /// Returns the number of frames this allocator cycles through.
    pub const fn frame_count(&self) -> u32 {
        self.frame_count
    }
}

impl Default for FrameAllocator {
    fn default() -> Self {
        Self::new(NUM_PHYSICAL_FRAMES as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let mut allocator = FrameAllocator::default();
        assert_eq!(allocator.allocate(), FrameNumber::new(0));
        assert_eq!(allocator.allocate(), FrameNumber::new(1));
        assert_eq!(allocator.allocations(), 2);
    }

    #[test]
    fn wraps_after_frame_count() {
        let mut allocator = FrameAllocator::new(4);
        let frames: Vec<u32> = (0..6).map(|_| allocator.allocate().as_u32()).collect();
        assert_eq!(frames, [0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn default_cycles_through_all_frames() {
        let mut allocator = FrameAllocator::default();
        for _ in 0..NUM_PHYSICAL_FRAMES {
            allocator.allocate();
        }
        assert_eq!(allocator.allocate(), FrameNumber::new(0));
    }

    #[test]
    fn clones_are_independent() {
        let mut a = FrameAllocator::default();
        a.allocate();
        let mut b = a.clone();
        assert_eq!(a.allocate(), FrameNumber::new(1));
        assert_eq!(b.allocate(), FrameNumber::new(1));
    }

    #[test]
    #[should_panic(expected = "frame allocator needs at least one frame")]
    fn zero_frames_panics() {
        FrameAllocator::new(0);
    }
}
