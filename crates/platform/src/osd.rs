//! Overlay backend abstraction layer
//!
//! Every character-overlay chip family offers the same four operations:
//! bring-up, a periodic flush that pushes pending changes to the chip, and
//! producer-side `write`/`clear` on an in-memory character grid. The
//! application probes the candidate backends at boot and keeps the first
//! one that comes up.

/// Character overlay driver.
pub trait OsdBackend {
    /// Error type for operations that touch the hardware
    type Error: core::fmt::Debug;

    /// Reset the chip and verify it responds.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Periodic entry point: reconcile the chip with the in-memory grid.
    ///
    /// May block on the bus lock. Must be called from one context only.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Place `text` at (`column`, `row`) with `attr`.
    ///
    /// Out-of-range rows and empty text are ignored; text past the right
    /// edge is clipped. Never touches the bus.
    fn write(&mut self, column: usize, row: usize, text: &[u8], attr: CharAttr);

    /// Blank the whole grid.
    fn clear(&mut self);
}

/// Per-character display attribute.
///
/// Bit positions match the display-memory-mode byte of MAX7456-compatible
/// chips so the value can be forwarded without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharAttr(u8);

impl CharAttr {
    /// No attribute: steady, normal video.
    pub const NONE: Self = Self(0);
    /// Character blinks at the chip's configured blink rate.
    pub const BLINK: Self = Self(1 << 4);
    /// Character is drawn with inverted pixel colour.
    pub const INVERT: Self = Self(1 << 3);

    /// Attribute from raw bits. Bits outside [`Self::BLINK`] and
    /// [`Self::INVERT`] are kept but ignored by the chip.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw attribute bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Union of two attributes.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for CharAttr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}
