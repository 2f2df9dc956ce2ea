//! Driver error type.

/// Errors reported by [`crate::Max7456`].
///
/// `E` is the error type of the register bus. Transient video signal
/// problems (loss of sync, format flapping) are handled internally and
/// never show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OsdError<E> {
    /// A frame plane or the command buffer could not be allocated.
    Allocation,
    /// Software reset did not complete: VM0 read back non-zero.
    Bringup {
        /// VM0 value read back after the reset
        status: u8,
    },
    /// The font asset is not in the asset store.
    AssetMissing,
    /// The font asset is not exactly 256 × 54 bytes.
    AssetSize {
        /// Size of the asset found
        actual: usize,
    },
    /// The chip stayed NVM-busy after programming a glyph.
    NvmTimeout {
        /// Glyph being programmed
        glyph: u8,
    },
    /// Register bus failure.
    Bus(E),
}

impl<E> From<E> for OsdError<E> {
    fn from(err: E) -> Self {
        Self::Bus(err)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for OsdError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Allocation => write!(f, "OSD buffer allocation failed"),
            Self::Bringup { status } => {
                write!(f, "OSD reset did not complete (VM0 = {status:#04x})")
            }
            Self::AssetMissing => write!(f, "OSD font asset not found"),
            Self::AssetSize { actual } => {
                write!(f, "OSD font asset has wrong size ({actual} bytes)")
            }
            Self::NvmTimeout { glyph } => {
                write!(f, "OSD NVM write timed out at glyph {glyph}")
            }
            #[allow(clippy::use_debug)] // bus errors only guarantee Debug
            Self::Bus(err) => write!(f, "OSD bus error: {err:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for OsdError<E> {}
