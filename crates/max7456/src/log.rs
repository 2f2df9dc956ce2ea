//! Logging shims.
//!
//! On target the driver logs through `defmt`; on the host (emulators,
//! integration harnesses) through `tracing`. With neither feature enabled
//! the macros compile to nothing but still borrow their arguments, so call
//! sites build without unused-variable warnings.
//!
//! Format strings must stay within the subset both backends accept: plain
//! positional `{}` placeholders, no inline captures.

macro_rules! osd_debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        tracing::debug!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

macro_rules! osd_info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        tracing::info!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

macro_rules! osd_warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        tracing::warn!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

pub(crate) use {osd_debug, osd_info, osd_warn};
