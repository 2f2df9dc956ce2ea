//! MAX7456 analog video OSD driver
//!
//! Superimposes a 30-column character grid (16 rows PAL, 13 rows NTSC) on
//! an analog camera feed using a MAX7456 or register-compatible clone
//! (AB7456). The application draws into an in-memory frame; a periodic
//! [`Max7456::flush`] pushes only the cells that changed since the last
//! flush, follows the camera's video standard, and uploads custom fonts
//! into the chip's character memory on request.
//!
//! # Architecture
//!
//! ```text
//! OSD page renderer
//!     │ write() / clear()              (no bus traffic)
//!     ▼
//! FrameStore ── frame planes ─┐
//!                             │  flush(): diff against shadow planes
//! SignalMonitor ──────────────┤           (≤ 64 cells per cycle)
//!                             ▼
//! CommandBuffer ──► SharedBus::with_lock ──► SPI ──► MAX7456
//! ```
//!
//! All hardware access goes through the capabilities in the `platform`
//! crate, so the driver runs unchanged against the mocks on the host.
//!
//! # Usage
//!
//! ```ignore
//! use core::cell::RefCell;
//! use embassy_sync::blocking_mutex::{raw::NoopRawMutex, Mutex};
//! use max7456::{Max7456, Max7456Config};
//! use platform::{CharAttr, EmbassyClock, InlinePool, SpiRegisterBus, StaticAssetStore};
//!
//! let bus = Mutex::<NoopRawMutex, _>::new(RefCell::new(SpiRegisterBus::new(spi_device)));
//! let mut osd = Max7456::probe(
//!     &bus,
//!     EmbassyClock,
//!     embassy_time::Delay,
//!     StaticAssetStore::new(&ASSETS),
//!     &InlinePool::<520>,
//!     Max7456Config::default(),
//! )?;
//!
//! loop {
//!     osd.clear();
//!     osd.write(1, 1, b"ALT 100", CharAttr::NONE);
//!     osd.flush()?;
//!     Timer::after_millis(50).await;
//! }
//! ```
//!
//! # Features
//!
//! - `std`: `std::error::Error` for [`OsdError`]
//! - `defmt`: on-target logging and `defmt::Format` derives
//! - `tracing`: host-side logging

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this driver crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod log;

pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod font;
pub mod frame;
pub mod registers;
pub mod signal;
pub mod sync;

pub use command::{CommandBuffer, COMMAND_BUFFER_SIZE, MAX_UPDATED_CHARS};
pub use config::{
    BackgroundBrightness, BlackLevel, BlinkDuty, BlinkTime, Max7456Config, WhiteLevel,
    DEFAULT_FONT_ASSET,
};
pub use driver::{DriverError, Max7456, POWER_SETTLE_MS};
pub use error::OsdError;
pub use font::{NVM_MAX_POLLS, NVM_POLL_INTERVAL_MS};
pub use frame::{CharCell, FrameStore, BLANK_GLYPH};
pub use signal::{
    SignalAction, SignalMonitor, SignalState, VideoFormat, SIGNAL_CHECK_INTERVAL_MS,
    VIDEO_SIGNAL_DEBOUNCE_MS,
};
