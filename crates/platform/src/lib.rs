//! Hardware capabilities for the OSD overlay driver
//!
//! This crate provides trait-based abstractions for everything the overlay
//! driver consumes from its environment, enabling development and testing
//! without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Scheduler / OSD page renderer (application)
//!         ↓
//! Overlay backend (max7456 crate, implements OsdBackend)
//!         ↓
//! Platform capabilities (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (embedded-hal SPI device, Embassy time + mutex)
//! ```
//!
//! # Capabilities
//!
//! - [`SharedBus`] / [`RegisterBus`] - register-oriented serial bus shared
//!   with other peripheral drivers, accessed under a blocking lock
//! - [`Clock`] - monotonic milliseconds since boot
//! - [`BufferPool`] - region-tagged buffers released on drop
//! - [`AssetStore`] - read-only named assets (font images)
//! - [`OsdBackend`] - the capability set every overlay chip driver offers
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Enable defmt `Format` derives

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
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod asset_store;
pub mod bus;
pub mod clock;
pub mod mem_pool;
pub mod mocks;
pub mod osd;

// Re-export main capability traits
pub use asset_store::{AssetStore, StaticAssetStore};
pub use bus::{BusSpeed, RegisterBus, SharedBus, SharedBusError, SpiRegisterBus};
pub use clock::{Clock, EmbassyClock};
pub use mem_pool::{BufferPool, InlinePool, MemoryRegion, RegionPool};
pub use osd::{CharAttr, OsdBackend};
