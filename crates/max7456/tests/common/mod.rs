//! Shared rig for the driver integration tests: a mock bus, fake time and
//! an accounting buffer pool, plus helpers that bring the driver to a known
//! state.

#![allow(dead_code)] // each test binary uses a different subset
#![allow(clippy::unwrap_used)]

use max7456::registers::{READ, STAT, STAT_NTSC, STAT_PAL, VM0};
use max7456::{Max7456, Max7456Config, VideoFormat, POWER_SETTLE_MS};
use platform::mocks::{MockAssets, MockBuffer, MockClock, MockPool, MockSharedBus};

/// Driver wired to the rig's mocks.
pub type Osd<'a> = Max7456<&'a MockSharedBus, MockClock, MockClock, MockAssets, MockBuffer>;

/// Time at which [`Rig::ready`] configures the chip.
pub const BOOT_MS: u64 = POWER_SETTLE_MS + 500;

pub struct Rig {
    pub shared: MockSharedBus,
    pub clock: MockClock,
    pub pool: MockPool,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            shared: MockSharedBus::new(),
            clock: MockClock::default(),
            pool: MockPool::new(),
        }
    }

    pub fn probe_with(&self, assets: MockAssets, config: Max7456Config) -> Osd<'_> {
        Max7456::probe(
            &self.shared,
            self.clock.clone(),
            self.clock.clone(),
            assets,
            &self.pool,
            config,
        )
        .unwrap()
    }

    pub fn probe(&self) -> Osd<'_> {
        self.probe_with(MockAssets::new(), Max7456Config::default())
    }

    /// Make the chip report `format` on its input and read back the VM0
    /// value commanding it.
    pub fn input(&self, format: VideoFormat) {
        let stat = match format {
            VideoFormat::Pal => STAT_PAL,
            VideoFormat::Ntsc => STAT_NTSC,
        };
        self.shared.bus_mut().set_register(STAT, stat);
    }

    /// Make VM0 read back as the chip would after being configured for
    /// `format`.
    pub fn chip_holds(&self, format: VideoFormat) {
        self.shared.bus_mut().set_register(VM0 | READ, format.vm0());
    }

    /// Drive `osd` through its first reinit in `format`, blank the frame and
    /// flush until the shadow has converged. Clears the recorded bus log.
    pub fn ready(&self, osd: &mut Osd<'_>, format: VideoFormat) {
        self.input(format);
        self.clock.set_ms(BOOT_MS);
        osd.clear();
        osd.flush().unwrap();
        assert!(osd.is_ready());
        assert_eq!(osd.video_format(), format);
        self.chip_holds(format);
        while osd.transfer_frame().unwrap() > 0 {}
        self.shared.bus_mut().clear_ops();
    }

    /// Lock acquisitions and releases balance and nothing holds the lock.
    pub fn assert_lock_balanced(&self) {
        assert!(!self.shared.is_held());
        assert_eq!(self.shared.acquisitions(), self.shared.releases());
    }
}

/// Split a burst into `(register, value)` pairs.
pub fn pairs(burst: &[u8]) -> Vec<(u8, u8)> {
    burst
        .chunks_exact(2)
        .map(|pair| match pair {
            [reg, value] => (*reg, *value),
            _ => unreachable!(),
        })
        .collect()
}
