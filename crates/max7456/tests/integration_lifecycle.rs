//! Probe, bring-up, re-init and teardown.

#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::unwrap_used)]

mod common;

use core::cell::RefCell;

use common::{Rig, BOOT_MS};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use max7456::registers::{READ, VM0};
use max7456::{Max7456, Max7456Config, OsdError, SignalState, VideoFormat, COMMAND_BUFFER_SIZE};
use platform::mocks::{MockAssets, MockClock, MockPool, MockSharedBus};
use platform::{CharAttr, EmbassyClock, InlinePool, MemoryRegion, OsdBackend, SpiRegisterBus};

type SpiBus = Mutex<NoopRawMutex, RefCell<SpiRegisterBus<SpiMock<u8>>>>;

fn reset_and_readback(status: u8) -> [SpiTransaction<u8>; 7] {
    [
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0x00, 0x02]),
        SpiTransaction::transaction_end(),
        SpiTransaction::transaction_start(),
        SpiTransaction::write_vec(vec![0x80]),
        SpiTransaction::read_vec(vec![status]),
        SpiTransaction::transaction_end(),
    ]
}

#[test]
fn probe_over_spi_resets_and_reads_back() {
    let expectations = reset_and_readback(0x00);
    let mut spi = SpiMock::new(&expectations);
    let bus: SpiBus = Mutex::new(RefCell::new(SpiRegisterBus::new(spi.clone())));
    let pool = InlinePool::<COMMAND_BUFFER_SIZE>;

    let osd = Max7456::probe(
        &bus,
        EmbassyClock,
        embassy_time::Delay,
        MockAssets::new(),
        &pool,
        Max7456Config::default(),
    );

    assert!(osd.is_ok());
    spi.done();
}

#[test]
fn probe_over_spi_rejects_stuck_reset() {
    let expectations = reset_and_readback(0x02);
    let mut spi = SpiMock::new(&expectations);
    let bus: SpiBus = Mutex::new(RefCell::new(SpiRegisterBus::new(spi.clone())));
    let pool = InlinePool::<COMMAND_BUFFER_SIZE>;

    let osd = Max7456::probe(
        &bus,
        MockClock::default(),
        MockClock::default(),
        MockAssets::new(),
        &pool,
        Max7456Config::default(),
    );

    assert!(matches!(osd, Err(OsdError::Bringup { status: 0x02 })));
    spi.done();
}

#[test]
fn allocation_failure_at_any_step_releases_everything() {
    for failing in 0..5 {
        let shared = MockSharedBus::new();
        let clock = MockClock::default();
        let pool = MockPool::failing_at(failing);

        let result = Max7456::probe(
            &shared,
            clock.clone(),
            clock,
            MockAssets::new(),
            &pool,
            Max7456Config::default(),
        );

        assert!(matches!(result, Err(OsdError::Allocation)), "step {failing}");
        assert_eq!(pool.live(), 0, "step {failing}");
        assert!(shared.bus().ops().is_empty(), "bus touched at step {failing}");
    }
}

#[test]
fn driver_owns_five_buffers_until_dropped() {
    let rig = Rig::new();
    let osd = rig.probe();

    assert_eq!(rig.pool.live(), 5);
    let requests = rig.pool.requests();
    assert_eq!(requests[0], (MemoryRegion::DmaSafe, COMMAND_BUFFER_SIZE));
    assert!(requests[1..].iter().all(|&(region, len)| region == MemoryRegion::Fast && len == 480));

    drop(osd);
    assert_eq!(rig.pool.live(), 0);
}

#[test]
fn bus_failure_during_probe_releases_buffers_and_lock() {
    let rig = Rig::new();
    rig.shared.bus_mut().set_failing(true);

    let result = Max7456::probe(
        &rig.shared,
        rig.clock.clone(),
        rig.clock.clone(),
        MockAssets::new(),
        &rig.pool,
        Max7456Config::default(),
    );

    assert!(matches!(result, Err(OsdError::Bus(_))));
    assert_eq!(rig.pool.live(), 0);
    rig.assert_lock_balanced();
}

#[test]
fn init_forgets_signal_history() {
    let rig = Rig::new();
    let mut osd = rig.probe();
    rig.ready(&mut osd, VideoFormat::Ntsc);
    osd.flush().unwrap();
    assert_eq!(osd.signal_state(), SignalState::Locked(VideoFormat::Ntsc));

    // Reset clears VM0 on the chip.
    rig.shared.bus_mut().set_register(VM0 | READ, 0x00);
    osd.init().unwrap();

    assert!(!osd.is_ready());
    assert_eq!(osd.signal_state(), SignalState::Unknown);
    assert_eq!(osd.video_format(), VideoFormat::Pal);
    osd.write(0, 0, b"X", CharAttr::NONE);
    assert_eq!(osd.transfer_frame().unwrap(), 0);

    // Next flush reconfigures for whatever the camera sends.
    rig.clock.set_ms(BOOT_MS + 10);
    osd.flush().unwrap();
    assert!(osd.is_ready());
    assert_eq!(osd.video_format(), VideoFormat::Ntsc);
    rig.assert_lock_balanced();
}

#[test]
fn failed_reinit_leaves_driver_not_ready() {
    let rig = Rig::new();
    let mut osd = rig.probe();
    rig.ready(&mut osd, VideoFormat::Ntsc);
    assert!(osd.is_ready());

    rig.shared.bus_mut().set_failing(true);
    assert!(matches!(osd.init(), Err(OsdError::Bus(_))));

    assert!(!osd.is_ready());
    assert_eq!(osd.signal_state(), SignalState::Unknown);
    assert_eq!(osd.video_format(), VideoFormat::Pal);
    osd.write(0, 0, b"X", CharAttr::NONE);
    assert_eq!(osd.transfer_frame().unwrap(), 0);
    rig.assert_lock_balanced();
}

#[test]
fn backend_trait_drives_the_full_cycle() {
    fn render<O: OsdBackend>(osd: &mut O) -> Result<(), O::Error> {
        osd.clear();
        osd.write(0, 0, b"BAT 16.4V", CharAttr::NONE);
        osd.write(0, 99, b"ignored", CharAttr::NONE);
        osd.flush()
    }

    let rig = Rig::new();
    let mut osd = rig.probe();
    rig.ready(&mut osd, VideoFormat::Pal);

    render(&mut osd).unwrap();
    assert_eq!(osd.shadow_cell(8).unwrap().glyph, b'V');
    assert_eq!(rig.shared.bus().transfers().len(), 1);
}
