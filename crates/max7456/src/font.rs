//! Character memory (NVM) font programming.
//!
//! Each glyph is uploaded as one burst (OSD off, glyph address, 54 ×
//! offset/data pairs, commit) under a single lock acquisition; the driver
//! then polls STAT, taking the lock once per poll so other devices on the
//! bus are not starved during the multi-millisecond NVM write.

use embedded_hal::delay::DelayNs;
use platform::{AssetStore, RegisterBus, SharedBus, SharedBusError};

use crate::command::CommandBuffer;
use crate::error::OsdError;
use crate::log::{osd_info, osd_warn};
use crate::registers::{
    CMAH, CMAL, CMDI, CMM, CMM_WRITE_NVM, FONT_BYTES, GLYPH_BYTES, STAT, STAT_NVR_BUSY, VM0,
};

/// Delay between NVM busy polls.
pub const NVM_POLL_INTERVAL_MS: u32 = 15;

/// Busy polls per glyph before giving up.
pub const NVM_MAX_POLLS: u32 = 10_000;

/// Look up `name` and check it is a complete 256-glyph image.
pub fn load_font<'a, A, E>(assets: &'a A, name: &str) -> Result<&'a [u8], OsdError<E>>
where
    A: AssetStore,
{
    let font = assets.find(name).ok_or(OsdError::AssetMissing)?;
    if font.len() != FONT_BYTES {
        return Err(OsdError::AssetSize { actual: font.len() });
    }
    Ok(font)
}

/// Queue the register writes that store one glyph in NVM.
pub fn build_glyph_upload<B>(commands: &mut CommandBuffer<B>, glyph: u8, data: &[u8])
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    commands.reset();
    commands.push(VM0, 0);
    commands.push(CMAH, glyph);
    for (offset, &byte) in (0u8..).zip(data.iter().take(GLYPH_BYTES)) {
        commands.push(CMAL, offset);
        commands.push(CMDI, byte);
    }
    commands.push(CMM, CMM_WRITE_NVM);
}

/// Program all 256 glyphs of `font` into character memory.
///
/// `font` must already be validated by [`load_font`]. Stops at the first
/// glyph whose commit does not finish within [`NVM_MAX_POLLS`] polls.
pub fn program_font<S, D, B>(
    bus: &S,
    delay: &mut D,
    commands: &mut CommandBuffer<B>,
    font: &[u8],
) -> Result<(), OsdError<SharedBusError<S>>>
where
    S: SharedBus,
    D: DelayNs,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    osd_info!("OSD font upload started");
    for (glyph, data) in (0u8..=u8::MAX).zip(font.chunks_exact(GLYPH_BYTES)) {
        build_glyph_upload(commands, glyph, data);
        bus.with_lock(|bus| bus.transfer(commands.as_bytes()))?;
        wait_nvm_idle(bus, delay, glyph)?;
    }
    osd_info!("OSD font upload complete");
    Ok(())
}

/// Poll STAT until the NVM busy bit clears.
fn wait_nvm_idle<S, D>(bus: &S, delay: &mut D, glyph: u8) -> Result<(), OsdError<SharedBusError<S>>>
where
    S: SharedBus,
    D: DelayNs,
{
    for _ in 0..NVM_MAX_POLLS {
        delay.delay_ms(NVM_POLL_INTERVAL_MS);
        let stat = bus.with_lock(|bus| bus.read_register(STAT))?;
        if stat & STAT_NVR_BUSY == 0 {
            return Ok(());
        }
    }
    osd_warn!("NVM still busy after glyph {}", glyph);
    Err(OsdError::NvmTimeout { glyph })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use platform::mocks::{BusOp, MockAssets, MockBuffer, MockClock, MockPool, MockSharedBus};
    use platform::Clock;

    fn commands(pool: &MockPool) -> CommandBuffer<MockBuffer> {
        CommandBuffer::allocate(pool).unwrap()
    }

    fn font() -> Vec<u8> {
        (0..FONT_BYTES).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn missing_and_truncated_assets_are_rejected() {
        let assets = MockAssets::with("other.bin", vec![0; FONT_BYTES]);
        assert_eq!(load_font::<_, ()>(&assets, "osd_font.bin"), Err(OsdError::AssetMissing));

        let assets = MockAssets::with("osd_font.bin", vec![0; FONT_BYTES - 1]);
        assert_eq!(
            load_font::<_, ()>(&assets, "osd_font.bin"),
            Err(OsdError::AssetSize { actual: FONT_BYTES - 1 })
        );
    }

    #[test]
    fn glyph_upload_layout() {
        let pool = MockPool::new();
        let mut cmds = commands(&pool);
        let data: Vec<u8> = (100..100 + GLYPH_BYTES as u8).collect();
        build_glyph_upload(&mut cmds, 0x41, &data);

        let bytes = cmds.as_bytes();
        assert_eq!(bytes.len(), (3 + 2 * GLYPH_BYTES) * 2);
        assert_eq!(&bytes[..4], &[VM0, 0x00, CMAH, 0x41]);
        assert_eq!(&bytes[4..8], &[CMAL, 0, CMDI, 100]);
        assert_eq!(&bytes[bytes.len() - 6..], &[CMAL, 53, CMDI, 153, CMM, CMM_WRITE_NVM]);
    }

    #[test]
    fn every_glyph_is_one_locked_burst_then_polls() {
        let shared = MockSharedBus::new();
        shared.bus_mut().queue_reads(STAT, &[STAT_NVR_BUSY]);
        let pool = MockPool::new();
        let mut cmds = commands(&pool);
        let mut delay = MockClock::default();
        let font = font();

        program_font(&shared, &mut delay, &mut cmds, &font).unwrap();

        let bus = shared.bus();
        assert_eq!(bus.transfers().len(), 256);
        // 256 idle polls plus the one busy poll on glyph 0.
        assert_eq!(bus.reads_of(STAT), 257);
        assert_eq!(shared.acquisitions(), 256 + 257);
        assert_eq!(shared.acquisitions(), shared.releases());
        assert_eq!(delay.delay_calls(), 257);

        // Glyph 7's burst carries glyph 7's bytes.
        let burst = bus.transfers()[7];
        assert_eq!(burst[3], 7);
        assert_eq!(burst[7], font[7 * GLYPH_BYTES]);

        // Glyph 0: lock, burst, unlock, then lock/read/unlock per poll.
        assert_eq!(bus.ops()[0], BusOp::Lock);
        assert!(matches!(bus.ops()[1], BusOp::Transfer(_)));
        assert_eq!(bus.ops()[2], BusOp::Unlock);
        assert_eq!(&bus.ops()[3..6], &[BusOp::Lock, BusOp::Read { reg: STAT }, BusOp::Unlock]);
    }

    #[test]
    fn stuck_nvm_times_out_after_max_polls() {
        let shared = MockSharedBus::new();
        shared.bus_mut().set_register(STAT, STAT_NVR_BUSY);
        let pool = MockPool::new();
        let mut cmds = commands(&pool);
        let clock = MockClock::default();
        let mut delay = clock.clone();

        let result = program_font(&shared, &mut delay, &mut cmds, &font());

        assert_eq!(result, Err(OsdError::NvmTimeout { glyph: 0 }));
        assert_eq!(shared.bus().reads_of(STAT), NVM_MAX_POLLS as usize);
        assert_eq!(shared.bus().transfers().len(), 1);
        assert_eq!(clock.now_ms(), u64::from(NVM_MAX_POLLS * NVM_POLL_INTERVAL_MS));
        assert!(!shared.is_held());
    }

    #[test]
    fn bus_failure_aborts_with_lock_released() {
        let shared = MockSharedBus::new();
        shared.bus_mut().set_failing(true);
        let pool = MockPool::new();
        let mut cmds = commands(&pool);
        let mut delay = MockClock::default();

        let result = program_font(&shared, &mut delay, &mut cmds, &font());

        assert!(matches!(result, Err(OsdError::Bus(_))));
        assert_eq!(shared.acquisitions(), 1);
        assert_eq!(shared.releases(), 1);
    }
}
