//! MAX7456 lifecycle and periodic flush.
//!
//! # Bring-up
//!
//! [`Max7456::probe`] allocates every buffer the driver will ever use, then
//! runs [`Max7456::init`]: a software reset followed by a VM0 readback.
//! The chip is not configured yet at that point. Configuration (format,
//! row brightness, blink) happens in the first reinit, which the signal
//! check triggers as soon as the camera has had [`POWER_SETTLE_MS`] to
//! come up: until then the chip ignores its input and would autodetect
//! garbage.
//!
//! # Flush
//!
//! ```text
//! flush()
//!   ├─ font upload      (only when requested; one-shot)
//!   ├─ signal check     (one lock: VM0 readback, STAT sample, reinit)
//!   └─ frame transfer   (one lock: single burst of ≤ 64 cells)
//! ```
//!
//! Every register access runs inside [`SharedBus::with_lock`], so the lock
//! is released on every exit path, errors included.

use embedded_hal::delay::DelayNs;
use platform::{
    AssetStore, BufferPool, CharAttr, Clock, OsdBackend, RegisterBus, SharedBus, SharedBusError,
};

use crate::command::CommandBuffer;
use crate::config::Max7456Config;
use crate::error::OsdError;
use crate::font::{load_font, program_font};
use crate::frame::{CharCell, FrameStore};
use crate::log::{osd_debug, osd_info, osd_warn};
use crate::registers::{
    DMM, DMM_CLEAR_DISPLAY, RB0, READ, ROW_BRIGHTNESS_REGS, STAT, VM0, VM0_RESET, VM1,
};
use crate::signal::{SignalAction, SignalMonitor, SignalState, VideoFormat};
use crate::sync::build_frame_update;

/// Time after boot before the chip may be configured.
///
/// Cameras powered from the same rail need this long before their video
/// output is stable enough for format detection.
pub const POWER_SETTLE_MS: u64 = 1500;

/// Delay between the software reset and the VM0 readback.
const RESET_SETTLE_MS: u32 = 1;

/// Error type of a driver on shared bus `S`.
pub type DriverError<S> = OsdError<SharedBusError<S>>;

/// State owned by the lifecycle manager; reset by every [`Max7456::init`].
#[derive(Debug, Clone)]
struct ChipState {
    /// Format last commanded through VM0
    format: VideoFormat,
    /// Reinit has completed since the last init
    ready: bool,
    monitor: SignalMonitor,
}

impl ChipState {
    const fn new() -> Self {
        Self {
            format: VideoFormat::Pal,
            ready: false,
            monitor: SignalMonitor::new(),
        }
    }
}

/// MAX7456 overlay driver.
///
/// - `S`: shared register bus
/// - `C`: millisecond clock
/// - `D`: blocking delay
/// - `A`: asset store holding the font image
/// - `B`: pool buffer type
pub struct Max7456<S, C, D, A, B> {
    bus: S,
    clock: C,
    delay: D,
    assets: A,
    frame: FrameStore<B>,
    commands: CommandBuffer<B>,
    state: ChipState,
    config: Max7456Config,
}

impl<S, C, D, A, B> Max7456<S, C, D, A, B>
where
    S: SharedBus,
    C: Clock,
    D: DelayNs,
    A: AssetStore,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Allocate buffers from `pool` and bring the chip out of reset.
    ///
    /// Returns a live driver only if every allocation and [`Self::init`]
    /// succeed. On failure everything already allocated goes back to the
    /// pool.
    pub fn probe<P>(
        bus: S,
        clock: C,
        delay: D,
        assets: A,
        pool: &P,
        config: Max7456Config,
    ) -> Result<Self, DriverError<S>>
    where
        P: BufferPool<Buffer = B>,
    {
        let commands = CommandBuffer::allocate(pool).ok_or(OsdError::Allocation)?;
        let frame = FrameStore::allocate(pool).ok_or(OsdError::Allocation)?;

        let mut osd = Self {
            bus,
            clock,
            delay,
            assets,
            frame,
            commands,
            state: ChipState::new(),
            config,
        };
        osd.init()?;
        Ok(osd)
    }

    /// Software-reset the chip and check it responds.
    ///
    /// Forgets the signal history and marks the driver not ready before
    /// touching the bus, so a failed reset never leaves it ready. The next
    /// flush after [`POWER_SETTLE_MS`] reconfigures the chip.
    pub fn init(&mut self) -> Result<(), DriverError<S>> {
        self.state = ChipState::new();

        let speed = self.config.bus_speed;
        let delay = &mut self.delay;
        let status = self.bus.with_lock(|bus| {
            bus.set_speed(speed)?;
            bus.write_register(VM0, VM0_RESET)?;
            delay.delay_ms(RESET_SETTLE_MS);
            bus.read_register(VM0 | READ)
        })?;

        if status != 0 {
            osd_warn!("MAX7456 reset failed, VM0 reads {}", status);
            return Err(OsdError::Bringup { status });
        }
        osd_info!("MAX7456 detected");
        Ok(())
    }

    /// Periodic entry point.
    ///
    /// Runs the pending font upload (if any), the signal check and one
    /// frame transfer. A failed font upload is reported only after the
    /// other two steps have run; bus errors from those steps take
    /// precedence.
    pub fn flush(&mut self) -> Result<(), DriverError<S>> {
        let font_result = if self.config.update_font {
            let result = self.update_font();
            if result.is_err() {
                osd_warn!("OSD font update failed");
            }
            self.config.update_font = false;
            result
        } else {
            Ok(())
        };

        self.check_video_signal()?;
        self.transfer_frame()?;
        font_result
    }

    /// Upload the configured font asset to character memory now.
    ///
    /// Blocks for the whole upload (256 NVM writes). The asset is checked
    /// before anything is sent.
    pub fn update_font(&mut self) -> Result<(), DriverError<S>> {
        let font = load_font::<_, SharedBusError<S>>(&self.assets, self.config.font_asset)?;
        program_font(&self.bus, &mut self.delay, &mut self.commands, font)
    }

    /// Verify the chip still holds its configuration and follow the video
    /// input format, reinitializing when needed.
    pub fn check_video_signal(&mut self) -> Result<(), DriverError<S>> {
        let now = self.clock.now_ms();
        let Self {
            bus,
            frame,
            state,
            config,
            ..
        } = self;

        bus.with_lock(|bus| -> Result<(), SharedBusError<S>> {
            let vm0 = bus.read_register(VM0 | READ)?;
            if vm0 != state.format.vm0() {
                osd_debug!("VM0 reads {}, expected {}", vm0, state.format.vm0());
                return reinit(bus, state, frame, config, now);
            }
            if state.monitor.status_check_due(now) {
                let stat = bus.read_register(STAT)?;
                if state.monitor.observe(stat, state.format, now) == SignalAction::Reinit {
                    return reinit(bus, state, frame, config, now);
                }
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Send up to [`crate::MAX_UPDATED_CHARS`] changed cells in one burst.
    ///
    /// Does nothing until the chip has been configured. Returns the number
    /// of cells sent. If the burst fails the whole shadow is marked stale,
    /// so the next transfers repaint the screen from the top.
    pub fn transfer_frame(&mut self) -> Result<usize, DriverError<S>> {
        if !self.state.ready {
            return Ok(0);
        }
        let updated =
            build_frame_update(&mut self.frame, self.state.format.cells(), &mut self.commands);
        if !self.commands.is_empty() {
            let commands = &self.commands;
            if let Err(error) = self.bus.with_lock(|bus| bus.transfer(commands.as_bytes())) {
                // Shadow already claims these cells; resend the whole screen.
                osd_warn!("frame transfer failed, shadow invalidated");
                self.frame.invalidate_shadow();
                return Err(OsdError::Bus(error));
            }
        }
        Ok(updated)
    }

    /// Place `text` at (`column`, `row`). See [`FrameStore::write`].
    pub fn write(&mut self, column: usize, row: usize, text: &[u8], attr: CharAttr) {
        self.frame.write(column, row, text, attr);
    }

    /// Blank the whole grid.
    pub fn clear(&mut self) {
        self.frame.clear();
    }

    /// Format currently commanded.
    pub fn video_format(&self) -> VideoFormat {
        self.state.format
    }

    /// Input signal as last sampled.
    pub fn signal_state(&self) -> SignalState {
        self.state.monitor.state()
    }

    /// `true` once the chip has been configured since the last init.
    pub fn is_ready(&self) -> bool {
        self.state.ready
    }

    /// Ask for a font upload on the next flush.
    pub fn request_font_update(&mut self) {
        self.config.update_font = true;
    }

    /// `true` while a font upload is scheduled.
    pub fn font_update_pending(&self) -> bool {
        self.config.update_font
    }

    /// Active configuration.
    pub fn config(&self) -> &Max7456Config {
        &self.config
    }

    /// Frame cell at linear index `row * 30 + column`.
    pub fn cell(&self, index: usize) -> Option<CharCell> {
        self.frame.cell(index)
    }

    /// What the chip was last sent for the cell at `index`.
    pub fn shadow_cell(&self, index: usize) -> Option<CharCell> {
        self.frame.shadow_cell(index)
    }
}

/// Configure the chip for the format on its input. Caller holds the lock.
///
/// Skipped entirely before [`POWER_SETTLE_MS`].
fn reinit<R, B>(
    bus: &mut R,
    state: &mut ChipState,
    frame: &mut FrameStore<B>,
    config: &Max7456Config,
    now: u64,
) -> Result<(), R::Error>
where
    R: RegisterBus,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    if now < POWER_SETTLE_MS {
        osd_debug!("reinit deferred, power settling");
        return Ok(());
    }

    let stat = bus.read_register(STAT)?;
    let format = VideoFormat::from_status(stat);

    let brightness = config.row_brightness();
    for row in 0..ROW_BRIGHTNESS_REGS {
        bus.write_register(RB0.wrapping_add(row), brightness)?;
    }
    bus.write_register(VM0, format.vm0())?;
    bus.write_register(VM1, config.vm1())?;
    bus.write_register(DMM, DMM_CLEAR_DISPLAY)?;

    frame.invalidate_shadow();
    state.format = format;
    state.monitor.reinitialized(stat);
    state.ready = true;

    osd_info!("MAX7456 configured for {}", format);
    Ok(())
}

impl<S, C, D, A, B> OsdBackend for Max7456<S, C, D, A, B>
where
    S: SharedBus,
    C: Clock,
    D: DelayNs,
    A: AssetStore,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    type Error = DriverError<S>;

    fn init(&mut self) -> Result<(), Self::Error> {
        Max7456::init(self)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Max7456::flush(self)
    }

    fn write(&mut self, column: usize, row: usize, text: &[u8], attr: CharAttr) {
        Max7456::write(self, column, row, text, attr);
    }

    fn clear(&mut self) {
        Max7456::clear(self);
    }
}
