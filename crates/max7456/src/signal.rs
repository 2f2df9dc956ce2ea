//! Video signal monitoring and format autodetection.
//!
//! The chip must be told whether the camera feeds PAL or NTSC. The
//! monitor samples STAT at most once per [`SIGNAL_CHECK_INTERVAL_MS`] and
//! asks for a reinit when the input disagrees with the commanded format
//! for at least [`VIDEO_SIGNAL_DEBOUNCE_MS`]:
//!
//! ```text
//!              agree / LOS
//!          ┌──────────────────┐
//!          ▼                  │
//!      ┌────────┐ mismatch ┌──┴──────┐ held ≥ debounce ┌────────┐
//!      │ Stable ├─────────►│ Pending ├────────────────►│ Reinit │
//!      └────────┘          └─────────┘                 └────────┘
//! ```
//!
//! AB7456 clones sometimes report neither PAL nor NTSC while locked, so
//! "no loss of sync and no PAL bit" counts as NTSC.
//!
//! Pure logic: the caller does the register reads and the reinit.

use crate::log::osd_debug;
use crate::registers::{
    CELLS_NTSC, CELLS_PAL, ROWS_NTSC, ROWS_PAL, STAT_LOS, STAT_PAL, VM0_NTSC, VM0_OSD_ENABLE,
    VM0_PAL,
};

/// Minimum time between two STAT samples.
pub const SIGNAL_CHECK_INTERVAL_MS: u64 = 1000;

/// How long a format mismatch must persist before reinit.
pub const VIDEO_SIGNAL_DEBOUNCE_MS: u64 = 100;

/// Analog video standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VideoFormat {
    /// 625 lines, 16 text rows
    Pal,
    /// 525 lines, 13 text rows
    Ntsc,
}

impl VideoFormat {
    /// Format reported by a STAT value: PAL only when locked with the PAL
    /// bit set, NTSC otherwise.
    pub const fn from_status(stat: u8) -> Self {
        if stat & STAT_LOS == 0 && stat & STAT_PAL != 0 {
            Self::Pal
        } else {
            Self::Ntsc
        }
    }

    /// Text rows displayed.
    pub const fn rows(self) -> usize {
        match self {
            Self::Pal => ROWS_PAL,
            Self::Ntsc => ROWS_NTSC,
        }
    }

    /// Cells displayed (and synchronized).
    pub const fn cells(self) -> usize {
        match self {
            Self::Pal => CELLS_PAL,
            Self::Ntsc => CELLS_NTSC,
        }
    }

    /// VM0 value commanding this format with the OSD enabled.
    pub const fn vm0(self) -> u8 {
        match self {
            Self::Pal => VM0_PAL | VM0_OSD_ENABLE,
            Self::Ntsc => VM0_NTSC | VM0_OSD_ENABLE,
        }
    }
}

impl core::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pal => write!(f, "PAL"),
            Self::Ntsc => write!(f, "NTSC"),
        }
    }
}

/// Input signal as last sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalState {
    /// Not sampled since the last init
    #[default]
    Unknown,
    /// Sync present with the given format
    Locked(VideoFormat),
    /// No sync on the video input
    LossOfSync,
}

impl SignalState {
    /// State described by a STAT value.
    pub const fn from_status(stat: u8) -> Self {
        if stat & STAT_LOS != 0 {
            Self::LossOfSync
        } else {
            Self::Locked(VideoFormat::from_status(stat))
        }
    }
}

/// What the caller should do after a STAT sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalAction {
    /// Keep the current configuration
    Keep,
    /// Reconfigure the chip for the detected format
    Reinit,
}

/// Debounced format detector.
#[derive(Debug, Clone, Default)]
pub struct SignalMonitor {
    state: SignalState,
    last_check_ms: u64,
    mismatch_since_ms: Option<u64>,
}

impl SignalMonitor {
    /// Fresh monitor: state unknown, no pending mismatch.
    pub const fn new() -> Self {
        Self {
            state: SignalState::Unknown,
            last_check_ms: 0,
            mismatch_since_ms: None,
        }
    }

    /// Last sampled signal state.
    pub fn state(&self) -> SignalState {
        self.state
    }

    /// Time the current mismatch was first seen, if one is pending.
    pub fn mismatch_since_ms(&self) -> Option<u64> {
        self.mismatch_since_ms
    }

    /// `true` once more than [`SIGNAL_CHECK_INTERVAL_MS`] has passed since
    /// the last sample.
    pub fn status_check_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_check_ms) > SIGNAL_CHECK_INTERVAL_MS
    }

    /// Feed a STAT sample taken at `now_ms` while `commanded` is active.
    pub fn observe(&mut self, stat: u8, commanded: VideoFormat, now_ms: u64) -> SignalAction {
        self.last_check_ms = now_ms;
        self.state = SignalState::from_status(stat);

        let SignalState::Locked(input) = self.state else {
            self.clear_mismatch();
            return SignalAction::Keep;
        };

        if input == commanded {
            self.clear_mismatch();
            return SignalAction::Keep;
        }

        match self.mismatch_since_ms {
            None => {
                osd_debug!("video input {} differs from {}, debouncing", input, commanded);
                self.mismatch_since_ms = Some(now_ms);
                SignalAction::Keep
            }
            Some(since) if now_ms.saturating_sub(since) >= VIDEO_SIGNAL_DEBOUNCE_MS => {
                SignalAction::Reinit
            }
            Some(_) => SignalAction::Keep,
        }
    }

    /// Record the STAT value read during a reinit; the chip now matches the
    /// input, so any pending mismatch is resolved.
    pub fn reinitialized(&mut self, stat: u8) {
        self.state = SignalState::from_status(stat);
        self.mismatch_since_ms = None;
    }

    fn clear_mismatch(&mut self) {
        if self.mismatch_since_ms.take().is_some() {
            osd_debug!("video format mismatch cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::STAT_NTSC;

    const LOCKED_PAL: u8 = STAT_PAL;
    const LOCKED_NTSC: u8 = STAT_NTSC;
    const LOCKED_NEITHER: u8 = 0x00;
    const LOST: u8 = STAT_LOS;

    #[test]
    fn pal_requires_lock_and_pal_bit() {
        assert_eq!(VideoFormat::from_status(LOCKED_PAL), VideoFormat::Pal);
        assert_eq!(VideoFormat::from_status(LOCKED_NTSC), VideoFormat::Ntsc);
        assert_eq!(VideoFormat::from_status(LOCKED_NEITHER), VideoFormat::Ntsc);
        assert_eq!(VideoFormat::from_status(LOST | STAT_PAL), VideoFormat::Ntsc);
    }

    #[test]
    fn format_geometry_and_vm0() {
        assert_eq!(VideoFormat::Pal.cells(), 480);
        assert_eq!(VideoFormat::Ntsc.cells(), 390);
        assert_eq!(VideoFormat::Pal.rows(), 16);
        assert_eq!(VideoFormat::Ntsc.rows(), 13);
        assert_eq!(VideoFormat::Pal.vm0(), 0x48);
        assert_eq!(VideoFormat::Ntsc.vm0(), 0x08);
    }

    #[test]
    fn check_is_due_strictly_after_interval() {
        let mut monitor = SignalMonitor::new();
        assert!(!monitor.status_check_due(1000));
        assert!(monitor.status_check_due(1001));
        monitor.observe(LOCKED_PAL, VideoFormat::Pal, 1001);
        assert!(!monitor.status_check_due(2001));
        assert!(monitor.status_check_due(2002));
    }

    #[test]
    fn agreement_keeps_configuration() {
        let mut monitor = SignalMonitor::new();
        assert_eq!(monitor.observe(LOCKED_PAL, VideoFormat::Pal, 2000), SignalAction::Keep);
        assert_eq!(monitor.state(), SignalState::Locked(VideoFormat::Pal));
        assert_eq!(monitor.mismatch_since_ms(), None);
    }

    #[test]
    fn mismatch_is_debounced() {
        let mut monitor = SignalMonitor::new();
        assert_eq!(monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 2000), SignalAction::Keep);
        assert_eq!(monitor.mismatch_since_ms(), Some(2000));
        assert_eq!(monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 2099), SignalAction::Keep);
        assert_eq!(monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 2100), SignalAction::Reinit);
    }

    #[test]
    fn neither_bit_counts_as_ntsc_mismatch_against_pal() {
        let mut monitor = SignalMonitor::new();
        monitor.observe(LOCKED_NEITHER, VideoFormat::Pal, 2000);
        assert_eq!(monitor.state(), SignalState::Locked(VideoFormat::Ntsc));
        assert_eq!(
            monitor.observe(LOCKED_NEITHER, VideoFormat::Pal, 3500),
            SignalAction::Reinit
        );
    }

    #[test]
    fn loss_of_sync_clears_pending_mismatch() {
        let mut monitor = SignalMonitor::new();
        monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 2000);
        assert_eq!(monitor.observe(LOST, VideoFormat::Ntsc, 3100), SignalAction::Keep);
        assert_eq!(monitor.state(), SignalState::LossOfSync);
        assert_eq!(monitor.mismatch_since_ms(), None);
        // Restarts from scratch.
        assert_eq!(monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 4200), SignalAction::Keep);
        assert_eq!(monitor.mismatch_since_ms(), Some(4200));
    }

    #[test]
    fn agreement_before_debounce_clears_timer() {
        let mut monitor = SignalMonitor::new();
        monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 2000);
        monitor.observe(LOCKED_NTSC, VideoFormat::Ntsc, 2050);
        assert_eq!(monitor.mismatch_since_ms(), None);
        assert_eq!(monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 2200), SignalAction::Keep);
    }

    #[test]
    fn reinit_resolves_mismatch() {
        let mut monitor = SignalMonitor::new();
        monitor.observe(LOCKED_PAL, VideoFormat::Ntsc, 2000);
        monitor.reinitialized(LOCKED_PAL);
        assert_eq!(monitor.mismatch_since_ms(), None);
        assert_eq!(monitor.state(), SignalState::Locked(VideoFormat::Pal));
    }
}
