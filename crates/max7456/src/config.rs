//! Driver configuration.
//!
//! Every field maps onto chip register bits; the defaults reproduce the
//! bring-up the flight controller firmware has always used:
//!
//! | Register | Default | Meaning |
//! |----------|---------|---------|
//! | RB0..RB15 | `0x01` | white 100 %, black 0 % |
//! | VM1      | `0x4C` | background 28 %, blink time 3, duty 50/50 |

use platform::BusSpeed;

use crate::registers::{VM1_BACKGROUND_SHIFT, VM1_BLINK_TIME_MASK, VM1_DUTY_MASK};

/// Default name of the font asset.
pub const DEFAULT_FONT_ASSET: &str = "osd_font.bin";

/// Character white level, relative to the video signal (RBn bits 1..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WhiteLevel {
    /// 120 %
    Percent120 = 0,
    /// 100 %
    #[default]
    Percent100 = 1,
    /// 90 %
    Percent90 = 2,
    /// 80 %
    Percent80 = 3,
}

/// Character black level, relative to the video signal (RBn bits 3..2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BlackLevel {
    /// 0 %
    #[default]
    Percent0 = 0,
    /// 10 %
    Percent10 = 1,
    /// 20 %
    Percent20 = 2,
    /// 30 %
    Percent30 = 3,
}

/// Blink on:off ratio (VM1 bits 1..0). `BT` is the blink time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BlinkDuty {
    /// BT : BT (50/50)
    #[default]
    Even = 0,
    /// BT : 2BT (33/66)
    OneThird = 1,
    /// BT : 3BT (25/75)
    OneQuarter = 2,
    /// 3BT : BT (75/25)
    ThreeQuarters = 3,
}

/// Blink time in video fields (VM1 bits 3..2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BlinkTime {
    /// 2 fields
    Fields2 = 0,
    /// 4 fields
    Fields4 = 1,
    /// 6 fields
    Fields6 = 2,
    /// 8 fields
    #[default]
    Fields8 = 3,
}

/// Brightness of the OSD background, in 7 % steps (VM1 bits 6..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BackgroundBrightness {
    /// 0 %
    Percent0 = 0,
    /// 7 %
    Percent7 = 1,
    /// 14 %
    Percent14 = 2,
    /// 21 %
    Percent21 = 3,
    /// 28 %
    #[default]
    Percent28 = 4,
    /// 35 %
    Percent35 = 5,
    /// 42 %
    Percent42 = 6,
    /// 49 %
    Percent49 = 7,
}

/// Configuration for [`crate::Max7456`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Max7456Config {
    /// Name of the font image in the asset store.
    pub font_asset: &'static str,
    /// Character white level, all rows.
    pub white_level: WhiteLevel,
    /// Character black level, all rows.
    pub black_level: BlackLevel,
    /// Blink on:off ratio.
    pub blink_duty: BlinkDuty,
    /// Blink period.
    pub blink_time: BlinkTime,
    /// Background brightness.
    pub background: BackgroundBrightness,
    /// Bus clock requested at bring-up.
    pub bus_speed: BusSpeed,
    /// Upload the font to NVM on the next flush. Cleared once attempted.
    pub update_font: bool,
}

impl Default for Max7456Config {
    fn default() -> Self {
        Self {
            font_asset: DEFAULT_FONT_ASSET,
            white_level: WhiteLevel::default(),
            black_level: BlackLevel::default(),
            blink_duty: BlinkDuty::default(),
            blink_time: BlinkTime::default(),
            background: BackgroundBrightness::default(),
            bus_speed: BusSpeed::default(),
            update_font: false,
        }
    }
}

impl Max7456Config {
    /// Value written to every row brightness register: `(black << 2) | white`.
    pub const fn row_brightness(&self) -> u8 {
        ((self.black_level as u8) << 2) | self.white_level as u8
    }

    /// Value written to VM1.
    pub const fn vm1(&self) -> u8 {
        ((self.background as u8) << VM1_BACKGROUND_SHIFT)
            | (((self.blink_time as u8) << 2) & VM1_BLINK_TIME_MASK)
            | ((self.blink_duty as u8) & VM1_DUTY_MASK)
    }
}
