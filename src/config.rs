//! Configuration types packed into the AD779x mode and configuration registers

use crate::Duration;

/// Physical input channels.
///
/// The values are the `CH2-CH0` codes of the configuration register's
/// second byte. Each channel keeps its own calibration register pair
/// inside the device.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    /// AIN1(+)/AIN1(-)
    Ain1 = 0,
    /// AIN2(+)/AIN2(-)
    Ain2 = 1,
    /// AIN3(+)/AIN3(-)
    Ain3 = 2,
}

/// In-amp gain, `G2-G0` in the configuration register's first byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    X1 = 0x01,
    X2 = 0x02,
    X4 = 0x03,
    X8 = 0x04,
    X16 = 0x05,
    X32 = 0x06,
    X64 = 0x07,
}

impl Gain {
    /// Numeric multiplier applied to the input signal: 2^(code - 1).
    pub fn multiplier(self) -> f32 {
        (1u32 << (self as u8 - 1)) as f32
    }
}

/// Output coding, the `U/~B` bit of the configuration register.
///
/// Unipolar spans `[0, vref/gain)`; bipolar centers the same span on zero,
/// with mid-scale output for a zero-volt input.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Coding {
    Bipolar = 0,
    Unipolar = 1,
}

/// Filter update rate, `FS3-FS0` in the mode register's second byte.
///
/// Slower rates trade throughput for mains rejection. The settle time is
/// how long a conversion takes to propagate through the sinc filter after
/// a channel change; the scheduler will not poll for a result before it
/// has elapsed.
///
/// | Code  | Rate      | Rejection           | Settle  |
/// | :---  | :---      | :---                | ---:    |
/// | `0x1` | 470 Hz    | -                   | 4 ms    |
/// | `0x2` | 242 Hz    | -                   | 8 ms    |
/// | `0x3` | 123 Hz    | -                   | 16 ms   |
/// | `0x4` | 62 Hz     | -                   | 32 ms   |
/// | `0x5` | 50 Hz     | -                   | 40 ms   |
/// | `0x6` | 39 Hz     | -                   | 48 ms   |
/// | `0x7` | 33.2 Hz   | -                   | 60 ms   |
/// | `0x8` | 19.6 Hz   | 90 dB at 60 Hz      | 101 ms  |
/// | `0x9` | 16.7 Hz   | 80 dB at 50 Hz      | 120 ms  |
/// | `0xA` | 16.7 Hz   | 65 dB at 50/60 Hz   | 120 ms  |
/// | `0xB` | 12.5 Hz   | 66 dB at 50/60 Hz   | 160 ms  |
/// | `0xC` | 10 Hz     | 69 dB at 50/60 Hz   | 200 ms  |
/// | `0xD` | 8.33 Hz   | 70 dB at 50/60 Hz   | 240 ms  |
/// | `0xE` | 6.25 Hz   | 72 dB at 50/60 Hz   | 320 ms  |
/// | `0xF` | 4.17 Hz   | 74 dB at 50/60 Hz   | 480 ms  |
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UpdateRate {
    /// 470 Hz
    Sps470 = 0x1,
    /// 242 Hz
    Sps242 = 0x2,
    /// 123 Hz
    Sps123 = 0x3,
    /// 62 Hz
    Sps62 = 0x4,
    /// 50 Hz
    Sps50 = 0x5,
    /// 39 Hz
    Sps39 = 0x6,
    /// 33.2 Hz
    Sps33 = 0x7,
    /// 19.6 Hz, 90 dB rejection at 60 Hz
    Sps19 = 0x8,
    /// 16.7 Hz, 80 dB rejection at 50 Hz
    Sps17 = 0x9,
    /// 16.7 Hz, 65 dB rejection at 50 Hz and 60 Hz
    Sps16 = 0xA,
    /// 12.5 Hz
    Sps12 = 0xB,
    /// 10 Hz
    Sps10 = 0xC,
    /// 8.33 Hz
    Sps8 = 0xD,
    /// 6.25 Hz
    Sps6 = 0xE,
    /// 4.17 Hz
    Sps4 = 0xF,
}

impl UpdateRate {
    /// Filter settling time for this rate (datasheet table 9).
    pub fn settle_time(self) -> Duration {
        Duration::millis(match self {
            UpdateRate::Sps470 => 4,
            UpdateRate::Sps242 => 8,
            UpdateRate::Sps123 => 16,
            UpdateRate::Sps62 => 32,
            UpdateRate::Sps50 => 40,
            UpdateRate::Sps39 => 48,
            UpdateRate::Sps33 => 60,
            UpdateRate::Sps19 => 101,
            UpdateRate::Sps17 | UpdateRate::Sps16 => 120,
            UpdateRate::Sps12 => 160,
            UpdateRate::Sps10 => 200,
            UpdateRate::Sps8 => 240,
            UpdateRate::Sps6 => 320,
            UpdateRate::Sps4 => 480,
        })
    }
}

/// User-facing device configuration.
///
/// Packed into the mode and configuration register byte pairs:
///
/// | Byte            | Bit  | Field                          |
/// | :---            | :--- | :---                           |
/// | config first    | 5    | burnout current                |
/// | config first    | 4    | unipolar/bipolar coding        |
/// | config first    | 2:0  | gain                           |
/// | config second   | 5    | reference detect               |
/// | config second   | 4    | input buffer                   |
/// | config second   | 2:0  | channel select (not held here) |
/// | mode first      | 7:5  | operating mode (not held here) |
/// | mode first      | 4    | power switch                   |
/// | mode second     | 3:0  | update rate                    |
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub gain: Gain,
    pub coding: Coding,
    pub update_rate: UpdateRate,
    /// Input buffer; may only be disabled at gains of 1 or 2.
    pub buffer: bool,
    /// Flag a missing or shorted reference in the status register.
    pub ref_detect: bool,
    /// 100 nA burnout currents for open-sensor detection.
    pub burnout_current: bool,
    /// Close the low-side power switch between conversions.
    pub power_switch: bool,
}

impl Default for Config {
    /// Power-on-reset state of the device: mode `0x400A`, configuration
    /// `0x0710`.
    fn default() -> Self {
        Self {
            gain: Gain::X64,
            coding: Coding::Bipolar,
            update_rate: UpdateRate::Sps16,
            buffer: true,
            ref_detect: false,
            burnout_current: false,
            power_switch: false,
        }
    }
}

impl Config {
    /// Configuration register byte pair, channel select bits left clear.
    pub(crate) fn config_bytes(&self) -> [u8; 2] {
        let first = ((self.burnout_current as u8) << 5)
            | ((self.coding as u8) << 4)
            | (self.gain as u8 & 0x07);
        let second = ((self.ref_detect as u8) << 5) | ((self.buffer as u8) << 4);
        [first, second]
    }

    /// Mode register byte pair, operating mode bits left clear.
    pub(crate) fn mode_bytes(&self) -> [u8; 2] {
        [
            (self.power_switch as u8) << 4,
            self.update_rate as u8 & 0x0F,
        ]
    }
}
