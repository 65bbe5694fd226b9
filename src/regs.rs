//! Register map and communication-byte layout of the AD7798/AD7799.
//!
//! Every bus access starts with a write to the communication register:
//!
//! | Bit  | Name      | Meaning                                           |
//! | :--- | :---      | :---                                              |
//! | 7    | `~WEN`    | Must be 0 to clock data into the register         |
//! | 6    | `R/~W`    | 1 for a read of the selected register             |
//! | 5:3  | `RS2-RS0` | Register selection                                |
//! | 2    | `CREAD`   | Continuous read of the data register              |
//! | 1:0  | -         | Always 0                                          |

/// `R/~W` bit of the communication byte.
pub(crate) const COMM_READ: u8 = 0x40;

/// Communication byte that latches continuous-read mode.
pub(crate) const COMM_CREAD_ENTER: u8 = 0x5C;
/// Communication byte that leaves continuous-read mode.
pub(crate) const COMM_CREAD_EXIT: u8 = 0x58;

/// Clocking 32 ones resets the serial interface and all registers.
pub(crate) const RESET_BYTE: u8 = 0xFF;

/// Status register: `~RDY`, low once a conversion or calibration finished.
pub(crate) const STATUS_NRDY: u8 = 0x80;
/// Status register: set on an over- or underrange conversion result.
pub(crate) const STATUS_ERR: u8 = 0x40;
/// Status register: set on an AD7799, clear on an AD7798.
pub(crate) const STATUS_AD7799: u8 = 0x08;

/// Bits of the mode register's first byte that survive an operating-mode
/// write (power switch plus the always-zero bits).
pub(crate) const MODE_RETAIN_MASK: u8 = 0x1F;
/// Bits of the configuration register's second byte that survive a channel
/// select write (reference detect, buffer, always-zero bits).
pub(crate) const CHANNEL_RETAIN_MASK: u8 = 0xF8;

/// Chip variant, reported by bit 3 of the status register.
///
/// The two parts share a register map and differ only in the width of the
/// data, offset and full-scale registers: 16 bits on the AD7798, 24 bits
/// on the AD7799.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Model {
    Ad7798,
    Ad7799,
}

impl Model {
    /// Width in bytes of the data, offset and full-scale registers.
    pub(crate) fn data_len(self) -> usize {
        match self {
            Model::Ad7798 => 2,
            Model::Ad7799 => 3,
        }
    }

    /// ADC resolution in bits.
    pub(crate) fn resolution_bits(self) -> u32 {
        match self {
            Model::Ad7798 => 16,
            Model::Ad7799 => 24,
        }
    }
}

/// On-chip registers, pre-shifted into the `RS2-RS0` position of the
/// communication byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Status = 0x00,
    Mode = 0x08,
    Configuration = 0x10,
    Data = 0x18,
    Id = 0x20,
    Io = 0x28,
    Offset = 0x30,
    FullScale = 0x38,
}

impl Register {
    /// Communication byte selecting this register for a read.
    pub(crate) fn read_comm(self) -> u8 {
        self as u8 | COMM_READ
    }

    /// Communication byte selecting this register for a write.
    pub(crate) fn write_comm(self) -> u8 {
        self as u8
    }

    /// Number of payload bytes behind this register.
    pub(crate) fn payload_len(self, model: Model) -> usize {
        match self {
            Register::Status | Register::Id | Register::Io => 1,
            Register::Mode | Register::Configuration => 2,
            Register::Data | Register::Offset | Register::FullScale => model.data_len(),
        }
    }
}

/// Operating modes, pre-shifted into bits 7:5 of the mode register's
/// first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OperatingMode {
    Continuous = 0x00,
    SingleConversion = 0x20,
    Idle = 0x40,
    PowerDown = 0x60,
    InternalZeroScale = 0x80,
    InternalFullScale = 0xA0,
    SystemZeroScale = 0xC0,
    SystemFullScale = 0xE0,
}
