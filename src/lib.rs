//! `ad779x`
//!
//! A driver for the AD7798/AD7799 low-power sigma-delta ADC family from
//! Analog Devices, attached over a 4-wire SPI bus.
//!
//! The driver samples up to three input channels in round-robin order
//! without blocking the caller: feed [`Ad779x::step`] from your main loop
//! together with a reading of a monotonic millisecond clock, and it either
//! returns immediately (conversion still settling) or harvests the finished
//! conversion and starts the next channel. Stalled conversions are recovered
//! by resetting and reprogramming the device; the only place the driver
//! waits synchronously is the setup-time calibration sequence.

#![cfg_attr(not(test), no_std)]

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

pub mod config;
mod regs;

pub use config::{Channel, Coding, Config, Gain, UpdateRate};
pub use regs::{Model, OperatingMode, Register};

use regs::{
    CHANNEL_RETAIN_MASK, COMM_CREAD_ENTER, COMM_CREAD_EXIT, MODE_RETAIN_MASK, RESET_BYTE,
    STATUS_AD7799, STATUS_ERR, STATUS_NRDY,
};

/// Instant of the caller's monotonic millisecond clock.
pub type Instant = fugit::TimerInstantU32<1_000>;
/// Millisecond duration.
pub type Duration = fugit::MillisDurationU32;

/// Returned by [`Ad779x::raw`] for a channel outside the configured range.
pub const OUT_OF_RANGE: u32 = 0xFF_FFFF;

/// Give up on a calibration whose ready bit never asserts.
const CALIBRATION_TIMEOUT_MS: u32 = 2_000;

/// Driver error type
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The status register read all zeroes after a reset; no device is
    /// responding on the bus.
    NoDevice,
    /// A calibration did not complete within its time budget.
    CalibrationTimeout,
    /// An error with the underlying SPI bus
    Spi(E),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Spi(e)
    }
}

/// Driver for the AD7798/AD7799.
///
/// Owns the SPI device (chip select included) and a delay provider. All
/// register state the chip cannot be trusted to keep across faults is
/// mirrored here: the mode and configuration byte pairs are retained so
/// that a write to one sub-field (say, the channel select) leaves the
/// other bits exactly as last programmed.
pub struct Ad779x<SPI, D> {
    spi: SPI,
    delay: D,
    vref: f32,
    model: Model,
    config: Config,
    /// Last-written mode register byte pair.
    mode_reg: [u8; 2],
    /// Last-written configuration register byte pair.
    config_reg: [u8; 2],
    gain: f32,
    settle: Duration,
    channels: [u8; 3],
    channel_count: usize,
    cursor: usize,
    samples: [u32; 3],
    /// `None` while no conversion is in flight.
    started_at: Option<Instant>,
    needs_calibration: bool,
    cread: bool,
    fault_count: u32,
}

impl<SPI, D> Ad779x<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Create a new [Ad779x] from an SPI device, a delay provider and the
    /// applied reference voltage in volts.
    ///
    /// No bus traffic happens until [`Self::begin`].
    pub fn new(spi: SPI, delay: D, vref: f32) -> Self {
        let config = Config::default();
        Self {
            spi,
            delay,
            vref,
            model: Model::Ad7798,
            gain: config.gain.multiplier(),
            settle: config.update_rate.settle_time(),
            config,
            mode_reg: [0x40, 0x0A],
            config_reg: [0x07, 0x10],
            channels: [0, 1, 2],
            channel_count: 3,
            cursor: 0,
            samples: [0; 3],
            started_at: None,
            needs_calibration: false,
            cread: false,
            fault_count: 0,
        }
    }

    /// Reset the device and detect which family member is attached.
    ///
    /// Returns [`Error::NoDevice`] if the status register reads as zero,
    /// which is what a floating bus looks like after a reset.
    pub fn begin(&mut self) -> Result<(), Error<SPI::Error>> {
        self.reset_state();
        self.reset()?;
        let status = self.read_register(Register::Status)? as u8;
        if status == 0 {
            return Err(Error::NoDevice);
        }
        self.model = if status & STATUS_AD7799 != 0 {
            Model::Ad7799
        } else {
            Model::Ad7798
        };
        Ok(())
    }

    /// Select which channels take part in round-robin sampling, in order.
    ///
    /// At most three channels are kept; an empty slice leaves the previous
    /// selection in place.
    pub fn setup(&mut self, channels: &[Channel]) {
        if channels.is_empty() {
            return;
        }
        let count = channels.len().min(self.channels.len());
        for (slot, &ch) in self.channels.iter_mut().zip(&channels[..count]) {
            *slot = ch as u8;
        }
        self.channel_count = count;
        self.cursor = 0;
    }

    /// Apply a new configuration.
    ///
    /// Settle time and gain multiplier are recomputed for the fields that
    /// actually changed. A gain change that invalidates the previous
    /// full-scale calibration triggers an internal full-scale calibration
    /// of every configured channel; that sequence busy-polls the ready bit
    /// and is the only blocking path in the driver. Otherwise, if any
    /// packed register byte changed, the device is reprogrammed and parked
    /// in idle mode until the next conversion starts.
    pub fn configure(&mut self, config: Config) -> Result<(), Error<SPI::Error>> {
        let config_bytes = config.config_bytes();
        let mode_bytes = config.mode_bytes();

        if self.mode_reg[1] & 0x0F != config.update_rate as u8 {
            self.settle = config.update_rate.settle_time();
        }

        if self.config_reg[0] & 0x07 != config.gain as u8 {
            self.gain = config.gain.multiplier();
            let code = config.gain as u8;
            // Ranges the datasheet (p. 15, p. 24) calls out as needing a
            // fresh internal full-scale calibration after a gain change.
            if code <= 0x02
                || (code > 0x02 && config.update_rate as u8 <= 0x05)
                || code != 0x07
            {
                self.needs_calibration = true;
            }
        }

        if self.needs_calibration {
            self.config_reg = config_bytes;
            self.mode_reg = mode_bytes;
            self.config = config;
            self.calibrate(OperatingMode::InternalFullScale)?;
            self.needs_calibration = false;
        } else if self.config_reg != config_bytes || self.mode_reg != mode_bytes {
            self.config_reg = config_bytes;
            self.mode_reg = mode_bytes;
            self.config = config;
            self.write_register(Register::Configuration, 0)?;
            self.write_register(Register::Mode, OperatingMode::Idle as u32)?;
        }
        Ok(())
    }

    /// Advance the sampling loop; never blocks on a conversion.
    ///
    /// `now` is a reading of the caller's monotonic millisecond clock.
    /// Returns `Ok(true)` when a channel finished converting and its sample
    /// slot was updated. Before the filter settle time has elapsed the bus
    /// is not even polled.
    ///
    /// A conversion that shows no ready bit for longer than four settle
    /// times is treated as a stall: the device is reset, reprogrammed from
    /// the retained register bytes and the same channel is restarted, with
    /// [`Self::fault_count`] incremented once per episode.
    pub fn step(&mut self, now: Instant) -> Result<bool, Error<SPI::Error>> {
        let started = match self.started_at {
            None => {
                self.start_conversion()?;
                self.started_at = Some(now);
                return Ok(false);
            }
            Some(started) => started,
        };
        let elapsed = match now.checked_duration_since(started) {
            Some(elapsed) => elapsed,
            None => return Ok(false),
        };
        if elapsed < self.settle {
            return Ok(false);
        }

        let status = self.read_register(Register::Status)? as u8;
        if status & STATUS_NRDY != 0 {
            if elapsed > self.settle * 4 {
                self.fault_count += 1;
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "conversion stalled on channel {}, resetting (fault {})",
                    self.channels[self.cursor],
                    self.fault_count
                );
                self.reset()?;
                self.reprogram()?;
                self.start_conversion()?;
                self.started_at = Some(now);
            }
            return Ok(false);
        }

        if status & STATUS_ERR != 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("channel {} over- or underrange", self.channels[self.cursor]);
        }
        let channel = self.channels[self.cursor] as usize;
        self.samples[channel] = self.read_register(Register::Data)?;
        self.cursor = (self.cursor + 1) % self.channel_count;
        self.start_conversion()?;
        self.started_at = Some(now);
        Ok(true)
    }

    /// Most recent raw sample of a physical channel, or [`OUT_OF_RANGE`]
    /// when the index lies outside the configured channel count.
    pub fn raw(&self, channel: u8) -> u32 {
        if (channel as usize) < self.channel_count {
            self.samples[channel as usize]
        } else {
            OUT_OF_RANGE
        }
    }

    /// Most recent sample of a physical channel converted to millivolts.
    pub fn millivolts(&self, channel: u8) -> f32 {
        let raw = self.raw(channel) as f32;
        let full_scale = (1u32 << self.model.resolution_bits()) as f32;
        match self.config.coding {
            Coding::Unipolar => raw / full_scale * self.vref / self.gain * 1000.0,
            Coding::Bipolar => (raw / (full_scale / 2.0) - 1.0) * self.vref / self.gain * 1000.0,
        }
    }

    /// Snapshot of the status register.
    pub fn status(&mut self) -> Result<u8, Error<SPI::Error>> {
        Ok(self.read_register(Register::Status)? as u8)
    }

    /// Contents of the ID register.
    pub fn id(&mut self) -> Result<u8, Error<SPI::Error>> {
        Ok(self.read_register(Register::Id)? as u8)
    }

    /// Detected chip variant. Only meaningful after [`Self::begin`].
    pub fn model(&self) -> Model {
        self.model
    }

    /// Number of stall recoveries since construction.
    pub fn fault_count(&self) -> u32 {
        self.fault_count
    }

    /// Enter or leave continuous-read mode. In continuous-read mode the
    /// data register is read without the addressing phase. Idempotent.
    pub fn continuous_read(&mut self, enable: bool) -> Result<(), Error<SPI::Error>> {
        if enable == self.cread {
            return Ok(());
        }
        let command = if enable {
            COMM_CREAD_ENTER
        } else {
            COMM_CREAD_EXIT
        };
        self.spi.write(&[command])?;
        self.cread = enable;
        Ok(())
    }

    /// Read any register, assembled most-significant-byte first.
    ///
    /// Status, ID and IO are 8 bits; mode and configuration are 16 bits;
    /// data, offset and full-scale are 16 bits on the AD7798 and 24 bits
    /// on the AD7799.
    pub fn read_register(&mut self, register: Register) -> Result<u32, Error<SPI::Error>> {
        let mut buf = [0u8; 4];
        let payload = register.payload_len(self.model);
        let frame = if register == Register::Data && self.cread {
            // The addressing phase is implicit in continuous-read mode.
            &mut buf[..payload]
        } else {
            buf[0] = register.read_comm();
            &mut buf[..payload + 1]
        };
        let skip = frame.len() - payload;
        self.spi.transfer_in_place(frame)?;
        Ok(frame[skip..]
            .iter()
            .fold(0u32, |value, &byte| value << 8 | u32::from(byte)))
    }

    /// Write a register.
    ///
    /// Mode and configuration writes replace only one sub-field: the
    /// operating-mode bits of the mode register's first byte, or the
    /// channel-select bits of the configuration register's second byte.
    /// The remaining bits come from the retained byte pair, and both bytes
    /// are transmitted. IO takes a single verbatim byte; offset and
    /// full-scale are split most-significant-byte first. Writes to
    /// read-only registers are ignored.
    pub fn write_register(&mut self, register: Register, value: u32) -> Result<(), Error<SPI::Error>> {
        let mut buf = [0u8; 4];
        buf[0] = register.write_comm();
        let len = match register {
            Register::Configuration => {
                self.config_reg[1] = (self.config_reg[1] & CHANNEL_RETAIN_MASK)
                    | (value as u8 & !CHANNEL_RETAIN_MASK);
                buf[1] = self.config_reg[0];
                buf[2] = self.config_reg[1];
                3
            }
            Register::Mode => {
                self.mode_reg[0] =
                    (self.mode_reg[0] & MODE_RETAIN_MASK) | (value as u8 & !MODE_RETAIN_MASK);
                buf[1] = self.mode_reg[0];
                buf[2] = self.mode_reg[1];
                3
            }
            Register::Io => {
                buf[1] = value as u8;
                2
            }
            Register::Offset | Register::FullScale => {
                let payload = self.model.data_len();
                for (i, byte) in buf[1..payload + 1].iter_mut().enumerate() {
                    *byte = (value >> (8 * (payload - 1 - i))) as u8;
                }
                payload + 1
            }
            Register::Status | Register::Data | Register::Id => return Ok(()),
        };
        self.spi.transfer_in_place(&mut buf[..len])?;
        Ok(())
    }

    /// Give back the SPI device and delay provider
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    /// Put the device in single conversion mode on the channel at the
    /// cursor.
    fn start_conversion(&mut self) -> Result<(), Error<SPI::Error>> {
        let channel = self.channels[self.cursor];
        self.write_register(Register::Mode, OperatingMode::SingleConversion as u32)?;
        self.write_register(Register::Configuration, channel as u32)
    }

    /// Calibrate every configured channel in the given mode, busy-polling
    /// the ready bit with a bounded budget.
    fn calibrate(&mut self, mode: OperatingMode) -> Result<(), Error<SPI::Error>> {
        for i in 0..self.channel_count {
            let channel = self.channels[i];
            self.write_register(Register::Configuration, channel as u32)?;
            self.write_register(Register::Mode, mode as u32)?;
            let mut waited_ms = 0;
            while self.read_register(Register::Status)? as u8 & STATUS_NRDY != 0 {
                if waited_ms >= CALIBRATION_TIMEOUT_MS {
                    return Err(Error::CalibrationTimeout);
                }
                self.delay.delay_ms(1);
                waited_ms += 1;
            }
        }
        Ok(())
    }

    /// Rewrite the configuration and mode registers from the retained byte
    /// pairs, as after a device reset.
    fn reprogram(&mut self) -> Result<(), Error<SPI::Error>> {
        let channel_bits = self.config_reg[1] & !CHANNEL_RETAIN_MASK;
        let mode_bits = self.mode_reg[0] & !MODE_RETAIN_MASK;
        self.write_register(Register::Configuration, channel_bits as u32)?;
        self.write_register(Register::Mode, mode_bits as u32)
    }

    /// Clock in 32 ones to reset the serial interface and all registers,
    /// then wait the 500 us the datasheet requires before the next access.
    fn reset(&mut self) -> Result<(), Error<SPI::Error>> {
        self.spi.write(&[RESET_BYTE; 4])?;
        self.delay.delay_us(500);
        Ok(())
    }

    /// Restore the mirrored state to the device's power-on-reset values.
    fn reset_state(&mut self) {
        self.config = Config::default();
        self.mode_reg = [0x40, 0x0A];
        self.config_reg = [0x07, 0x10];
        self.gain = self.config.gain.multiplier();
        self.settle = self.config.update_rate.settle_time();
        self.channels = [0, 1, 2];
        self.channel_count = 3;
        self.cursor = 0;
        self.started_at = None;
        self.needs_calibration = false;
        self.cread = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{Error as SpiError, ErrorKind, ErrorType, Operation};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct MockError;

    impl SpiError for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[derive(Default)]
    struct BusState {
        status: u8,
        id: u8,
        data: VecDeque<u32>,
        /// Outgoing bytes of every transaction, in order.
        frames: Vec<Vec<u8>>,
    }

    #[derive(Clone)]
    struct MockBus(Rc<RefCell<BusState>>);

    impl MockBus {
        fn new(status: u8) -> Self {
            MockBus(Rc::new(RefCell::new(BusState {
                status,
                ..Default::default()
            })))
        }

        fn set_status(&self, status: u8) {
            self.0.borrow_mut().status = status;
        }

        fn push_data(&self, value: u32) {
            self.0.borrow_mut().data.push_back(value);
        }

        fn frames(&self) -> Vec<Vec<u8>> {
            self.0.borrow().frames.clone()
        }

        fn clear(&self) {
            self.0.borrow_mut().frames.clear();
        }
    }

    impl ErrorType for MockBus {
        type Error = MockError;
    }

    impl SpiDevice for MockBus {
        fn transaction(
            &mut self,
            operations: &mut [Operation<'_, u8>],
        ) -> Result<(), Self::Error> {
            let mut bus = self.0.borrow_mut();
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(words) => bus.frames.push(words.to_vec()),
                    Operation::TransferInPlace(words) => {
                        bus.frames.push(words.to_vec());
                        match words[0] {
                            // status read
                            0x40 if words.len() == 2 => words[1] = bus.status,
                            // id read
                            0x60 if words.len() == 2 => words[1] = bus.id,
                            // data read
                            0x58 if words.len() > 1 => {
                                let value = bus.data.pop_front().unwrap_or(0);
                                let payload = words.len() - 1;
                                for i in 0..payload {
                                    words[1 + i] = (value >> (8 * (payload - 1 - i))) as u8;
                                }
                            }
                            _ => {}
                        }
                    }
                    _ => panic!("unexpected SPI operation"),
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    /// A started AD7799 with a ready status and an empty frame log.
    fn ad7799() -> (Ad779x<MockBus, NoDelay>, MockBus) {
        let bus = MockBus::new(0x88);
        let mut adc = Ad779x::new(bus.clone(), NoDelay, 2.5);
        adc.begin().unwrap();
        assert_eq!(adc.model(), Model::Ad7799);
        bus.set_status(0x08);
        bus.clear();
        (adc, bus)
    }

    #[test]
    fn begin_fails_without_a_device() {
        let bus = MockBus::new(0x00);
        let mut adc = Ad779x::new(bus, NoDelay, 2.5);
        assert_eq!(adc.begin(), Err(Error::NoDevice));
    }

    #[test]
    fn register_framing_widths_match_the_register_map() {
        for (status, model, data_len) in
            [(0x80u8, Model::Ad7798, 2usize), (0x88, Model::Ad7799, 3)]
        {
            let bus = MockBus::new(status);
            let mut adc = Ad779x::new(bus.clone(), NoDelay, 2.5);
            adc.begin().unwrap();
            assert_eq!(adc.model(), model);

            let widths = [
                (Register::Status, 1),
                (Register::Id, 1),
                (Register::Io, 1),
                (Register::Mode, 2),
                (Register::Configuration, 2),
                (Register::Data, data_len),
                (Register::Offset, data_len),
                (Register::FullScale, data_len),
            ];
            for (register, payload) in widths {
                bus.clear();
                adc.read_register(register).unwrap();
                let frames = bus.frames();
                assert_eq!(frames.len(), 1);
                assert_eq!(frames[0].len(), 1 + payload, "{:?} on {:?}", register, model);
                assert_eq!(frames[0][0], register as u8 | 0x40);
            }
        }
    }

    #[test]
    fn offset_writes_split_the_value_by_model_width() {
        let (mut adc, bus) = ad7799();
        adc.write_register(Register::Offset, 0x0123_45).unwrap();
        assert_eq!(bus.frames(), [vec![0x30, 0x01, 0x23, 0x45]]);

        let bus = MockBus::new(0x80);
        let mut adc = Ad779x::new(bus.clone(), NoDelay, 2.5);
        adc.begin().unwrap();
        bus.clear();
        adc.write_register(Register::FullScale, 0x0123_45).unwrap();
        assert_eq!(bus.frames(), [vec![0x38, 0x23, 0x45]]);
    }

    #[test]
    fn partial_writes_preserve_sibling_bytes() {
        let (mut adc, bus) = ad7799();
        adc.configure(Config {
            coding: Coding::Unipolar,
            update_rate: UpdateRate::Sps17,
            ..Config::default()
        })
        .unwrap();
        bus.clear();

        // Selecting a channel must keep the gain/coding/burnout byte.
        adc.write_register(Register::Configuration, 0x02).unwrap();
        // Selecting an operating mode must keep the update-rate byte.
        adc.write_register(Register::Mode, OperatingMode::SingleConversion as u32)
            .unwrap();

        let frames = bus.frames();
        assert_eq!(frames[0], vec![0x10, 0x17, 0x12]);
        assert_eq!(frames[1], vec![0x08, 0x20, 0x09]);
    }

    #[test]
    fn round_robin_covers_each_channel_once_per_cycle() {
        let (mut adc, bus) = ad7799();
        adc.setup(&[Channel::Ain1, Channel::Ain2, Channel::Ain3]);

        // First call only arms channel 0.
        assert!(!adc.step(Instant::from_ticks(0)).unwrap());

        for value in [111, 222, 333] {
            bus.push_data(value);
        }
        for i in 1..=3u32 {
            assert!(adc.step(Instant::from_ticks(120 * i)).unwrap());
        }

        assert_eq!(adc.raw(0), 111);
        assert_eq!(adc.raw(1), 222);
        assert_eq!(adc.raw(2), 333);

        // Channel selects on the wire: the armed channel, then each
        // successor, wrapping back to channel 0.
        let selected: Vec<u8> = bus
            .frames()
            .iter()
            .filter(|frame| frame[0] == 0x10)
            .map(|frame| frame[2] & 0x07)
            .collect();
        assert_eq!(selected, vec![0, 1, 2, 0]);
    }

    #[test]
    fn early_step_does_not_touch_the_bus() {
        let (mut adc, bus) = ad7799();
        adc.setup(&[Channel::Ain1]);
        adc.step(Instant::from_ticks(0)).unwrap();
        bus.clear();

        assert!(!adc.step(Instant::from_ticks(119)).unwrap());
        assert!(bus.frames().is_empty());
    }

    #[test]
    fn stall_recovery_counts_one_fault_per_episode() {
        let (mut adc, bus) = ad7799();
        bus.set_status(0x88); // ready never asserts
        adc.setup(&[Channel::Ain1, Channel::Ain2]);
        adc.step(Instant::from_ticks(0)).unwrap();

        // Not ready but within four settle times: no fault yet.
        assert!(!adc.step(Instant::from_ticks(130)).unwrap());
        assert_eq!(adc.fault_count(), 0);

        bus.clear();
        assert!(!adc.step(Instant::from_ticks(481)).unwrap());
        assert_eq!(adc.fault_count(), 1);
        let frames = bus.frames();
        assert!(frames.contains(&vec![0xFF; 4]), "device reset expected");
        // The same channel is restarted.
        let restarted = frames
            .iter()
            .filter(|frame| frame[0] == 0x10)
            .map(|frame| frame[2] & 0x07)
            .last()
            .unwrap();
        assert_eq!(restarted, 0);

        // The stall clock restarted with the recovery.
        assert!(!adc.step(Instant::from_ticks(610)).unwrap());
        assert_eq!(adc.fault_count(), 1);

        // A full second episode elapses.
        assert!(!adc.step(Instant::from_ticks(962)).unwrap());
        assert_eq!(adc.fault_count(), 2);
    }

    #[test]
    fn unipolar_half_scale_is_half_the_reference() {
        let (mut adc, _bus) = ad7799();
        adc.configure(Config {
            gain: Gain::X1,
            coding: Coding::Unipolar,
            ..Config::default()
        })
        .unwrap();
        adc.samples[0] = 0x80_0000;
        assert!((adc.millivolts(0) - 1250.0).abs() < 1e-3);
    }

    #[test]
    fn bipolar_three_quarter_scale_is_half_the_reference() {
        let (mut adc, _bus) = ad7799();
        adc.configure(Config {
            gain: Gain::X1,
            coding: Coding::Bipolar,
            ..Config::default()
        })
        .unwrap();
        adc.samples[0] = 0xC0_0000;
        assert!((adc.millivolts(0) - 1250.0).abs() < 1e-3);
    }

    #[test]
    fn out_of_range_channel_returns_the_sentinel() {
        let (adc, _bus) = ad7799();
        assert_eq!(adc.raw(5), OUT_OF_RANGE);
    }

    #[test]
    fn continuous_read_elides_the_address_phase() {
        let (mut adc, bus) = ad7799();
        adc.continuous_read(true).unwrap();
        adc.continuous_read(true).unwrap(); // idempotent
        adc.read_register(Register::Data).unwrap();
        adc.continuous_read(false).unwrap();

        let frames = bus.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], vec![0x5C]);
        assert_eq!(frames[1].len(), 3, "payload only, no comm byte");
        assert_eq!(frames[2], vec![0x58]);
    }

    #[test]
    fn gain_change_calibrates_each_configured_channel() {
        let (mut adc, bus) = ad7799();
        adc.setup(&[Channel::Ain1, Channel::Ain3]);
        adc.configure(Config {
            gain: Gain::X4,
            ..Config::default()
        })
        .unwrap();

        let frames = bus.frames();
        let selected: Vec<u8> = frames
            .iter()
            .filter(|frame| frame[0] == 0x10)
            .map(|frame| frame[2] & 0x07)
            .collect();
        assert_eq!(selected, vec![0, 2]);
        let calibrations = frames
            .iter()
            .filter(|frame| frame[0] == 0x08 && frame[1] & 0xE0 == 0xA0)
            .count();
        assert_eq!(calibrations, 2);
    }

    #[test]
    fn calibration_gives_up_if_ready_never_asserts() {
        let (mut adc, bus) = ad7799();
        bus.set_status(0x88);
        let err = adc
            .configure(Config {
                gain: Gain::X2,
                ..Config::default()
            })
            .unwrap_err();
        assert_eq!(err, Error::CalibrationTimeout);
    }
}
