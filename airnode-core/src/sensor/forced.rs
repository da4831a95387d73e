//! Register-level forced-mode driver
//!
//! Drives a BME68x-class temperature/humidity/pressure/gas sensor over any
//! [`BusTransport`]. Only register encoding lives here; turning raw ADC words
//! into physical units is the job of a [`Compensation`] implementation.

use fugit::MicrosDurationU32;

use crate::constants::registers::*;
use crate::errors::{BusError, BusResult};
use crate::sample::{PhysicalSample, SampleStatus};
use crate::sensor::{HeaterConfig, RawMeasurement, SensorConfig};
use crate::time::Timestamp;
use crate::traits::{BusTransport, Compensation, SensorDevice};

/// Chip-id reads after a soft reset before giving up
const INIT_POLL_LIMIT: u8 = 5;

/// Settle time after soft reset
const RESET_DELAY_US: u32 = 10_000;

/// ADC time per oversampling cycle, µs
const CYCLE_US: u32 = 1963;

/// Channel switching overhead (4 for T/P/H, 5 for gas), µs
const SWITCH_US: u32 = 477 * 9;

/// Wake-up from sleep, µs
const WAKEUP_US: u32 = 1000;

/// Forced-mode sensor on a register bus
pub struct ForcedModeSensor<B, C> {
    bus: B,
    compensation: C,
    config: SensorConfig,
    heater: HeaterConfig,
}

impl<B: BusTransport, C: Compensation> ForcedModeSensor<B, C> {
    /// Wrap a bus; call [`init`](Self::init) before first use
    pub fn new(bus: B, compensation: C) -> Self {
        Self {
            bus,
            compensation,
            config: SensorConfig::default(),
            heater: HeaterConfig::off(),
        }
    }

    /// Soft-reset the device and wait for it to identify itself
    ///
    /// Fails with [`BusError::Stuck`] if the chip id never reads back
    /// correctly within a bounded number of polls.
    pub fn init(&mut self) -> BusResult<()> {
        self.bus.write(REG_RESET, &[RESET_CMD])?;
        self.bus.delay(MicrosDurationU32::micros(RESET_DELAY_US));

        let mut id = [0u8; 1];
        for _ in 0..INIT_POLL_LIMIT {
            self.bus.read(REG_CHIP_ID, &mut id)?;
            if id[0] == CHIP_ID {
                log_debug!("sensor: chip id {:#04x} after reset", id[0]);
                self.config = SensorConfig::default();
                self.heater = HeaterConfig::off();
                return Ok(());
            }
            self.bus.delay(MicrosDurationU32::micros(RESET_DELAY_US));
        }

        log_error!("sensor: chip id {:#04x} does not match {:#04x}", id[0], CHIP_ID);
        Err(BusError::Stuck { polls: INIT_POLL_LIMIT })
    }

    /// Give the bus and compensation back
    pub fn release(self) -> (B, C) {
        (self.bus, self.compensation)
    }

    fn meas_control(&self, mode: u8) -> u8 {
        (self.config.os_temperature.code() << 5)
            | (self.config.os_pressure.code() << 2)
            | (mode & MODE_MASK)
    }
}

/// Encode a heater wait time into the `gas_wait` register format
///
/// Six bits of mantissa, two bits of x4 multiplier. Durations at or above
/// the encodable maximum saturate to `0xFF`.
pub(crate) fn encode_gas_wait(duration_ms: u16) -> u8 {
    if duration_ms >= MAX_GAS_WAIT_MS {
        return 0xFF;
    }
    let mut dur = duration_ms;
    let mut factor: u8 = 0;
    while dur > 0x3F {
        dur /= 4;
        factor += 1;
    }
    dur as u8 + factor * 64
}

/// Split the field-0 register block into raw ADC words
pub(crate) fn decode_field(b: &[u8; FIELD0_LEN]) -> RawMeasurement {
    RawMeasurement {
        new_data: b[0] & STATUS_NEW_DATA != 0,
        measuring: b[0] & STATUS_MEASURING != 0,
        pressure_adc: (u32::from(b[2]) << 12) | (u32::from(b[3]) << 4) | (u32::from(b[4]) >> 4),
        temperature_adc: (u32::from(b[5]) << 12) | (u32::from(b[6]) << 4) | (u32::from(b[7]) >> 4),
        humidity_adc: (u16::from(b[8]) << 8) | u16::from(b[9]),
        gas_adc: (u16::from(b[13]) << 2) | (u16::from(b[14]) >> 6),
        gas_range: b[14] & GAS_RANGE_MASK,
        gas_valid: b[14] & GAS_VALID != 0,
        heat_stable: b[14] & HEAT_STABLE != 0,
    }
}

impl<B: BusTransport, C: Compensation> SensorDevice for ForcedModeSensor<B, C> {
    fn config(&self) -> SensorConfig {
        self.config
    }

    fn heater_config(&self) -> HeaterConfig {
        self.heater
    }

    fn set_config(&mut self, config: &SensorConfig) -> BusResult<()> {
        // ctrl_hum only latches on the following ctrl_meas write
        self.bus.write(REG_CTRL_HUM, &[config.os_humidity.code()])?;
        self.bus.write(REG_CONFIG, &[config.filter.code() << 2])?;
        let ctrl_meas = (config.os_temperature.code() << 5)
            | (config.os_pressure.code() << 2)
            | MODE_SLEEP;
        self.bus.write(REG_CTRL_MEAS, &[ctrl_meas])?;
        self.config = *config;
        Ok(())
    }

    fn set_heater_config(&mut self, heater: &HeaterConfig) -> BusResult<()> {
        if heater.enabled {
            let res_heat = self.compensation.heater_resistance(heater.target_celsius);
            self.bus.write(REG_RES_HEAT_0, &[res_heat])?;
            self.bus.write(REG_GAS_WAIT_0, &[encode_gas_wait(heater.duration_ms)])?;
            self.bus.write(REG_CTRL_GAS_0, &[0])?;
            self.bus.write(REG_CTRL_GAS_1, &[RUN_GAS])?;
        } else {
            self.bus.write(REG_CTRL_GAS_0, &[HEAT_OFF])?;
            self.bus.write(REG_CTRL_GAS_1, &[0])?;
        }
        self.heater = *heater;
        Ok(())
    }

    fn trigger(&mut self) -> BusResult<()> {
        let ctrl_meas = self.meas_control(MODE_FORCED);
        self.bus.write(REG_CTRL_MEAS, &[ctrl_meas])
    }

    fn measurement_duration(&self) -> MicrosDurationU32 {
        let cycles = self.config.os_temperature.cycles()
            + self.config.os_pressure.cycles()
            + self.config.os_humidity.cycles();
        let mut us = cycles * CYCLE_US + SWITCH_US + WAKEUP_US;
        if self.heater.enabled {
            us += u32::from(self.heater.duration_ms) * 1000;
        }
        MicrosDurationU32::micros(us)
    }

    fn poll_sample(&mut self, timestamp: Timestamp) -> nb::Result<PhysicalSample, BusError> {
        let mut block = [0u8; FIELD0_LEN];
        self.bus.read(REG_FIELD0, &mut block)?;

        let raw = decode_field(&block);
        if raw.measuring || !raw.new_data {
            return Err(nb::Error::WouldBlock);
        }

        let values = self.compensation.compensate(&raw);

        let mut status = SampleStatus::NEW_DATA;
        let mut sample = PhysicalSample::new(timestamp);
        if self.config.os_temperature.is_enabled() {
            sample = sample.with_temperature(values.temperature);
        }
        if self.config.os_pressure.is_enabled() {
            sample = sample.with_pressure(values.pressure);
        }
        if self.config.os_humidity.is_enabled() {
            sample = sample.with_humidity(values.humidity);
        }
        if self.heater.enabled && raw.gas_valid {
            status.set(SampleStatus::GAS_VALID);
            if raw.heat_stable {
                status.set(SampleStatus::HEAT_STABLE);
            }
            if let Some(ohm) = values.gas_resistance {
                sample = sample.with_gas_resistance(ohm);
            }
        }

        Ok(sample.with_status(status))
    }

    fn delay(&mut self, duration: MicrosDurationU32) {
        self.bus.delay(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Compensated, Filter, Oversampling};

    struct RegisterFile {
        regs: [u8; 256],
        writes: std::vec::Vec<(u8, u8)>,
        chip_id: u8,
    }

    impl RegisterFile {
        fn new() -> Self {
            Self { regs: [0; 256], writes: std::vec::Vec::new(), chip_id: CHIP_ID }
        }
    }

    impl BusTransport for RegisterFile {
        fn read(&mut self, register: u8, buf: &mut [u8]) -> BusResult<()> {
            if register == REG_CHIP_ID {
                buf[0] = self.chip_id;
                return Ok(());
            }
            let start = register as usize;
            buf.copy_from_slice(&self.regs[start..start + buf.len()]);
            Ok(())
        }

        fn write(&mut self, register: u8, data: &[u8]) -> BusResult<()> {
            for (i, byte) in data.iter().enumerate() {
                self.regs[register as usize + i] = *byte;
                self.writes.push((register + i as u8, *byte));
            }
            Ok(())
        }

        fn delay(&mut self, _duration: MicrosDurationU32) {}
    }

    /// Passes ADC words through as physical values
    struct Identity;

    impl Compensation for Identity {
        fn compensate(&mut self, raw: &RawMeasurement) -> Compensated {
            Compensated {
                temperature: raw.temperature_adc as f32,
                pressure: raw.pressure_adc as f32,
                humidity: raw.humidity_adc as f32,
                gas_resistance: Some(raw.gas_adc as f32),
            }
        }

        fn heater_resistance(&self, target_celsius: u16) -> u8 {
            (target_celsius / 4) as u8
        }
    }

    fn sensor() -> ForcedModeSensor<RegisterFile, Identity> {
        ForcedModeSensor::new(RegisterFile::new(), Identity)
    }

    #[test]
    fn init_checks_chip_id() {
        let mut dev = sensor();
        assert_eq!(dev.init(), Ok(()));
        assert_eq!(dev.bus.writes[0], (REG_RESET, RESET_CMD));

        let mut wrong = ForcedModeSensor::new(RegisterFile { chip_id: 0x00, ..RegisterFile::new() }, Identity);
        assert_eq!(wrong.init(), Err(BusError::Stuck { polls: INIT_POLL_LIMIT }));
    }

    #[test]
    fn config_encodes_control_registers() {
        let mut dev = sensor();
        let config = SensorConfig {
            os_temperature: Oversampling::X2,
            os_pressure: Oversampling::X16,
            os_humidity: Oversampling::X1,
            filter: Filter::Coeff3,
        };
        dev.set_config(&config).unwrap();

        assert_eq!(dev.bus.regs[REG_CTRL_HUM as usize], 0b001);
        assert_eq!(dev.bus.regs[REG_CONFIG as usize], 0b010 << 2);
        assert_eq!(dev.bus.regs[REG_CTRL_MEAS as usize], (0b010 << 5) | (0b101 << 2));
        assert_eq!(dev.config(), config);

        dev.trigger().unwrap();
        assert_eq!(dev.bus.regs[REG_CTRL_MEAS as usize] & MODE_MASK, MODE_FORCED);
    }

    #[test]
    fn heater_profile_slot_zero() {
        let mut dev = sensor();
        dev.set_heater_config(&HeaterConfig { enabled: true, target_celsius: 320, duration_ms: 150 })
            .unwrap();
        assert_eq!(dev.bus.regs[REG_RES_HEAT_0 as usize], 80);
        assert_eq!(dev.bus.regs[REG_GAS_WAIT_0 as usize], encode_gas_wait(150));
        assert_eq!(dev.bus.regs[REG_CTRL_GAS_1 as usize], RUN_GAS);

        dev.set_heater_config(&HeaterConfig::off()).unwrap();
        assert_eq!(dev.bus.regs[REG_CTRL_GAS_0 as usize], HEAT_OFF);
        assert_eq!(dev.bus.regs[REG_CTRL_GAS_1 as usize], 0);
    }

    #[test]
    fn gas_wait_encoding() {
        assert_eq!(encode_gas_wait(0), 0);
        assert_eq!(encode_gas_wait(63), 63);
        // 100 ms -> 25 x4
        assert_eq!(encode_gas_wait(100), 25 + 64);
        // 150 ms -> 37 x4
        assert_eq!(encode_gas_wait(150), 37 + 64);
        assert_eq!(encode_gas_wait(5000), 0xFF);
    }

    #[test]
    fn duration_includes_heater() {
        let mut dev = sensor();
        dev.set_config(&SensorConfig::default()).unwrap();
        let bare = dev.measurement_duration().ticks();
        assert_eq!(bare, 3 * CYCLE_US + SWITCH_US + WAKEUP_US);

        dev.set_heater_config(&HeaterConfig::default()).unwrap();
        assert_eq!(dev.measurement_duration().ticks(), bare + 100_000);
    }

    #[test]
    fn poll_waits_for_new_data() {
        let mut dev = sensor();
        dev.set_config(&SensorConfig::default()).unwrap();
        dev.set_heater_config(&HeaterConfig::default()).unwrap();

        // Measuring, no new data yet
        dev.bus.regs[REG_FIELD0 as usize] = STATUS_MEASURING;
        assert_eq!(dev.poll_sample(0), Err(nb::Error::WouldBlock));

        let base = REG_FIELD0 as usize;
        dev.bus.regs[base] = STATUS_NEW_DATA;
        dev.bus.regs[base + 5..base + 8].copy_from_slice(&[0x00, 0x01, 0x50]); // temp = 21
        dev.bus.regs[base + 8..base + 10].copy_from_slice(&[0x00, 0x28]); // hum = 40
        dev.bus.regs[base + 13] = 0x01;
        dev.bus.regs[base + 14] = 0x40 | GAS_VALID | HEAT_STABLE | 0x03; // gas = 5

        let sample = dev.poll_sample(99).unwrap();
        assert_eq!(sample.timestamp, 99);
        assert_eq!(sample.temperature, Some(21.0));
        assert_eq!(sample.humidity, Some(40.0));
        assert_eq!(sample.gas_resistance, Some(5.0));
        assert!(sample.status.contains(SampleStatus::HEAT_STABLE));
    }

    #[test]
    fn skipped_channels_are_absent() {
        let mut dev = sensor();
        dev.set_config(&SensorConfig { os_pressure: Oversampling::Skipped, ..SensorConfig::default() })
            .unwrap();
        dev.bus.regs[REG_FIELD0 as usize] = STATUS_NEW_DATA;

        let sample = dev.poll_sample(0).unwrap();
        assert!(sample.pressure.is_none());
        assert!(sample.temperature.is_some());
        // heater off: no gas reading even if the flag is stale
        assert!(sample.gas_resistance.is_none());
    }
}
