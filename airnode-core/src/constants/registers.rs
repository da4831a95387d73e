//! Register map of the forced-mode gas sensor
//!
//! Addresses and bit fields follow the BME68x datasheet (I2C interface,
//! forced mode, heater profile slot 0).

/// Chip identifier register
pub const REG_CHIP_ID: u8 = 0xD0;

/// Expected chip identifier
pub const CHIP_ID: u8 = 0x61;

/// Soft-reset register
pub const REG_RESET: u8 = 0xE0;

/// Soft-reset command
pub const RESET_CMD: u8 = 0xB6;

/// Measurement status + field 0 data block start
pub const REG_FIELD0: u8 = 0x1D;

/// Length of the field 0 data block (status .. gas LSB)
pub const FIELD0_LEN: usize = 15;

/// Heater set-point, profile slot 0
pub const REG_RES_HEAT_0: u8 = 0x5A;

/// Heater wait time, profile slot 0
pub const REG_GAS_WAIT_0: u8 = 0x64;

/// Gas control 0 (heater off bit)
pub const REG_CTRL_GAS_0: u8 = 0x70;

/// Gas control 1 (run_gas, profile index)
pub const REG_CTRL_GAS_1: u8 = 0x71;

/// Humidity oversampling control
pub const REG_CTRL_HUM: u8 = 0x72;

/// Temperature/pressure oversampling and power mode
pub const REG_CTRL_MEAS: u8 = 0x74;

/// IIR filter configuration
pub const REG_CONFIG: u8 = 0x75;

/// `new_data_0` bit of the measurement status byte
pub const STATUS_NEW_DATA: u8 = 0x80;

/// `measuring` bit of the measurement status byte
pub const STATUS_MEASURING: u8 = 0x20;

/// `gas_valid_r` bit of the gas LSB byte
pub const GAS_VALID: u8 = 0x20;

/// `heat_stab_r` bit of the gas LSB byte
pub const HEAT_STABLE: u8 = 0x10;

/// `gas_range_r` mask of the gas LSB byte
pub const GAS_RANGE_MASK: u8 = 0x0F;

/// `run_gas` bit of ctrl_gas_1
pub const RUN_GAS: u8 = 0x10;

/// `heat_off` bit of ctrl_gas_0
pub const HEAT_OFF: u8 = 0x08;

/// Power mode: sleep
pub const MODE_SLEEP: u8 = 0b00;

/// Power mode: forced (single measurement)
pub const MODE_FORCED: u8 = 0b01;

/// Power mode mask of ctrl_meas
pub const MODE_MASK: u8 = 0b11;

/// Largest encodable heater wait time (milliseconds)
pub const MAX_GAS_WAIT_MS: u16 = 0x0FC0;
