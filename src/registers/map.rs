// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register map
//!
//! Static addressing scheme of the level sensor controllers. Each controller
//! exposes its holding registers as:
//!
//! | Offset | Content                                   |
//! |--------|-------------------------------------------|
//! | 0      | Slave id                                  |
//! | 1      | Baud rate                                 |
//! | 2      | Sensor 1 configuration block (10 words)   |
//! | 12     | Sensor 2 configuration block (10 words)   |
//! | 22     | Sensor 1 data block (7 words)             |
//! | 29     | Sensor 2 data block (7 words)             |
//!
//! Both overhead tanks hang off controller 5 (sensor 1 and sensor 2), the
//! underground tank is sensor 1 of controller 6.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TankError;

/// Controller settings (slave id, baud rate) at the head of the register map.
pub const CONTROLLER_SETTINGS: u16 = 2;
/// First register of the sensor 1 configuration block.
pub const SENSOR1_CONFIG: u16 = CONTROLLER_SETTINGS;
/// First register of the sensor 2 configuration block.
pub const SENSOR2_CONFIG: u16 = SENSOR1_CONFIG + ConfigParameter::COUNT;
/// First register of the sensor 1 data block.
pub const SENSOR1_DATA: u16 = SENSOR2_CONFIG + ConfigParameter::COUNT;
/// First register of the sensor 2 data block.
pub const SENSOR2_DATA: u16 = SENSOR1_DATA + DataRegister::COUNT;

/// Controller serving both overhead tanks.
pub const OVERHEAD_DEVICE_ID: u8 = 5;
/// Controller serving the underground tank.
pub const UNDERGROUND_DEVICE_ID: u8 = 6;

/// A monitored tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tank {
    Overhead1,
    Overhead2,
    Underground,
}

impl Tank {
    pub const ALL: [Tank; 3] = [Tank::Overhead1, Tank::Overhead2, Tank::Underground];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tank::Overhead1 => "overhead1",
            Tank::Overhead2 => "overhead2",
            Tank::Underground => "underground",
        }
    }

    /// Controller and register blocks of this tank's sensor.
    pub fn layout(&self) -> TankLayout {
        match self {
            Tank::Overhead1 => TankLayout {
                device_id: OVERHEAD_DEVICE_ID,
                config_base: SENSOR1_CONFIG,
                data_base: SENSOR1_DATA,
            },
            Tank::Overhead2 => TankLayout {
                device_id: OVERHEAD_DEVICE_ID,
                config_base: SENSOR2_CONFIG,
                data_base: SENSOR2_DATA,
            },
            Tank::Underground => TankLayout {
                device_id: UNDERGROUND_DEVICE_ID,
                config_base: SENSOR1_CONFIG,
                data_base: SENSOR1_DATA,
            },
        }
    }
}

impl fmt::Display for Tank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tank {
    type Err = TankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tank::ALL
            .into_iter()
            .find(|tank| tank.as_str() == s)
            .ok_or_else(|| TankError::UnknownTank(s.to_string()))
    }
}

/// Resolve a tank name into its register layout.
pub fn resolve(tank: &str) -> Result<TankLayout, TankError> {
    Ok(tank.parse::<Tank>()?.layout())
}

/// Where a tank's sensor lives on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TankLayout {
    pub device_id: u8,
    pub config_base: u16,
    pub data_base: u16,
}

impl TankLayout {
    pub fn config_address(&self, parameter: ConfigParameter) -> RegisterAddress {
        RegisterAddress::config(self.device_id, self.config_base, parameter)
    }

    pub fn data_address(&self, field: DataRegister) -> RegisterAddress {
        RegisterAddress::data(self.device_id, self.data_base, field)
    }
}

/// Unit scaling between a register and its engineering value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// Register holds tenths.
    Tenths,
    /// Register holds thousandths.
    Thousandths,
    /// Register holds the raw integer.
    Raw,
}

/// Calibration parameters, in configuration block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigParameter {
    CapacitanceEmpty,
    CapacitanceFull,
    FullLevelDistance,
    Resonance1Low,
    Resonance1High,
    Resonance2Low,
    Resonance2High,
    OscillatorK,
    HighAlarmPercent,
    LowAlarmPercent,
}

impl ConfigParameter {
    pub const COUNT: u16 = 10;

    pub const ALL: [ConfigParameter; 10] = [
        ConfigParameter::CapacitanceEmpty,
        ConfigParameter::CapacitanceFull,
        ConfigParameter::FullLevelDistance,
        ConfigParameter::Resonance1Low,
        ConfigParameter::Resonance1High,
        ConfigParameter::Resonance2Low,
        ConfigParameter::Resonance2High,
        ConfigParameter::OscillatorK,
        ConfigParameter::HighAlarmPercent,
        ConfigParameter::LowAlarmPercent,
    ];

    /// Offset within the configuration block.
    pub fn offset(&self) -> u16 {
        match self {
            ConfigParameter::CapacitanceEmpty => 0,
            ConfigParameter::CapacitanceFull => 1,
            ConfigParameter::FullLevelDistance => 2,
            ConfigParameter::Resonance1Low => 3,
            ConfigParameter::Resonance1High => 4,
            ConfigParameter::Resonance2Low => 5,
            ConfigParameter::Resonance2High => 6,
            ConfigParameter::OscillatorK => 7,
            ConfigParameter::HighAlarmPercent => 8,
            ConfigParameter::LowAlarmPercent => 9,
        }
    }

    pub fn scaling(&self) -> Scaling {
        match self {
            ConfigParameter::CapacitanceEmpty
            | ConfigParameter::CapacitanceFull
            | ConfigParameter::FullLevelDistance
            | ConfigParameter::HighAlarmPercent
            | ConfigParameter::LowAlarmPercent => Scaling::Tenths,
            ConfigParameter::OscillatorK => Scaling::Thousandths,
            ConfigParameter::Resonance1Low
            | ConfigParameter::Resonance1High
            | ConfigParameter::Resonance2Low
            | ConfigParameter::Resonance2High => Scaling::Raw,
        }
    }
}

/// 32-bit calibration values stored as a low/high register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitParameter {
    Resonance1,
    Resonance2,
}

impl SplitParameter {
    pub fn low(&self) -> ConfigParameter {
        match self {
            SplitParameter::Resonance1 => ConfigParameter::Resonance1Low,
            SplitParameter::Resonance2 => ConfigParameter::Resonance2Low,
        }
    }

    pub fn high(&self) -> ConfigParameter {
        match self {
            SplitParameter::Resonance1 => ConfigParameter::Resonance1High,
            SplitParameter::Resonance2 => ConfigParameter::Resonance2High,
        }
    }
}

/// Live measurement fields, in data block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataRegister {
    LevelDistance,
    Capacitance,
    FrequencyLow,
    FrequencyHigh,
    Temperature,
    LowAlarm,
    HighAlarm,
}

impl DataRegister {
    pub const COUNT: u16 = 7;

    /// Offset within the data block.
    pub fn offset(&self) -> u16 {
        match self {
            DataRegister::LevelDistance => 0,
            DataRegister::Capacitance => 1,
            DataRegister::FrequencyLow => 2,
            DataRegister::FrequencyHigh => 3,
            DataRegister::Temperature => 4,
            DataRegister::LowAlarm => 5,
            DataRegister::HighAlarm => 6,
        }
    }
}

/// Addressing unit of the register cache: one holding register of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterAddress {
    pub device_id: u8,
    pub offset: u16,
}

impl RegisterAddress {
    pub fn new(device_id: u8, offset: u16) -> Self {
        Self { device_id, offset }
    }

    pub fn config(device_id: u8, config_base: u16, parameter: ConfigParameter) -> Self {
        Self::new(device_id, config_base + parameter.offset())
    }

    pub fn data(device_id: u8, data_base: u16, field: DataRegister) -> Self {
        Self::new(device_id, data_base + field.offset())
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device_id, self.offset)
    }
}
