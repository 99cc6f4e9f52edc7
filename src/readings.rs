// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Live sensor readings
//!
//! Builds the view polled by the live dashboard from the data block and a
//! few configuration registers of one tank. The oscillator frequency gates
//! every derived measurement: a sensor without oscillation reports them as
//! `null`.

use serde::Serialize;

use crate::cache::CacheGateway;
use crate::registers::codec;
use crate::registers::{ConfigParameter, DataRegister, Tank, TankLayout};

/// Health of the sensor head, derived from its capacitance register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorStatus {
    /// The controller never published the register.
    NoModbusDevice,
    /// The controller answers but the head reads no capacitance.
    SensorDisconnected,
    Ok,
}

impl SensorStatus {
    pub fn classify(capacitance: Option<&str>) -> Self {
        match capacitance {
            None => SensorStatus::NoModbusDevice,
            Some(raw) if codec::to_number(Some(raw)).unwrap_or(0.0) <= 0.0 => {
                SensorStatus::SensorDisconnected
            }
            Some(_) => SensorStatus::Ok,
        }
    }
}

/// Level alarm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlarmState {
    Normal,
    Low,
    High,
}

impl AlarmState {
    /// The high flag takes precedence when both flags are raised.
    pub fn classify(low_flag: Option<&str>, high_flag: Option<&str>) -> Self {
        // flags are stored ×10 like the other data registers
        let is_set = |raw: Option<&str>| codec::scale_down_10(raw) == 1.0;
        if is_set(high_flag) {
            AlarmState::High
        } else if is_set(low_flag) {
            AlarmState::Low
        } else {
            AlarmState::Normal
        }
    }
}

/// Live view of one tank.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingsView {
    pub sensor_status: SensorStatus,
    /// Liquid temperature in °C.
    #[serde(rename = "liquidTemperature")]
    pub temperature: Option<f64>,
    /// Head capacitance in pF.
    pub sensor_cap: Option<f64>,
    /// Oscillator frequency, `None` when the oscillator is stopped.
    pub frequency: Option<i64>,
    /// Liquid level in mm.
    pub liquid_level: Option<f64>,
    pub alarm: Option<AlarmState>,
    /// Liquid level as a percentage of the calibrated full level.
    pub liquid_level_pct: Option<f64>,
    pub liquid_level_high_set: f64,
    pub liquid_level_low_set: f64,
}

/// Percentage of `level_full` reached by `level`, 0 when no full level is set.
pub fn level_percent(level: f64, level_full: f64) -> f64 {
    if level_full > 0.0 {
        codec::round_to(level * 100.0 / level_full, 1)
    } else {
        0.0
    }
}

async fn data(gateway: &CacheGateway, layout: TankLayout, field: DataRegister) -> Option<String> {
    gateway.read_register(layout.data_address(field)).await
}

async fn config(
    gateway: &CacheGateway,
    layout: TankLayout,
    parameter: ConfigParameter,
) -> Option<String> {
    gateway.read_register(layout.config_address(parameter)).await
}

/// Assemble the live readings of `tank` from the cache.
pub async fn get_readings(gateway: &CacheGateway, tank: Tank) -> ReadingsView {
    let layout = tank.layout();

    let capacitance = data(gateway, layout, DataRegister::Capacitance).await;
    let level = data(gateway, layout, DataRegister::LevelDistance).await;
    let frequency_low = data(gateway, layout, DataRegister::FrequencyLow).await;
    let frequency_high = data(gateway, layout, DataRegister::FrequencyHigh).await;
    let temperature = data(gateway, layout, DataRegister::Temperature).await;
    let low_alarm = data(gateway, layout, DataRegister::LowAlarm).await;
    let high_alarm = data(gateway, layout, DataRegister::HighAlarm).await;
    let level_full = config(gateway, layout, ConfigParameter::FullLevelDistance).await;
    let high_set = config(gateway, layout, ConfigParameter::HighAlarmPercent).await;
    let low_set = config(gateway, layout, ConfigParameter::LowAlarmPercent).await;

    let frequency = codec::combine_words(
        codec::to_integer(frequency_low.as_deref()),
        codec::to_integer(frequency_high.as_deref()),
    );
    let liquid_level = codec::scale_down_10_offset(level.as_deref());
    let level_full = codec::scale_down_10(level_full.as_deref());
    let oscillating = frequency > 0;
    let gated = |value| if oscillating { Some(value) } else { None };

    ReadingsView {
        sensor_status: SensorStatus::classify(capacitance.as_deref()),
        temperature: if oscillating {
            codec::temperature(temperature.as_deref())
        } else {
            None
        },
        sensor_cap: gated(codec::scale_down_10(capacitance.as_deref())),
        frequency: oscillating.then_some(frequency),
        liquid_level: gated(liquid_level),
        alarm: oscillating.then(|| AlarmState::classify(low_alarm.as_deref(), high_alarm.as_deref())),
        liquid_level_pct: gated(level_percent(liquid_level, level_full)),
        liquid_level_high_set: codec::scale_down_10(high_set.as_deref()),
        liquid_level_low_set: codec::scale_down_10(low_set.as_deref()),
    }
}
