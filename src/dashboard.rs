// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Composite snapshot of the home dashboard
//!
//! The tank figures come from the cache. Weather and room values have no
//! sensor behind them yet and are filled with random placeholders.

use rand::Rng;
use serde::Serialize;

use crate::cache::CacheGateway;
use crate::readings::level_percent;
use crate::registers::codec;
use crate::registers::{ConfigParameter, DataRegister, Tank};

/// Per tank summary shown on the dashboard tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankSummary {
    /// Raw capacitance register.
    pub capacitance: i64,
    /// Level in percent of the full level.
    pub level: f64,
    /// Liquid temperature in °C, `None` without a reading.
    pub temp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wind {
    pub speed: u32,
    pub direction: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rooms {
    pub room1: u32,
    pub room2: u32,
    pub room3: u32,
    pub room4: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IotSnapshot {
    pub overhead1: TankSummary,
    pub overhead2: TankSummary,
    pub underground: TankSummary,
    pub humidity: u32,
    pub ambient_temp: u32,
    pub rain: u32,
    pub wind: Wind,
    pub rooms: Rooms,
}

async fn summarize(gateway: &CacheGateway, tank: Tank) -> TankSummary {
    let layout = tank.layout();
    let capacitance = gateway
        .read_register(layout.data_address(DataRegister::Capacitance))
        .await;
    let level = gateway
        .read_register(layout.data_address(DataRegister::LevelDistance))
        .await;
    let level_full = gateway
        .read_register(layout.config_address(ConfigParameter::FullLevelDistance))
        .await;
    let temp = gateway
        .read_register(layout.data_address(DataRegister::Temperature))
        .await;

    TankSummary {
        capacitance: codec::to_integer(capacitance.as_deref()),
        level: level_percent(
            codec::scale_down_10_offset(level.as_deref()),
            codec::scale_down_10(level_full.as_deref()),
        ),
        temp: temp.as_deref().and_then(|raw| codec::temperature(Some(raw))),
    }
}

/// Weather and room placeholders, drawn in one go after all cache reads.
fn placeholders(rng: &mut impl Rng) -> (u32, u32, u32, Wind, Rooms) {
    (
        rng.random_range(40..=70),
        rng.random_range(20..=35),
        rng.random_range(0..=1),
        Wind {
            speed: rng.random_range(0..=40),
            direction: rng.random_range(0..=359),
        },
        Rooms {
            room1: rng.random_range(22..=28),
            room2: rng.random_range(22..=28),
            room3: rng.random_range(22..=28),
            room4: rng.random_range(22..=28),
        },
    )
}

pub async fn get_iot_data(gateway: &CacheGateway) -> IotSnapshot {
    let overhead1 = summarize(gateway, Tank::Overhead1).await;
    let overhead2 = summarize(gateway, Tank::Overhead2).await;
    let underground = summarize(gateway, Tank::Underground).await;

    let (humidity, ambient_temp, rain, wind, rooms) = placeholders(&mut rand::rng());
    IotSnapshot {
        overhead1,
        overhead2,
        underground,
        humidity,
        ambient_temp,
        rain,
        wind,
        rooms,
    }
}
