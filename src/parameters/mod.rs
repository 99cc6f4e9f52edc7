// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Calibration parameter orchestration
//!
//! Parameters are never written to the bus directly. An update compares the
//! desired values with the cached registers and stages a write for each
//! register that differs; the Modbus process executes the staged writes and
//! posts one confirmation per register. A status check then waits, within a
//! bounded window, until as many confirmations as pending writes were seen.
//!
//! ```text
//! update_parameters ──► modbus:write:<dev>:<off>  ──► bus writer
//!                                                         │
//! get_update_status ◄── modbus:result:<dev>:<off> ◄───────┘
//! ```

mod request;

use log::{debug, info, warn};

use crate::cache::CacheGateway;
use crate::error::{CacheError, TankError};
use crate::registers::codec;
use crate::registers::{
    ConfigParameter, RegisterAddress, Scaling, SplitParameter, Tank, TankLayout,
};

pub use request::{
    CalibrationSnapshot, ParameterUpdateRequest, StatusReport, UpdateOutcome, UpdateStatus,
};

/// Largest value a low/high register pair can hold.
const SPLIT_MAX: i64 = u32::MAX as i64;

/// Stage the calibration values of `request` that differ from the cache.
///
/// The cache liveness is checked before the tank is resolved, so an
/// unreachable cache always reports `cache-unreachable`.
pub async fn update_parameters(
    gateway: &CacheGateway,
    request: &ParameterUpdateRequest,
) -> Result<UpdateOutcome, TankError> {
    if !gateway.is_alive().await {
        return Ok(UpdateOutcome {
            status: UpdateStatus::CacheUnreachable,
            updated: None,
            staged: Vec::new(),
        });
    }

    let tank: Tank = request.tank.parse()?;
    let resonances = requested_resonances(request)?;
    match stage_changes(gateway, tank.layout(), request, &resonances).await {
        Ok(staged) => {
            info!(
                "Calibration update for {}: {} register write(s) staged",
                tank,
                staged.len()
            );
            Ok(UpdateOutcome {
                status: UpdateStatus::Ok,
                updated: Some(tank),
                staged,
            })
        }
        Err(e) => {
            warn!("Staging calibration writes for {} failed: {}", tank, e);
            Ok(UpdateOutcome {
                status: UpdateStatus::CacheUnreachable,
                updated: None,
                staged: Vec::new(),
            })
        }
    }
}

/// Resonance values of an advanced update, each checked to fit a word pair.
///
/// A value outside `0..=u32::MAX` would never read back equal once split,
/// so it is rejected before anything is staged.
fn requested_resonances(
    request: &ParameterUpdateRequest,
) -> Result<Vec<(SplitParameter, i64)>, TankError> {
    if !request.has_advanced_settings() {
        return Ok(Vec::new());
    }
    [
        (SplitParameter::Resonance1, "oscRes1", &request.osc_res1),
        (SplitParameter::Resonance2, "oscRes2", &request.osc_res2),
    ]
    .into_iter()
    .map(|(parameter, name, raw)| {
        let value = codec::to_integer(raw.as_deref());
        if (0..=SPLIT_MAX).contains(&value) {
            Ok((parameter, value))
        } else {
            Err(TankError::OutOfRange {
                parameter: name,
                value,
                max: SPLIT_MAX,
            })
        }
    })
    .collect()
}

async fn stage_changes(
    gateway: &CacheGateway,
    layout: TankLayout,
    request: &ParameterUpdateRequest,
    resonances: &[(SplitParameter, i64)],
) -> Result<Vec<(RegisterAddress, i64)>, CacheError> {
    let mut staged = Vec::new();

    let scaled_fields = [
        (ConfigParameter::CapacitanceEmpty, &request.zero_pf),
        (ConfigParameter::CapacitanceFull, &request.full_pf),
        (ConfigParameter::FullLevelDistance, &request.level_full_mm),
        (ConfigParameter::HighAlarmPercent, &request.level_high_set),
        (ConfigParameter::LowAlarmPercent, &request.level_low_set),
    ];
    for (parameter, raw) in scaled_fields {
        let desired = codec::to_register_value(codec::scale_up_10(raw.as_deref()));
        stage_if_changed(gateway, layout, parameter, desired, &mut staged).await?;
    }

    if request.has_advanced_settings() {
        for &(parameter, desired) in resonances {
            stage_split_if_changed(gateway, layout, parameter, desired, &mut staged).await?;
        }

        let desired = codec::to_register_value(codec::scale_up_1000(request.osc_k_val.as_deref()));
        stage_if_changed(
            gateway,
            layout,
            ConfigParameter::OscillatorK,
            desired,
            &mut staged,
        )
        .await?;
    }

    Ok(staged)
}

async fn stage_if_changed(
    gateway: &CacheGateway,
    layout: TankLayout,
    parameter: ConfigParameter,
    desired: i64,
    staged: &mut Vec<(RegisterAddress, i64)>,
) -> Result<(), CacheError> {
    let address = layout.config_address(parameter);
    let current = codec::to_integer(gateway.read_register(address).await.as_deref());
    if current == desired {
        return Ok(());
    }
    debug!("{:?} at {}: {} -> {}", parameter, address, current, desired);
    gateway.stage_write(address, desired).await?;
    staged.push((address, desired));
    Ok(())
}

async fn stage_split_if_changed(
    gateway: &CacheGateway,
    layout: TankLayout,
    parameter: SplitParameter,
    desired: i64,
    staged: &mut Vec<(RegisterAddress, i64)>,
) -> Result<(), CacheError> {
    let current = read_split(gateway, layout, parameter).await;
    if current == desired {
        return Ok(());
    }
    debug!("{:?}: {} -> {}", parameter, current, desired);
    let (low, high) = codec::split_word(desired);
    for (half, value) in [(parameter.low(), low), (parameter.high(), high)] {
        let address = layout.config_address(half);
        gateway.stage_write(address, i64::from(value)).await?;
        staged.push((address, i64::from(value)));
    }
    Ok(())
}

async fn read_split(gateway: &CacheGateway, layout: TankLayout, parameter: SplitParameter) -> i64 {
    let low = read_raw(gateway, layout, parameter.low()).await;
    let high = read_raw(gateway, layout, parameter.high()).await;
    codec::combine_words(
        codec::to_integer(low.as_deref()),
        codec::to_integer(high.as_deref()),
    )
}

async fn read_raw(
    gateway: &CacheGateway,
    layout: TankLayout,
    parameter: ConfigParameter,
) -> Option<String> {
    gateway.read_register(layout.config_address(parameter)).await
}

/// Wait for the confirmations of every pending write.
///
/// Returns `nothing-to-update` without polling when no write is pending.
/// The wait is bounded by the gateway's confirmation schedule; writes not
/// confirmed in time report `failed` even if they land later.
pub async fn get_update_status(gateway: &CacheGateway) -> StatusReport {
    if !gateway.is_alive().await {
        return StatusReport {
            status: UpdateStatus::CacheUnreachable,
        };
    }

    let pending = match gateway.list_pending_writes().await {
        Ok(pending) => pending,
        Err(e) => {
            warn!("Listing pending writes failed: {}", e);
            return StatusReport {
                status: UpdateStatus::CacheUnreachable,
            };
        }
    };
    if pending.is_empty() {
        return StatusReport {
            status: UpdateStatus::NothingToUpdate,
        };
    }

    let expected = pending.len();
    let consumed = gateway
        .drain_confirmations_up_to(expected, gateway.confirmation_schedule())
        .await;
    let status = if consumed >= expected {
        UpdateStatus::Updated(consumed)
    } else {
        warn!(
            "Only {}/{} write confirmation(s) arrived in time",
            consumed, expected
        );
        UpdateStatus::Failed
    };
    StatusReport { status }
}

async fn read_decoded(gateway: &CacheGateway, layout: TankLayout, parameter: ConfigParameter) -> f64 {
    let raw = read_raw(gateway, layout, parameter).await;
    match parameter.scaling() {
        Scaling::Tenths => codec::scale_down_10(raw.as_deref()),
        Scaling::Thousandths => codec::scale_down_1000(raw.as_deref()),
        Scaling::Raw => codec::to_integer(raw.as_deref()) as f64,
    }
}

/// Current calibration of `tank`, read from the cache.
pub async fn get_parameters(gateway: &CacheGateway, tank: Tank) -> CalibrationSnapshot {
    let layout = tank.layout();
    let zero_pf = read_decoded(gateway, layout, ConfigParameter::CapacitanceEmpty).await;
    let full_pf = read_decoded(gateway, layout, ConfigParameter::CapacitanceFull).await;
    let level_full_mm = read_decoded(gateway, layout, ConfigParameter::FullLevelDistance).await;
    let level_high_set = read_decoded(gateway, layout, ConfigParameter::HighAlarmPercent).await;
    let level_low_set = read_decoded(gateway, layout, ConfigParameter::LowAlarmPercent).await;
    let osc_k_val = read_decoded(gateway, layout, ConfigParameter::OscillatorK).await;
    let osc_res1 = read_split(gateway, layout, SplitParameter::Resonance1).await;
    let osc_res2 = read_split(gateway, layout, SplitParameter::Resonance2).await;

    CalibrationSnapshot {
        zero_pf,
        full_pf,
        level_full_mm,
        level_high_set,
        level_low_set,
        osc_res1,
        osc_res2,
        osc_k_val,
        pf_per_cm: pf_per_cm(zero_pf, full_pf, level_full_mm),
    }
}

/// Capacitance gain per centimetre, 0 when the full level is not set.
pub fn pf_per_cm(zero_pf: f64, full_pf: f64, level_full_mm: f64) -> f64 {
    if level_full_mm > 0.0 {
        codec::round_to((full_pf - zero_pf) * 10.0 / level_full_mm, 2)
    } else {
        0.0
    }
}
