// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JSON API
//!
//! Thin handlers over [`crate::parameters`], [`crate::readings`] and
//! [`crate::dashboard`]. Cache failures never surface as HTTP errors: they
//! are reported through the `status` strings or as absent values. Only an
//! invalid tank is rejected, with `400 Bad Request`.

use log::debug;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{get, post, Request, State};
use serde_json::{json, Value};

use crate::cache::CacheGateway;
use crate::dashboard::{self, IotSnapshot};
use crate::error::TankError;
use crate::parameters::{
    self, CalibrationSnapshot, ParameterUpdateRequest, StatusReport, UpdateOutcome,
};
use crate::readings::{self, ReadingsView};
use crate::registers::Tank;

/// Error answered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: Status::BadRequest,
            message: message.into(),
        }
    }
}

impl From<TankError> for ApiError {
    fn from(error: TankError) -> Self {
        ApiError::bad_request(error.to_string())
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        debug!("{} {} -> {}: {}", request.method(), request.uri(), self.status, self.message);
        (self.status, Json(json!({ "error": self.message }))).respond_to(request)
    }
}

fn parse_tank(tank: Option<&str>) -> Result<Tank, ApiError> {
    let tank = tank.ok_or_else(|| ApiError::bad_request("missing 'tank' query parameter"))?;
    Ok(tank.parse()?)
}

/// # Cache health
///
/// `{"redis": "ok"}` when the register cache answers, `503` otherwise.
#[get("/health")]
pub async fn health(gateway: &State<CacheGateway>) -> (Status, Json<Value>) {
    if gateway.ping().await {
        (Status::Ok, Json(json!({ "redis": "ok" })))
    } else {
        (Status::ServiceUnavailable, Json(json!({ "redis": "down" })))
    }
}

/// # Stage calibration changes
#[post("/update-parameters", data = "<request>")]
pub async fn update_parameters(
    gateway: &State<CacheGateway>,
    request: Json<ParameterUpdateRequest>,
) -> Result<Json<UpdateOutcome>, ApiError> {
    let outcome = parameters::update_parameters(gateway, &request).await?;
    Ok(Json(outcome))
}

/// # Current calibration of a tank
#[get("/parameters?<tank>")]
pub async fn get_parameters(
    gateway: &State<CacheGateway>,
    tank: Option<&str>,
) -> Result<Json<CalibrationSnapshot>, ApiError> {
    let tank = parse_tank(tank)?;
    Ok(Json(parameters::get_parameters(gateway, tank).await))
}

/// # Wait for write confirmations
///
/// Blocks the request (not the server) for up to the configured
/// confirmation timeout.
#[get("/get-update-status")]
pub async fn get_update_status(gateway: &State<CacheGateway>) -> Json<StatusReport> {
    Json(parameters::get_update_status(gateway).await)
}

/// # Live readings of a tank
#[get("/readings?<tank>")]
pub async fn get_readings(
    gateway: &State<CacheGateway>,
    tank: Option<&str>,
) -> Result<Json<ReadingsView>, ApiError> {
    let tank = parse_tank(tank)?;
    Ok(Json(readings::get_readings(gateway, tank).await))
}

/// # Dashboard snapshot
#[get("/iot_data")]
pub async fn iot_data(gateway: &State<CacheGateway>) -> Json<IotSnapshot> {
    Json(dashboard::get_iot_data(gateway).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tank() {
        assert_eq!(parse_tank(Some("overhead2")).unwrap(), Tank::Overhead2);
        assert_eq!(parse_tank(None).unwrap_err().status, Status::BadRequest);
        let error = parse_tank(Some("attic")).unwrap_err();
        assert_eq!(error.status, Status::BadRequest);
        assert!(error.message.contains("attic"));
    }
}
