// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::Arc;
use std::time::Duration;

use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use rust_tanklevel::cache::{CacheGateway, InMemoryStore, PollSchedule};
use rust_tanklevel::diagnostics::{RegisterMapping, StaticMappingSource};
use rust_tanklevel::registers::{ConfigParameter, DataRegister, RegisterAddress, Tank};
use rust_tanklevel::visualization::server::build_rocket;
use serde_json::{json, Value};

fn test_figment() -> rocket::figment::Figment {
    rocket::Config::figment()
        .merge(("address", "127.0.0.1"))
        .merge(("port", 0))
        .merge(("log_level", rocket::config::LogLevel::Off))
}

async fn client_with(store: Arc<InMemoryStore>) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    // keep the failure path of the status check short
    let gateway = CacheGateway::new(store).with_confirmation_schedule(PollSchedule::new(
        Duration::from_millis(300),
        Duration::from_millis(20),
    ));
    let mappings = Arc::new(StaticMappingSource::new(vec![
        RegisterMapping::new(5, "LEVEL_IN_MM", 22),
        RegisterMapping::new(5, "CAP_PF", 23),
    ]));
    let rocket = build_rocket(test_figment(), gateway, mappings).expect("valid rocket instance");
    Client::tracked(rocket).await.expect("valid rocket instance")
}

async fn get_json(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri).dispatch().await;
    let status = response.status();
    let body = response.into_json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[rocket::async_test]
async fn test_health_reports_cache_state() {
    let store = Arc::new(InMemoryStore::new());
    let client = client_with(store.clone()).await;

    let (status, body) = get_json(&client, "/health").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body, json!({"redis": "ok"}));

    store.set_offline(true);
    let (status, body) = get_json(&client, "/health").await;
    assert_eq!(status, Status::ServiceUnavailable);
    assert_eq!(body, json!({"redis": "down"}));
}

#[rocket::async_test]
async fn test_update_then_confirm_round_trip() {
    let store = Arc::new(InMemoryStore::new());
    store.set_register(RegisterAddress::new(6, 2), 125);
    let client = client_with(store.clone()).await;

    let response = client
        .post("/api/update-parameters")
        .header(ContentType::JSON)
        .body(
            json!({
                "tank": "underground",
                "zeroPf": "12.5",
                "fullPf": "40.0",
                "levelFullMm": "500",
                "levelHighSet": "90",
                "levelLowSet": "10"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "updated": "underground"}));
    assert_eq!(store.keys_matching("modbus:write:*").len(), 4);

    // writes staged but never executed: confirmation times out
    let (_, body) = get_json(&client, "/api/get-update-status").await;
    assert_eq!(body["status"], "failed");

    // the bus writer catches up
    assert_eq!(store.complete_pending_writes(), 4);
    let (_, body) = get_json(&client, "/api/get-update-status").await;
    assert_eq!(body["status"], "nothing-to-update");

    let (status, body) = get_json(&client, "/api/parameters?tank=underground").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["zeroPf"], 12.5);
    assert_eq!(body["fullPf"], 40.0);
    assert_eq!(body["levelFullMm"], 500.0);
    assert_eq!(body["pfPerCm"], 0.55);
}

#[rocket::async_test]
async fn test_status_counts_confirmations() {
    let store = Arc::new(InMemoryStore::new());
    store.insert("modbus:write:5:2", "125");
    store.insert("modbus:write:5:3", "400");
    store.insert("modbus:result:5:2", "OK");
    store.insert("modbus:result:5:3", "OK");
    let client = client_with(store.clone()).await;

    let (status, body) = get_json(&client, "/api/get-update-status").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body, json!({"status": "2 parameter(s) updated"}));
    assert!(store.keys_matching("modbus:result:*").is_empty());
}

#[rocket::async_test]
async fn test_unreachable_cache_is_a_status_not_an_error() {
    let store = Arc::new(InMemoryStore::new());
    store.set_offline(true);
    let client = client_with(store).await;

    let response = client
        .post("/api/update-parameters")
        .header(ContentType::JSON)
        .body(r#"{"tank":"overhead1","zeroPf":1}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body, json!({"status": "cache-unreachable", "updated": null}));

    let (status, body) = get_json(&client, "/api/get-update-status").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "cache-unreachable");

    let (status, body) = get_json(&client, "/api/readings?tank=overhead1").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["sensorStatus"], "no-modbus-device");
}

#[rocket::async_test]
async fn test_invalid_tank_is_bad_request() {
    let client = client_with(Arc::new(InMemoryStore::new())).await;

    let (status, body) = get_json(&client, "/api/readings?tank=attic").await;
    assert_eq!(status, Status::BadRequest);
    assert!(body["error"].as_str().unwrap().contains("attic"));

    let (status, body) = get_json(&client, "/api/parameters").await;
    assert_eq!(status, Status::BadRequest);
    assert!(body["error"].is_string());

    let response = client
        .post("/api/update-parameters")
        .header(ContentType::JSON)
        .body(r#"{"tank":"attic"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn test_resonance_out_of_range_is_bad_request() {
    let store = Arc::new(InMemoryStore::new());
    let client = client_with(store.clone()).await;

    let response = client
        .post("/api/update-parameters")
        .header(ContentType::JSON)
        .body(r#"{"tank":"overhead1","zeroPf":"12.5","oscRes1":"4294967296"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("oscRes1"));
    assert!(store.keys_matching("modbus:write:*").is_empty());
}

#[rocket::async_test]
async fn test_readings_and_dashboard() {
    let store = Arc::new(InMemoryStore::new());
    let layout = Tank::Overhead2.layout();
    for (field, value) in [
        (DataRegister::LevelDistance, 2600),
        (DataRegister::Capacitance, 352),
        (DataRegister::FrequencyLow, 1200),
        (DataRegister::FrequencyHigh, 0),
        (DataRegister::Temperature, 350),
        (DataRegister::LowAlarm, 10),
        (DataRegister::HighAlarm, 0),
    ] {
        store.set_register(layout.data_address(field), value);
    }
    store.set_register(layout.config_address(ConfigParameter::FullLevelDistance), 5000);
    let client = client_with(store).await;

    let (status, body) = get_json(&client, "/api/readings?tank=overhead2").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["sensorStatus"], "ok");
    assert_eq!(body["frequency"], 1200);
    assert_eq!(body["liquidTemperature"], 25.0);
    assert_eq!(body["liquidLevelPct"], 50.0);
    assert_eq!(body["alarm"], "LOW");

    let (status, body) = get_json(&client, "/api/iot_data").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["overhead2"]["capacitance"], 352);
    assert_eq!(body["overhead2"]["level"], 50.0);
    assert_eq!(body["overhead1"]["capacitance"], 0);
    let humidity = body["humidity"].as_u64().unwrap();
    assert!((40..=70).contains(&humidity));
}

#[rocket::async_test]
async fn test_pages_render() {
    let store = Arc::new(InMemoryStore::new());
    store.insert("modbus:5:reg23", "352");
    let client = client_with(store).await;

    for uri in ["/", "/levelconfig", "/registers"] {
        let response = client.get(uri).dispatch().await;
        assert_eq!(response.status(), Status::Ok, "{}", uri);
        assert_eq!(response.content_type(), Some(ContentType::HTML));
    }

    let response = client.get("/registers").dispatch().await;
    let html = response.into_string().await.unwrap();
    assert!(html.contains("modbus:5:reg23"));
    assert!(html.contains("352"));
    assert!(html.contains("modbus:5:reg22"));

    let response = client.get("/static/style.css").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::CSS));
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );

    let response = client.get("/static/missing.js").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}
