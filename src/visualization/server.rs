// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use include_dir::{include_dir, Dir};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::{ContentType, Header};
use rocket::response::Responder;
use rocket::{get, options, routes, Build, Rocket};
use rocket::{Request, Response};

use super::{api, pages};
use crate::cache::CacheGateway;
use crate::diagnostics::RegisterMappingSource;

const STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources/static");

#[derive(Debug)]
struct StaticFileResponse(Vec<u8>, ContentType);

impl<'r> Responder<'r, 'static> for StaticFileResponse {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        Response::build()
            .header(self.1)
            .header(Header {
                name: "Cache-Control".into(),
                value: "max-age=3600".into(),
            })
            .sized_body(self.0.len(), Cursor::new(self.0))
            .ok()
    }
}

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

/// Answers to CORS preflight requests
#[options("/<_path..>")]
async fn options(_path: PathBuf) {}

/// Retrieves an embedded asset from resources/static
#[get("/static/<path..>")]
async fn static_file(path: PathBuf) -> Option<StaticFileResponse> {
    let file = STATIC_DIR.get_file(&path)?;
    let content_type = file
        .path()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ContentType::from_extension)
        .unwrap_or(ContentType::Binary);
    Some(StaticFileResponse(file.contents().to_vec(), content_type))
}

/// Assemble the Rocket instance serving the API and the pages.
///
/// `figment` carries the listener settings; the cache gateway and the
/// register mapping source are shared by every request.
pub fn build_rocket(
    figment: Figment,
    gateway: CacheGateway,
    mappings: Arc<dyn RegisterMappingSource>,
) -> Result<Rocket<Build>> {
    let pages = pages::Pages::new().context("Failed to load page templates")?;

    let rocket = rocket::custom(figment)
        .attach(CORS)
        .mount(
            "/",
            routes![
                options,
                static_file,
                api::health,
                pages::index,
                pages::levelconfig,
                pages::registers,
            ],
        )
        .mount(
            "/api",
            routes![
                api::update_parameters,
                api::get_parameters,
                api::get_update_status,
                api::get_readings,
                api::iot_data,
            ],
        )
        .manage(gateway)
        .manage(mappings)
        .manage(pages);
    Ok(rocket)
}
