// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTML pages
//!
//! Templates are embedded in the binary and rendered with Handlebars. The
//! live and configuration pages are static shells polling the JSON API; the
//! registers page is rendered server side from the diagnostics listing.

use std::sync::Arc;

use chrono::Local;
use handlebars::Handlebars;
use include_dir::{include_dir, Dir};
use log::{debug, error, warn};
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::{get, State};
use serde_json::{json, Value};

use crate::cache::CacheGateway;
use crate::diagnostics::{self, RegisterMappingSource};
use crate::registers::Tank;

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/resources/templates");

/// Handlebars registry holding every embedded template, keyed by file stem.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        for file in TEMPLATES.files() {
            let path = file.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("hbs") {
                continue;
            }
            let (Some(name), Some(source)) =
                (path.file_stem().and_then(|stem| stem.to_str()), file.contents_utf8())
            else {
                warn!("Skipping unreadable template {}", path.display());
                continue;
            };
            debug!("Registering template {}", name);
            registry.register_template_string(name, source)?;
        }
        Ok(Self { registry })
    }

    pub fn render(&self, name: &str, data: &Value) -> Result<RawHtml<String>, Status> {
        self.registry
            .render(name, data)
            .map(RawHtml)
            .map_err(|e| {
                error!("Rendering {} failed: {}", name, e);
                Status::InternalServerError
            })
    }
}

fn tanks() -> Vec<&'static str> {
    Tank::ALL.iter().map(Tank::as_str).collect()
}

#[get("/")]
pub fn index(pages: &State<Pages>) -> Result<RawHtml<String>, Status> {
    pages.render("live", &json!({ "title": "Live levels", "tanks": tanks() }))
}

#[get("/levelconfig")]
pub fn levelconfig(pages: &State<Pages>) -> Result<RawHtml<String>, Status> {
    pages.render(
        "levelconfig",
        &json!({ "title": "Level configuration", "tanks": tanks() }),
    )
}

/// Register dump. A registry failure is shown on the page.
#[get("/registers")]
pub async fn registers(
    pages: &State<Pages>,
    gateway: &State<CacheGateway>,
    source: &State<Arc<dyn RegisterMappingSource>>,
) -> Result<RawHtml<String>, Status> {
    let taken_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let data = match diagnostics::list_registers(gateway, source.inner().as_ref()).await {
        Ok(rows) => json!({ "title": "Registers", "rows": rows, "error": null, "taken_at": taken_at }),
        Err(e) => {
            warn!("Register listing unavailable: {}", e);
            json!({ "title": "Registers", "rows": [], "error": e.to_string(), "taken_at": taken_at })
        }
    };
    pages.render("registers", &data)
}
