// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//!
//! Visualization module
//!
//! This module handles the web interface: the JSON API consumed by the
//! dashboard pages, the pages themselves and the Rocket server wiring.

pub mod api;
pub mod pages;
pub mod server;
