// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust tank level library
//!
//! Web service in front of the register cache filled by the Modbus process
//! of the liquid level controllers: live readings, calibration read/write
//! with a confirmation handshake, and register diagnostics.

pub mod cache;
pub mod config;
pub mod daemon;
pub mod dashboard;
pub mod diagnostics;
pub mod error;
pub mod parameters;
pub mod readings;
pub mod registers;
pub mod visualization;

pub use cache::CacheGateway;
pub use registers::Tank;
