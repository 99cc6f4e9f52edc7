// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Cache key conventions shared with the Modbus reader/writer process.
//!
//! - `modbus:<device>:reg<offset>`: last value read from the bus
//! - `modbus:write:<device>:<offset>`: value waiting to be written
//! - `modbus:result:<device>:<offset>`: outcome posted after a write

use std::fmt::Display;

use crate::registers::RegisterAddress;

/// Glob matching every staged write.
pub const WRITE_PATTERN: &str = "modbus:write:*";
/// Glob matching every write confirmation.
pub const RESULT_PATTERN: &str = "modbus:result:*";

const WRITE_PREFIX: &str = "modbus:write:";

pub fn read_key(device_id: impl Display, offset: impl Display) -> String {
    format!("modbus:{}:reg{}", device_id, offset)
}

pub fn write_key(address: RegisterAddress) -> String {
    format!("{}{}:{}", WRITE_PREFIX, address.device_id, address.offset)
}

pub fn result_key(address: RegisterAddress) -> String {
    format!("modbus:result:{}:{}", address.device_id, address.offset)
}

/// Recover the register address from a staged write key.
pub fn parse_write_key(key: &str) -> Option<RegisterAddress> {
    let (device_id, offset) = key.strip_prefix(WRITE_PREFIX)?.split_once(':')?;
    Some(RegisterAddress::new(device_id.parse().ok()?, offset.parse().ok()?))
}
