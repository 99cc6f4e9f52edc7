// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus register model
//!
//! - [`map`]: where each tank parameter and measurement lives on the bus
//! - [`codec`]: conversion between raw register text and engineering units

pub mod codec;
pub mod map;

pub use map::{
    resolve, ConfigParameter, DataRegister, RegisterAddress, Scaling, SplitParameter, Tank,
    TankLayout,
};
