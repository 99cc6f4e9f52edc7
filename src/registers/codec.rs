// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register value codec
//!
//! Raw register values cross the cache boundary as text. Every conversion
//! between that text and engineering units lives here, so the rest of the
//! crate only handles numbers. All functions are total: absent or
//! unparseable input reads as zero.
//!
//! Rounding follows ties-to-even at the requested number of decimals.

/// Raw temperature register value reported by the sensor when it has no reading.
pub const TEMPERATURE_NO_READING: f64 = 5010.0;

/// Offset baked into temperature and level registers (raw 100 = 0.0 units).
const UNIT_OFFSET: f64 = 10.0;

/// Parse a textual register value as an integer or decimal number.
///
/// Returns `None` if the value is absent, non-numeric or not finite.
pub fn to_number(raw: Option<&str>) -> Option<f64> {
    let value = raw?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Parse a register value as a whole number, truncating any fraction.
///
/// Absent or non-numeric input yields `0`.
pub fn to_integer(raw: Option<&str>) -> i64 {
    to_number(raw).map(|value| value.trunc() as i64).unwrap_or(0)
}

/// Round `value` to `decimals` fractional digits, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Register value ÷10, rounded to one decimal.
pub fn scale_down_10(raw: Option<&str>) -> f64 {
    to_number(raw)
        .map(|value| round_to(value / 10.0, 1))
        .unwrap_or(0.0)
}

/// Register value ÷10 minus the +10 unit offset, rounded to one decimal.
///
/// Absent input is read as 0 and therefore yields -10.0.
pub fn scale_down_10_offset(raw: Option<&str>) -> f64 {
    let value = to_number(raw).unwrap_or(0.0);
    round_to(value / 10.0 - UNIT_OFFSET, 1)
}

/// Register value ÷1000, rounded to four decimals (oscillator k-factor).
pub fn scale_down_1000(raw: Option<&str>) -> f64 {
    to_number(raw)
        .map(|value| round_to(value / 1000.0, 4))
        .unwrap_or(0.0)
}

/// Engineering value ×10, the register representation of tenths.
pub fn scale_up_10(raw: Option<&str>) -> f64 {
    to_number(raw).map(|value| value * 10.0).unwrap_or(0.0)
}

/// Engineering value ×1000, the register representation of thousandths.
pub fn scale_up_1000(raw: Option<&str>) -> f64 {
    to_number(raw).map(|value| value * 1000.0).unwrap_or(0.0)
}

/// Nearest whole register value for a scaled engineering value.
pub fn to_register_value(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Compose a 32-bit quantity from its low and high 16-bit words.
pub fn combine_words(low: i64, high: i64) -> i64 {
    (high << 16) | low
}

/// Split a 32-bit quantity into its `(low, high)` 16-bit words.
pub fn split_word(value: i64) -> (u16, u16) {
    ((value & 0xFFFF) as u16, ((value >> 16) & 0xFFFF) as u16)
}

/// Liquid temperature in °C, or `None` when the sensor reports no reading.
pub fn temperature(raw: Option<&str>) -> Option<f64> {
    let value = to_number(raw).unwrap_or(0.0);
    if value == TEMPERATURE_NO_READING {
        None
    } else {
        Some(round_to(value / 10.0 - UNIT_OFFSET, 1))
    }
}
