// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Tick-based date and duration values.
//!
//! A tick is 100 nanoseconds. [`DateTime`] counts ticks since
//! 0001-01-01T00:00:00 and carries a [`DateTimeKind`] in the top two bits of
//! its 64-bit wire form. [`TimeSpan`] is a signed tick count.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks per microsecond.
const TICKS_PER_MICROSECOND: i64 = 10;

/// Nanoseconds per tick.
const NANOS_PER_TICK: i64 = 100;

/// Largest tick count the 62-bit field can hold.
pub const MAX_TICKS: i64 = 0x3FFF_FFFF_FFFF_FFFF;

const KIND_SHIFT: u32 = 62;

/// How a [`DateTime`] relates to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DateTimeKind {
    /// No time zone information
    #[default]
    Unspecified = 0,
    /// Coordinated Universal Time
    Utc = 1,
    /// Local time
    Local = 2,
    /// Local time inside an ambiguous daylight-saving hour
    LocalAmbiguousDst = 3,
}

impl DateTimeKind {
    fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0 => DateTimeKind::Unspecified,
            1 => DateTimeKind::Utc,
            2 => DateTimeKind::Local,
            _ => DateTimeKind::LocalAmbiguousDst,
        }
    }
}

/// Point in time as ticks since 0001-01-01 plus a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateTime {
    ticks: i64,
    kind: DateTimeKind,
}

impl DateTime {
    /// Build from a tick count in `0..=MAX_TICKS`.
    pub fn new(ticks: i64, kind: DateTimeKind) -> Result<Self> {
        if !(0..=MAX_TICKS).contains(&ticks) {
            return Err(CodecError::unsupported_value(
                format!("DateTime ticks {ticks}"),
                "62-bit tick field",
            ));
        }
        Ok(Self { ticks, kind })
    }

    /// Split a raw 64-bit word into ticks and kind. Never fails.
    pub fn from_raw(raw: u64) -> Self {
        Self {
            ticks: (raw & MAX_TICKS as u64) as i64,
            kind: DateTimeKind::from_bits(raw >> KIND_SHIFT),
        }
    }

    /// Pack into the 64-bit word.
    pub fn to_raw(self) -> u64 {
        ((self.kind as u64) << KIND_SHIFT) | self.ticks as u64
    }

    /// Tick count.
    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    /// Kind bits.
    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    /// Convert from a chrono calendar value.
    pub fn from_naive(value: NaiveDateTime, kind: DateTimeKind) -> Result<Self> {
        let since_epoch = value.signed_duration_since(epoch());
        let ticks = TimeSpan::from_delta(since_epoch)
            .map(|span| span.ticks())
            .ok_or_else(|| {
                CodecError::unsupported_value(value.to_string(), "DateTime tick range")
            })?;
        Self::new(ticks, kind)
    }

    /// Convert to a chrono calendar value, if it is inside chrono's range.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        epoch().checked_add_signed(TimeSpan(self.ticks).to_delta())
    }
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Signed duration in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeSpan(i64);

impl TimeSpan {
    /// Build from a raw tick count.
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Raw tick count.
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Convert to a chrono duration. Every tick count fits.
    pub fn to_delta(&self) -> TimeDelta {
        let micros = TimeDelta::microseconds(self.0 / TICKS_PER_MICROSECOND);
        let nanos = TimeDelta::nanoseconds((self.0 % TICKS_PER_MICROSECOND) * NANOS_PER_TICK);
        micros + nanos
    }

    /// Convert from a chrono duration, truncating below one tick.
    pub fn from_delta(delta: TimeDelta) -> Option<Self> {
        let micros = delta.num_microseconds()?;
        let sub_micro = (delta.subsec_nanos() as i64 % 1_000) / NANOS_PER_TICK;
        micros
            .checked_mul(TICKS_PER_MICROSECOND)?
            .checked_add(sub_micro)
            .map(Self)
    }
}
