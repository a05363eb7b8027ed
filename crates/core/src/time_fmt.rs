// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-time duration parsing (§4.3.1).
//!
//! Scheduler adapters and clients report wall-clock durations as `HH:MM:SS`
//! text at the boundary; everywhere inside the core a wall time is whole
//! minutes. The parse is purely numeric — no implementation may multiply a
//! string-typed hour token by 60 (the bug one historical scheduler adapter's
//! inline parser made); unparsable input yields `0`, matching that adapter's
//! own fallback for a malformed field rather than panicking.

/// Parse an `HH:MM:SS` wall-time string into whole minutes.
///
/// `H*60 + M + round(S/60)`. Missing fields are treated as `0`. A string that
/// does not split into 1-3 numeric fields returns `0`.
pub fn parse_wall_time_minutes(input: &str) -> u32 {
    let fields: Vec<&str> = input.trim().split(':').collect();
    if fields.is_empty() || fields.len() > 3 || input.trim().is_empty() {
        return 0;
    }

    let parsed: Option<Vec<u32>> = fields.iter().map(|f| f.trim().parse::<u32>().ok()).collect();
    let parsed = match parsed {
        Some(p) => p,
        None => return 0,
    };

    let (h, m, s) = match parsed.len() {
        1 => (0, parsed[0], 0),
        2 => (parsed[0], parsed[1], 0),
        3 => (parsed[0], parsed[1], parsed[2]),
        _ => return 0,
    };

    h * 60 + m + (s as f64 / 60.0).round() as u32
}
