// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

#![no_main]

use changewise::services::heuristic::{classify_with_diff, clean_description};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (message, diff) = s.split_once('\0').unwrap_or((s, ""));
        let _ = classify_with_diff(message, diff);
        assert!(!clean_description(message).is_empty());
    }
});
