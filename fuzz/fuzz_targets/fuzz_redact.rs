// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

#![no_main]

use changewise::services::safety::{REDACTION_MARKER, redact};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let once = redact(s);
        // Collapsing means no two markers are ever directly adjacent.
        assert!(!once.contains(&format!("{REDACTION_MARKER}{REDACTION_MARKER}")));
    }
});
