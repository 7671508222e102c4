// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

#![no_main]

use changewise::services::response::ResponseParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(parsed) = ResponseParser::classification(s) {
            assert!(!parsed.description.is_empty());
        }
        let _ = ResponseParser::description(s);
        let _ = ResponseParser::summary(s);
    }
});
