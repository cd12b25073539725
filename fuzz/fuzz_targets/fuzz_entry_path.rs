// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Component;

use tagvault::extractors::archive::sanitize_entry_path;

fuzz_target!(|name: &str| {
    if let Some(path) = sanitize_entry_path(name) {
        // Whatever the entry claims, the result must stay below the target directory
        assert!(path
            .components()
            .all(|c| matches!(c, Component::Normal(_))));
    }
});
