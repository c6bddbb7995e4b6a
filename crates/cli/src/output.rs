// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text output helpers. Everything list-shaped is tab-separated for
//! scriptability.

use anyhow::Result;
use std::io::Read;

/// Print one tab-separated row, trimming trailing empty columns.
pub fn print_row(cols: &[&str]) {
    let mut cols: Vec<&str> = cols.to_vec();
    while cols.last().is_some_and(|c| c.is_empty()) {
        cols.pop();
    }
    println!("{}", cols.join("\t"));
}

/// Resolve a message argument: a literal value, or `-`/absent for stdin.
pub fn read_message(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
