// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only config access.
//!
//! The config file is YAML or JSON; both parse into a `serde_json::Value`
//! tree and are read through typed path accessors. A missing or unreadable
//! file behaves as an empty config so every setting falls back to its
//! default. Only `team.drive.mode` is re-read after startup (see
//! [`crate::settings::drive_mode_hot`]).

use serde_json::Value;
use std::path::{Path, PathBuf};

/// Parsed configuration document.
#[derive(Debug, Clone, Default)]
pub struct Config {
    root: Value,
    path: PathBuf,
}

impl Config {
    /// Load from `path`. JSON is preferred when the content looks like JSON;
    /// otherwise YAML. Missing files and parse failures yield an empty config.
    pub fn load(path: &Path) -> Self {
        let root = read_value(path);
        Self {
            root,
            path: path.to_path_buf(),
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn from_value(root: Value) -> Self {
        Self {
            root,
            path: PathBuf::new(),
        }
    }

    /// The file this config was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let mut cur = &self.root;
        for key in path {
            cur = cur.as_object()?.get(*key)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, path: &[&str], default: &str) -> String {
        match self.get(path) {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => default.to_string(),
        }
    }

    pub fn get_f64(&self, path: &[&str], default: f64) -> f64 {
        match self.get(path) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    pub fn get_i64(&self, path: &[&str], default: i64) -> i64 {
        match self.get(path) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Forgiving bool: accepts real booleans, numbers, and common words.
    pub fn get_bool(&self, path: &[&str], default: bool) -> bool {
        match self.get(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => true,
                "0" | "false" | "no" | "n" | "off" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// A list of non-empty strings; a bare string becomes a single entry.
    pub fn get_str_list(&self, path: &[&str], default: &[&str]) -> Vec<String> {
        match self.get(path) {
            Some(Value::Array(items)) => {
                let out: Vec<String> = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if out.is_empty() {
                    default.iter().map(|s| s.to_string()).collect()
                } else {
                    out
                }
            }
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => default.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Parse the config file content into a JSON value tree.
fn read_value(path: &Path) -> Value {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Value::Null;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.starts_with('{') {
        if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
            if v.is_object() {
                return v;
            }
        }
    }
    match serde_yaml::from_str::<Value>(&raw) {
        Ok(v) if v.is_object() => v,
        _ => Value::Null,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
