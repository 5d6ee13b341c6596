//! Reader for Kconfig-style `.config` files.
//!
//! Each meaningful line is `CONFIG_<KEY>=<value>`. Blank lines and `#`
//! comments are skipped. Any malformed line leaves the whole file
//! unconfigured.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

const KEY_PREFIX: &str = "CONFIG_";

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KconfigValue {
    /// `y`
    Bool(bool),
    /// `"quoted"`
    Str(String),
    /// Decimal or `0x` hexadecimal
    Int(i64),
}

impl fmt::Display for KconfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KconfigValue::Bool(b) => write!(f, "{}", if *b { "y" } else { "n" }),
            KconfigValue::Str(s) => write!(f, "\"{}\"", s),
            KconfigValue::Int(i) => write!(f, "{}", i),
        }
    }
}

/// Parsed configuration values, keyed without the `CONFIG_` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KconfigValues {
    values: BTreeMap<String, KconfigValue>,
}

impl KconfigValues {
    /// Read a `.config` file. A missing file yields an unconfigured set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(KconfigValues::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build configuration: {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    /// Parse `.config` contents.
    pub fn parse(contents: &str) -> Self {
        let mut values = BTreeMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return KconfigValues::default();
            };
            let (key, value) = (key.trim(), value.trim());
            let Some(key) = key.strip_prefix(KEY_PREFIX) else {
                return KconfigValues::default();
            };
            if key.is_empty() || value.is_empty() {
                return KconfigValues::default();
            }

            match parse_value(value) {
                Some(value) => {
                    values.insert(key.to_string(), value);
                }
                None => {
                    tracing::warn!("unrecognised value type: {}", value);
                    return KconfigValues::default();
                }
            }
        }

        KconfigValues { values }
    }

    /// Whether any configuration was read.
    pub fn configured(&self) -> bool {
        !self.values.is_empty()
    }

    /// Get a value, `None` for undefined keys.
    pub fn get(&self, key: &str) -> Option<&KconfigValue> {
        self.values.get(key)
    }

    /// Get a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(KconfigValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}

fn parse_value(value: &str) -> Option<KconfigValue> {
    if value == "y" {
        return Some(KconfigValue::Bool(true));
    }
    if value.starts_with('"') && value.ends_with('"') {
        let inner = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or_default();
        return Some(KconfigValue::Str(inner.to_string()));
    }
    if let Some(hex) = value.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(KconfigValue::Int);
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse().ok().map(KconfigValue::Int);
    }
    None
}
