//! Programmer parameter strings
//!
//! Parses the `key1=value1,key2=value2` syntax carried after `--programmer
//! NAME:`. Matching the source's convention, a programmer's init code pulls
//! out the keys it recognizes with [`ParamString::take`]; whatever is left
//! over once init finishes is logged, not treated as an error.

/// A parsed, mutable `key=value,...` parameter list.
pub struct ParamString {
    pairs: Vec<(String, String)>,
}

impl ParamString {
    pub fn parse(s: &str) -> Self {
        let pairs = s
            .split(',')
            .filter(|p| !p.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();
        Self { pairs }
    }

    /// Remove and return a named parameter's value, if present.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    /// Log every parameter nobody claimed via `take`.
    pub fn warn_unused(&self) {
        for (k, v) in &self.pairs {
            log::warn!("unknown programmer parameter ignored: {k}={v}");
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer parameter value.
pub fn parse_int(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| format!("invalid hex value: {s}"))
    } else {
        s.parse::<u64>().map_err(|_| format!("invalid integer value: {s}"))
    }
}
