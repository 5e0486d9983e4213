use std::collections::HashMap;
use std::fs;
use std::str::FromStr;

/// INI-style configuration: optional global `key = value` lines followed by
/// `[Section]` blocks. `#` starts a comment line and values may be quoted.
///
/// ```text
/// [Signaling]
/// bind_addr = 0.0.0.0:5000
/// outbound_queue = 256
///
/// [Persistence]
/// sessions_path = "sessions.jsonl"
/// ```
#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Error reading file {path}: {e}"))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::empty();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_string();
            let value = value.trim().trim_matches('"').to_string();

            match &current_section {
                None => {
                    cfg.globals.insert(key, value);
                }
                Some(sec) => {
                    cfg.sections
                        .entry(sec.clone())
                        .or_default()
                        .insert(key, value);
                }
            }
        }
        cfg
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(String::as_str)
    }

    /// Section value, then global value, then `default`.
    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Parse a value with `FromStr`, falling back to `default` when the key is
    /// missing or does not parse.
    #[must_use]
    pub fn get_parsed_or<T: FromStr>(&self, section: &str, key: &str, default: T) -> T {
        self.get_non_empty(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
