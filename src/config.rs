use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::pkg::cache::project_dirs;
use crate::synth::shortcuts::AliasTable;
use crate::toolchain::{GO_ENV, Toolchain};

pub const CONFIG_ENV: &str = "GRUN_CONFIG";
pub const CONFIG_FILE: &str = "config.toml";

/// Optional user settings, read from `config.toml` in the OS config directory.
///
/// ```toml
/// go = "/usr/local/go/bin/go"
///
/// [aliases]
/// F = "filepath"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub go: Option<String>,
    pub aliases: BTreeMap<String, String>,
}

impl Config {
    pub fn parse(toml_text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str::<Config>(toml_text)?)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        if let Ok(p) = std::env::var(CONFIG_ENV)
            && !p.trim().is_empty()
        {
            return Ok(PathBuf::from(p));
        }
        Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
    }

    /// Load the config file if there is one; a missing file means defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path()?;
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse {}", path.display()))
    }

    /// Default aliases overlaid with the configured ones.
    pub fn alias_table(&self) -> anyhow::Result<AliasTable> {
        let mut table = AliasTable::default();
        for (key, pkg) in &self.aliases {
            table.insert(key, pkg)?;
        }
        Ok(table)
    }

    /// `GRUN_GO` beats the config file, which beats plain `go`.
    pub fn toolchain(&self) -> Toolchain {
        let from_env = std::env::var(GO_ENV).ok().filter(|s| !s.trim().is_empty());
        match from_env.or_else(|| self.go.clone()) {
            Some(go) => Toolchain::new(go),
            None => Toolchain::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn empty_config_keeps_defaults() {
        let cfg = Config::parse("").expect("parse empty");
        assert!(cfg.go.is_none());
        let table = cfg.alias_table().expect("aliases");
        assert_eq!(table.get('S'), Some("strings"));
        assert_eq!(table.get('M'), Some("math"));
        assert_eq!(table.get('C'), Some("strconv"));
    }

    #[test]
    fn aliases_extend_and_override() {
        let cfg = Config::parse(
            r#"
go = "/opt/go/bin/go"

[aliases]
F = "filepath"
M = "maps"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.go.as_deref(), Some("/opt/go/bin/go"));
        let table = cfg.alias_table().expect("aliases");
        assert_eq!(table.get('F'), Some("filepath"));
        assert_eq!(table.get('M'), Some("maps"));
        assert_eq!(table.get('S'), Some("strings"));
    }

    #[test]
    fn bad_alias_key_is_rejected() {
        let cfg = Config::parse("[aliases]\nfoo = \"strings\"\n").expect("parse");
        assert!(cfg.alias_table().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("colour = true\n").is_err());
    }
}
