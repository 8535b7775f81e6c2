// ============================================================================
// src/config.rs – strict config loader
// ============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::action::shell::Elevation;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElevationCfg {
    /// Tool that re-executes privileged commands (sudo, doas, pkexec).
    #[serde(default = "default_elevation_tool")]
    pub tool: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_elevation_tool() -> String {
    "sudo".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ElevationCfg {
    fn default() -> Self {
        Self {
            tool: default_elevation_tool(),
            enabled: true,
        }
    }
}

impl ElevationCfg {
    pub fn elevation(&self) -> Elevation {
        if self.enabled && !self.tool.is_empty() {
            Elevation::Tool(self.tool.clone())
        } else {
            Elevation::None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpgCfg {
    #[serde(default = "default_gpg_binary")]
    pub binary: String,
    #[serde(default)]
    pub homedir: Option<PathBuf>,
    /// ASCII-armored output (`.asc`) instead of binary (`.gpg`).
    #[serde(default = "default_true")]
    pub armor: bool,
    /// Recipient used when `--gpg-key` is not given.
    #[serde(default)]
    pub default_recipient: Option<String>,
}

fn default_gpg_binary() -> String {
    "gpg".to_string()
}

impl Default for GpgCfg {
    fn default() -> Self {
        Self {
            binary: default_gpg_binary(),
            homedir: None,
            armor: true,
            default_recipient: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultsCfg {
    /// Directory vault paths are resolved against (default: home directory).
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Hand new mount points to this owner/group (both required).
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditCfg {
    /// Append-only audit log; disabled when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub elevation: ElevationCfg,
    #[serde(default)]
    pub gpg: GpgCfg,
    #[serde(default)]
    pub vaults: VaultsCfg,
    #[serde(default)]
    pub audit: AuditCfg,
}

impl Config {
    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self> {
        let s = fs::read_to_string(&p)
            .with_context(|| format!("read config: {}", p.as_ref().display()))?;
        let cfg: Self = if p.as_ref().extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&s).context("toml parse")?
        } else {
            serde_yaml::from_str(&s).context("yaml parse")?
        };
        Ok(cfg)
    }

    /// Load `explicit` if given (must exist), otherwise the per-user default
    /// file when present, otherwise built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zvault").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "").unwrap();
        let cfg = Config::load(&p).unwrap();
        assert_eq!(cfg.elevation.elevation(), Elevation::Tool("sudo".into()));
        assert_eq!(cfg.gpg.binary, "gpg");
        assert!(cfg.gpg.armor);
        assert!(cfg.audit.path.is_none());
    }

    #[test]
    fn toml_and_yaml_are_both_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let t = dir.path().join("c.toml");
        fs::write(
            &t,
            "[elevation]\ntool = \"doas\"\n[gpg]\narmor = false\ndefault_recipient = \"ABCD1234\"\n",
        )
        .unwrap();
        let cfg = Config::load(&t).unwrap();
        assert_eq!(cfg.elevation.elevation(), Elevation::Tool("doas".into()));
        assert!(!cfg.gpg.armor);
        assert_eq!(cfg.gpg.default_recipient.as_deref(), Some("ABCD1234"));

        let y = dir.path().join("c.yaml");
        fs::write(&y, "elevation:\n  enabled: false\nvaults:\n  owner: alice\n  group: staff\n")
            .unwrap();
        let cfg = Config::load(&y).unwrap();
        assert_eq!(cfg.elevation.elevation(), Elevation::None);
        assert_eq!(cfg.vaults.owner.as_deref(), Some("alice"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("c.toml");
        fs::write(&p, "[gpg]\nbinaryy = \"gpg2\"\n").unwrap();
        assert!(Config::load(&p).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::resolve(Some(dir.path().join("absent.toml").as_path())).is_err());
    }
}
