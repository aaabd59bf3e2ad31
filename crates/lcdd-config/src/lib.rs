//! Configuration loading (§6/§4.6 ambient stack): `lcdd.toml` via `serde` +
//! `toml`, following the same `ConfigFile`/`discover`/`load_from` shape used
//! elsewhere in the pack. Unknown fields are ignored for forward
//! compatibility.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::PathBuf;

/// Port LCDproc clients traditionally connect to.
pub const DEFAULT_PORT: u16 = 13666;
pub const DEFAULT_FRAME_RATE_HZ: u32 = 32;
pub const DEFAULT_DURATION_FRAMES: u32 = 128;
pub const DEFAULT_MAX_RENDER_LAG_FRAMES: u32 = 16;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub allow: Vec<IpAddr>,
    pub driver: String,
    pub frame_rate_hz: u32,
    pub default_duration_frames: u32,
    pub max_render_lag_frames: u32,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            allow: vec![IpAddr::from([127, 0, 0, 1])],
            driver: "null".to_string(),
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            default_duration_frames: DEFAULT_DURATION_FRAMES,
            max_render_lag_frames: DEFAULT_MAX_RENDER_LAG_FRAMES,
        }
    }
}

/// Effective server configuration, after CLI overrides are applied on top
/// of the parsed file (§6).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub allow: Vec<IpAddr>,
    pub driver: String,
    pub frame_rate_hz: u32,
    pub default_duration_frames: u32,
    pub max_render_lag_frames: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ConfigFile::default().into()
    }
}

impl From<ConfigFile> for ServerConfig {
    fn from(f: ConfigFile) -> Self {
        Self {
            bind_addr: f.bind_addr,
            port: f.port,
            allow: f.allow,
            driver: f.driver,
            frame_rate_hz: f.frame_rate_hz,
            default_duration_frames: f.default_duration_frames,
            max_render_lag_frames: f.max_render_lag_frames,
        }
    }
}

impl ServerConfig {
    /// Loopback always implicitly trusted, even with a populated allow-list,
    /// so a misconfigured file can't lock out local clients.
    pub fn is_allowed(&self, addr: IpAddr) -> bool {
        addr.is_loopback() || self.allow.iter().any(|a| *a == addr)
    }
}

/// Best-effort config path following platform conventions (XDG / AppData).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("lcdd.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("lcdd").join("lcdd.toml");
    }
    PathBuf::from("lcdd.toml")
}

/// Load configuration from `path` (or the discovered default). A missing
/// file yields defaults; a malformed file is an error, since an operator
/// who wrote one presumably wants it honored, not silently ignored.
pub fn load_from(path: Option<PathBuf>) -> Result<ServerConfig> {
    let path = path.unwrap_or_else(discover);
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let file: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            tracing::info!(target: "config", path = %path.display(), "loaded configuration");
            Ok(file.into())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(target: "config", path = %path.display(), "no config file, using defaults");
            Ok(ServerConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_lcdd__.toml"))).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.frame_rate_hz, DEFAULT_FRAME_RATE_HZ);
    }

    #[test]
    fn parses_overridden_fields() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "port = 9999\nframe_rate_hz = 10\ndriver = \"curses\"\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.frame_rate_hz, 10);
        assert_eq!(cfg.driver, "curses");
        assert_eq!(cfg.default_duration_frames, DEFAULT_DURATION_FRAMES);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "port = \"not a number\"\n").unwrap();
        assert!(load_from(Some(tmp.path().to_path_buf())).is_err());
    }

    #[test]
    fn loopback_is_always_allowed_even_with_a_populated_allow_list() {
        let mut cfg = ServerConfig::default();
        cfg.allow = vec!["10.0.0.5".parse().unwrap()];
        assert!(cfg.is_allowed("127.0.0.1".parse().unwrap()));
        assert!(cfg.is_allowed("10.0.0.5".parse().unwrap()));
        assert!(!cfg.is_allowed("10.0.0.6".parse().unwrap()));
    }
}
