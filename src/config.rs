use std::env;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::tape::DEFAULT_TAPE_SIZE;

/// Machine settings resolved from the config file and environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    pub tape_size: usize,
    pub max_steps: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            max_steps: None,
            timeout_ms: None,
        }
    }
}

/// Shape of `bfm.toml`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    machine: Option<MachineSection>,
}

#[derive(Debug, Default, Deserialize)]
struct MachineSection {
    tape_size: Option<usize>,
    max_steps: Option<usize>,
    timeout_ms: Option<u64>,
}

impl MachineConfig {
    /// Defaults, overlaid with `bfm.toml`, overlaid with `BFM_*` variables.
    pub fn load() -> Self {
        let mut cfg = Self::default();
        if let Some(content) = read_config_file() {
            cfg.apply_toml(&content);
        }
        cfg.apply_env(|key| env::var(key).ok());
        cfg
    }

    /// Apply the `[machine]` section of a config file.
    ///
    /// Unknown keys and other sections are ignored. A file that fails to
    /// parse leaves the settings untouched.
    pub fn apply_toml(&mut self, content: &str) {
        let file: ConfigFile = match toml::from_str(content) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "ignoring malformed config file");
                return;
            }
        };
        let Some(machine) = file.machine else { return };

        match machine.tape_size {
            Some(0) => warn!(key = "tape_size", origin = "config file", "ignoring tape size; expected a positive integer"),
            Some(n) => self.tape_size = n,
            None => {}
        }
        if let Some(n) = machine.max_steps {
            self.max_steps = Some(n);
        }
        if let Some(ms) = machine.timeout_ms {
            self.timeout_ms = Some(ms);
        }
    }

    /// Apply `BFM_TAPE_SIZE`, `BFM_MAX_STEPS` and `BFM_TIMEOUT_MS` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.overlay(
            |key| lookup(&format!("BFM_{}", key.to_ascii_uppercase())),
            "environment",
        );
    }

    fn overlay<F>(&mut self, get: F, origin: &str)
    where
        F: Fn(&str) -> Option<String>,
    {
        let cfg = self;

        macro_rules! set {
            ($field:ident, $key:literal, $wrap:expr) => {
                if let Some(raw) = get($key) {
                    match raw.trim().parse() {
                        Ok(v) => cfg.$field = $wrap(v),
                        Err(_) => warn!(key = $key, value = %raw, origin, "ignoring malformed setting"),
                    }
                }
            };
        }

        set!(max_steps, "max_steps", Some);
        set!(timeout_ms, "timeout_ms", Some);

        if let Some(raw) = get("tape_size") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.tape_size = n,
                _ => warn!(key = "tape_size", value = %raw, origin, "ignoring tape size; expected a positive integer"),
            }
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("BFM_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bfm.toml");
    Some(path)
}

fn read_config_file() -> Option<String> {
    let path = config_path()?;
    match fs::read_to_string(&path) {
        Ok(content) => {
            debug!(path = %path.display(), "loaded config file");
            Some(content)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no config file");
            None
        }
    }
}
