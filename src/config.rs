// galaxy - CLI for the Galaxy console slot API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::CommandError;
use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const CONSOLE_ENV: &str = "GALAXY_CONSOLE";
pub const SSH_COMMAND_ENV: &str = "GALAXY_SSH_COMMAND";
pub const CONFIG_DIR_ENV: &str = "GALAXY_CONFIG_DIR";
pub const DEFAULT_SSH_COMMAND: &str = "ssh";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub console: Option<String>,
    pub ssh_command: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a config directory for the current user")]
    MissingConfigDir,
}

/// Values from the command line that take precedence over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub console: Option<String>,
    pub debug: bool,
}

/// Fully resolved invocation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub console_url: String,
    pub ssh_command: String,
    pub debug: bool,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".galaxy.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var(CONFIG_DIR_ENV) {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("galaxy").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<ConfigFile> {
    // A user without a config directory can still run with flags and env.
    let user = match config_path(Scope::User, cwd) {
        Ok(path) => read_if_exists(&path)?.unwrap_or_default(),
        Err(_) => ConfigFile::default(),
    };
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

/// Flag, then environment, then local file, then user file.
pub fn resolve(cwd: &Path, overrides: Overrides) -> Result<Settings> {
    let file = load(cwd)?;

    let console_url = non_empty(overrides.console)
        .or_else(|| non_empty(env::var(CONSOLE_ENV).ok()))
        .or_else(|| non_empty(file.console))
        .ok_or_else(|| {
            CommandError::invalid_usage(
                "You must set Galaxy console host by passing --console CONSOLE or by setting the GALAXY_CONSOLE environment variable.",
            )
        })?;

    let ssh_command = non_empty(env::var(SSH_COMMAND_ENV).ok())
        .or_else(|| non_empty(file.ssh_command))
        .unwrap_or_else(|| DEFAULT_SSH_COMMAND.to_string());

    Ok(Settings {
        console_url,
        ssh_command,
        debug: overrides.debug,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_if_exists(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

fn merge(user: ConfigFile, local: ConfigFile) -> ConfigFile {
    ConfigFile {
        console: local.console.or(user.console),
        ssh_command: local.ssh_command.or(user.ssh_command),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{ErrorCode, command_error};
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use tempfile::{TempDir, tempdir};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    /// Serializes tests that touch the process environment and points the
    /// user config dir at an empty temp dir.
    pub(crate) fn isolated_env() -> (MutexGuard<'static, ()>, TempDir) {
        let guard = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = tempdir().unwrap();
        unsafe {
            env::set_var(CONFIG_DIR_ENV, dir.path().join("config"));
            env::remove_var(CONSOLE_ENV);
            env::remove_var(SSH_COMMAND_ENV);
        }
        (guard, dir)
    }

    fn write(path: &Path, config: &ConfigFile) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, serde_yaml::to_string(config).unwrap()).unwrap();
    }

    #[test]
    fn flag_beats_env_beats_files() {
        let (_guard, cwd) = isolated_env();
        write(
            &config_path(Scope::User, cwd.path()).unwrap(),
            &ConfigFile {
                console: Some("http://user.test".into()),
                ssh_command: Some("ssh -A".into()),
            },
        );
        write(
            &config_path(Scope::Local, cwd.path()).unwrap(),
            &ConfigFile {
                console: Some("http://local.test".into()),
                ssh_command: None,
            },
        );

        let settings = resolve(cwd.path(), Overrides::default()).unwrap();
        assert_eq!(settings.console_url, "http://local.test");
        assert_eq!(settings.ssh_command, "ssh -A");
        assert!(!settings.debug);

        unsafe {
            env::set_var(CONSOLE_ENV, "http://env.test");
            env::set_var(SSH_COMMAND_ENV, "mosh");
        }
        let settings = resolve(cwd.path(), Overrides::default()).unwrap();
        assert_eq!(settings.console_url, "http://env.test");
        assert_eq!(settings.ssh_command, "mosh");

        let settings = resolve(
            cwd.path(),
            Overrides {
                console: Some("http://flag.test".into()),
                debug: true,
            },
        )
        .unwrap();
        assert_eq!(settings.console_url, "http://flag.test");
        assert!(settings.debug);
    }

    #[test]
    fn defaults_ssh_command() {
        let (_guard, cwd) = isolated_env();
        let settings = resolve(
            cwd.path(),
            Overrides {
                console: Some("http://flag.test".into()),
                debug: false,
            },
        )
        .unwrap();
        assert_eq!(settings.ssh_command, DEFAULT_SSH_COMMAND);
    }

    #[test]
    fn missing_or_empty_console_is_invalid_usage() {
        let (_guard, cwd) = isolated_env();
        let err = resolve(cwd.path(), Overrides::default()).unwrap_err();
        assert_eq!(command_error(&err).unwrap().code, ErrorCode::InvalidUsage);

        unsafe {
            env::set_var(CONSOLE_ENV, "");
        }
        let err = resolve(
            cwd.path(),
            Overrides {
                console: Some("   ".into()),
                debug: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("GALAXY_CONSOLE"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (_guard, cwd) = isolated_env();
        fs::write(cwd.path().join(".galaxy.yaml"), "console: [unclosed").unwrap();
        let err = resolve(cwd.path(), Overrides::default()).unwrap_err();
        assert!(command_error(&err).is_none());
        assert!(err.to_string().contains("parsing"));
    }
}
