//! Options loader using figment.
//!
//! # Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific file (`cfgtree.{profile}.toml` / `cfgtree.{profile}.yaml`)
//! 3. Main file (`cfgtree.toml` / `cfgtree.yaml`), or the one given to
//!    [`OptionsLoader::file`]
//! 4. Environment variables (`CFGTREE_*`)
//! 5. Values passed to [`OptionsLoader::set`]
//!
//! # Feature Flags
//!
//! - `toml-options`: search for and accept TOML files
//! - `yaml-options`: search for and accept YAML files
//!
//! # Environment Variable Mapping
//!
//! `__` separates nesting levels:
//!
//! - `CFGTREE_PARSE__MAX_DEPTH=64` sets `parse.max_depth`
//! - `CFGTREE_INCLUDE__DIR=/etc/app` sets `include.dir`
//! - `CFGTREE_LOGGING__LEVEL=debug` sets `logging.level`
//!
//! # Example
//!
//! ```rust,ignore
//! use cfgtree_runtime::options::OptionsLoader;
//!
//! let options = OptionsLoader::new()
//!     .profile("production")
//!     .set("write.indent_width", 4)
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-options", feature = "yaml-options"))]
use figment::providers::Format;
#[cfg(feature = "toml-options")]
use figment::providers::Toml;
#[cfg(feature = "yaml-options")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info, trace};

use super::error::{OptionsError, OptionsResult};
use super::schema::EngineOptions;
use super::validation::validate_options;

const ENV_PREFIX: &str = "CFGTREE_";
const APP_DIR: &str = "cfgtree";

/// Selects profile-specific option files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `CFGTREE_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(format!("{ENV_PREFIX}PROFILE"))
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layered loader for [`EngineOptions`].
pub struct OptionsLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    options_file: Option<PathBuf>,
}

impl Default for OptionsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            options_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for option files. Without any, the
    /// current directory and the user config directory are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.options_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Overrides one value by its dotted key, e.g. `"parse.max_depth"`.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads, extracts and validates the options.
    pub fn load(self) -> OptionsResult<EngineOptions> {
        let profile = self.profile.clone();
        let options: EngineOptions = self.build_figment()?.extract()?;
        validate_options(&options)?;

        debug!(
            profile = %profile,
            max_depth = options.parse.max_depth,
            includes = options.include.enabled,
            logging_level = %options.logging.level,
            "Options loaded"
        );
        Ok(options)
    }

    fn build_figment(self) -> OptionsResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(EngineOptions::default()));

        if let Some(path) = &self.options_file {
            if !path.exists() {
                return Err(OptionsError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading options file");
            figment = Self::merge_file(figment, path)?;
        } else {
            figment = self.search_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn merge_file(figment: Figment, path: &Path) -> OptionsResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-options")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-options")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(OptionsError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR));
        }
        paths
    }

    /// Merges the first main file found for each enabled format, preceded
    /// by its profile-specific sibling.
    #[cfg_attr(
        not(any(feature = "toml-options", feature = "yaml-options")),
        allow(unused_mut)
    )]
    fn search_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-options")]
        {
            let (f, ok) = self.search_format(figment, &search_paths, &["toml"], |fig, path| {
                fig.merge(Toml::file(path))
            });
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-options")]
        {
            let (f, ok) = self.search_format(figment, &search_paths, &["yaml", "yml"], |fig, path| {
                fig.merge(Yaml::file(path))
            });
            figment = f;
            found |= ok;
        }

        if !found {
            debug!(paths = ?search_paths, "No options file found, using defaults");
        }
        figment
    }

    #[cfg(any(feature = "toml-options", feature = "yaml-options"))]
    fn search_format<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        extensions: &[&str],
        merge: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for dir in search_paths {
            for ext in extensions {
                let profile_path = dir.join(format!("{APP_DIR}.{}.{ext}", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile options file");
                    figment = merge(figment, &profile_path);
                }

                let base_path = dir.join(format!("{APP_DIR}.{ext}"));
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading options file");
                    return (merge(figment, &base_path), true);
                }
            }
        }
        (figment, false)
    }
}
