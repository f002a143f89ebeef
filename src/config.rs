//! Organizer configuration.
//!
//! This module loads the folders, options and category table from a TOML file.
//! Every value can be overridden on the command line; anything left unset falls
//! back to a default.
//!
//! # Configuration File Format
//!
//! ```toml
//! source = "/home/me/Downloads"
//! organized = "/home/me/Downloads/Organized"
//! unorganized = "/home/me/Downloads/Unorganized"
//!
//! [options]
//! use_creation_date = false
//! force_date = false
//! date_folders = false
//!
//! [[categories]]
//! name = "images"
//! extensions = [".jpg", ".png"]
//!
//! [[categories]]
//! name = "backups"
//! extensions = [".bak"]
//! ```
//!
//! Categories are matched in file order. Without a `categories` list the
//! built-in table is used.

use crate::file_category::{Category, FileMapper, normalize_extension};
use crate::organizer::OrganizeOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the organized root when none is configured.
pub const DEFAULT_ORGANIZED_DIR: &str = "Organized";

/// Name of the unorganized root when none is configured.
pub const DEFAULT_UNORGANIZED_DIR: &str = "Unorganized";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading or writing configuration.
    IoError(String),
    /// No source folder was given in the file or on the command line.
    MissingSource,
    /// Two categories share a name.
    DuplicateCategory(String),
    /// A category name is empty or contains a path separator.
    InvalidCategoryName(String),
    /// An extension is empty.
    InvalidExtension {
        /// The category listing the extension.
        category: String,
        /// The offending value.
        extension: String,
    },
    /// Serializing the configuration failed.
    SerializeFailed(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error on configuration: {}", msg),
            ConfigError::MissingSource => {
                write!(f, "No source folder given (set `source` or pass a path)")
            }
            ConfigError::DuplicateCategory(name) => {
                write!(f, "Category '{}' is defined more than once", name)
            }
            ConfigError::InvalidCategoryName(name) => {
                write!(f, "Invalid category name '{}'", name)
            }
            ConfigError::InvalidExtension {
                category,
                extension,
            } => write!(
                f,
                "Invalid extension '{}' in category '{}'",
                extension, category
            ),
            ConfigError::SerializeFailed(msg) => {
                write!(f, "Could not serialize configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Organizer configuration as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Folder to organize.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Root for categorized files. Defaults to `<source>/Organized`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organized: Option<PathBuf>,

    /// Root for moved subfolders. Defaults to `<source>/Unorganized`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unorganized: Option<PathBuf>,

    #[serde(default)]
    pub options: OrganizeOptions,

    /// Ordered category table. `None` means the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<PathBuf>,
    pub organized: Option<PathBuf>,
    pub unorganized: Option<PathBuf>,
    pub use_creation_date: bool,
    pub force_date: bool,
    pub date_folders: bool,
    pub dry_run: bool,
}

/// A configuration with every value decided and validated.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub source: PathBuf,
    pub organized_root: PathBuf,
    pub unorganized_root: PathBuf,
    pub options: OrganizeOptions,
    pub mapper: FileMapper,
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".dirsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home_config) = Self::user_config_path()
            && home_config.exists()
        {
            return Self::load_from_file(&home_config);
        }

        Ok(Self::default())
    }

    /// `~/.config/dirsort/config.toml`, if a home directory is known.
    pub fn user_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml"),
        )
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// The default configuration with the built-in category table spelled out,
    /// as written by `dirsort init`.
    pub fn starter() -> Self {
        Self {
            categories: Some(FileMapper::default().categories().to_vec()),
            ..Self::default()
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeFailed(e.to_string()))
    }

    /// Writes this configuration to `path`, creating parent folders.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }
        fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Builds the category mapper, normalizing and validating the table.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or duplicate category names and for empty
    /// extensions.
    pub fn mapper(&self) -> Result<FileMapper, ConfigError> {
        let Some(categories) = &self.categories else {
            return Ok(FileMapper::default());
        };

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(categories.len());
        for category in categories {
            let name = category.name.trim();
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(ConfigError::InvalidCategoryName(category.name.clone()));
            }
            if !seen.insert(name.to_string()) {
                return Err(ConfigError::DuplicateCategory(name.to_string()));
            }

            let mut extensions: Vec<String> = Vec::with_capacity(category.extensions.len());
            for ext in &category.extensions {
                let normalized_ext = normalize_extension(ext);
                if normalized_ext == "." {
                    return Err(ConfigError::InvalidExtension {
                        category: name.to_string(),
                        extension: ext.clone(),
                    });
                }
                if !extensions.contains(&normalized_ext) {
                    extensions.push(normalized_ext);
                }
            }

            normalized.push(Category {
                name: name.to_string(),
                extensions,
            });
        }
        Ok(FileMapper::new(normalized))
    }

    /// Applies command-line overrides and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSource` when no source folder is known, or
    /// any error from [`OrganizerConfig::mapper`].
    pub fn resolve(&self, overrides: &ConfigOverrides) -> Result<ResolvedConfig, ConfigError> {
        let source = overrides
            .source
            .clone()
            .or_else(|| self.source.clone())
            .ok_or(ConfigError::MissingSource)?;

        let organized_root = overrides
            .organized
            .clone()
            .or_else(|| self.organized.clone())
            .unwrap_or_else(|| source.join(DEFAULT_ORGANIZED_DIR));

        let unorganized_root = overrides
            .unorganized
            .clone()
            .or_else(|| self.unorganized.clone())
            .unwrap_or_else(|| source.join(DEFAULT_UNORGANIZED_DIR));

        let options = OrganizeOptions {
            use_creation_date: self.options.use_creation_date || overrides.use_creation_date,
            force_date: self.options.force_date || overrides.force_date,
            date_folders: self.options.date_folders || overrides.date_folders,
            dry_run: overrides.dry_run,
        };

        Ok(ResolvedConfig {
            source,
            organized_root,
            unorganized_root,
            options,
            mapper: self.mapper()?,
        })
    }
}
