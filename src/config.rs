//! Layered application configuration.
//!
//! Values are merged in this order, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, else `config.toml` in the platform config dir)
//! 3. Environment variables prefixed `HASHSTAMP_` (e.g. `HASHSTAMP_JOBS=4`)
//! 4. Command-line flags
//!
//! The merged [`Config`] is validated and frozen into a [`RunConfig`] before
//! any file is touched.
//!
//! ```toml
//! attr_name = "user.io.hashstamp.digest"
//! hash = "sha256"
//! suffixes = [".py", ".pyc"]
//! regen_cmd = "python3 -m py_compile"
//! jobs = 4
//! max_size = 2097152
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, SelectionArgs, StampArgs};
use crate::regen::{CommandRegenerator, NoopRegenerator, RegenError, Regenerator};
use crate::scanner::{HashAlgorithm, UnknownAlgorithm, WalkerConfig, DEFAULT_SUFFIXES};
use crate::stamp::StamperConfig;
use crate::store::{validate_name, DEFAULT_ATTR_NAME};

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "HASHSTAMP_";

const KNOWN_KEYS: &[&str] = &[
    "root",
    "attr_name",
    "hash",
    "suffixes",
    "regen_cmd",
    "jobs",
    "follow_symlinks",
    "max_size",
    "output",
    "strict",
];

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The layered sources could not be merged or deserialized.
    #[error("Invalid configuration")]
    Load(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),

    /// The hash algorithm name is not supported.
    #[error(transparent)]
    Algorithm(#[from] UnknownAlgorithm),

    /// The attribute name cannot be used.
    #[error("Invalid attribute name '{0}': expected a namespaced name such as 'user.example.digest'")]
    AttrName(String),

    /// The worker count is zero.
    #[error("jobs must be at least 1")]
    ZeroJobs,

    /// The regeneration command is unusable.
    #[error("Invalid regeneration command")]
    Regen(#[from] RegenError),
}

/// Merged configuration, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Traversal root; the current directory when unset
    pub root: Option<PathBuf>,
    /// Extended attribute holding the digest
    pub attr_name: String,
    /// Digest algorithm identifier
    pub hash: String,
    /// File name suffixes to select
    pub suffixes: Vec<String>,
    /// Regeneration command template
    pub regen_cmd: Option<String>,
    /// Worker threads
    pub jobs: usize,
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// Skip files larger than this many bytes
    pub max_size: Option<u64>,
    /// Report format
    pub output: OutputFormat,
    /// Exit non-zero when files were skipped
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            attr_name: DEFAULT_ATTR_NAME.to_string(),
            hash: HashAlgorithm::default().name().to_string(),
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
            regen_cmd: None,
            jobs: 1,
            follow_symlinks: false,
            max_size: None,
            output: OutputFormat::Text,
            strict: false,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// With an explicit `path` the file must exist. Otherwise the platform
    /// default is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any layer
    /// holds a value of the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if !p.exists() => Err(ConfigError::MissingFile(p.to_path_buf())),
            Some(p) => Self::load_from_path(p),
            None => match Self::default_path() {
                Some(p) => Self::load_from_path(&p),
                None => Self::from_figment(Self::figment()),
            },
        }
    }

    /// Load defaults, the TOML file at `path` (if it exists) and the environment.
    ///
    /// Unknown keys in the file are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a value has the wrong type.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::debug!("Loading config from {}", path.display());
            warn_unknown_keys(path);
        }
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(figment)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Platform-specific config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "hashstamp", "hashstamp")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply the selection flags that were given on the command line.
    pub fn merge_selection(&mut self, args: &SelectionArgs) {
        if let Some(root) = args.root() {
            self.root = Some(root.clone());
        }
        if let Some(ref name) = args.attr_name {
            self.attr_name.clone_from(name);
        }
        if let Some(ref hash) = args.hash {
            self.hash.clone_from(hash);
        }
        if !args.suffixes.is_empty() {
            self.suffixes.clone_from(&args.suffixes);
        }
        if let Some(jobs) = args.jobs {
            self.jobs = jobs;
        }
        if let Some(follow) = args.follow_symlinks() {
            self.follow_symlinks = follow;
        }
        if args.max_size.is_some() {
            self.max_size = args.max_size;
        }
        if let Some(output) = args.output {
            self.output = output;
        }
    }

    /// Apply the stamp-only flags that were given on the command line.
    pub fn merge_stamp_args(&mut self, args: &StampArgs) {
        self.merge_selection(&args.selection);
        if let Some(ref cmd) = args.regen_cmd {
            self.regen_cmd = Some(cmd.clone());
        }
        if args.strict {
            self.strict = true;
        }
    }

    /// Check every value and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown algorithm, an unusable
    /// attribute name, a zero worker count or a blank regeneration command.
    pub fn to_run_config(&self, verbose: u8) -> Result<RunConfig, ConfigError> {
        let algorithm: HashAlgorithm = self.hash.parse()?;
        if validate_name(&self.attr_name).is_err() {
            return Err(ConfigError::AttrName(self.attr_name.clone()));
        }
        if self.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        let regen_cmd = self
            .regen_cmd
            .as_deref()
            .map(CommandRegenerator::parse)
            .transpose()?;

        Ok(RunConfig {
            root: self.root.clone().unwrap_or_else(|| PathBuf::from(".")),
            attr_name: self.attr_name.clone(),
            algorithm,
            suffixes: self.suffixes.clone(),
            regen_cmd,
            jobs: self.jobs,
            follow_symlinks: self.follow_symlinks,
            max_size: self.max_size,
            output: self.output,
            strict: self.strict,
            verbose,
        })
    }
}

/// Log a warning for each top-level key the file has that [`Config`] does not.
fn warn_unknown_keys(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        // Syntax errors are reported by figment.
        return;
    };
    for key in unknown_keys(&table) {
        match suggest_key(&key) {
            Some(s) => log::warn!(
                "Unknown config key '{}' in {} (did you mean '{}'?)",
                key,
                path.display(),
                s
            ),
            None => log::warn!("Unknown config key '{}' in {}", key, path.display()),
        }
    }
}

fn unknown_keys(table: &toml::Table) -> Vec<String> {
    table
        .keys()
        .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
        .cloned()
        .collect()
}

/// Closest known key by Jaro-Winkler similarity.
fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|k| (*k, strsim::jaro_winkler(k, key)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k)
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Traversal root as given
    pub root: PathBuf,
    /// Attribute name
    pub attr_name: String,
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Suffix set
    pub suffixes: Vec<String>,
    /// Parsed regeneration command
    pub regen_cmd: Option<CommandRegenerator>,
    /// Worker threads
    pub jobs: usize,
    /// Symlink policy
    pub follow_symlinks: bool,
    /// Size limit
    pub max_size: Option<u64>,
    /// Report format
    pub output: OutputFormat,
    /// Strict exit codes
    pub strict: bool,
    /// Verbosity count
    pub verbose: u8,
}

impl RunConfig {
    /// Walker settings for this run.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_suffixes(self.suffixes.clone())
            .with_follow_symlinks(self.follow_symlinks)
            .with_max_size(self.max_size)
    }

    /// Pipeline settings for this run.
    #[must_use]
    pub fn stamper_config(&self, shutdown_flag: Arc<AtomicBool>) -> StamperConfig {
        StamperConfig::default()
            .with_attr_name(self.attr_name.clone())
            .with_algorithm(self.algorithm)
            .with_walker(self.walker_config())
            .with_jobs(self.jobs)
            .with_shutdown_flag(shutdown_flag)
    }

    /// The configured regenerator, or a no-op one.
    #[must_use]
    pub fn regenerator(&self) -> Arc<dyn Regenerator> {
        match self.regen_cmd {
            Some(ref cmd) => Arc::new(cmd.clone()),
            None => Arc::new(NoopRegenerator),
        }
    }
}
