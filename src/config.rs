use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default name of the generated file.
pub const DEFAULT_OUTPUT: &str = "drupalTranslations.js";

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "drupal-translations.json";

/// Configuration for drupal-translations
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Glob patterns for source modules (e.g., ["src/**/*.js"])
    #[serde(default = "default_input")]
    pub input: Vec<String>,

    /// Glob patterns excluded from scanning
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Build output directory the generated file is written into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// File name of the generated file, relative to `output_dir`
    #[serde(default = "default_output")]
    pub output: String,
}

/// Errors raised while validating a configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`output` must not be empty")]
    EmptyOutput,

    #[error("`output` must be a file name, not a path: {0:?}")]
    OutputIsPath(String),

    #[error("`outputDir` must not be empty")]
    EmptyOutputDir,

    #[error("`input` must contain at least one glob pattern")]
    NoInput,

    #[error("invalid glob pattern in `{field}`: {pattern:?} ({message})")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        message: String,
    },
}

/// Validated file name of the generated file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputName(String);

impl OutputName {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyOutput);
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::OutputIsPath(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OutputName {
    fn default() -> Self {
        Self(DEFAULT_OUTPUT.to_string())
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "napi")]
use napi_derive::napi;

#[cfg(feature = "napi")]
#[napi(object)]
#[allow(non_snake_case)]
pub struct NapiConfig {
    pub input: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub outputDir: Option<String>,
    pub output: Option<String>,
}

fn default_input() -> Vec<String> {
    ["js", "jsx", "ts", "tsx"]
        .iter()
        .map(|ext| format!("src/**/*.{}", ext))
        .collect()
}

fn default_ignore() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            ignore: default_ignore(),
            output_dir: default_output_dir(),
            output: default_output(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load from default config file, or return default config
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, output_dir: Option<String>, output: Option<String>) -> Result<Self> {
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(name) = output {
            self.output = name;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings that would only fail later, at write time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output_name()?;
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::EmptyOutputDir);
        }
        if self.input.is_empty() {
            return Err(ConfigError::NoInput);
        }
        check_patterns("input", &self.input)?;
        check_patterns("ignore", &self.ignore)?;
        Ok(())
    }

    pub fn output_name(&self) -> Result<OutputName, ConfigError> {
        OutputName::parse(&self.output)
    }

    #[cfg(feature = "napi")]
    pub fn from_napi(config: NapiConfig) -> Result<Self> {
        let defaults = Config::default();
        let config = Config {
            input: config.input.unwrap_or(defaults.input),
            ignore: config.ignore.unwrap_or(defaults.ignore),
            output_dir: config.outputDir.unwrap_or(defaults.output_dir),
            output: config.output.unwrap_or(defaults.output),
        };
        config.validate()?;
        Ok(config)
    }
}

fn check_patterns(field: &'static str, patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        glob::Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            field,
            pattern: pattern.clone(),
            message: e.msg.to_string(),
        })?;
    }
    Ok(())
}
