//! Project configuration (typeroll.toml) parsing and types.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Root configuration structure for typeroll.toml.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TyperollConfig {
    /// Entry source files or glob patterns.
    #[serde(default)]
    pub entry: Vec<String>,
    /// Bundle configuration.
    #[serde(default)]
    pub bundle: BundleConfig,
}

/// Bundle configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BundleConfig {
    /// Output directory for declaration files.
    pub out_dir: Option<String>,
    /// Inline external package declarations: `true` for all, or a list of
    /// package names.
    pub resolve: Option<ResolveSetting>,
    /// Use the whole-program checker instead of isolated declarations.
    pub infer_types: Option<bool>,
    /// Use the native-preview checker binary.
    pub tsgo: Option<bool>,
    /// Alternative project configuration for the checker.
    pub tsconfig: Option<String>,
    /// Allow shared chunks between entries.
    pub splitting: Option<bool>,
    /// Minify the final declaration text.
    pub minify: Option<bool>,
    /// Output naming pattern.
    pub naming: Option<String>,
}

/// `resolve = true` or `resolve = ["pkg", …]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResolveSetting {
    All(bool),
    Packages(Vec<String>),
}

impl TyperollConfig {
    /// Load configuration from typeroll.toml under the given directory.
    /// Returns None if the file doesn't exist.
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join("typeroll.toml");
        if !path.exists() {
            return None;
        }
        let content = fs::read_to_string(path).ok()?;
        Self::parse(&content).ok()
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration or return default if not found.
    pub fn load_or_default(dir: &Path) -> Self {
        Self::load(dir).unwrap_or_default()
    }
}

impl BundleConfig {
    /// Get the output directory, defaulting to "dist".
    pub fn out_dir(&self) -> &str {
        self.out_dir.as_deref().unwrap_or("dist")
    }

    pub fn splitting(&self) -> bool {
        self.splitting.unwrap_or(false)
    }

    pub fn minify(&self) -> bool {
        self.minify.unwrap_or(false)
    }

    pub fn infer_types(&self) -> bool {
        self.infer_types.unwrap_or(false)
    }

    pub fn tsgo(&self) -> bool {
        self.tsgo.unwrap_or(false)
    }
}
