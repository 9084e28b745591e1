//! Configuration for content backends.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from vellum.toml)
//! - User overrides (./vellum.toml or ~/.config/vellum/vellum.toml)
//! - Automatic merging with user values taking precedence

use crate::{BackendKind, DocumentStoreResolver, FileSystemResolver, MemoryBucket, ResourceResolver};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};
use vellum_error::{ConfigError, VellumError, VellumResult};

/// Content store behaviour.
///
/// ```toml
/// [store]
/// backend = "filesystem"
/// serialize_writes = false
/// copy_chunk_size = 65536
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSettings {
    /// Which backend holds content
    #[serde(default)]
    pub backend: BackendKind,

    /// Serialize writes and deletes per content key
    #[serde(default)]
    pub serialize_writes: bool,

    /// Bytes copied per chunk when streaming content into a backend
    #[serde(default = "default_copy_chunk_size")]
    pub copy_chunk_size: usize,
}

fn default_copy_chunk_size() -> usize {
    64 * 1024
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            serialize_writes: false,
            copy_chunk_size: default_copy_chunk_size(),
        }
    }
}

/// Filesystem backend settings.
///
/// ```toml
/// [filesystem]
/// root = "/var/vellum/content"
/// read_only = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileSystemSettings {
    /// Directory under which content is stored
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Serve existing content without writes or deletes
    #[serde(default)]
    pub read_only: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from("content")
}

impl Default for FileSystemSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            read_only: false,
        }
    }
}

/// Document backend settings.
///
/// ```toml
/// [document]
/// bucket = "fs"
/// chunk_size = 261120
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocumentSettings {
    /// Bucket name
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Size of the chunks documents are split into
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_bucket() -> String {
    "fs".to_string()
}

fn default_chunk_size() -> usize {
    255 * 1024
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Top-level Vellum configuration.
///
/// Loads from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from vellum.toml)
/// 2. User override (./vellum.toml or ~/.config/vellum/vellum.toml)
///
/// # Example
///
/// ```no_run
/// use vellum_storage::VellumConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = VellumConfig::load()?;
/// let resolver = config.build_resolver()?;
/// println!("Content lives in the {} backend", resolver.backend());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct VellumConfig {
    /// Content store behaviour
    #[serde(default)]
    pub store: StoreSettings,

    /// Filesystem backend settings
    #[serde(default)]
    pub filesystem: FileSystemSettings,

    /// Document backend settings
    #[serde(default)]
    pub document: DocumentSettings,
}

impl VellumConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> VellumResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (vellum.toml shipped with the library)
    /// 2. User config in home directory (~/.config/vellum/vellum.toml)
    /// 3. User config in current directory (./vellum.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> VellumResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../../../vellum.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/vellum/vellum.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("vellum").required(false));

        let config: Self = builder
            .build()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check settings the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a zero chunk size or an empty root or
    /// bucket name.
    pub fn validate(&self) -> VellumResult<()> {
        if self.store.copy_chunk_size == 0 {
            return Err(ConfigError::new("store.copy_chunk_size must be positive").into());
        }
        if self.filesystem.root.as_os_str().is_empty() {
            return Err(ConfigError::new("filesystem.root must not be empty").into());
        }
        if self.document.bucket.trim().is_empty() {
            return Err(ConfigError::new("document.bucket must not be empty").into());
        }
        if self.document.chunk_size == 0 {
            return Err(ConfigError::new("document.chunk_size must be positive").into());
        }
        Ok(())
    }

    /// Build the resolver for the configured backend.
    ///
    /// The document backend is served by an in-process [`MemoryBucket`].
    #[instrument(skip(self), fields(backend = %self.store.backend))]
    pub fn build_resolver(&self) -> VellumResult<Arc<dyn ResourceResolver>> {
        self.validate()?;

        let resolver: Arc<dyn ResourceResolver> = match self.store.backend {
            BackendKind::Filesystem => {
                let resolver = FileSystemResolver::new(&self.filesystem.root)?;
                if self.filesystem.read_only {
                    Arc::new(resolver.read_only())
                } else {
                    Arc::new(resolver)
                }
            }
            BackendKind::Document => {
                let bucket =
                    MemoryBucket::with_chunk_size(&self.document.bucket, self.document.chunk_size);
                Arc::new(DocumentStoreResolver::new(Arc::new(bucket)))
            }
        };

        debug!("Built resource resolver");
        Ok(resolver)
    }
}
