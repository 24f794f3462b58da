//! Optimizer configuration.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::tensor::DataType;

/// Placeholder written into data-dependent dimensions by speculative shape inference.
pub const DEFAULT_SPECULATIVE_DIM: i64 = 1000;

/// Settings that steer one compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Catalog name of the backend whose kernels are instantiated (e.g. `"arm"`, `"cuda"`).
    pub backend: String,
    /// Floating type that generic data-type selection propagates.
    pub preferred_fp_type: DataType,
    /// Requested output type: `Unknown` inherits, `Int8` copies quantization, anything else
    /// forces that type.
    pub requested_type: DataType,
    /// Planning-only size used for dimensions that depend on runtime data.
    pub speculative_dim: i64,
    /// How many times deferred nodes are retried before the driver gives up on them.
    pub max_retry_rounds: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            backend: "arm".to_string(),
            preferred_fp_type: DataType::Float32,
            requested_type: DataType::Unknown,
            speculative_dim: DEFAULT_SPECULATIVE_DIM,
            max_retry_rounds: 4,
        }
    }
}

impl OptimizerConfig {
    pub fn for_backend(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }

    /// Applies `NNOPT_SPECULATIVE_DIM` and `NNOPT_PREFERRED_FP` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dim) = crate::env::speculative_dim_override() {
            self.speculative_dim = dim;
        }
        if let Some(dtype) = crate::env::preferred_fp_override() {
            self.preferred_fp_type = dtype;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.backend.is_empty(), "backend name must not be empty");
        ensure!(
            self.preferred_fp_type.is_float(),
            "preferred_fp_type must be a floating type, got {}",
            self.preferred_fp_type
        );
        ensure!(
            self.speculative_dim > 0,
            "speculative_dim must be positive, got {}",
            self.speculative_dim
        );
        Ok(())
    }

    pub fn from_json_str(src: &str) -> Result<Self> {
        let config: OptimizerConfig =
            serde_json::from_str(src).context("failed to parse optimizer config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read optimizer config {}", path.display()))?;
        Self::from_json_str(&contents)
    }
}
