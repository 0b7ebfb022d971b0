// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the Forge container driver.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`FORGE_DRIVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use forge_config::load_config;
//!
//! let config = load_config()?;
//! println!("Projects live in {}", config.kubernetes.namespace);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ForgeConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, ENV_PREFIX};

use tracing::{debug, info};

/// Fully resolved driver configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForgeConfig {
	pub app: AppConfig,
	pub kubernetes: KubernetesConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`FORGE_DRIVER_*`)
/// 2. Config file (`/etc/forge/driver.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ForgeConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ForgeConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource::new())])
}

/// Load configuration with a custom config file path.
///
/// Unlike the system file, a custom file that does not exist is an error.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ForgeConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ForgeConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ForgeConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ForgeConfigLayer) -> Result<ForgeConfig, ConfigError> {
	let app = layer.app.unwrap_or_default().finalize();
	let kubernetes = layer.kubernetes.unwrap_or_default().resolve()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		app = %app.name,
		namespace = %kubernetes.namespace,
		max_projects = kubernetes.max_projects,
		domain = ?kubernetes.domain,
		ambient_cluster = kubernetes.kubeconfig.is_none() && kubernetes.context.is_none(),
		"Driver configuration loaded"
	);

	Ok(ForgeConfig {
		app,
		kubernetes,
		logging,
	})
}
