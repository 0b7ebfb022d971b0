// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ForgeConfigLayer;
use crate::sections::{AppConfigLayer, KubernetesConfigLayer, LogFormat, LoggingConfigLayer};

/// Prefix shared by every environment variable the driver reads.
pub const ENV_PREFIX: &str = "FORGE_DRIVER_";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ForgeConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ForgeConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ForgeConfigLayer::default())
	}
}

/// TOML file configuration source.
///
/// A file named explicitly must exist; the system file is optional.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	pub fn system() -> Self {
		Self {
			path: PathBuf::from("/etc/forge/driver.toml"),
			required: false,
		}
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ForgeConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ForgeConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ForgeConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: FORGE_DRIVER_<FIELD>. Variables are captured when the source
/// is built so a load sees one consistent snapshot.
pub struct EnvSource {
	vars: HashMap<String, String>,
}

impl EnvSource {
	/// Capture the `FORGE_DRIVER_*` variables of the current process.
	pub fn new() -> Self {
		Self::from_vars(std::env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)))
	}

	/// Build a source from explicit variables.
	pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: vars
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		self.vars.get(name).filter(|s| !s.is_empty()).cloned()
	}

	fn parse<T: std::str::FromStr>(&self, name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {kind} value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn u16(&self, name: &str) -> Result<Option<u16>, ConfigError> {
		self.parse(name, "u16")
	}

	fn u32(&self, name: &str) -> Result<Option<u32>, ConfigError> {
		self.parse(name, "u32")
	}

	fn u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		self.parse(name, "u64")
	}

	fn list(&self, name: &str) -> Option<Vec<String>> {
		self.var(name).map(|s| {
			s.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		})
	}

	fn load_app(&self) -> AppConfigLayer {
		AppConfigLayer {
			name: self.var("FORGE_DRIVER_APP_NAME"),
			base_url: self.var("FORGE_DRIVER_BASE_URL"),
		}
	}

	fn load_kubernetes(&self) -> Result<KubernetesConfigLayer, ConfigError> {
		Ok(KubernetesConfigLayer {
			namespace: self.var("FORGE_DRIVER_NAMESPACE"),
			default_image: self.var("FORGE_DRIVER_DEFAULT_IMAGE"),
			container_port: self.u16("FORGE_DRIVER_CONTAINER_PORT")?,
			service_port: self.u16("FORGE_DRIVER_SERVICE_PORT")?,
			image_pull_secrets: self.list("FORGE_DRIVER_IMAGE_PULL_SECRETS"),
			ready_timeout_secs: self.u64("FORGE_DRIVER_READY_TIMEOUT_SECS")?,
			max_projects: self.u32("FORGE_DRIVER_MAX_PROJECTS")?,
			domain: self.var("FORGE_DRIVER_DOMAIN"),
			ingress_class: self.var("FORGE_DRIVER_INGRESS_CLASS"),
			stop_grace_period_secs: self.u32("FORGE_DRIVER_STOP_GRACE_PERIOD_SECS")?,
			kubeconfig: self.var("FORGE_DRIVER_KUBECONFIG").map(PathBuf::from),
			context: self.var("FORGE_DRIVER_KUBE_CONTEXT"),
		})
	}

	fn load_logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		let format = match self.var("FORGE_DRIVER_LOG_FORMAT") {
			Some(v) => Some(v.parse::<LogFormat>().map_err(|message| {
				ConfigError::InvalidValue {
					key: "FORGE_DRIVER_LOG_FORMAT".to_string(),
					message,
				}
			})?),
			None => None,
		};

		Ok(LoggingConfigLayer {
			level: self.var("FORGE_DRIVER_LOG_LEVEL"),
			format,
		})
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ForgeConfigLayer, ConfigError> {
		debug!(count = self.vars.len(), "loading environment variables");
		Ok(ForgeConfigLayer {
			app: Some(self.load_app()),
			kubernetes: Some(self.load_kubernetes()?),
			logging: Some(self.load_logging()?),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.app.is_none());
		assert!(layer.kubernetes.is_none());
	}

	#[test]
	fn test_toml_source_missing_optional_file_returns_empty() {
		let source = TomlSource {
			path: PathBuf::from("/nonexistent/driver.toml"),
			required: false,
		};
		let layer = source.load().unwrap();
		assert!(layer.kubernetes.is_none());
	}

	#[test]
	fn test_toml_source_missing_explicit_file_is_read_error() {
		match TomlSource::new("/nonexistent/driver.toml").load() {
			Err(ConfigError::FileRead { path, .. }) => {
				assert_eq!(path, PathBuf::from("/nonexistent/driver.toml"));
			}
			other => panic!("expected FileRead, got {other:?}"),
		}
	}

	#[test]
	fn test_env_source_reads_fields() {
		let source = EnvSource::from_vars([
			("FORGE_DRIVER_NAMESPACE", "flows"),
			("FORGE_DRIVER_MAX_PROJECTS", "7"),
			("FORGE_DRIVER_IMAGE_PULL_SECRETS", "ghcr, ,quay"),
			("FORGE_DRIVER_KUBECONFIG", "/etc/forge/kubeconfig"),
			("FORGE_DRIVER_LOG_FORMAT", "json"),
			("FORGE_DRIVER_DOMAIN", ""),
		]);
		let layer = source.load().unwrap();

		let k8s = layer.kubernetes.unwrap();
		assert_eq!(k8s.namespace.as_deref(), Some("flows"));
		assert_eq!(k8s.max_projects, Some(7));
		assert_eq!(
			k8s.image_pull_secrets,
			Some(vec!["ghcr".to_string(), "quay".to_string()])
		);
		assert_eq!(
			k8s.kubeconfig,
			Some(PathBuf::from("/etc/forge/kubeconfig"))
		);
		assert!(k8s.domain.is_none());
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
	}

	#[test]
	fn test_env_source_rejects_bad_numbers() {
		let source = EnvSource::from_vars([("FORGE_DRIVER_CONTAINER_PORT", "http")]);
		match source.load() {
			Err(ConfigError::InvalidValue { key, message }) => {
				assert_eq!(key, "FORGE_DRIVER_CONTAINER_PORT");
				assert!(message.contains("'http'"));
			}
			other => panic!("expected InvalidValue, got {other:?}"),
		}
	}

	#[test]
	fn test_env_source_rejects_bad_log_format() {
		let source = EnvSource::from_vars([("FORGE_DRIVER_LOG_FORMAT", "xml")]);
		assert!(matches!(
			source.load(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	proptest! {
		#[test]
		fn env_u32_accepts_every_u32(value in any::<u32>()) {
			let source = EnvSource::from_vars([("FORGE_DRIVER_MAX_PROJECTS", value.to_string())]);
			prop_assert_eq!(source.u32("FORGE_DRIVER_MAX_PROJECTS").unwrap(), Some(value));
		}

		#[test]
		fn env_u16_rejects_out_of_range(value in 65536u64..u64::MAX) {
			let source = EnvSource::from_vars([("FORGE_DRIVER_SERVICE_PORT", value.to_string())]);
			prop_assert!(source.u16("FORGE_DRIVER_SERVICE_PORT").is_err());
		}
	}
}
