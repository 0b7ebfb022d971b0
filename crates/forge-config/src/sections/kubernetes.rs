// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kubernetes driver configuration section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_NAMESPACE: &str = "forge-projects";
const DEFAULT_IMAGE: &str = "nodered/node-red:latest";
const DEFAULT_PORT: u16 = 1880;

/// Kubernetes configuration layer (for merging).
///
/// All fields are optional to support layered configuration from
/// multiple sources (defaults, files, environment).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KubernetesConfigLayer {
	pub namespace: Option<String>,
	pub default_image: Option<String>,
	pub container_port: Option<u16>,
	pub service_port: Option<u16>,
	pub image_pull_secrets: Option<Vec<String>>,
	pub ready_timeout_secs: Option<u64>,
	pub max_projects: Option<u32>,
	/// Base domain for project Ingresses
	pub domain: Option<String>,
	pub ingress_class: Option<String>,
	pub stop_grace_period_secs: Option<u32>,
	/// Explicit kubeconfig file; ambient configuration is used when unset
	pub kubeconfig: Option<PathBuf>,
	/// Kubeconfig context
	pub context: Option<String>,
}

impl KubernetesConfigLayer {
	/// Merges another layer on top of this one.
	/// Values from `other` take precedence when present.
	pub fn merge(&mut self, other: KubernetesConfigLayer) {
		if other.namespace.is_some() {
			self.namespace = other.namespace;
		}
		if other.default_image.is_some() {
			self.default_image = other.default_image;
		}
		if other.container_port.is_some() {
			self.container_port = other.container_port;
		}
		if other.service_port.is_some() {
			self.service_port = other.service_port;
		}
		if other.image_pull_secrets.is_some() {
			self.image_pull_secrets = other.image_pull_secrets;
		}
		if other.ready_timeout_secs.is_some() {
			self.ready_timeout_secs = other.ready_timeout_secs;
		}
		if other.max_projects.is_some() {
			self.max_projects = other.max_projects;
		}
		if other.domain.is_some() {
			self.domain = other.domain;
		}
		if other.ingress_class.is_some() {
			self.ingress_class = other.ingress_class;
		}
		if other.stop_grace_period_secs.is_some() {
			self.stop_grace_period_secs = other.stop_grace_period_secs;
		}
		if other.kubeconfig.is_some() {
			self.kubeconfig = other.kubeconfig;
		}
		if other.context.is_some() {
			self.context = other.context;
		}
	}

	/// Resolves this layer into a runtime configuration.
	pub fn resolve(self) -> Result<KubernetesConfig, ConfigError> {
		let config = KubernetesConfig {
			namespace: self
				.namespace
				.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
			default_image: self
				.default_image
				.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
			container_port: self.container_port.unwrap_or(DEFAULT_PORT),
			service_port: self.service_port.unwrap_or(DEFAULT_PORT),
			image_pull_secrets: self.image_pull_secrets.unwrap_or_default(),
			ready_timeout_secs: self.ready_timeout_secs.unwrap_or(120),
			max_projects: self.max_projects.unwrap_or(100),
			domain: self.domain.filter(|d| !d.is_empty()),
			ingress_class: self.ingress_class.filter(|c| !c.is_empty()),
			stop_grace_period_secs: self.stop_grace_period_secs.unwrap_or(10),
			kubeconfig: self.kubeconfig,
			context: self.context.filter(|c| !c.is_empty()),
		};
		config.validate()?;
		Ok(config)
	}
}

/// Kubernetes configuration (runtime, resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct KubernetesConfig {
	pub namespace: String,
	pub default_image: String,
	pub container_port: u16,
	pub service_port: u16,
	pub image_pull_secrets: Vec<String>,
	pub ready_timeout_secs: u64,
	pub max_projects: u32,
	pub domain: Option<String>,
	pub ingress_class: Option<String>,
	pub stop_grace_period_secs: u32,
	pub kubeconfig: Option<PathBuf>,
	pub context: Option<String>,
}

impl KubernetesConfig {
	fn validate(&self) -> Result<(), ConfigError> {
		if self.namespace.trim().is_empty() {
			return Err(ConfigError::Validation(
				"kubernetes.namespace must not be empty".to_string(),
			));
		}
		if self.default_image.trim().is_empty() {
			return Err(ConfigError::Validation(
				"kubernetes.default_image must not be empty".to_string(),
			));
		}
		if self.container_port == 0 || self.service_port == 0 {
			return Err(ConfigError::Validation(
				"kubernetes ports must be between 1 and 65535".to_string(),
			));
		}
		if self.ready_timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"kubernetes.ready_timeout_secs must be positive".to_string(),
			));
		}
		if self.max_projects == 0 {
			return Err(ConfigError::Validation(
				"kubernetes.max_projects must be positive".to_string(),
			));
		}
		Ok(())
	}
}

impl Default for KubernetesConfig {
	fn default() -> Self {
		Self {
			namespace: DEFAULT_NAMESPACE.to_string(),
			default_image: DEFAULT_IMAGE.to_string(),
			container_port: DEFAULT_PORT,
			service_port: DEFAULT_PORT,
			image_pull_secrets: Vec::new(),
			ready_timeout_secs: 120,
			max_projects: 100,
			domain: None,
			ingress_class: None,
			stop_grace_period_secs: 10,
			kubeconfig: None,
			context: None,
		}
	}
}
