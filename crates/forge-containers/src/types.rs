// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project driver types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::DriverError;

/// Maximum length of a project name (DNS-1123 label).
pub const MAX_PROJECT_NAME_LENGTH: usize = 63;

/// Validated name of a project.
///
/// The name is used verbatim for the Deployment, Service and Ingress that
/// back the project, so it must be a DNS-1123 label that also starts with a
/// letter (Service names are DNS-1035 labels).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
	/// Validate and wrap a project name.
	pub fn new(name: impl Into<String>) -> Result<Self, DriverError> {
		let name = name.into();
		match validate_name(&name) {
			Ok(()) => Ok(Self(name)),
			Err(reason) => Err(DriverError::InvalidProjectName { name, reason }),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

fn validate_name(name: &str) -> Result<(), String> {
	if name.is_empty() {
		return Err("name is empty".to_string());
	}
	if name.len() > MAX_PROJECT_NAME_LENGTH {
		return Err(format!(
			"name is {} characters (max {MAX_PROJECT_NAME_LENGTH})",
			name.len()
		));
	}
	if let Some(c) = name
		.chars()
		.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
	{
		return Err(format!("invalid character {c:?}"));
	}
	if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
		return Err("must start with a lowercase letter".to_string());
	}
	if name.ends_with('-') {
		return Err("must end with a letter or digit".to_string());
	}
	Ok(())
}

impl std::fmt::Display for ProjectName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl std::str::FromStr for ProjectName {
	type Err = DriverError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl<'de> Deserialize<'de> for ProjectName {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Self::new(s).map_err(serde::de::Error::custom)
	}
}

impl AsRef<str> for ProjectName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// The application that owns the driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppContext {
	/// Application name, recorded as `app.kubernetes.io/managed-by`.
	pub name: String,
	/// Public base URL of the application, injected into project containers
	/// as `FORGE_URL` when non-empty.
	pub base_url: String,
}

/// Status of a project, derived from its Deployment and pods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
	/// Scaled up, containers not ready yet
	Starting,
	/// All desired replicas ready
	Running,
	/// Scaled to zero
	Stopped,
	/// Containers cannot start (image pull, crash loop, rollout deadline)
	Failed,
	/// Deployment is being deleted
	Terminating,
}

impl std::fmt::Display for ProjectState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ProjectState::Starting => "starting",
			ProjectState::Running => "running",
			ProjectState::Stopped => "stopped",
			ProjectState::Failed => "failed",
			ProjectState::Terminating => "terminating",
		};
		f.write_str(s)
	}
}

/// Desired versus ready replica counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaCounts {
	pub desired: i32,
	pub ready: i32,
}

/// Current status and metadata of a project instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
	pub name: ProjectName,
	pub state: ProjectState,
	pub image: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	pub replicas: ReplicaCounts,
	pub tags: HashMap<String, String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub created_at: Option<DateTime<Utc>>,
	/// Why the project is failing, when it is.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

/// Resource limits for a project container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
	/// Memory limit (e.g., "512Mi")
	pub memory_limit: Option<String>,
	/// CPU limit (e.g., "500m")
	pub cpu_limit: Option<String>,
}

/// Options for creating a project instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateProjectOptions {
	/// Container image; the driver default is used when unset.
	pub image: Option<String>,
	pub env: HashMap<String, String>,
	pub resources: ResourceSpec,
	/// Container port; the driver default is used when unset.
	pub port: Option<u16>,
	pub command: Option<Vec<String>>,
	pub args: Option<Vec<String>>,
	/// Free-form metadata stored on the Deployment.
	pub tags: HashMap<String, String>,
}
