// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Driver error types.

use forge_k8s::K8sError;

/// Errors that can occur during project lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
	/// Name cannot be used for cluster objects
	#[error("Invalid project name {name:?}: {reason}")]
	InvalidProjectName { name: String, reason: String },

	/// Project not found
	#[error("Project not found: {name}")]
	ProjectNotFound { name: String },

	/// Project already has a backing deployment
	#[error("Project already exists: {name}")]
	ProjectAlreadyExists { name: String },

	/// Too many managed projects in the namespace
	#[error("Too many projects: {current} provisioned (max: {max})")]
	QuotaExceeded { current: u32, max: u32 },

	/// The cluster rejected the request because of a ResourceQuota
	#[error("Cluster quota exceeded for {name}: {message}")]
	ClusterQuotaExceeded { name: String, message: String },

	/// API server could not be reached
	#[error("Cluster unreachable: {message}")]
	ClusterUnreachable { message: String },

	/// Cluster client configuration could not be loaded
	#[error("Cluster configuration error: {message}")]
	ClusterConfig { message: String },

	/// Project is not in a state that allows the operation
	#[error("Project not running: {name} (state: {state})")]
	ProjectNotRunning { name: String, state: String },

	/// Project containers failed to start
	#[error("Project failed: {name} - {reason}")]
	ProjectFailed { name: String, reason: String },

	/// Project did not become ready in time
	#[error("Project timed out waiting for ready state: {name}")]
	ProjectTimeout { name: String },

	/// Namespace not found
	#[error("Namespace not found: {name}")]
	NamespaceNotFound { name: String },

	/// Kubernetes error
	#[error(transparent)]
	K8s(#[from] K8sError),
}

impl DriverError {
	/// Translate a client error raised while operating on `project`.
	///
	/// A missing or conflicting Deployment is the project itself missing or
	/// already existing; other object kinds keep the raw client error.
	pub fn for_project(project: &str, err: K8sError) -> Self {
		match err {
			K8sError::NotFound {
				kind: "Deployment", ..
			} => DriverError::ProjectNotFound {
				name: project.to_string(),
			},
			K8sError::AlreadyExists {
				kind: "Deployment", ..
			} => DriverError::ProjectAlreadyExists {
				name: project.to_string(),
			},
			K8sError::QuotaExceeded { message } => DriverError::ClusterQuotaExceeded {
				name: project.to_string(),
				message,
			},
			other => cluster_error(other),
		}
	}
}

/// Convert a client error that is not tied to one project.
pub(crate) fn cluster_error(err: K8sError) -> DriverError {
	match err {
		K8sError::Unreachable { message } => DriverError::ClusterUnreachable { message },
		K8sError::Config { message } => DriverError::ClusterConfig { message },
		K8sError::NamespaceNotFound { name } => DriverError::NamespaceNotFound { name },
		other => DriverError::K8s(other),
	}
}
