// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Driver configuration.

use forge_k8s::ClusterConnection;

/// Options passed to [`crate::ContainerDriver::init`].
#[derive(Debug, Clone)]
pub struct DriverOptions {
	/// Kubernetes namespace for project objects
	pub namespace: String,
	/// Image used when a create request does not name one
	pub default_image: String,
	/// Port the project container listens on
	pub container_port: u16,
	/// Port exposed by the project Service
	pub service_port: u16,
	/// Image pull secret names for private registries
	pub image_pull_secrets: Vec<String>,
	/// Timeout waiting for a project to become ready, in seconds
	pub ready_timeout_secs: u64,
	/// Maximum number of projects in the namespace
	pub max_projects: u32,
	/// Base domain; when set each project gets an Ingress at `<name>.<domain>`
	pub domain: Option<String>,
	/// IngressClass for project Ingresses
	pub ingress_class: Option<String>,
	/// Grace period when deleting project pods, in seconds
	pub stop_grace_period_secs: u32,
	/// Where the cluster client configuration comes from
	pub cluster: ClusterConnection,
}

impl Default for DriverOptions {
	fn default() -> Self {
		Self {
			namespace: "forge-projects".to_string(),
			default_image: "nodered/node-red:latest".to_string(),
			container_port: 1880,
			service_port: 1880,
			image_pull_secrets: Vec::new(),
			ready_timeout_secs: 120,
			max_projects: 100,
			domain: None,
			ingress_class: None,
			stop_grace_period_secs: 10,
			cluster: ClusterConnection::default(),
		}
	}
}
