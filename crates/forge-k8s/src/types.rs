// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

pub use k8s_openapi::api::apps::v1::{
	Deployment, DeploymentCondition, DeploymentSpec, DeploymentStatus, DeploymentStrategy,
};
pub use k8s_openapi::api::core::v1::{
	Capabilities, Container, ContainerPort, ContainerState, ContainerStateWaiting, ContainerStatus,
	EnvVar, LocalObjectReference, Namespace, Pod, PodSpec, PodStatus, PodTemplateSpec,
	ResourceRequirements, SecurityContext, Service, ServicePort, ServiceSpec,
};
pub use k8s_openapi::api::networking::v1::{
	HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
	IngressServiceBackend, IngressSpec, ServiceBackendPort,
};

/// Pod template annotation that `kubectl rollout restart` stamps.
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Where to find the cluster client configuration.
///
/// With both fields unset the configuration is inferred from the ambient
/// environment: in-cluster service account, then `KUBECONFIG`, then
/// `~/.kube/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterConnection {
	/// Explicit kubeconfig file.
	pub kubeconfig: Option<PathBuf>,
	/// Kubeconfig context to select instead of the current one.
	pub context: Option<String>,
}

impl ClusterConnection {
	/// Whether this connection falls back to ambient inference.
	pub fn is_ambient(&self) -> bool {
		self.kubeconfig.is_none() && self.context.is_none()
	}
}
