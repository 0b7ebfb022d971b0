// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::{Deployment, Ingress, Namespace, Pod, Service};

/// Trait for K8s client operations.
///
/// This abstraction allows for easy mocking in tests while providing
/// a clean interface for the K8s operations needed by the container driver.
/// Object lookups that miss return [`K8sError::NotFound`] with the object
/// kind and name.
#[async_trait]
pub trait K8sClient: Send + Sync {
	/// Get a namespace by name.
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError>;

	/// Create a new deployment in the specified namespace.
	async fn create_deployment(
		&self,
		namespace: &str,
		deployment: Deployment,
	) -> Result<Deployment, K8sError>;

	/// Get a specific deployment by name.
	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError>;

	/// List deployments in a namespace matching the given label selector.
	async fn list_deployments(
		&self,
		namespace: &str,
		label_selector: &str,
	) -> Result<Vec<Deployment>, K8sError>;

	/// Set the desired replica count of a deployment.
	async fn scale_deployment(
		&self,
		name: &str,
		namespace: &str,
		replicas: i32,
	) -> Result<Deployment, K8sError>;

	/// Trigger a rolling restart by stamping the pod template with
	/// `kubectl.kubernetes.io/restartedAt`.
	async fn restart_deployment(
		&self,
		name: &str,
		namespace: &str,
		restarted_at: &str,
	) -> Result<Deployment, K8sError>;

	/// Delete a deployment; its pods are removed by the garbage collector.
	async fn delete_deployment(
		&self,
		name: &str,
		namespace: &str,
		grace_period_seconds: u32,
	) -> Result<(), K8sError>;

	/// Create a new service in the specified namespace.
	async fn create_service(&self, namespace: &str, service: Service) -> Result<Service, K8sError>;

	/// Delete a service by name.
	async fn delete_service(&self, name: &str, namespace: &str) -> Result<(), K8sError>;

	/// Create a new ingress in the specified namespace.
	async fn create_ingress(&self, namespace: &str, ingress: Ingress) -> Result<Ingress, K8sError>;

	/// Delete an ingress by name.
	async fn delete_ingress(&self, name: &str, namespace: &str) -> Result<(), K8sError>;

	/// List pods in a namespace matching the given label selector.
	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError>;
}
