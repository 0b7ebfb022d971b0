// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kubernetes-backed container driver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use forge_k8s::{K8sClient, K8sError, KubeClient, Pod};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::config::DriverOptions;
use crate::driver::ContainerDriver;
use crate::error::{cluster_error, DriverError};
use crate::locks::ProjectLocks;
use crate::manifest::{
	build_deployment, build_ingress, build_service, managed_selector, project_selector,
	PROJECT_LABEL,
};
use crate::status::{deployment_to_details, deployment_project_name, desired_replicas};
use crate::types::{AppContext, CreateProjectOptions, ProjectDetails, ProjectName, ProjectState};

const POLL_INTERVAL_MS: u64 = 500;

/// Objects created so far during a create, for rollback.
#[derive(Debug, Clone, Copy)]
enum Created {
	Deployment,
	Service,
}

/// Backs each project with a Deployment, a Service and, when a domain is
/// configured, an Ingress.
///
/// Stopping scales the Deployment to zero; starting scales it back to one.
pub struct KubernetesDriver {
	app: Arc<AppContext>,
	client: Arc<dyn K8sClient>,
	options: DriverOptions,
	locks: ProjectLocks,
	/// Held from the quota count until the Deployment exists, so concurrent
	/// creates of different projects cannot both pass the quota check.
	quota_gate: Mutex<()>,
}

impl KubernetesDriver {
	/// Create a driver over an existing K8s client.
	///
	/// No cluster call is made; use [`KubernetesDriver::validate_namespace`]
	/// to fail fast on a misconfigured namespace.
	pub fn new(app: Arc<AppContext>, client: Arc<dyn K8sClient>, options: DriverOptions) -> Self {
		Self {
			app,
			client,
			options,
			locks: ProjectLocks::default(),
			quota_gate: Mutex::new(()),
		}
	}

	/// Get the namespace this driver operates in.
	pub fn namespace(&self) -> &str {
		&self.options.namespace
	}

	pub fn options(&self) -> &DriverOptions {
		&self.options
	}

	/// Validate that the configured namespace exists in the cluster.
	pub async fn validate_namespace(&self) -> Result<(), DriverError> {
		match self.client.get_namespace(&self.options.namespace).await {
			Ok(_) => {
				tracing::info!(namespace = %self.options.namespace, "Validated namespace exists");
				Ok(())
			}
			Err(K8sError::NamespaceNotFound { .. }) => Err(DriverError::NamespaceNotFound {
				name: self.options.namespace.clone(),
			}),
			Err(e) => Err(cluster_error(e)),
		}
	}

	/// Count the projects currently provisioned in the namespace.
	///
	/// Projects that are being deleted do not count.
	pub async fn count_projects(&self) -> Result<u32, DriverError> {
		let deployments = self
			.client
			.list_deployments(&self.options.namespace, &managed_selector())
			.await
			.map_err(cluster_error)?;

		let count = deployments
			.iter()
			.filter(|d| d.metadata.deletion_timestamp.is_none())
			.count() as u32;

		Ok(count)
	}

	/// List all managed projects, sorted by name.
	pub async fn list_projects(&self) -> Result<Vec<ProjectDetails>, DriverError> {
		let selector = managed_selector();
		let deployments = self
			.client
			.list_deployments(&self.options.namespace, &selector)
			.await
			.map_err(cluster_error)?;
		let pods = self
			.client
			.list_pods(&self.options.namespace, &selector)
			.await
			.map_err(cluster_error)?;

		let mut pods_by_project: HashMap<String, Vec<Pod>> = HashMap::new();
		for pod in pods {
			let project = pod
				.metadata
				.labels
				.as_ref()
				.and_then(|l| l.get(PROJECT_LABEL).cloned());
			if let Some(project) = project {
				pods_by_project.entry(project).or_default().push(pod);
			}
		}

		let mut projects = Vec::new();
		for deployment in &deployments {
			let pods = deployment_project_name(deployment)
				.ok()
				.and_then(|name| pods_by_project.get(name.as_str()))
				.map(Vec::as_slice)
				.unwrap_or(&[]);
			match deployment_to_details(deployment, pods, &self.options) {
				Ok(details) => projects.push(details),
				Err(e) => {
					tracing::warn!(
						deployment = ?deployment.metadata.name,
						"Failed to parse deployment as project: {}",
						e
					);
				}
			}
		}

		projects.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(projects)
	}

	async fn fetch_details(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError> {
		let deployment = self
			.client
			.get_deployment(name.as_str(), &self.options.namespace)
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;
		let pods = self
			.client
			.list_pods(&self.options.namespace, &project_selector(name))
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;
		deployment_to_details(&deployment, &pods, &self.options)
	}

	async fn poll_until_ready(
		&self,
		name: &ProjectName,
		timeout: Duration,
	) -> Result<ProjectDetails, DriverError> {
		let start = Instant::now();
		let poll_interval = Duration::from_millis(POLL_INTERVAL_MS);

		loop {
			if start.elapsed() > timeout {
				return Err(DriverError::ProjectTimeout {
					name: name.to_string(),
				});
			}

			let details = self.fetch_details(name).await?;

			match details.state {
				ProjectState::Running => return Ok(details),
				ProjectState::Failed => {
					return Err(DriverError::ProjectFailed {
						name: name.to_string(),
						reason: details
							.reason
							.unwrap_or_else(|| "Unknown failure".to_string()),
					});
				}
				ProjectState::Stopped | ProjectState::Terminating => {
					return Err(DriverError::ProjectNotRunning {
						name: name.to_string(),
						state: details.state.to_string(),
					});
				}
				ProjectState::Starting => {
					tokio::time::sleep(poll_interval).await;
				}
			}
		}
	}

	fn ready_timeout(&self) -> Duration {
		Duration::from_secs(self.options.ready_timeout_secs)
	}

	/// Delete objects left behind by a create that failed part way.
	async fn rollback(&self, name: &ProjectName, created: &[Created]) {
		let namespace = &self.options.namespace;
		for object in created.iter().rev() {
			let result = match object {
				Created::Service => self.client.delete_service(name.as_str(), namespace).await,
				Created::Deployment => {
					self
						.client
						.delete_deployment(name.as_str(), namespace, 0)
						.await
				}
			};
			match result {
				Ok(()) => {
					tracing::debug!(project = %name, object = ?object, "Rolled back partially created object");
				}
				Err(e) if e.is_not_found() => {}
				Err(e) => {
					tracing::warn!(project = %name, object = ?object, error = %e, "Failed to roll back partially created object");
				}
			}
		}
	}

	async fn provision(
		&self,
		name: &ProjectName,
		options: &CreateProjectOptions,
	) -> Result<(), DriverError> {
		let namespace = &self.options.namespace;
		let project_err = |e| DriverError::for_project(name.as_str(), e);

		let deployment = build_deployment(name, options, &self.app, &self.options);
		self
			.client
			.create_deployment(namespace, deployment)
			.await
			.map_err(project_err)?;

		let service = build_service(name, options, &self.app, &self.options);
		if let Err(e) = self.client.create_service(namespace, service).await {
			self.rollback(name, &[Created::Deployment]).await;
			return Err(project_err(e));
		}

		if let Some(ingress) = build_ingress(name, &self.app, &self.options) {
			if let Err(e) = self.client.create_ingress(namespace, ingress).await {
				self
					.rollback(name, &[Created::Deployment, Created::Service])
					.await;
				return Err(project_err(e));
			}
		}

		Ok(())
	}
}

#[async_trait]
impl ContainerDriver for KubernetesDriver {
	type Options = DriverOptions;

	#[instrument(skip_all, fields(app = %app.name, namespace = %options.namespace))]
	async fn init(app: Arc<AppContext>, options: DriverOptions) -> Result<Self, DriverError> {
		let client = KubeClient::connect(&options.cluster)
			.await
			.map_err(cluster_error)?;
		let driver = Self::new(app, Arc::new(client), options);
		driver.validate_namespace().await?;
		tracing::info!("Kubernetes container driver initialized");
		Ok(driver)
	}

	#[instrument(skip(self, options), fields(project = %name, namespace = %self.options.namespace))]
	async fn create(
		&self,
		name: &ProjectName,
		options: CreateProjectOptions,
	) -> Result<ProjectDetails, DriverError> {
		let _guard = self.locks.acquire(name).await;

		{
			let _quota = self.quota_gate.lock().await;

			let current = self.count_projects().await?;
			if current >= self.options.max_projects {
				return Err(DriverError::QuotaExceeded {
					current,
					max: self.options.max_projects,
				});
			}

			match self
				.client
				.get_deployment(name.as_str(), &self.options.namespace)
				.await
			{
				Ok(_) => {
					return Err(DriverError::ProjectAlreadyExists {
						name: name.to_string(),
					})
				}
				Err(e) if e.is_not_found() => {}
				Err(e) => return Err(DriverError::for_project(name.as_str(), e)),
			}

			let image = options
				.image
				.clone()
				.unwrap_or_else(|| self.options.default_image.clone());
			tracing::info!(image = %image, "Creating project");

			self.provision(name, &options).await?;
		}

		let details = self.poll_until_ready(name, self.ready_timeout()).await?;
		tracing::info!(url = ?details.url, "Project running");
		Ok(details)
	}

	#[instrument(skip(self), fields(project = %name, namespace = %self.options.namespace))]
	async fn remove(&self, name: &ProjectName) -> Result<(), DriverError> {
		let _guard = self.locks.acquire(name).await;
		let namespace = &self.options.namespace;

		self
			.client
			.get_deployment(name.as_str(), namespace)
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;

		match self.client.delete_ingress(name.as_str(), namespace).await {
			Ok(()) => tracing::debug!("Deleted ingress"),
			Err(e) if e.is_not_found() => {}
			Err(e) => return Err(DriverError::for_project(name.as_str(), e)),
		}

		match self.client.delete_service(name.as_str(), namespace).await {
			Ok(()) => tracing::debug!("Deleted service"),
			Err(e) if e.is_not_found() => {}
			Err(e) => return Err(DriverError::for_project(name.as_str(), e)),
		}

		self
			.client
			.delete_deployment(name.as_str(), namespace, self.options.stop_grace_period_secs)
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;

		tracing::info!("Removed project");
		Ok(())
	}

	#[instrument(skip(self), fields(project = %name))]
	async fn details(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError> {
		self.fetch_details(name).await
	}

	#[instrument(skip(self), fields(project = %name, namespace = %self.options.namespace))]
	async fn start(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError> {
		let _guard = self.locks.acquire(name).await;

		let deployment = self
			.client
			.get_deployment(name.as_str(), &self.options.namespace)
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;

		if desired_replicas(&deployment) >= 1 {
			tracing::debug!("Project already started");
			return self.fetch_details(name).await;
		}

		self
			.client
			.scale_deployment(name.as_str(), &self.options.namespace, 1)
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;
		tracing::info!("Starting project");

		self.poll_until_ready(name, self.ready_timeout()).await
	}

	#[instrument(skip(self), fields(project = %name, namespace = %self.options.namespace))]
	async fn stop(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError> {
		let _guard = self.locks.acquire(name).await;

		let deployment = self
			.client
			.get_deployment(name.as_str(), &self.options.namespace)
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;

		if desired_replicas(&deployment) == 0 {
			tracing::debug!("Project already stopped");
		} else {
			self
				.client
				.scale_deployment(name.as_str(), &self.options.namespace, 0)
				.await
				.map_err(|e| DriverError::for_project(name.as_str(), e))?;
			tracing::info!("Stopped project");
		}

		self.fetch_details(name).await
	}

	#[instrument(skip(self), fields(project = %name, namespace = %self.options.namespace))]
	async fn restart(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError> {
		let _guard = self.locks.acquire(name).await;

		let details = self.fetch_details(name).await?;
		if details.replicas.desired == 0 || details.state == ProjectState::Terminating {
			return Err(DriverError::ProjectNotRunning {
				name: name.to_string(),
				state: details.state.to_string(),
			});
		}

		let restarted_at = Utc::now().to_rfc3339();
		self
			.client
			.restart_deployment(name.as_str(), &self.options.namespace, &restarted_at)
			.await
			.map_err(|e| DriverError::for_project(name.as_str(), e))?;
		tracing::info!(%restarted_at, "Restarting project");

		self.fetch_details(name).await
	}
}
