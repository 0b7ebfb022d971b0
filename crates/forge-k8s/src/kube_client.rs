// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use kube::{
	api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams},
	config::{KubeConfigOptions, Kubeconfig},
	Client, Config,
};
use serde_json::json;
use tracing::{debug, instrument};

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::{
	ClusterConnection, Deployment, Ingress, Namespace, Pod, Service, RESTARTED_AT_ANNOTATION,
};

/// Production K8s client implementation using the kube crate.
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	/// Create a new KubeClient that auto-discovers cluster configuration.
	///
	/// This will attempt to load config from:
	/// 1. In-cluster service account (when running in K8s)
	/// 2. KUBECONFIG environment variable
	/// 3. ~/.kube/config
	pub async fn new() -> Result<Self, K8sError> {
		Self::connect(&ClusterConnection::default()).await
	}

	/// Create a KubeClient from an explicit connection description.
	///
	/// An explicit kubeconfig file wins; a context alone selects that context
	/// from the default kubeconfig; otherwise the ambient configuration is
	/// inferred as in [`KubeClient::new`].
	#[instrument(skip_all, fields(kubeconfig = ?connection.kubeconfig, context = ?connection.context))]
	pub async fn connect(connection: &ClusterConnection) -> Result<Self, K8sError> {
		let options = KubeConfigOptions {
			context: connection.context.clone(),
			..Default::default()
		};

		let config = match (&connection.kubeconfig, &connection.context) {
			(Some(path), _) => {
				let kubeconfig = Kubeconfig::read_from(path).map_err(|e| K8sError::Config {
					message: format!("{}: {e}", path.display()),
				})?;
				Config::from_custom_kubeconfig(kubeconfig, &options)
					.await
					.map_err(|e| K8sError::Config {
						message: e.to_string(),
					})?
			}
			(None, Some(_)) => Config::from_kubeconfig(&options)
				.await
				.map_err(|e| K8sError::Config {
					message: e.to_string(),
				})?,
			(None, None) => Config::infer().await.map_err(|e| K8sError::Config {
				message: e.to_string(),
			})?,
		};

		debug!(cluster_url = %config.cluster_url, namespace = %config.default_namespace, "Loaded cluster configuration");
		Self::from_config(config)
	}

	/// Build a KubeClient from an already resolved configuration.
	pub fn from_config(config: Config) -> Result<Self, K8sError> {
		let client = Client::try_from(config)?;
		debug!("K8s client initialized");
		Ok(Self { client })
	}

	fn deployments(&self, namespace: &str) -> Api<Deployment> {
		Api::namespaced(self.client.clone(), namespace)
	}
}

#[async_trait]
impl K8sClient for KubeClient {
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		match namespaces.get(name).await {
			Ok(ns) => Ok(ns),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				Err(K8sError::NamespaceNotFound { name: name.into() })
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn create_deployment(
		&self,
		namespace: &str,
		deployment: Deployment,
	) -> Result<Deployment, K8sError> {
		let name = deployment.metadata.name.clone().unwrap_or_default();
		self
			.deployments(namespace)
			.create(&PostParams::default(), &deployment)
			.await
			.map_err(|e| K8sError::from_kube(e, "Deployment", &name))
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError> {
		self
			.deployments(namespace)
			.get(name)
			.await
			.map_err(|e| K8sError::from_kube(e, "Deployment", name))
	}

	async fn list_deployments(
		&self,
		namespace: &str,
		label_selector: &str,
	) -> Result<Vec<Deployment>, K8sError> {
		let lp = ListParams::default().labels(label_selector);
		let list = self.deployments(namespace).list(&lp).await?;
		Ok(list.items)
	}

	async fn scale_deployment(
		&self,
		name: &str,
		namespace: &str,
		replicas: i32,
	) -> Result<Deployment, K8sError> {
		let patch = json!({ "spec": { "replicas": replicas } });
		debug!(deployment = %name, replicas, "Scaling deployment");
		self
			.deployments(namespace)
			.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
			.await
			.map_err(|e| K8sError::from_kube(e, "Deployment", name))
	}

	async fn restart_deployment(
		&self,
		name: &str,
		namespace: &str,
		restarted_at: &str,
	) -> Result<Deployment, K8sError> {
		let patch = json!({
			"spec": {
				"template": {
					"metadata": {
						"annotations": { RESTARTED_AT_ANNOTATION: restarted_at }
					}
				}
			}
		});
		debug!(deployment = %name, %restarted_at, "Restarting deployment");
		self
			.deployments(namespace)
			.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
			.await
			.map_err(|e| K8sError::from_kube(e, "Deployment", name))
	}

	async fn delete_deployment(
		&self,
		name: &str,
		namespace: &str,
		grace_period_seconds: u32,
	) -> Result<(), K8sError> {
		let dp = DeleteParams {
			grace_period_seconds: Some(grace_period_seconds),
			..DeleteParams::background()
		};
		self
			.deployments(namespace)
			.delete(name, &dp)
			.await
			.map(|_| ())
			.map_err(|e| K8sError::from_kube(e, "Deployment", name))
	}

	async fn create_service(&self, namespace: &str, service: Service) -> Result<Service, K8sError> {
		let name = service.metadata.name.clone().unwrap_or_default();
		let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
		services
			.create(&PostParams::default(), &service)
			.await
			.map_err(|e| K8sError::from_kube(e, "Service", &name))
	}

	async fn delete_service(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
		services
			.delete(name, &DeleteParams::default())
			.await
			.map(|_| ())
			.map_err(|e| K8sError::from_kube(e, "Service", name))
	}

	async fn create_ingress(&self, namespace: &str, ingress: Ingress) -> Result<Ingress, K8sError> {
		let name = ingress.metadata.name.clone().unwrap_or_default();
		let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
		ingresses
			.create(&PostParams::default(), &ingress)
			.await
			.map_err(|e| K8sError::from_kube(e, "Ingress", &name))
	}

	async fn delete_ingress(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
		ingresses
			.delete(name, &DeleteParams::default())
			.await
			.map(|_| ())
			.map_err(|e| K8sError::from_kube(e, "Ingress", name))
	}

	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError> {
		let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		let lp = ListParams::default().labels(label_selector);
		let pod_list = pods.list(&lp).await?;
		Ok(pod_list.items)
	}
}
