// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory K8s client for tests.
//!
//! Objects are stored per namespace and name. Deployments become ready as
//! soon as they are created or scaled unless readiness is switched off or
//! their image was registered as unpullable, in which case a pod stuck in
//! `ErrImagePull` is reported instead.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

use crate::client::K8sClient;
use crate::error::K8sError;
use crate::types::{
	ContainerState, ContainerStateWaiting, ContainerStatus, Deployment, DeploymentStatus, Ingress,
	Namespace, Pod, PodStatus, Service, RESTARTED_AT_ANNOTATION,
};

type Key = (String, String);

#[derive(Default)]
struct MockState {
	namespaces: HashSet<String>,
	deployments: HashMap<Key, Deployment>,
	services: HashMap<Key, Service>,
	ingresses: HashMap<Key, Ingress>,
	failing_images: HashSet<String>,
	hold_readiness: bool,
	unreachable: bool,
	quota_message: Option<String>,
	calls: Vec<String>,
}

/// A mock K8s client backed by hash maps.
#[derive(Default)]
pub struct MockK8sClient {
	state: Mutex<MockState>,
}

impl MockK8sClient {
	/// Create an empty mock cluster with the given namespaces.
	pub fn with_namespaces(namespaces: &[&str]) -> Self {
		let mock = Self::default();
		{
			let mut state = mock.state.lock().unwrap();
			state.namespaces = namespaces.iter().map(|s| s.to_string()).collect();
		}
		mock
	}

	/// Pods for deployments using this image never become ready.
	pub fn fail_image(&self, image: &str) {
		self.state.lock().unwrap().failing_images.insert(image.to_string());
	}

	/// Keep deployments in a not-ready state to simulate slow rollouts.
	pub fn hold_readiness(&self, hold: bool) {
		self.state.lock().unwrap().hold_readiness = hold;
	}

	/// Fail every call as if the API server could not be reached.
	pub fn set_unreachable(&self, unreachable: bool) {
		self.state.lock().unwrap().unreachable = unreachable;
	}

	/// Reject deployment creates as a namespace ResourceQuota would.
	pub fn reject_with_quota(&self, message: &str) {
		self.state.lock().unwrap().quota_message = Some(message.to_string());
	}

	/// Insert a deployment as-is, bypassing create semantics.
	pub fn insert_deployment(&self, namespace: &str, deployment: Deployment) {
		let name = deployment.metadata.name.clone().unwrap_or_default();
		self
			.state
			.lock()
			.unwrap()
			.deployments
			.insert((namespace.to_string(), name), deployment);
	}

	/// Snapshot of a stored deployment.
	pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
		self
			.state
			.lock()
			.unwrap()
			.deployments
			.get(&key(namespace, name))
			.cloned()
	}

	/// Snapshot of a stored service.
	pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
		self
			.state
			.lock()
			.unwrap()
			.services
			.get(&key(namespace, name))
			.cloned()
	}

	/// Snapshot of a stored ingress.
	pub fn ingress(&self, namespace: &str, name: &str) -> Option<Ingress> {
		self
			.state
			.lock()
			.unwrap()
			.ingresses
			.get(&key(namespace, name))
			.cloned()
	}

	/// Names of the client calls made so far, in order.
	pub fn calls(&self) -> Vec<String> {
		self.state.lock().unwrap().calls.clone()
	}

	fn enter(&self, call: &str) -> Result<std::sync::MutexGuard<'_, MockState>, K8sError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(call.to_string());
		if state.unreachable {
			return Err(K8sError::Unreachable {
				message: "connection refused".to_string(),
			});
		}
		Ok(state)
	}
}

fn key(namespace: &str, name: &str) -> Key {
	(namespace.to_string(), name.to_string())
}

fn deployment_image(deployment: &Deployment) -> Option<String> {
	deployment
		.spec
		.as_ref()
		.and_then(|s| s.template.spec.as_ref())
		.and_then(|s| s.containers.first())
		.and_then(|c| c.image.clone())
}

/// Recompute the status block the way the deployment controller would.
fn reconcile(state: &MockState, deployment: &mut Deployment) {
	let desired = deployment
		.spec
		.as_ref()
		.and_then(|s| s.replicas)
		.unwrap_or(1);
	let failing = deployment_image(deployment)
		.map(|image| state.failing_images.contains(&image))
		.unwrap_or(false);
	let ready = if failing || state.hold_readiness {
		0
	} else {
		desired
	};

	deployment.status = Some(DeploymentStatus {
		replicas: Some(desired),
		ready_replicas: Some(ready),
		available_replicas: Some(ready),
		..Default::default()
	});
}

/// Match `k=v[,k=v]` selectors against a label map.
fn selector_matches(selector: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
	selector
		.split(',')
		.filter(|s| !s.is_empty())
		.all(|pair| match pair.split_once('=') {
			Some((k, v)) => labels.and_then(|l| l.get(k)).map(|lv| lv == v).unwrap_or(false),
			None => labels.map(|l| l.contains_key(pair)).unwrap_or(false),
		})
}

fn failing_pod(deployment: &Deployment, image: &str) -> Pod {
	let name = deployment.metadata.name.clone().unwrap_or_default();
	let labels = deployment
		.spec
		.as_ref()
		.and_then(|s| s.template.metadata.as_ref())
		.and_then(|m| m.labels.clone());

	Pod {
		metadata: ObjectMeta {
			name: Some(format!("{name}-0")),
			labels,
			..Default::default()
		},
		spec: None,
		status: Some(PodStatus {
			phase: Some("Pending".to_string()),
			container_statuses: Some(vec![ContainerStatus {
				name: "project".to_string(),
				image: image.to_string(),
				ready: false,
				state: Some(ContainerState {
					waiting: Some(ContainerStateWaiting {
						reason: Some("ErrImagePull".to_string()),
						message: Some(format!("failed to pull image \"{image}\"")),
					}),
					..Default::default()
				}),
				..Default::default()
			}]),
			..Default::default()
		}),
	}
}

#[async_trait]
impl K8sClient for MockK8sClient {
	async fn get_namespace(&self, name: &str) -> Result<Namespace, K8sError> {
		let state = self.enter("get_namespace")?;
		if state.namespaces.contains(name) {
			Ok(Namespace {
				metadata: ObjectMeta {
					name: Some(name.to_string()),
					..Default::default()
				},
				..Default::default()
			})
		} else {
			Err(K8sError::NamespaceNotFound { name: name.into() })
		}
	}

	async fn create_deployment(
		&self,
		namespace: &str,
		mut deployment: Deployment,
	) -> Result<Deployment, K8sError> {
		let mut state = self.enter("create_deployment")?;
		if let Some(message) = &state.quota_message {
			return Err(K8sError::QuotaExceeded {
				message: message.clone(),
			});
		}
		let name = deployment.metadata.name.clone().unwrap_or_default();
		let k = key(namespace, &name);
		if state.deployments.contains_key(&k) {
			return Err(K8sError::AlreadyExists {
				kind: "Deployment",
				name,
			});
		}
		deployment.metadata.namespace = Some(namespace.to_string());
		deployment.metadata.creation_timestamp = Some(Time(Utc::now()));
		deployment.metadata.generation = Some(1);
		reconcile(&state, &mut deployment);
		state.deployments.insert(k, deployment.clone());
		Ok(deployment)
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> Result<Deployment, K8sError> {
		let state = self.enter("get_deployment")?;
		state
			.deployments
			.get(&key(namespace, name))
			.cloned()
			.ok_or_else(|| K8sError::NotFound {
				kind: "Deployment",
				name: name.to_string(),
			})
	}

	async fn list_deployments(
		&self,
		namespace: &str,
		label_selector: &str,
	) -> Result<Vec<Deployment>, K8sError> {
		let state = self.enter("list_deployments")?;
		Ok(
			state
				.deployments
				.iter()
				.filter(|((ns, _), d)| {
					ns == namespace && selector_matches(label_selector, d.metadata.labels.as_ref())
				})
				.map(|(_, d)| d.clone())
				.collect(),
		)
	}

	async fn scale_deployment(
		&self,
		name: &str,
		namespace: &str,
		replicas: i32,
	) -> Result<Deployment, K8sError> {
		let mut state = self.enter("scale_deployment")?;
		let mut deployment = state
			.deployments
			.get(&key(namespace, name))
			.cloned()
			.ok_or_else(|| K8sError::NotFound {
				kind: "Deployment",
				name: name.to_string(),
			})?;
		if let Some(spec) = deployment.spec.as_mut() {
			spec.replicas = Some(replicas);
		}
		reconcile(&state, &mut deployment);
		state
			.deployments
			.insert(key(namespace, name), deployment.clone());
		Ok(deployment)
	}

	async fn restart_deployment(
		&self,
		name: &str,
		namespace: &str,
		restarted_at: &str,
	) -> Result<Deployment, K8sError> {
		let mut state = self.enter("restart_deployment")?;
		let deployment = state
			.deployments
			.get_mut(&key(namespace, name))
			.ok_or_else(|| K8sError::NotFound {
				kind: "Deployment",
				name: name.to_string(),
			})?;
		if let Some(spec) = deployment.spec.as_mut() {
			spec
				.template
				.metadata
				.get_or_insert_with(Default::default)
				.annotations
				.get_or_insert_with(Default::default)
				.insert(
					RESTARTED_AT_ANNOTATION.to_string(),
					restarted_at.to_string(),
				);
		}
		deployment.metadata.generation = Some(deployment.metadata.generation.unwrap_or(1) + 1);
		Ok(deployment.clone())
	}

	async fn delete_deployment(
		&self,
		name: &str,
		namespace: &str,
		_grace_period_seconds: u32,
	) -> Result<(), K8sError> {
		let mut state = self.enter("delete_deployment")?;
		state
			.deployments
			.remove(&key(namespace, name))
			.map(|_| ())
			.ok_or_else(|| K8sError::NotFound {
				kind: "Deployment",
				name: name.to_string(),
			})
	}

	async fn create_service(&self, namespace: &str, service: Service) -> Result<Service, K8sError> {
		let mut state = self.enter("create_service")?;
		let name = service.metadata.name.clone().unwrap_or_default();
		let k = key(namespace, &name);
		if state.services.contains_key(&k) {
			return Err(K8sError::AlreadyExists {
				kind: "Service",
				name,
			});
		}
		state.services.insert(k, service.clone());
		Ok(service)
	}

	async fn delete_service(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let mut state = self.enter("delete_service")?;
		state
			.services
			.remove(&key(namespace, name))
			.map(|_| ())
			.ok_or_else(|| K8sError::NotFound {
				kind: "Service",
				name: name.to_string(),
			})
	}

	async fn create_ingress(&self, namespace: &str, ingress: Ingress) -> Result<Ingress, K8sError> {
		let mut state = self.enter("create_ingress")?;
		let name = ingress.metadata.name.clone().unwrap_or_default();
		let k = key(namespace, &name);
		if state.ingresses.contains_key(&k) {
			return Err(K8sError::AlreadyExists {
				kind: "Ingress",
				name,
			});
		}
		state.ingresses.insert(k, ingress.clone());
		Ok(ingress)
	}

	async fn delete_ingress(&self, name: &str, namespace: &str) -> Result<(), K8sError> {
		let mut state = self.enter("delete_ingress")?;
		state
			.ingresses
			.remove(&key(namespace, name))
			.map(|_| ())
			.ok_or_else(|| K8sError::NotFound {
				kind: "Ingress",
				name: name.to_string(),
			})
	}

	async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>, K8sError> {
		let state = self.enter("list_pods")?;
		let pods = state
			.deployments
			.iter()
			.filter(|((ns, _), _)| ns == namespace)
			.filter_map(|(_, d)| {
				let image = deployment_image(d)?;
				let desired = d.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
				if desired == 0 || !state.failing_images.contains(&image) {
					return None;
				}
				Some(failing_pod(d, &image))
			})
			.filter(|p| selector_matches(label_selector, p.metadata.labels.as_ref()))
			.collect();
		Ok(pods)
	}
}
