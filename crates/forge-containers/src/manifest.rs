// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kubernetes objects backing a project.

use std::collections::BTreeMap;

use forge_k8s::{
	Capabilities, Container, ContainerPort, Deployment, DeploymentSpec, DeploymentStrategy, EnvVar,
	HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
	IngressServiceBackend, IngressSpec, LocalObjectReference, PodSpec, PodTemplateSpec,
	ResourceRequirements, SecurityContext, Service, ServiceBackendPort, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::config::DriverOptions;
use crate::types::{AppContext, CreateProjectOptions, ProjectName};

pub(crate) const MANAGED_LABEL: &str = "forge.dev/managed";
pub(crate) const PROJECT_LABEL: &str = "forge.dev/project";
pub(crate) const APP_NAME_LABEL: &str = "app.kubernetes.io/name";
pub(crate) const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub(crate) const TAGS_ANNOTATION: &str = "forge.dev/tags";
pub(crate) const CONTAINER_NAME: &str = "project";
const PORT_NAME: &str = "http";
const DEFAULT_MEMORY_LIMIT: &str = "512Mi";
const DEFAULT_MANAGER: &str = "forge";
const MAX_LABEL_LENGTH: usize = 63;

/// Sanitize a string to be a valid Kubernetes label value.
///
/// K8s label values must:
/// - Be 63 characters or less
/// - Begin and end with an alphanumeric character
/// - Contain only alphanumeric characters, dashes, underscores, and dots
pub(crate) fn sanitize_label_value(value: &str) -> String {
	let sanitized: String = value
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
				c
			} else {
				'_'
			}
		})
		.collect();

	let trimmed = sanitized
		.trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
		.trim_end_matches(|c: char| !c.is_ascii_alphanumeric());

	if trimmed.len() > MAX_LABEL_LENGTH {
		trimmed[..MAX_LABEL_LENGTH]
			.trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
			.to_string()
	} else {
		trimmed.to_string()
	}
}

/// Selector matching every object the driver manages.
pub(crate) fn managed_selector() -> String {
	format!("{MANAGED_LABEL}=true")
}

/// Selector matching the objects of one project.
pub(crate) fn project_selector(name: &ProjectName) -> String {
	format!("{MANAGED_LABEL}=true,{PROJECT_LABEL}={name}")
}

fn selector_labels(name: &ProjectName) -> BTreeMap<String, String> {
	let mut labels = BTreeMap::new();
	labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
	labels.insert(PROJECT_LABEL.to_string(), name.to_string());
	labels
}

fn object_labels(name: &ProjectName, app: &AppContext) -> BTreeMap<String, String> {
	let mut labels = selector_labels(name);
	labels.insert(APP_NAME_LABEL.to_string(), name.to_string());
	let manager = sanitize_label_value(&app.name);
	labels.insert(
		MANAGED_BY_LABEL.to_string(),
		if manager.is_empty() {
			DEFAULT_MANAGER.to_string()
		} else {
			manager
		},
	);
	labels
}

fn object_meta(name: &ProjectName, app: &AppContext, options: &DriverOptions) -> ObjectMeta {
	ObjectMeta {
		name: Some(name.to_string()),
		namespace: Some(options.namespace.clone()),
		labels: Some(object_labels(name, app)),
		..Default::default()
	}
}

fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
	EnvVar {
		name: name.to_string(),
		value: Some(value.into()),
		value_from: None,
	}
}

/// Build the Deployment running the project container.
pub(crate) fn build_deployment(
	name: &ProjectName,
	req: &CreateProjectOptions,
	app: &AppContext,
	options: &DriverOptions,
) -> Deployment {
	let image = req
		.image
		.clone()
		.unwrap_or_else(|| options.default_image.clone());
	let port = req.port.unwrap_or(options.container_port);

	let mut metadata = object_meta(name, app, options);
	if !req.tags.is_empty() {
		if let Ok(tags_json) = serde_json::to_string(&req.tags) {
			let mut annotations = BTreeMap::new();
			annotations.insert(TAGS_ANNOTATION.to_string(), tags_json);
			metadata.annotations = Some(annotations);
		}
	}

	// Sorted so repeated creates render identical specs.
	let mut user_env: Vec<(&String, &String)> = req.env.iter().collect();
	user_env.sort();
	let mut env_vars: Vec<EnvVar> = user_env
		.into_iter()
		.map(|(k, v)| env_var(k, v.clone()))
		.collect();
	env_vars.push(env_var("FORGE_PROJECT", name.to_string()));
	if !app.base_url.is_empty() {
		env_vars.push(env_var("FORGE_URL", app.base_url.clone()));
	}

	let mut limits = BTreeMap::new();
	limits.insert(
		"memory".to_string(),
		Quantity(
			req
				.resources
				.memory_limit
				.clone()
				.unwrap_or_else(|| DEFAULT_MEMORY_LIMIT.to_string()),
		),
	);
	if let Some(cpu) = &req.resources.cpu_limit {
		limits.insert("cpu".to_string(), Quantity(cpu.clone()));
	}

	let security_context = SecurityContext {
		run_as_non_root: Some(true),
		allow_privilege_escalation: Some(false),
		capabilities: Some(Capabilities {
			drop: Some(vec!["ALL".to_string()]),
			add: None,
		}),
		..Default::default()
	};

	let container = Container {
		name: CONTAINER_NAME.to_string(),
		image: Some(image),
		ports: Some(vec![ContainerPort {
			container_port: i32::from(port),
			name: Some(PORT_NAME.to_string()),
			protocol: Some("TCP".to_string()),
			..Default::default()
		}]),
		env: Some(env_vars),
		command: req.command.clone(),
		args: req.args.clone(),
		resources: Some(ResourceRequirements {
			limits: Some(limits),
			requests: None,
			claims: None,
		}),
		security_context: Some(security_context),
		..Default::default()
	};

	let image_pull_secrets = if options.image_pull_secrets.is_empty() {
		None
	} else {
		Some(
			options
				.image_pull_secrets
				.iter()
				.map(|name| LocalObjectReference { name: name.clone() })
				.collect(),
		)
	};

	Deployment {
		metadata,
		spec: Some(DeploymentSpec {
			replicas: Some(1),
			selector: LabelSelector {
				match_labels: Some(selector_labels(name)),
				match_expressions: None,
			},
			// Two instances of one project must never run side by side.
			strategy: Some(DeploymentStrategy {
				type_: Some("Recreate".to_string()),
				rolling_update: None,
			}),
			template: PodTemplateSpec {
				metadata: Some(ObjectMeta {
					labels: Some(object_labels(name, app)),
					..Default::default()
				}),
				spec: Some(PodSpec {
					containers: vec![container],
					image_pull_secrets,
					termination_grace_period_seconds: Some(i64::from(options.stop_grace_period_secs)),
					..Default::default()
				}),
			},
			..Default::default()
		}),
		status: None,
	}
}

/// Build the ClusterIP Service in front of the project pods.
pub(crate) fn build_service(
	name: &ProjectName,
	req: &CreateProjectOptions,
	app: &AppContext,
	options: &DriverOptions,
) -> Service {
	let target = req.port.unwrap_or(options.container_port);
	Service {
		metadata: object_meta(name, app, options),
		spec: Some(ServiceSpec {
			type_: Some("ClusterIP".to_string()),
			selector: Some(selector_labels(name)),
			ports: Some(vec![ServicePort {
				name: Some(PORT_NAME.to_string()),
				port: i32::from(options.service_port),
				target_port: Some(IntOrString::Int(i32::from(target))),
				protocol: Some("TCP".to_string()),
				..Default::default()
			}]),
			..Default::default()
		}),
		status: None,
	}
}

/// Build the Ingress routing `<name>.<domain>` to the project Service.
///
/// Returns `None` when no domain is configured.
pub(crate) fn build_ingress(
	name: &ProjectName,
	app: &AppContext,
	options: &DriverOptions,
) -> Option<Ingress> {
	let host = project_host(name, options)?;
	Some(Ingress {
		metadata: object_meta(name, app, options),
		spec: Some(IngressSpec {
			ingress_class_name: options.ingress_class.clone(),
			rules: Some(vec![IngressRule {
				host: Some(host),
				http: Some(HTTPIngressRuleValue {
					paths: vec![HTTPIngressPath {
						path: Some("/".to_string()),
						path_type: "Prefix".to_string(),
						backend: IngressBackend {
							service: Some(IngressServiceBackend {
								name: name.to_string(),
								port: Some(ServiceBackendPort {
									number: Some(i32::from(options.service_port)),
									name: None,
								}),
							}),
							resource: None,
						},
					}],
				}),
			}]),
			..Default::default()
		}),
		status: None,
	})
}

/// Public hostname of a project, when a domain is configured.
pub(crate) fn project_host(name: &ProjectName, options: &DriverOptions) -> Option<String> {
	options
		.domain
		.as_deref()
		.map(|d| d.trim_matches('.'))
		.filter(|d| !d.is_empty())
		.map(|domain| format!("{name}.{domain}"))
}

/// URL at which a project is reachable.
pub(crate) fn project_url(name: &ProjectName, options: &DriverOptions) -> String {
	match project_host(name, options) {
		Some(host) => format!("https://{host}"),
		None => format!(
			"http://{name}.{}.svc.cluster.local:{}",
			options.namespace, options.service_port
		),
	}
}


#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	fn is_valid_k8s_label_value(s: &str) -> bool {
		if s.is_empty() {
			return true;
		}
		if s.len() > MAX_LABEL_LENGTH {
			return false;
		}
		let first_ok = s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
		let last_ok = s.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
		first_ok
			&& last_ok
			&& s
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
	}

	proptest! {
		#[test]
		fn sanitize_label_value_always_valid(input in ".*") {
			let result = sanitize_label_value(&input);
			prop_assert!(
				is_valid_k8s_label_value(&result),
				"Invalid label value: {:?} (from input: {:?})",
				result,
				input
			);
		}

		#[test]
		fn sanitize_label_value_preserves_alphanumeric(input in "[a-zA-Z0-9]+") {
			let result = sanitize_label_value(&input);
			if input.len() <= MAX_LABEL_LENGTH {
				prop_assert_eq!(result, input);
			} else {
				prop_assert_eq!(result, &input[..MAX_LABEL_LENGTH]);
			}
		}

		#[test]
		fn project_labels_are_valid(
			project in "[a-z][a-z0-9-]{0,61}[a-z0-9]",
			app_name in ".{0,80}"
		) {
			let name = ProjectName::new(project.clone()).unwrap();
			let app = AppContext { name: app_name, base_url: String::new() };
			let deployment = build_deployment(
				&name,
				&CreateProjectOptions::default(),
				&app,
				&DriverOptions::default(),
			);
			for (key, value) in deployment.metadata.labels.unwrap() {
				prop_assert!(
					is_valid_k8s_label_value(&value),
					"Label {}={:?} has invalid value",
					key,
					value
				);
			}
		}
	}
}
