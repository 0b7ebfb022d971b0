// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mapping Deployment and pod status onto project state.

use std::collections::HashMap;

use forge_k8s::{Deployment, Pod};

use crate::config::DriverOptions;
use crate::error::DriverError;
use crate::manifest::{project_url, CONTAINER_NAME, PROJECT_LABEL, TAGS_ANNOTATION};
use crate::types::{ProjectDetails, ProjectName, ProjectState, ReplicaCounts};

/// Container waiting reasons that will not resolve without intervention.
const FATAL_WAITING_REASONS: &[&str] = &[
	"ErrImagePull",
	"ImagePullBackOff",
	"CrashLoopBackOff",
	"InvalidImageName",
	"CreateContainerConfigError",
];

pub(crate) fn desired_replicas(deployment: &Deployment) -> i32 {
	deployment
		.spec
		.as_ref()
		.and_then(|s| s.replicas)
		.unwrap_or(1)
}

fn ready_replicas(deployment: &Deployment) -> i32 {
	deployment
		.status
		.as_ref()
		.and_then(|s| s.ready_replicas)
		.unwrap_or(0)
}

/// Why the project cannot come up, if one of its pods says so.
fn failure_reason(deployment: &Deployment, pods: &[Pod]) -> Option<String> {
	for pod in pods {
		if pod.metadata.deletion_timestamp.is_some() {
			continue;
		}
		let Some(status) = pod.status.as_ref() else {
			continue;
		};
		// Evicted pods linger until pod GC.
		if status.reason.as_deref() == Some("Evicted") {
			continue;
		}

		if status.phase.as_deref() == Some("Failed") {
			return Some(
				status
					.message
					.clone()
					.or_else(|| status.reason.clone())
					.unwrap_or_else(|| "Pod failed".to_string()),
			);
		}

		let waiting = status
			.container_statuses
			.iter()
			.flatten()
			.filter_map(|cs| cs.state.as_ref().and_then(|s| s.waiting.as_ref()));
		for w in waiting {
			let Some(reason) = w.reason.as_deref() else {
				continue;
			};
			if FATAL_WAITING_REASONS.contains(&reason) {
				return Some(match &w.message {
					Some(message) => format!("{reason}: {message}"),
					None => reason.to_string(),
				});
			}
		}
	}

	deployment
		.status
		.as_ref()
		.and_then(|s| s.conditions.as_ref())
		.and_then(|conditions| {
			conditions.iter().find(|c| {
				c.type_ == "Progressing" && c.reason.as_deref() == Some("ProgressDeadlineExceeded")
			})
		})
		.map(|c| {
			c.message
				.clone()
				.unwrap_or_else(|| "ProgressDeadlineExceeded".to_string())
		})
}

/// Map a Deployment and its pods to a project state plus failure reason.
pub(crate) fn map_state(deployment: &Deployment, pods: &[Pod]) -> (ProjectState, Option<String>) {
	if deployment.metadata.deletion_timestamp.is_some() {
		return (ProjectState::Terminating, None);
	}

	let desired = desired_replicas(deployment);
	if desired == 0 {
		return (ProjectState::Stopped, None);
	}

	if ready_replicas(deployment) >= desired {
		return (ProjectState::Running, None);
	}

	match failure_reason(deployment, pods) {
		Some(reason) => (ProjectState::Failed, Some(reason)),
		None => (ProjectState::Starting, None),
	}
}

fn project_image(deployment: &Deployment) -> String {
	deployment
		.spec
		.as_ref()
		.and_then(|s| s.template.spec.as_ref())
		.and_then(|s| {
			s.containers
				.iter()
				.find(|c| c.name == CONTAINER_NAME)
				.or_else(|| s.containers.first())
		})
		.and_then(|c| c.image.clone())
		.unwrap_or_default()
}

/// Name of the project a Deployment backs.
pub(crate) fn deployment_project_name(deployment: &Deployment) -> Result<ProjectName, DriverError> {
	let name = deployment
		.metadata
		.labels
		.as_ref()
		.and_then(|l| l.get(PROJECT_LABEL).cloned())
		.or_else(|| deployment.metadata.name.clone())
		.unwrap_or_default();
	ProjectName::new(name)
}

/// Build project details from a Deployment and the pods it owns.
pub(crate) fn deployment_to_details(
	deployment: &Deployment,
	pods: &[Pod],
	options: &DriverOptions,
) -> Result<ProjectDetails, DriverError> {
	let name = deployment_project_name(deployment)?;

	let tags: HashMap<String, String> = deployment
		.metadata
		.annotations
		.as_ref()
		.and_then(|a| a.get(TAGS_ANNOTATION))
		.and_then(|s| serde_json::from_str(s).ok())
		.unwrap_or_default();

	let (state, reason) = map_state(deployment, pods);
	let url = Some(project_url(&name, options));

	Ok(ProjectDetails {
		state,
		image: project_image(deployment),
		url,
		replicas: ReplicaCounts {
			desired: desired_replicas(deployment),
			ready: ready_replicas(deployment),
		},
		tags,
		created_at: deployment.metadata.creation_timestamp.as_ref().map(|ts| ts.0),
		reason,
		name,
	})
}
