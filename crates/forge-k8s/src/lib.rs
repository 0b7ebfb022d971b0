// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! K8s client abstraction for Forge project containers.
//!
//! This crate provides:
//! - A trait-based K8s client abstraction for testability
//! - Production implementation using the kube crate
//! - Cluster connection loading (explicit kubeconfig, context, or ambient)
//! - An in-memory mock client for driver tests (`test-util` feature)

mod client;
mod error;
mod kube_client;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod types;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use kube_client::KubeClient;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockK8sClient;
pub use types::{
	Capabilities, ClusterConnection, Container, ContainerPort, ContainerState,
	ContainerStateWaiting, ContainerStatus, Deployment, DeploymentCondition, DeploymentSpec,
	DeploymentStatus, DeploymentStrategy, EnvVar, HTTPIngressPath, HTTPIngressRuleValue, Ingress,
	IngressBackend, IngressRule, IngressServiceBackend, IngressSpec, LocalObjectReference, Namespace,
	Pod, PodSpec, PodStatus, PodTemplateSpec, ResourceRequirements, SecurityContext, Service,
	ServiceBackendPort, ServicePort, ServiceSpec, RESTARTED_AT_ANNOTATION,
};
