// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lifecycle contract between the project manager and a container backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::types::{AppContext, CreateProjectOptions, ProjectDetails, ProjectName};

/// Backs projects with containers.
///
/// Every operation is keyed by project name. Implementations serialize calls
/// for the same project and may run calls for different projects in parallel.
#[async_trait]
pub trait ContainerDriver: Send + Sync {
	/// Backend-specific options passed to [`ContainerDriver::init`].
	type Options: Send;

	/// Load the cluster configuration and prepare the driver for use.
	async fn init(app: Arc<AppContext>, options: Self::Options) -> Result<Self, DriverError>
	where
		Self: Sized;

	/// Provision the containers for a project and wait for them to be ready.
	async fn create(
		&self,
		name: &ProjectName,
		options: CreateProjectOptions,
	) -> Result<ProjectDetails, DriverError>;

	/// Tear down everything backing a project.
	async fn remove(&self, name: &ProjectName) -> Result<(), DriverError>;

	/// Current status of a project.
	async fn details(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError>;

	/// Resume a stopped project.
	async fn start(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError>;

	/// Suspend a project without removing it.
	async fn stop(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError>;

	/// Cycle the containers of a running project.
	async fn restart(&self, name: &ProjectName) -> Result<ProjectDetails, DriverError>;
}
