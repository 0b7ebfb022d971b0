// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Container driver for Forge projects.
//!
//! A project is an application instance known to the project manager only by
//! name. This crate backs each project with Kubernetes objects and exposes the
//! lifecycle through the [`ContainerDriver`] trait:
//!
//! - `init` connects to the cluster and checks the target namespace
//! - `create` / `remove` provision and tear down a project
//! - `start` / `stop` scale a project up and down
//! - `restart` rolls the project pods
//! - `details` reports the current state
//!
//! ```no_run
//! use std::sync::Arc;
//! use forge_containers::{
//! 	AppContext, ContainerDriver, CreateProjectOptions, DriverOptions, KubernetesDriver,
//! 	ProjectName,
//! };
//!
//! # async fn run() -> Result<(), forge_containers::DriverError> {
//! let app = Arc::new(AppContext {
//! 	name: "forge".to_string(),
//! 	base_url: "https://forge.example.com".to_string(),
//! });
//! let driver = KubernetesDriver::init(app, DriverOptions::default()).await?;
//! let name = ProjectName::new("my-flow")?;
//! let details = driver.create(&name, CreateProjectOptions::default()).await?;
//! println!("{} is {}", details.name, details.state);
//! # Ok(())
//! # }
//! ```

mod config;
mod driver;
mod error;
mod kubernetes;
mod locks;
mod manifest;
mod status;
mod types;

pub use config::DriverOptions;
pub use driver::ContainerDriver;
pub use error::DriverError;
pub use forge_k8s::ClusterConnection;
pub use kubernetes::KubernetesDriver;
pub use types::{
	AppContext, CreateProjectOptions, ProjectDetails, ProjectName, ProjectState, ReplicaCounts,
	ResourceSpec, MAX_PROJECT_NAME_LENGTH,
};
