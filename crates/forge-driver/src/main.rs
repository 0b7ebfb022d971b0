// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Forge container driver command-line binary.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use forge_config::{ForgeConfig, KubernetesConfig, LogFormat};
use forge_containers::{
	AppContext, ClusterConnection, ContainerDriver, DriverOptions, KubernetesDriver,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod version;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
	// Parse CLI arguments
	let args = Args::parse();

	// Handle subcommands that do not touch the cluster
	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return ExitCode::SUCCESS;
	}

	match run(args).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!(error = %e, "forge-driver failed");
			eprintln!("error: {e}");
			ExitCode::FAILURE
		}
	}
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
	let config = match &args.config {
		Some(path) => forge_config::load_config_with_file(path)?,
		None => forge_config::load_config()?,
	};

	init_tracing(&config);

	let app = Arc::new(AppContext {
		name: config.app.name.clone(),
		base_url: config.app.base_url.clone(),
	});
	let driver = KubernetesDriver::init(app, driver_options(&config.kubernetes)).await?;

	let output = match args.command {
		Command::Create(create) => {
			let (name, options) = create.into_options();
			serde_json::to_value(driver.create(&name, options).await?)?
		}
		Command::Remove(project) => {
			driver.remove(&project.name).await?;
			serde_json::json!({ "name": project.name, "removed": true })
		}
		Command::Details(project) => serde_json::to_value(driver.details(&project.name).await?)?,
		Command::Start(project) => serde_json::to_value(driver.start(&project.name).await?)?,
		Command::Stop(project) => serde_json::to_value(driver.stop(&project.name).await?)?,
		Command::Restart(project) => serde_json::to_value(driver.restart(&project.name).await?)?,
		Command::List => serde_json::to_value(driver.list_projects().await?)?,
		Command::Version => return Ok(()),
	};

	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(config: &ForgeConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
		LogFormat::Text => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

fn driver_options(config: &KubernetesConfig) -> DriverOptions {
	DriverOptions {
		namespace: config.namespace.clone(),
		default_image: config.default_image.clone(),
		container_port: config.container_port,
		service_port: config.service_port,
		image_pull_secrets: config.image_pull_secrets.clone(),
		ready_timeout_secs: config.ready_timeout_secs,
		max_projects: config.max_projects,
		domain: config.domain.clone(),
		ingress_class: config.ingress_class.clone(),
		stop_grace_period_secs: config.stop_grace_period_secs,
		cluster: ClusterConnection {
			kubeconfig: config.kubeconfig.clone(),
			context: config.context.clone(),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn default_config_matches_driver_defaults() {
		let from_config = driver_options(&KubernetesConfig::default());
		let defaults = DriverOptions::default();
		assert_eq!(from_config.namespace, defaults.namespace);
		assert_eq!(from_config.default_image, defaults.default_image);
		assert_eq!(from_config.container_port, defaults.container_port);
		assert_eq!(from_config.service_port, defaults.service_port);
		assert_eq!(from_config.ready_timeout_secs, defaults.ready_timeout_secs);
		assert_eq!(from_config.max_projects, defaults.max_projects);
		assert_eq!(
			from_config.stop_grace_period_secs,
			defaults.stop_grace_period_secs
		);
		assert!(from_config.cluster.is_ambient());
	}

	#[test]
	fn cluster_connection_comes_from_config() {
		let config = KubernetesConfig {
			kubeconfig: Some(PathBuf::from("/etc/forge/kubeconfig")),
			context: Some("prod".to_string()),
			..Default::default()
		};
		let options = driver_options(&config);
		assert_eq!(
			options.cluster,
			ClusterConnection {
				kubeconfig: Some(PathBuf::from("/etc/forge/kubeconfig")),
				context: Some("prod".to_string()),
			}
		);
	}
}
