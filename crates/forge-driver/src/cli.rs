// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line arguments.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use forge_containers::{CreateProjectOptions, ProjectName, ResourceSpec};

/// Forge driver - manage container-backed projects on Kubernetes.
#[derive(Parser, Debug)]
#[command(
	name = "forge-driver",
	about = "Manage container-backed Forge projects on Kubernetes",
	version
)]
pub struct Args {
	/// TOML config file (defaults to /etc/forge/driver.toml)
	#[arg(long, global = true, env = "FORGE_DRIVER_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Provision a project and wait until it is running
	Create(CreateArgs),
	/// Delete everything backing a project
	Remove(ProjectArg),
	/// Show the current state of a project
	Details(ProjectArg),
	/// Scale a stopped project back up
	Start(ProjectArg),
	/// Scale a project down to zero
	Stop(ProjectArg),
	/// Roll the pods of a running project
	Restart(ProjectArg),
	/// List every managed project
	List,
	/// Show version and build information
	Version,
}

#[derive(ClapArgs, Debug)]
pub struct ProjectArg {
	/// Project name
	#[arg(value_parser = parse_project_name)]
	pub name: ProjectName,
}

#[derive(ClapArgs, Debug)]
pub struct CreateArgs {
	/// Project name
	#[arg(value_parser = parse_project_name)]
	pub name: ProjectName,

	/// Container image (defaults to the configured image)
	#[arg(long)]
	pub image: Option<String>,

	/// Environment variable for the container, KEY=VALUE (repeatable)
	#[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
	pub env: Vec<(String, String)>,

	/// Port the container listens on
	#[arg(long)]
	pub port: Option<u16>,

	/// Memory limit, e.g. 512Mi
	#[arg(long)]
	pub memory: Option<String>,

	/// CPU limit, e.g. 500m
	#[arg(long)]
	pub cpu: Option<String>,

	/// Tag stored with the project, KEY=VALUE (repeatable)
	#[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_key_val)]
	pub tags: Vec<(String, String)>,
}

impl CreateArgs {
	pub fn into_options(self) -> (ProjectName, CreateProjectOptions) {
		let options = CreateProjectOptions {
			image: self.image,
			env: self.env.into_iter().collect::<HashMap<_, _>>(),
			resources: ResourceSpec {
				memory_limit: self.memory,
				cpu_limit: self.cpu,
			},
			port: self.port,
			command: None,
			args: None,
			tags: self.tags.into_iter().collect(),
		};
		(self.name, options)
	}
}

fn parse_project_name(s: &str) -> Result<ProjectName, String> {
	ProjectName::new(s).map_err(|e| e.to_string())
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
	match s.split_once('=') {
		Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
		_ => Err(format!("expected KEY=VALUE, got '{s}'")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_key_val_splits_on_first_equals() {
		assert_eq!(
			parse_key_val("DB_URL=postgres://u:p@h/db?a=b").unwrap(),
			(
				"DB_URL".to_string(),
				"postgres://u:p@h/db?a=b".to_string()
			)
		);
		assert_eq!(
			parse_key_val("EMPTY=").unwrap(),
			("EMPTY".to_string(), String::new())
		);
		assert!(parse_key_val("novalue").is_err());
		assert!(parse_key_val("=value").is_err());
	}

	#[test]
	fn create_args_map_to_options() {
		let args = Args::try_parse_from([
			"forge-driver",
			"create",
			"my-flow",
			"--image",
			"nodered/node-red:3.1",
			"--env",
			"TZ=UTC",
			"--env",
			"LOG=debug",
			"--port",
			"8080",
			"--memory",
			"1Gi",
			"--tag",
			"team=core",
		])
		.unwrap();

		let Command::Create(create) = args.command else {
			panic!("expected create command");
		};
		let (name, options) = create.into_options();
		assert_eq!(name.as_str(), "my-flow");
		assert_eq!(options.image.as_deref(), Some("nodered/node-red:3.1"));
		assert_eq!(options.env.get("TZ"), Some(&"UTC".to_string()));
		assert_eq!(options.env.len(), 2);
		assert_eq!(options.port, Some(8080));
		assert_eq!(options.resources.memory_limit.as_deref(), Some("1Gi"));
		assert!(options.resources.cpu_limit.is_none());
		assert_eq!(options.tags.get("team"), Some(&"core".to_string()));
	}

	#[test]
	fn invalid_project_name_is_rejected() {
		let result = Args::try_parse_from(["forge-driver", "details", "Bad_Name"]);
		assert!(result.is_err());
	}

	#[test]
	fn config_flag_is_global() {
		let args =
			Args::try_parse_from(["forge-driver", "list", "--config", "/tmp/driver.toml"]).unwrap();
		assert_eq!(args.config, Some(PathBuf::from("/tmp/driver.toml")));
		assert!(matches!(args.command, Command::List));
	}
}
