// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layering of defaults, TOML file and environment.

use std::io::Write;
use std::path::PathBuf;

use forge_config::{
	load_from_sources, ConfigError, DefaultsSource, EnvSource, LogFormat, TomlSource,
};
use tempfile::NamedTempFile;

fn toml_file(content: &str) -> NamedTempFile {
	let mut file = NamedTempFile::new().unwrap();
	file.write_all(content.as_bytes()).unwrap();
	file
}

const DRIVER_TOML: &str = r#"
[app]
name = "forge-staging"
base_url = "https://staging.example.com"

[kubernetes]
namespace = "staging-projects"
default_image = "nodered/node-red:3.1"
max_projects = 20
domain = "apps.staging.example.com"
ingress_class = "nginx"
kubeconfig = "/etc/forge/kubeconfig"
context = "staging"

[logging]
level = "debug"
format = "json"
"#;

#[test]
fn toml_overrides_defaults() {
	let file = toml_file(DRIVER_TOML);
	let config = load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(file.path())),
	])
	.unwrap();

	assert_eq!(config.app.name, "forge-staging");
	assert_eq!(config.app.base_url, "https://staging.example.com");
	assert_eq!(config.kubernetes.namespace, "staging-projects");
	assert_eq!(config.kubernetes.default_image, "nodered/node-red:3.1");
	assert_eq!(config.kubernetes.max_projects, 20);
	assert_eq!(
		config.kubernetes.domain.as_deref(),
		Some("apps.staging.example.com")
	);
	assert_eq!(config.kubernetes.ingress_class.as_deref(), Some("nginx"));
	assert_eq!(
		config.kubernetes.kubeconfig,
		Some(PathBuf::from("/etc/forge/kubeconfig"))
	);
	assert_eq!(config.kubernetes.context.as_deref(), Some("staging"));
	assert_eq!(config.logging.level, "debug");
	assert_eq!(config.logging.format, LogFormat::Json);

	// Untouched fields keep their defaults.
	assert_eq!(config.kubernetes.container_port, 1880);
	assert_eq!(config.kubernetes.ready_timeout_secs, 120);
}

#[test]
fn env_overrides_toml() {
	let file = toml_file(DRIVER_TOML);
	let config = load_from_sources(vec![
		Box::new(EnvSource::from_vars([
			("FORGE_DRIVER_NAMESPACE", "prod-projects"),
			("FORGE_DRIVER_MAX_PROJECTS", "250"),
			("FORGE_DRIVER_LOG_LEVEL", "warn"),
		])),
		Box::new(TomlSource::new(file.path())),
		Box::new(DefaultsSource),
	])
	.unwrap();

	assert_eq!(config.kubernetes.namespace, "prod-projects");
	assert_eq!(config.kubernetes.max_projects, 250);
	assert_eq!(config.logging.level, "warn");
	// Values only the file sets survive.
	assert_eq!(config.kubernetes.context.as_deref(), Some("staging"));
	assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn invalid_numeric_env_is_invalid_value() {
	let err = load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(EnvSource::from_vars([("FORGE_DRIVER_MAX_PROJECTS", "lots")])),
	])
	.unwrap_err();
	assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "FORGE_DRIVER_MAX_PROJECTS"));
}

#[test]
fn malformed_toml_is_parse_error() {
	let file = toml_file("[kubernetes\nnamespace = ");
	let err = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap_err();
	match err {
		ConfigError::TomlParse { path, .. } => assert_eq!(path, file.path()),
		other => panic!("expected TomlParse, got {other:?}"),
	}
}

#[test]
fn wrong_type_in_toml_is_parse_error() {
	let file = toml_file("[kubernetes]\nmax_projects = \"many\"\n");
	let err = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap_err();
	assert!(matches!(err, ConfigError::TomlParse { .. }));
}

#[test]
fn unknown_section_key_is_rejected() {
	let file = toml_file("[kubernetes]\nnamespce = \"typo\"\n");
	let err = load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(file.path())),
	])
	.unwrap_err();
	match err {
		ConfigError::TomlParse { source, .. } => {
			assert!(source.to_string().contains("namespce"), "error: {source}");
		}
		other => panic!("expected TomlParse, got {other:?}"),
	}
}

#[test]
fn unknown_keys_rejected_in_every_section() {
	for content in [
		"[app]\nnmae = \"forge\"\n",
		"[logging]\nlevle = \"debug\"\n",
		"[extra]\nkey = 1\n",
	] {
		let file = toml_file(content);
		let err = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap_err();
		assert!(
			matches!(err, ConfigError::TomlParse { .. }),
			"accepted: {content}"
		);
	}
}

#[test]
fn missing_explicit_config_file_is_read_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("driver.toml");
	let err = load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(&path)),
	])
	.unwrap_err();
	match err {
		ConfigError::FileRead { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("expected FileRead, got {other:?}"),
	}
}
