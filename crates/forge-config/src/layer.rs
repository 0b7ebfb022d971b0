// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{AppConfigLayer, KubernetesConfigLayer, LoggingConfigLayer};

/// Driver configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgeConfigLayer {
	#[serde(default)]
	pub app: Option<AppConfigLayer>,
	#[serde(default)]
	pub kubernetes: Option<KubernetesConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ForgeConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ForgeConfigLayer) {
		merge_option(&mut self.app, other.app, AppConfigLayer::merge);
		merge_option(
			&mut self.kubernetes,
			other.kubernetes,
			KubernetesConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ForgeConfigLayer::default();
		base.merge(ForgeConfigLayer::default());
		assert!(base.app.is_none());
		assert!(base.kubernetes.is_none());
	}

	#[test]
	fn test_merge_other_overwrites() {
		let mut base = ForgeConfigLayer {
			kubernetes: Some(KubernetesConfigLayer {
				namespace: Some("a".to_string()),
				max_projects: Some(10),
				..Default::default()
			}),
			..Default::default()
		};
		let other = ForgeConfigLayer {
			kubernetes: Some(KubernetesConfigLayer {
				namespace: Some("b".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(other);
		let k8s = base.kubernetes.unwrap();
		assert_eq!(k8s.namespace.as_deref(), Some("b"));
		assert_eq!(k8s.max_projects, Some(10));
	}

	#[test]
	fn test_merge_adds_missing_sections() {
		let mut base = ForgeConfigLayer::default();
		base.merge(ForgeConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("debug".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(
			base.logging.and_then(|l| l.level).as_deref(),
			Some("debug")
		);
	}

	#[test]
	fn test_unknown_section_is_rejected() {
		let result: Result<ForgeConfigLayer, _> = toml::from_str("[http]\nport = 1\n");
		assert!(result.is_err());
	}
}
