// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application identity section.

use serde::{Deserialize, Serialize};

fn default_name() -> String {
	"forge".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppConfigLayer {
	pub name: Option<String>,
	pub base_url: Option<String>,
}

impl AppConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.name.is_some() {
			self.name = other.name;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
	}

	pub fn finalize(self) -> AppConfig {
		AppConfig {
			name: self.name.unwrap_or_else(default_name),
			base_url: self.base_url.unwrap_or_default(),
		}
	}
}

/// Identity of the application that owns the projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
	/// Recorded on every managed object as `app.kubernetes.io/managed-by`.
	pub name: String,
	/// Public URL handed to project containers; empty to omit.
	pub base_url: String,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			name: default_name(),
			base_url: String::new(),
		}
	}
}
