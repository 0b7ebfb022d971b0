// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("{kind} not found: {name}")]
	NotFound { kind: &'static str, name: String },

	#[error("{kind} already exists: {name}")]
	AlreadyExists { kind: &'static str, name: String },

	#[error("Cluster quota exceeded: {message}")]
	QuotaExceeded { message: String },

	#[error("Forbidden: {message}")]
	Forbidden { message: String },

	#[error("Cluster unreachable: {message}")]
	Unreachable { message: String },

	#[error("Namespace not found: {name}")]
	NamespaceNotFound { name: String },

	#[error("Invalid cluster configuration: {message}")]
	Config { message: String },

	#[error("Operation timed out")]
	Timeout,
}

impl K8sError {
	/// Classify a kube error for a named object of the given kind.
	///
	/// 404 and 409 responses become `NotFound` / `AlreadyExists` carrying the
	/// object name; everything else goes through the generic conversion.
	pub fn from_kube(err: kube::Error, kind: &'static str, name: &str) -> Self {
		match err {
			kube::Error::Api(ref resp) if resp.code == 404 => K8sError::NotFound {
				kind,
				name: name.into(),
			},
			kube::Error::Api(ref resp) if resp.code == 409 => K8sError::AlreadyExists {
				kind,
				name: name.into(),
			},
			other => other.into(),
		}
	}

	/// Whether this error means the object does not exist.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			K8sError::NotFound { .. } | K8sError::NamespaceNotFound { .. }
		)
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		match err {
			kube::Error::Api(resp) if resp.code == 403 => {
				if resp.message.contains("exceeded quota") {
					K8sError::QuotaExceeded {
						message: resp.message,
					}
				} else {
					K8sError::Forbidden {
						message: resp.message,
					}
				}
			}
			kube::Error::Api(resp) if resp.code == 504 => K8sError::Timeout,
			kube::Error::HyperError(e) => K8sError::Unreachable {
				message: e.to_string(),
			},
			kube::Error::Service(e) => K8sError::Unreachable {
				message: e.to_string(),
			},
			kube::Error::InferConfig(e) => K8sError::Config {
				message: e.to_string(),
			},
			other => K8sError::ApiError {
				message: other.to_string(),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use kube::core::ErrorResponse;

	fn api_error(code: u16, message: &str) -> kube::Error {
		kube::Error::Api(ErrorResponse {
			status: "Failure".to_string(),
			message: message.to_string(),
			reason: String::new(),
			code,
		})
	}

	#[test]
	fn not_found_carries_kind_and_name() {
		let err = K8sError::from_kube(api_error(404, "gone"), "Deployment", "alpha");
		assert!(err.is_not_found());
		assert_eq!(err.to_string(), "Deployment not found: alpha");
	}

	#[test]
	fn conflict_maps_to_already_exists() {
		let err = K8sError::from_kube(api_error(409, "exists"), "Service", "alpha");
		assert!(matches!(
			err,
			K8sError::AlreadyExists {
				kind: "Service",
				..
			}
		));
	}

	#[test]
	fn quota_forbidden_is_distinguished() {
		let err: K8sError = api_error(
			403,
			"pods \"x\" is forbidden: exceeded quota: compute, requested: cpu=2",
		)
		.into();
		assert!(matches!(err, K8sError::QuotaExceeded { .. }));

		let err: K8sError = api_error(403, "user cannot create deployments").into();
		assert!(matches!(err, K8sError::Forbidden { .. }));
	}

	#[test]
	fn other_api_errors_are_generic() {
		let err: K8sError = api_error(500, "boom").into();
		assert!(matches!(err, K8sError::ApiError { .. }));
		assert!(!err.is_not_found());
	}
}
