// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-project operation locks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::ProjectName;

/// Serializes lifecycle operations on the same project.
///
/// Operations on different projects do not wait on each other here; only
/// the quota check in `create` is driver-wide.
#[derive(Debug, Default)]
pub(crate) struct ProjectLocks {
	locks: Mutex<HashMap<ProjectName, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
	/// Wait for exclusive access to `name`.
	pub(crate) async fn acquire(&self, name: &ProjectName) -> OwnedMutexGuard<()> {
		let lock = {
			let mut locks = self.locks.lock().await;
			// Entries nobody holds or waits on can go.
			locks.retain(|_, lock| Arc::strong_count(lock) > 1);
			locks
				.entry(name.clone())
				.or_insert_with(|| Arc::new(Mutex::new(())))
				.clone()
		};
		lock.lock_owned().await
	}

	#[cfg(test)]
	async fn len(&self) -> usize {
		self.locks.lock().await.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	fn name(s: &str) -> ProjectName {
		ProjectName::new(s).unwrap()
	}

	#[tokio::test]
	async fn same_project_waits() {
		let locks = Arc::new(ProjectLocks::default());
		let guard = locks.acquire(&name("alpha")).await;

		let contender = {
			let locks = Arc::clone(&locks);
			tokio::spawn(async move {
				let _guard = locks.acquire(&name("alpha")).await;
			})
		};

		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(!contender.is_finished());

		drop(guard);
		tokio::time::timeout(Duration::from_secs(1), contender)
			.await
			.unwrap()
			.unwrap();
	}

	#[tokio::test]
	async fn different_projects_do_not_wait() {
		let locks = ProjectLocks::default();
		let _alpha = locks.acquire(&name("alpha")).await;
		let beta = tokio::time::timeout(Duration::from_secs(1), locks.acquire(&name("beta"))).await;
		assert!(beta.is_ok());
	}

	#[tokio::test]
	async fn released_entries_are_pruned() {
		let locks = ProjectLocks::default();
		drop(locks.acquire(&name("alpha")).await);
		drop(locks.acquire(&name("beta")).await);
		assert_eq!(locks.len().await, 1);
	}
}
