// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod app;
mod kubernetes;
mod logging;

pub use app::{AppConfig, AppConfigLayer};
pub use kubernetes::{KubernetesConfig, KubernetesConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
