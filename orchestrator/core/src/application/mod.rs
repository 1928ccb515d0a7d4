// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod deploy;
pub mod lifecycle;
pub mod registry;

// Re-export use cases for convenience
pub use deploy::DeployPipeline;
pub use lifecycle::{LifecycleError, ServiceAction, ServiceLifecycle};
pub use registry::{RegistryError, ServiceRegistry};
