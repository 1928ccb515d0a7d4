// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod git;
pub mod providers;
pub mod repositories;
pub mod runtime;

pub use providers::default_providers;
pub use runtime::ProcessRunner;
