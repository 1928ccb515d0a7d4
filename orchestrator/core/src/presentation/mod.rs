// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`osservatore-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. Handlers only resolve, delegate and map errors to status codes.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP/WebSocket (Axum) | REST endpoints + WebSocket deploy progress |

pub mod api;
