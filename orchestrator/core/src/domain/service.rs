// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Managed Service Aggregate
//!
//! A `ManagedService` is one externally supervised process, unit or container
//! tracked by the registry. Its identifier is handed verbatim to the backend
//! CLI, so it must be the name the backend already knows the entity by.
//!
//! The stored `status` is advisory: every read path re-probes the backend and
//! overwrites it. It is only surfaced unchanged when no probe answer exists.

use chrono::{DateTime, Utc};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Stable external identifier of a managed service (unit name, pm2 app name,
/// container name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Process-management technology governing a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// systemd units
    Systemd,
    /// pm2-managed apps
    Pm2,
    /// podman containers
    Podman,
    /// docker containers
    Docker,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Systemd,
        BackendKind::Pm2,
        BackendKind::Podman,
        BackendKind::Docker,
    ];

    /// Wire name, as stored in the registry file.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Systemd => "systemd",
            BackendKind::Pm2 => "pm2",
            BackendKind::Podman => "podman",
            BackendKind::Docker => "docker",
        }
    }

    /// Human-facing backend name used in progress banners.
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::Systemd => "Systemd",
            BackendKind::Pm2 => "PM2",
            BackendKind::Podman => "Podman",
            BackendKind::Docker => "Docker",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown backend kind '{}'. Supported: systemd, pm2, podman, docker",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Running,
    Stopped,
    Error,
    Updating,
    #[default]
    Unknown,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Running => "running",
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Error => "error",
            ServiceStatus::Updating => "updating",
            ServiceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Update recipe for a service. Every field is optional; a blank field skips
/// its pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSpec {
    /// Source repository URL (git-backed kinds) or image reference
    /// (container kinds).
    #[serde(default)]
    pub repo_url: String,

    #[serde(default)]
    pub branch: String,

    /// Commands run before the source is pulled, in order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pre_update: Vec<String>,

    /// Commands run after the build, in order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub post_update: Vec<String>,

    #[serde(default)]
    pub build_command: String,
}

impl UpdateSpec {
    /// The configured source reference, if any.
    pub fn source_reference(&self) -> Option<&str> {
        non_blank(&self.repo_url)
    }

    /// The configured build command, if any.
    pub fn build_step(&self) -> Option<&str> {
        non_blank(&self.build_command)
    }

    pub fn is_empty(&self) -> bool {
        self.source_reference().is_none()
            && self.build_step().is_none()
            && self.pre_update.iter().all(|c| c.trim().is_empty())
            && self.post_update.iter().all(|c| c.trim().is_empty())
    }
}

/// Registry files from older writers store absent hook lists as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` and `""` both read as `Unknown`.
fn blank_status_as_unknown<'de, D>(deserializer: D) -> Result<ServiceStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(ServiceStatus::Unknown),
        Some(other) => ServiceStatus::deserialize(other.into_deserializer()),
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedService {
    pub id: ServiceId,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: BackendKind,

    /// Last known status. Recomputed from the backend on every read.
    #[serde(default, deserialize_with = "blank_status_as_unknown")]
    pub status: ServiceStatus,

    /// Working directory for hooks, builds and source sync.
    #[serde(default)]
    pub path: PathBuf,

    #[serde(default)]
    pub description: String,

    /// UI icon tag, e.g. "terminal", "cpu", "box", "globe", "database".
    #[serde(default)]
    pub icon: String,

    /// UI color tag, e.g. "blue", "emerald", "violet", "orange", "rose".
    #[serde(default)]
    pub color: String,

    #[serde(rename = "update_config", default)]
    pub update: UpdateSpec,

    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl ManagedService {
    pub fn new(id: impl Into<ServiceId>, name: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            status: ServiceStatus::Unknown,
            path: PathBuf::new(),
            description: String::new(),
            icon: String::new(),
            color: String::new(),
            update: UpdateSpec::default(),
            last_updated: Utc::now(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_update(mut self, update: UpdateSpec) -> Self {
        self.update = update;
        self
    }

    /// Name shown in progress output; falls back to the identifier.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
