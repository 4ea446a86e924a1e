// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Configuration for the services server
//!
//! Runtime settings come from environment variables (see `from_env()`). The
//! cluster topology and the API users come from a JSON file named by
//! `CONFIG_FILE`:
//!
//! ```json
//! {
//!   "clusters": [{
//!     "name": "cluster1",
//!     "services": [{
//!       "name": "hdfs1",
//!       "type": "HDFS",
//!       "config": { "dfs.replication": "3" },
//!       "roles": [{ "name": "hdfs1-DATANODE-1", "type": "DATANODE", "hostname": "node1" }]
//!     }]
//!   }],
//!   "users": [{ "name": "admin", "password": "admin", "role": "admin" }]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cluster_types::{CommissionState, ServiceState, ServiceType};
use secrecy::SecretString;
use serde::Deserialize;
use strum::{Display, EnumString};

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:7180";

/// Default number of commands kept for polling.
const DEFAULT_COMMAND_HISTORY_LIMIT: usize = 1000;

/// What entering maintenance mode twice (or leaving it twice) does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MaintenancePolicy {
    /// Reject with 409
    #[default]
    Conflict,
    /// Succeed without changing anything
    Idempotent,
}

/// Privilege level of an API user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    ReadOnly,
}

#[derive(Debug, Deserialize)]
pub struct UserSpec {
    pub name: String,
    pub password: SecretString,
    pub role: UserRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub role_type: String,
    pub hostname: String,
    #[serde(default)]
    pub commission_state: CommissionState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub state: ServiceState,
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSpec {
    pub name: String,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

/// Contents of `CONFIG_FILE`.
#[derive(Debug, Default, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub clusters: Vec<ClusterSpec>,
    #[serde(default)]
    pub users: Vec<UserSpec>,
}

impl TopologyFile {
    /// Load and validate a topology file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let topology: TopologyFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        topology.validate()?;
        Ok(topology)
    }

    /// Reject duplicate names at every level
    pub fn validate(&self) -> Result<()> {
        let mut clusters = HashSet::new();
        for cluster in &self.clusters {
            if !clusters.insert(cluster.name.as_str()) {
                bail!("duplicate cluster name '{}'", cluster.name);
            }

            let mut services = HashSet::new();
            for service in &cluster.services {
                if !services.insert(service.name.as_str()) {
                    bail!(
                        "duplicate service name '{}' in cluster '{}'",
                        service.name,
                        cluster.name
                    );
                }

                let mut roles = HashSet::new();
                for role in &service.roles {
                    if !roles.insert(role.name.as_str()) {
                        bail!(
                            "duplicate role name '{}' in service '{}'",
                            role.name,
                            service.name
                        );
                    }
                }
            }
        }

        let mut users = HashSet::new();
        for user in &self.users {
            if !users.insert(user.name.as_str()) {
                bail!("duplicate user name '{}'", user.name);
            }
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    /// Time an asynchronous command spends queued before its effect lands
    pub command_delay: Duration,
    /// Commands kept for polling; the oldest finished ones go first
    pub command_history_limit: usize,
    pub maintenance_policy: MaintenancePolicy,
    pub topology: TopologyFile,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 7180)),
            command_delay: Duration::ZERO,
            command_history_limit: DEFAULT_COMMAND_HISTORY_LIMIT,
            maintenance_policy: MaintenancePolicy::default(),
            topology: TopologyFile::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
            .parse()
            .context("Invalid BIND_ADDRESS")?;

        let config_file = std::env::var("CONFIG_FILE")
            .map(PathBuf::from)
            .context("CONFIG_FILE environment variable required")?;

        let command_delay_ms: u64 = std::env::var("COMMAND_DELAY_MS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("Invalid COMMAND_DELAY_MS")?;

        let command_history_limit = std::env::var("COMMAND_HISTORY_LIMIT")
            .unwrap_or_else(|_| DEFAULT_COMMAND_HISTORY_LIMIT.to_string())
            .parse()
            .context("Invalid COMMAND_HISTORY_LIMIT")?;

        let maintenance_policy = std::env::var("MAINTENANCE_POLICY")
            .unwrap_or_else(|_| MaintenancePolicy::default().to_string())
            .to_lowercase()
            .parse()
            .context("Invalid MAINTENANCE_POLICY (expected 'conflict' or 'idempotent')")?;

        let topology = TopologyFile::from_file(&config_file)?;

        Ok(Self {
            bind_address,
            command_delay: Duration::from_millis(command_delay_ms),
            command_history_limit,
            maintenance_policy,
            topology,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "clusters": [{
            "name": "cluster1",
            "services": [{
                "name": "hdfs1",
                "type": "HDFS",
                "state": "STARTED",
                "config": { "dfs.replication": "3" },
                "roles": [
                    { "name": "dn1", "type": "DATANODE", "hostname": "node1" },
                    { "name": "dn2", "type": "DATANODE", "hostname": "node2",
                      "commission_state": "DECOMMISSIONED" }
                ]
            }]
        }],
        "users": [{ "name": "admin", "password": "secret", "role": "admin" }]
    }"#;

    #[test]
    fn test_parse_topology() {
        let topology: TopologyFile = serde_json::from_str(SAMPLE).expect("parse");
        topology.validate().expect("valid");

        let service = &topology.clusters[0].services[0];
        assert_eq!(service.service_type, ServiceType::Hdfs);
        assert_eq!(service.state, ServiceState::Started);
        assert!(!service.maintenance_mode);
        assert_eq!(service.roles[0].commission_state, CommissionState::Commissioned);
        assert_eq!(
            service.roles[1].commission_state,
            CommissionState::Decommissioned
        );
        assert_eq!(topology.users[0].role, UserRole::Admin);
        assert_eq!(topology.users[0].password.expose_secret(), "secret");
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let json = r#"{"clusters": [{"name": "c", "services": [
            {"name": "s", "type": "HDFS"}, {"name": "s", "type": "YARN"}
        ]}]}"#;
        let topology: TopologyFile = serde_json::from_str(json).expect("parse");
        let err = topology.validate().expect_err("duplicate");
        assert!(err.to_string().contains("duplicate service name 's'"));
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let json = r#"{"clusters": [{"name": "c", "services": [
            {"name": "s", "type": "HDFS", "roles": [
                {"name": "r", "type": "DATANODE", "hostname": "h1"},
                {"name": "r", "type": "DATANODE", "hostname": "h2"}
            ]}
        ]}]}"#;
        let topology: TopologyFile = serde_json::from_str(json).expect("parse");
        assert!(topology.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let topology = TopologyFile::from_file(file.path()).expect("load");
        assert_eq!(topology.clusters.len(), 1);
        assert_eq!(topology.users.len(), 1);
    }

    #[test]
    fn test_from_file_missing() {
        let err = TopologyFile::from_file(Path::new("/nonexistent/services.json"))
            .expect_err("missing file");
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_maintenance_policy_parse() {
        assert_eq!(
            "idempotent".parse::<MaintenancePolicy>().ok(),
            Some(MaintenancePolicy::Idempotent)
        );
        assert_eq!(MaintenancePolicy::default().to_string(), "conflict");
        assert!("sometimes".parse::<MaintenancePolicy>().is_err());
    }
}
