// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Wire model for the cluster services API.
//!
//! These types are shared by the Dropshot API trait (`services-api`) and the
//! server that implements it. Field names follow the camelCase convention of
//! the cluster manager REST API; enum values are upper snake case.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

// ============================================================================
// Enumerations
// ============================================================================

/// Kind of a managed service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Hdfs,
    Mapreduce,
    Yarn,
    Hbase,
    Oozie,
    Zookeeper,
    Hue,
    Hive,
    Impala,
    Sqoop,
    Flume,
}

impl ServiceType {
    /// Base name of the `<name>-site.xml` file shipped in client configs.
    pub fn site_file_prefix(&self) -> &'static str {
        match self {
            ServiceType::Hdfs => "hdfs",
            ServiceType::Mapreduce => "mapred",
            ServiceType::Yarn => "yarn",
            ServiceType::Hbase => "hbase",
            ServiceType::Oozie => "oozie",
            ServiceType::Zookeeper => "zoo",
            ServiceType::Hue => "hue",
            ServiceType::Hive => "hive",
            ServiceType::Impala => "impala",
            ServiceType::Sqoop => "sqoop",
            ServiceType::Flume => "flume",
        }
    }
}

/// Run state of a service.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    #[default]
    Stopped,
    Starting,
    Started,
    Stopping,
    Unknown,
}

/// Run state of a single role.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleState {
    #[default]
    Stopped,
    Starting,
    Started,
    Stopping,
    Unknown,
}

impl From<ServiceState> for RoleState {
    fn from(state: ServiceState) -> Self {
        match state {
            ServiceState::Stopped => RoleState::Stopped,
            ServiceState::Starting => RoleState::Starting,
            ServiceState::Started => RoleState::Started,
            ServiceState::Stopping => RoleState::Stopping,
            ServiceState::Unknown => RoleState::Unknown,
        }
    }
}

/// Whether a role takes part in the service's workload.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionState {
    #[default]
    Commissioned,
    Decommissioning,
    Decommissioned,
}

// ============================================================================
// References
// ============================================================================

/// Reference to a cluster by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiClusterRef {
    pub cluster_name: String,
}

/// Reference to a service within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiServiceRef {
    pub cluster_name: String,
    pub service_name: String,
}

/// Reference to the host a role runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiHostRef {
    pub host_id: String,
}

// ============================================================================
// Commands
// ============================================================================

/// A tracked unit of work run against a service.
///
/// Synchronous commands come back with `active == false` and a `success`
/// value. Asynchronous commands come back pending (`active == true`); poll
/// `/commands/{commandId}` for the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommand {
    /// Unique command identifier
    pub id: u64,
    /// Command name, e.g. "Recommission"
    pub name: String,
    pub start_time: DateTime<Utc>,
    /// Set once the command is no longer active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub active: bool,
    /// Outcome; absent while the command is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_ref: Option<ApiClusterRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ref: Option<ApiServiceRef>,
}

impl ApiCommand {
    /// True once the command has finished, successfully or not.
    pub fn is_resolved(&self) -> bool {
        !self.active && self.success.is_some()
    }
}

/// A list of commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiCommandList {
    pub items: Vec<ApiCommand>,
}

/// Role names submitted to role-level commands such as recommission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiRoleNameList {
    #[serde(default)]
    pub items: Vec<String>,
}

impl ApiRoleNameList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Services and roles
// ============================================================================

/// A service as exposed by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiService {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub cluster_ref: ApiClusterRef,
    pub service_state: ServiceState,
    pub maintenance_mode: bool,
}

/// A list of services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiServiceList {
    pub items: Vec<ApiService>,
}

/// A role of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiRole {
    pub name: String,
    /// Role type, e.g. "DATANODE"
    #[serde(rename = "type")]
    pub role_type: String,
    pub service_ref: ApiServiceRef,
    pub host_ref: ApiHostRef,
    pub role_state: RoleState,
    pub commission_state: CommissionState,
}

/// A list of roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiRoleList {
    pub items: Vec<ApiRole>,
}

/// One configuration entry of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiConfig {
    pub name: String,
    pub value: String,
}

/// Service configuration, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiConfigList {
    pub items: Vec<ApiConfig>,
}
