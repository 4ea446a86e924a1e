// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Versioned routing table.
//!
//! Every operation of the services API is listed here exactly once, together
//! with the API version that introduced it and the privilege a caller needs.
//! Later versions carry every earlier operation unchanged; the server uses
//! [`ApiVersion::supports`] to hide operations from versions that predate
//! them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// API version, the first path segment after `/api`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub const LATEST: ApiVersion = ApiVersion::V2;

    /// Whether `operation` is routable under this version.
    pub fn supports(self, operation: Operation) -> bool {
        self >= operation.route().since
    }
}

/// What a caller must be allowed to do to invoke an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Privilege {
    /// No credentials needed
    None,
    Read,
    Write,
}

/// Every operation the services API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Operation {
    ListServices,
    ReadService,
    ReadServiceConfig,
    ListRoles,
    ReadRole,
    ListActiveCommands,
    StartCommand,
    StopCommand,
    RestartCommand,
    DecommissionCommand,
    ReadCommand,
    AbortCommand,
    GetClientConfig,
    EnterMaintenanceMode,
    ExitMaintenanceMode,
    RecommissionCommand,
    HdfsCreateTmpDir,
    CreateOozieDb,
}

/// One row of the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub operation: Operation,
    pub method: &'static str,
    /// Path below `/api/{version}`
    pub path: &'static str,
    pub since: ApiVersion,
    pub privilege: Privilege,
}

macro_rules! services_path {
    ($suffix:literal) => {
        concat!("/clusters/{cluster_name}/services", $suffix)
    };
}

impl Operation {
    pub fn route(self) -> Route {
        use ApiVersion::{V1, V2};
        use Operation::*;
        use Privilege::{Read, Write};

        let (method, path, since, privilege) = match self {
            ListServices => ("GET", services_path!(""), V1, Read),
            ReadService => ("GET", services_path!("/{service_name}"), V1, Read),
            ReadServiceConfig => ("GET", services_path!("/{service_name}/config"), V1, Read),
            ListRoles => ("GET", services_path!("/{service_name}/roles"), V1, Read),
            ReadRole => (
                "GET",
                services_path!("/{service_name}/roles/{role_name}"),
                V1,
                Read,
            ),
            ListActiveCommands => ("GET", services_path!("/{service_name}/commands"), V1, Read),
            StartCommand => (
                "POST",
                services_path!("/{service_name}/commands/start"),
                V1,
                Write,
            ),
            StopCommand => (
                "POST",
                services_path!("/{service_name}/commands/stop"),
                V1,
                Write,
            ),
            RestartCommand => (
                "POST",
                services_path!("/{service_name}/commands/restart"),
                V1,
                Write,
            ),
            DecommissionCommand => (
                "POST",
                services_path!("/{service_name}/commands/decommission"),
                V1,
                Write,
            ),
            ReadCommand => ("GET", "/commands/{command_id}", V1, Read),
            AbortCommand => ("POST", "/commands/{command_id}/abort", V1, Write),
            GetClientConfig => (
                "GET",
                services_path!("/{service_name}/clientConfig"),
                V2,
                Privilege::None,
            ),
            EnterMaintenanceMode => (
                "POST",
                services_path!("/{service_name}/commands/enterMaintenanceMode"),
                V2,
                Write,
            ),
            ExitMaintenanceMode => (
                "POST",
                services_path!("/{service_name}/commands/exitMaintenanceMode"),
                V2,
                Write,
            ),
            RecommissionCommand => (
                "POST",
                services_path!("/{service_name}/commands/recommission"),
                V2,
                Write,
            ),
            HdfsCreateTmpDir => (
                "POST",
                services_path!("/{service_name}/commands/hdfsCreateTmpDir"),
                V2,
                Write,
            ),
            CreateOozieDb => (
                "POST",
                services_path!("/{service_name}/commands/createOozieDb"),
                V2,
                Write,
            ),
        };

        Route {
            operation: self,
            method,
            path,
            since,
            privilege,
        }
    }
}

/// The full routing table, one row per operation.
pub fn routes() -> Vec<Route> {
    Operation::iter().map(Operation::route).collect()
}

/// Operations routable under `version`.
pub fn routes_for(version: ApiVersion) -> Vec<Route> {
    routes()
        .into_iter()
        .filter(|route| version >= route.since)
        .collect()
}
