// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Dropshot API trait for cluster service administration.
//!
//! Services live under `/api/{version}/clusters/{cluster_name}/services`.
//! The API is versioned in the path: `v1` covers reads and the basic
//! lifecycle commands, `v2` adds client configuration downloads,
//! maintenance mode, recommissioning and the HDFS/Oozie provisioning
//! commands. See [`routes`] for the full table.
//!
//! ## Endpoints (v2 additions)
//!
//! - `GET .../{service_name}/clientConfig` - Download client configuration (no auth)
//! - `POST .../{service_name}/commands/enterMaintenanceMode` - Synchronous
//! - `POST .../{service_name}/commands/exitMaintenanceMode` - Synchronous
//! - `POST .../{service_name}/commands/recommission` - Asynchronous
//! - `POST .../{service_name}/commands/hdfsCreateTmpDir` - Asynchronous
//! - `POST .../{service_name}/commands/createOozieDb` - Asynchronous

pub mod routes;

use cluster_types::{
    ApiCommand, ApiCommandList, ApiConfigList, ApiRole, ApiRoleList, ApiRoleNameList, ApiService,
    ApiServiceList,
};
use dropshot::{Body, HttpError, HttpResponseOk, Path, RequestContext, TypedBody};
use http::Response;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use routes::{ApiVersion, Operation, Privilege, Route};

// ============================================================================
// Path parameters
// ============================================================================

/// Path parameters for the services collection.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClusterPath {
    pub version: ApiVersion,
    pub cluster_name: String,
}

/// Path parameters for a single service.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ServicePath {
    pub version: ApiVersion,
    pub cluster_name: String,
    pub service_name: String,
}

/// Path parameters for a single role of a service.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RolePath {
    pub version: ApiVersion,
    pub cluster_name: String,
    pub service_name: String,
    pub role_name: String,
}

/// Path parameters for a command.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CommandPath {
    pub version: ApiVersion,
    pub command_id: u64,
}

/// Versions served by this endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiVersionInfo {
    pub latest: ApiVersion,
    pub supported: Vec<ApiVersion>,
}

// ============================================================================
// API Trait
// ============================================================================

/// Cluster Services API
///
/// Read and control the services of a cluster. All operations except the
/// client configuration download and the version listing require HTTP Basic
/// credentials; commands require an administrator.
#[dropshot::api_description]
pub trait ServicesApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    /// List supported API versions
    #[endpoint {
        method = GET,
        path = "/versions",
        tags = ["meta"],
    }]
    async fn get_api_versions(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ApiVersionInfo>, HttpError>;

    // ------------------------------------------------------------------------
    // v1
    // ------------------------------------------------------------------------

    /// List the services of a cluster
    #[endpoint {
        method = GET,
        path = "/api/{version}/clusters/{cluster_name}/services",
        tags = ["services"],
    }]
    async fn list_services(
        rqctx: RequestContext<Self::Context>,
        path: Path<ClusterPath>,
    ) -> Result<HttpResponseOk<ApiServiceList>, HttpError>;

    /// Get a single service
    #[endpoint {
        method = GET,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}",
        tags = ["services"],
    }]
    async fn read_service(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiService>, HttpError>;

    /// Get the configuration of a service
    #[endpoint {
        method = GET,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/config",
        tags = ["services"],
    }]
    async fn read_service_config(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiConfigList>, HttpError>;

    /// List the roles of a service
    #[endpoint {
        method = GET,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/roles",
        tags = ["roles"],
    }]
    async fn list_roles(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiRoleList>, HttpError>;

    /// Get a single role
    #[endpoint {
        method = GET,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/roles/{role_name}",
        tags = ["roles"],
    }]
    async fn read_role(
        rqctx: RequestContext<Self::Context>,
        path: Path<RolePath>,
    ) -> Result<HttpResponseOk<ApiRole>, HttpError>;

    /// List the commands still running against a service
    #[endpoint {
        method = GET,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands",
        tags = ["commands"],
    }]
    async fn list_active_commands(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommandList>, HttpError>;

    /// Start a service
    ///
    /// Asynchronous; returns the pending command.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/start",
        tags = ["commands"],
    }]
    async fn start_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Stop a service
    ///
    /// Asynchronous; returns the pending command.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/stop",
        tags = ["commands"],
    }]
    async fn stop_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Restart a service
    ///
    /// Asynchronous; returns the pending command.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/restart",
        tags = ["commands"],
    }]
    async fn restart_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Decommission roles of a service
    ///
    /// The list must name at least one role of the service.
    ///
    /// Returns 400 if the list is empty or names an unknown role.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/decommission",
        tags = ["commands"],
    }]
    async fn decommission_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
        body: TypedBody<ApiRoleNameList>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Get a command by id
    ///
    /// Use this to poll asynchronous commands until `active` is false.
    #[endpoint {
        method = GET,
        path = "/api/{version}/commands/{command_id}",
        tags = ["commands"],
    }]
    async fn read_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<CommandPath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Abort a running command
    ///
    /// Returns 409 if the command is no longer active.
    #[endpoint {
        method = POST,
        path = "/api/{version}/commands/{command_id}/abort",
        tags = ["commands"],
    }]
    async fn abort_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<CommandPath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    // ------------------------------------------------------------------------
    // v2
    // ------------------------------------------------------------------------

    /// Download the client configuration of a service
    ///
    /// Returns a zip-compressed archive. This resource does not require any
    /// authentication.
    #[endpoint {
        method = GET,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/clientConfig",
        tags = ["services"],
    }]
    async fn get_client_config(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<Response<Body>, HttpError>;

    /// Put the service into maintenance mode
    ///
    /// Synchronous; the result is known when the call returns.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/enterMaintenanceMode",
        tags = ["commands"],
    }]
    async fn enter_maintenance_mode(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Take the service out of maintenance mode
    ///
    /// Synchronous; the result is known when the call returns.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/exitMaintenanceMode",
        tags = ["commands"],
    }]
    async fn exit_maintenance_mode(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Recommission roles of a service
    ///
    /// The list should contain names of roles to recommission.
    ///
    /// Returns 400 if the list is empty or names an unknown role.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/recommission",
        tags = ["commands"],
    }]
    async fn recommission_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
        body: TypedBody<ApiRoleNameList>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Create the tmp directory on the HDFS filesystem
    ///
    /// Returns 400 if the service is not an HDFS service.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/hdfsCreateTmpDir",
        tags = ["commands"],
    }]
    async fn hdfs_create_tmp_dir(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;

    /// Create the Oozie database schema
    ///
    /// Creates only the tables Oozie needs, not the database itself.
    ///
    /// Returns 400 if the service is not an Oozie service and 409 if the
    /// schema already exists.
    #[endpoint {
        method = POST,
        path = "/api/{version}/clusters/{cluster_name}/services/{service_name}/commands/createOozieDb",
        tags = ["commands"],
    }]
    async fn create_oozie_db(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError>;
}
