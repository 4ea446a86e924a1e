// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Services Server Library
//!
//! Implements the cluster services administration API. Handlers check the
//! requested API version and the caller's credentials, validate the request,
//! and then hand the work to a [`executor::CommandExecutor`]. They never
//! change cluster state directly.
//!
//! # Modules
//!
//! - [`archive`] - Client configuration archive generation
//! - [`auth`] - HTTP Basic authentication
//! - [`config`] - Server configuration and cluster topology
//! - [`context`] - API context for request handlers
//! - [`error`] - Error kinds and their HTTP mapping
//! - [`executor`] - Command execution and history
//! - [`registry`] - In-memory cluster state

pub mod archive;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod registry;

use cluster_types::{
    ApiCommand, ApiCommandList, ApiConfigList, ApiRole, ApiRoleList, ApiRoleNameList, ApiService,
    ApiServiceList, ServiceType,
};
use dropshot::{Body, HttpError, HttpResponseOk, Path, RequestContext, TypedBody};
use http::Response;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use services_api::{
    ApiVersion, ApiVersionInfo, ClusterPath, CommandPath, Operation, RolePath, ServicePath,
    ServicesApi,
};
use strum::IntoEnumIterator;

use crate::context::ApiContext;
use crate::error::ServiceError;
use crate::executor::{CommandKind, CommandTarget};

/// Services API implementation
///
/// This enum serves as the implementation type for the `ServicesApi` trait.
/// It contains no data - all state is stored in the `ApiContext`.
pub enum ServicesServerImpl {}

/// Version and privilege check shared by every versioned handler
fn authorize(
    rqctx: &RequestContext<ApiContext>,
    version: ApiVersion,
    operation: Operation,
) -> Result<(), HttpError> {
    let user = rqctx
        .context()
        .authorize(rqctx.request.headers(), version, operation)
        .inspect_err(|e| {
            tracing::debug!(operation = %operation, %version, error = %e, "Request rejected");
        })?;

    tracing::debug!(operation = %operation, %version, user = ?user, "Request authorized");
    Ok(())
}

fn target(path: &ServicePath) -> CommandTarget {
    CommandTarget::new(&path.cluster_name, &path.service_name)
}

async fn run_sync(
    rqctx: RequestContext<ApiContext>,
    path: ServicePath,
    operation: Operation,
    kind: CommandKind,
) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
    authorize(&rqctx, path.version, operation)?;
    let command = rqctx.context().run_sync(&target(&path), kind).await?;
    Ok(HttpResponseOk(command))
}

async fn submit(
    rqctx: RequestContext<ApiContext>,
    path: ServicePath,
    operation: Operation,
    kind: CommandKind,
) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
    authorize(&rqctx, path.version, operation)?;
    let command = rqctx.context().submit(&target(&path), kind).await?;
    Ok(HttpResponseOk(command))
}

async fn submit_role_command(
    rqctx: RequestContext<ApiContext>,
    path: ServicePath,
    body: ApiRoleNameList,
    operation: Operation,
    make_kind: fn(Vec<String>) -> CommandKind,
) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
    authorize(&rqctx, path.version, operation)?;
    let ctx = rqctx.context();
    let target = target(&path);

    let roles = ctx.validate_roles(&target, body).await?;
    tracing::info!(
        cluster = %target.cluster,
        service = %target.service,
        role_count = roles.len(),
        "Submitting {}",
        operation
    );

    let command = ctx.submit(&target, make_kind(roles)).await?;
    Ok(HttpResponseOk(command))
}

impl ServicesApi for ServicesServerImpl {
    type Context = ApiContext;

    async fn get_api_versions(
        _rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ApiVersionInfo>, HttpError> {
        Ok(HttpResponseOk(ApiVersionInfo {
            latest: ApiVersion::LATEST,
            supported: ApiVersion::iter().collect(),
        }))
    }

    async fn list_services(
        rqctx: RequestContext<Self::Context>,
        path: Path<ClusterPath>,
    ) -> Result<HttpResponseOk<ApiServiceList>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::ListServices)?;

        let items = rqctx
            .context()
            .registry()
            .list_services(&path.cluster_name)
            .await?;
        Ok(HttpResponseOk(ApiServiceList { items }))
    }

    async fn read_service(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiService>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::ReadService)?;

        let service = rqctx
            .context()
            .registry()
            .service(&path.cluster_name, &path.service_name)
            .await?;
        Ok(HttpResponseOk(service))
    }

    async fn read_service_config(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiConfigList>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::ReadServiceConfig)?;

        let config = rqctx
            .context()
            .registry()
            .service_config(&path.cluster_name, &path.service_name)
            .await?;
        Ok(HttpResponseOk(config))
    }

    async fn list_roles(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiRoleList>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::ListRoles)?;

        let items = rqctx
            .context()
            .registry()
            .list_roles(&path.cluster_name, &path.service_name)
            .await?;
        Ok(HttpResponseOk(ApiRoleList { items }))
    }

    async fn read_role(
        rqctx: RequestContext<Self::Context>,
        path: Path<RolePath>,
    ) -> Result<HttpResponseOk<ApiRole>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::ReadRole)?;

        let role = rqctx
            .context()
            .registry()
            .role(&path.cluster_name, &path.service_name, &path.role_name)
            .await?;
        Ok(HttpResponseOk(role))
    }

    async fn list_active_commands(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommandList>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::ListActiveCommands)?;

        let ctx = rqctx.context();
        ctx.registry()
            .service(&path.cluster_name, &path.service_name)
            .await?;
        let items = ctx.executor().active_commands(&target(&path)).await;
        Ok(HttpResponseOk(ApiCommandList { items }))
    }

    async fn start_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        submit(
            rqctx,
            path.into_inner(),
            Operation::StartCommand,
            CommandKind::Start,
        )
        .await
    }

    async fn stop_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        submit(
            rqctx,
            path.into_inner(),
            Operation::StopCommand,
            CommandKind::Stop,
        )
        .await
    }

    async fn restart_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        submit(
            rqctx,
            path.into_inner(),
            Operation::RestartCommand,
            CommandKind::Restart,
        )
        .await
    }

    async fn decommission_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
        body: TypedBody<ApiRoleNameList>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        submit_role_command(
            rqctx,
            path.into_inner(),
            body.into_inner(),
            Operation::DecommissionCommand,
            CommandKind::Decommission,
        )
        .await
    }

    async fn read_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<CommandPath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::ReadCommand)?;

        let command = rqctx.context().executor().command(path.command_id).await?;
        Ok(HttpResponseOk(command))
    }

    async fn abort_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<CommandPath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::AbortCommand)?;

        let command = rqctx.context().executor().abort(path.command_id).await?;
        Ok(HttpResponseOk(command))
    }

    async fn get_client_config(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<Response<Body>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::GetClientConfig)?;

        let archive = rqctx.context().client_config(&target(&path)).await?;

        tracing::info!(
            cluster = %path.cluster_name,
            service = %path.service_name,
            size = archive.bytes.len(),
            "Serving client configuration"
        );

        Response::builder()
            .status(200)
            .header(CONTENT_TYPE, archive.content_type)
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", archive.filename),
            )
            .body(archive.bytes.into())
            .map_err(|e| {
                HttpError::from(ServiceError::Internal(format!(
                    "Failed to build response: {}",
                    e
                )))
            })
    }

    async fn enter_maintenance_mode(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        run_sync(
            rqctx,
            path.into_inner(),
            Operation::EnterMaintenanceMode,
            CommandKind::EnterMaintenanceMode,
        )
        .await
    }

    async fn exit_maintenance_mode(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        run_sync(
            rqctx,
            path.into_inner(),
            Operation::ExitMaintenanceMode,
            CommandKind::ExitMaintenanceMode,
        )
        .await
    }

    async fn recommission_command(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
        body: TypedBody<ApiRoleNameList>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        submit_role_command(
            rqctx,
            path.into_inner(),
            body.into_inner(),
            Operation::RecommissionCommand,
            CommandKind::Recommission,
        )
        .await
    }

    async fn hdfs_create_tmp_dir(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::HdfsCreateTmpDir)?;

        let target = target(&path);
        let ctx = rqctx.context();
        ctx.require_type(&target, ServiceType::Hdfs, "hdfsCreateTmpDir")
            .await?;

        let command = ctx.submit(&target, CommandKind::HdfsCreateTmpDir).await?;
        Ok(HttpResponseOk(command))
    }

    async fn create_oozie_db(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServicePath>,
    ) -> Result<HttpResponseOk<ApiCommand>, HttpError> {
        let path = path.into_inner();
        authorize(&rqctx, path.version, Operation::CreateOozieDb)?;

        let target = target(&path);
        let ctx = rqctx.context();
        ctx.require_type(&target, ServiceType::Oozie, "createOozieDb")
            .await?;

        let command = ctx.submit(&target, CommandKind::CreateOozieDb).await?;
        Ok(HttpResponseOk(command))
    }
}
