// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! API context for the services server

use std::collections::HashSet;
use std::sync::Arc;

use cluster_types::{ApiCommand, ApiRoleNameList, ServiceType};
use http::HeaderMap;
use services_api::{ApiVersion, Operation};

use crate::archive::{ConfigArchiveBuilder, ZipArchiveBuilder};
use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::executor::{
    CommandExecutor, CommandKind, CommandStore, CommandTarget, LocalCommandExecutor,
};
use crate::registry::ClusterRegistry;

/// Generated client configuration, ready to send
pub struct ClientConfigArchive {
    pub content_type: &'static str,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// API context shared across all request handlers
pub struct ApiContext {
    registry: Arc<ClusterRegistry>,
    executor: Arc<dyn CommandExecutor>,
    archive: Arc<dyn ConfigArchiveBuilder>,
    auth: Authenticator,
}

impl ApiContext {
    /// Create a new API context backed by the local executor
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(ClusterRegistry::new(&config.topology.clusters));
        let store = Arc::new(CommandStore::new(config.command_history_limit));
        let executor = Arc::new(LocalCommandExecutor::new(
            Arc::clone(&registry),
            store,
            config.maintenance_policy,
            config.command_delay,
        ));

        Self::with_collaborators(
            registry,
            executor,
            Arc::new(ZipArchiveBuilder),
            Authenticator::new(config.topology.users),
        )
    }

    /// Create a context with explicit collaborators
    pub fn with_collaborators(
        registry: Arc<ClusterRegistry>,
        executor: Arc<dyn CommandExecutor>,
        archive: Arc<dyn ConfigArchiveBuilder>,
        auth: Authenticator,
    ) -> Self {
        Self {
            registry,
            executor,
            archive,
            auth,
        }
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &dyn CommandExecutor {
        self.executor.as_ref()
    }

    /// Check that `operation` exists under `version` and that the caller
    /// holds the privilege it needs.
    ///
    /// Operations a version does not have are reported as not found before
    /// credentials are looked at.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        version: ApiVersion,
        operation: Operation,
    ) -> Result<Option<String>, ServiceError> {
        if !version.supports(operation) {
            return Err(ServiceError::NotFound(format!(
                "Operation {} is not available in API {}",
                operation, version
            )));
        }

        self.auth.authorize(headers, operation.route().privilege)
    }

    /// Validate a role list against a service
    ///
    /// Returns the names with duplicates removed, in request order.
    pub async fn validate_roles(
        &self,
        target: &CommandTarget,
        list: ApiRoleNameList,
    ) -> Result<Vec<String>, ServiceError> {
        self.registry.service(&target.cluster, &target.service).await?;

        if list.is_empty() {
            return Err(ServiceError::Validation(
                "Role name list must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let roles: Vec<String> = list
            .items
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();

        let unknown = self
            .registry
            .unknown_roles(&target.cluster, &target.service, &roles)
            .await?;
        if !unknown.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Unknown role(s) for service '{}': {}",
                target.service,
                unknown.join(", ")
            )));
        }

        Ok(roles)
    }

    /// Reject services that are not of the given type
    pub async fn require_type(
        &self,
        target: &CommandTarget,
        expected: ServiceType,
        command: &str,
    ) -> Result<(), ServiceError> {
        let service = self
            .registry
            .service(&target.cluster, &target.service)
            .await?;

        if service.service_type != expected {
            return Err(ServiceError::UnsupportedOperation(format!(
                "{} is only supported on {} services; '{}' is {}",
                command, expected, target.service, service.service_type
            )));
        }

        Ok(())
    }

    pub async fn run_sync(
        &self,
        target: &CommandTarget,
        kind: CommandKind,
    ) -> Result<ApiCommand, ServiceError> {
        self.executor.run_sync(target, kind).await
    }

    pub async fn submit(
        &self,
        target: &CommandTarget,
        kind: CommandKind,
    ) -> Result<ApiCommand, ServiceError> {
        self.executor.submit(target, kind).await
    }

    /// Build the client configuration archive of a service
    pub async fn client_config(
        &self,
        target: &CommandTarget,
    ) -> Result<ClientConfigArchive, ServiceError> {
        let source = self
            .registry
            .client_config_source(&target.cluster, &target.service)
            .await?;

        let bytes = self.archive.build(&source)?;

        Ok(ClientConfigArchive {
            content_type: self.archive.content_type(),
            filename: format!("{}-clientconfig.zip", target.service),
            bytes,
        })
    }
}
