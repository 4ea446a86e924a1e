// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! In-memory cluster, service and role registry
//!
//! Holds the state the commands act upon: run states, the maintenance flag,
//! commission states and the provisioning markers for HDFS and Oozie. The
//! registry is seeded from the topology file and never grows or shrinks.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use cluster_types::{
    ApiClusterRef, ApiConfig, ApiConfigList, ApiHostRef, ApiRole, ApiService, ApiServiceRef,
    CommissionState, RoleState, ServiceState, ServiceType,
};
use tokio::sync::RwLock;

use crate::config::ClusterSpec;
use crate::error::ServiceError;

#[derive(Debug, Clone)]
struct RoleEntry {
    role_type: String,
    hostname: String,
    state: RoleState,
    commission_state: CommissionState,
}

#[derive(Debug, Clone)]
struct ServiceEntry {
    service_type: ServiceType,
    state: ServiceState,
    maintenance_mode: bool,
    config: BTreeMap<String, String>,
    roles: BTreeMap<String, RoleEntry>,
    hdfs_tmp_dir: bool,
    oozie_schema: bool,
}

/// Everything needed to render a client configuration archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfigSource {
    pub cluster_name: String,
    pub service_name: String,
    pub service_type: ServiceType,
    pub config: BTreeMap<String, String>,
    /// Hosts running a role of the service, sorted and de-duplicated
    pub hosts: Vec<String>,
}

/// Cluster → service → role map
pub struct ClusterRegistry {
    clusters: RwLock<HashMap<String, BTreeMap<String, ServiceEntry>>>,
}

impl ClusterRegistry {
    /// Build the registry from the configured topology
    pub fn new(specs: &[ClusterSpec]) -> Self {
        let clusters = specs
            .iter()
            .map(|cluster| {
                let services = cluster
                    .services
                    .iter()
                    .map(|svc| {
                        let roles = svc
                            .roles
                            .iter()
                            .map(|role| {
                                (
                                    role.name.clone(),
                                    RoleEntry {
                                        role_type: role.role_type.clone(),
                                        hostname: role.hostname.clone(),
                                        state: svc.state.into(),
                                        commission_state: role.commission_state,
                                    },
                                )
                            })
                            .collect();

                        (
                            svc.name.clone(),
                            ServiceEntry {
                                service_type: svc.service_type,
                                state: svc.state,
                                maintenance_mode: svc.maintenance_mode,
                                config: svc.config.clone(),
                                roles,
                                hdfs_tmp_dir: false,
                                oozie_schema: false,
                            },
                        )
                    })
                    .collect();

                (cluster.name.clone(), services)
            })
            .collect();

        Self {
            clusters: RwLock::new(clusters),
        }
    }

    async fn read_service<T>(
        &self,
        cluster: &str,
        service: &str,
        f: impl FnOnce(&ServiceEntry) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let clusters = self.clusters.read().await;
        let services = clusters
            .get(cluster)
            .ok_or_else(|| ServiceError::cluster_not_found(cluster))?;
        let entry = services
            .get(service)
            .ok_or_else(|| ServiceError::service_not_found(cluster, service))?;
        f(entry)
    }

    async fn write_service<T>(
        &self,
        cluster: &str,
        service: &str,
        f: impl FnOnce(&mut ServiceEntry) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut clusters = self.clusters.write().await;
        let services = clusters
            .get_mut(cluster)
            .ok_or_else(|| ServiceError::cluster_not_found(cluster))?;
        let entry = services
            .get_mut(service)
            .ok_or_else(|| ServiceError::service_not_found(cluster, service))?;
        f(entry)
    }

    /// List the services of a cluster, sorted by name
    pub async fn list_services(&self, cluster: &str) -> Result<Vec<ApiService>, ServiceError> {
        let clusters = self.clusters.read().await;
        let services = clusters
            .get(cluster)
            .ok_or_else(|| ServiceError::cluster_not_found(cluster))?;

        Ok(services
            .iter()
            .map(|(name, entry)| to_api_service(cluster, name, entry))
            .collect())
    }

    pub async fn service(&self, cluster: &str, service: &str) -> Result<ApiService, ServiceError> {
        self.read_service(cluster, service, |entry| {
            Ok(to_api_service(cluster, service, entry))
        })
        .await
    }

    pub async fn service_config(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ApiConfigList, ServiceError> {
        self.read_service(cluster, service, |entry| {
            Ok(ApiConfigList {
                items: entry
                    .config
                    .iter()
                    .map(|(name, value)| ApiConfig {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            })
        })
        .await
    }

    pub async fn client_config_source(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ClientConfigSource, ServiceError> {
        self.read_service(cluster, service, |entry| {
            let hosts: BTreeSet<&str> = entry.roles.values().map(|r| r.hostname.as_str()).collect();
            Ok(ClientConfigSource {
                cluster_name: cluster.to_string(),
                service_name: service.to_string(),
                service_type: entry.service_type,
                config: entry.config.clone(),
                hosts: hosts.into_iter().map(str::to_string).collect(),
            })
        })
        .await
    }

    pub async fn list_roles(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<Vec<ApiRole>, ServiceError> {
        self.read_service(cluster, service, |entry| {
            Ok(entry
                .roles
                .iter()
                .map(|(name, role)| to_api_role(cluster, service, name, role))
                .collect())
        })
        .await
    }

    pub async fn role(
        &self,
        cluster: &str,
        service: &str,
        role: &str,
    ) -> Result<ApiRole, ServiceError> {
        self.read_service(cluster, service, |entry| {
            entry
                .roles
                .get(role)
                .map(|r| to_api_role(cluster, service, role, r))
                .ok_or_else(|| ServiceError::role_not_found(service, role))
        })
        .await
    }

    /// Names in `roles` that are not roles of the service
    pub async fn unknown_roles(
        &self,
        cluster: &str,
        service: &str,
        roles: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        self.read_service(cluster, service, |entry| {
            Ok(roles
                .iter()
                .filter(|name| !entry.roles.contains_key(name.as_str()))
                .cloned()
                .collect())
        })
        .await
    }

    /// Set the maintenance flag, returning its previous value
    pub async fn set_maintenance_mode(
        &self,
        cluster: &str,
        service: &str,
        on: bool,
    ) -> Result<bool, ServiceError> {
        self.write_service(cluster, service, |entry| {
            Ok(std::mem::replace(&mut entry.maintenance_mode, on))
        })
        .await
    }

    /// Set the run state of the service and all of its roles
    pub async fn set_run_state(
        &self,
        cluster: &str,
        service: &str,
        state: ServiceState,
    ) -> Result<ServiceState, ServiceError> {
        self.write_service(cluster, service, |entry| {
            for role in entry.roles.values_mut() {
                role.state = state.into();
            }
            Ok(std::mem::replace(&mut entry.state, state))
        })
        .await
    }

    /// Set the commission state of the named roles
    pub async fn set_commission_state(
        &self,
        cluster: &str,
        service: &str,
        roles: &[String],
        state: CommissionState,
    ) -> Result<(), ServiceError> {
        self.write_service(cluster, service, |entry| {
            // Check every name before touching any role.
            if let Some(missing) = roles.iter().find(|r| !entry.roles.contains_key(r.as_str())) {
                return Err(ServiceError::role_not_found(service, missing));
            }
            for name in roles {
                if let Some(role) = entry.roles.get_mut(name) {
                    role.commission_state = state;
                }
            }
            Ok(())
        })
        .await
    }

    /// Mark `/tmp` as created; false if it already existed
    pub async fn create_hdfs_tmp_dir(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<bool, ServiceError> {
        self.write_service(cluster, service, |entry| {
            Ok(!std::mem::replace(&mut entry.hdfs_tmp_dir, true))
        })
        .await
    }

    pub async fn oozie_schema_exists(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<bool, ServiceError> {
        self.read_service(cluster, service, |entry| Ok(entry.oozie_schema))
            .await
    }

    /// Mark the Oozie schema as created; false if it already existed
    pub async fn create_oozie_schema(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<bool, ServiceError> {
        self.write_service(cluster, service, |entry| {
            Ok(!std::mem::replace(&mut entry.oozie_schema, true))
        })
        .await
    }
}

fn to_api_service(cluster: &str, name: &str, entry: &ServiceEntry) -> ApiService {
    ApiService {
        name: name.to_string(),
        service_type: entry.service_type,
        cluster_ref: ApiClusterRef {
            cluster_name: cluster.to_string(),
        },
        service_state: entry.state,
        maintenance_mode: entry.maintenance_mode,
    }
}

fn to_api_role(cluster: &str, service: &str, name: &str, role: &RoleEntry) -> ApiRole {
    ApiRole {
        name: name.to_string(),
        role_type: role.role_type.clone(),
        service_ref: ApiServiceRef {
            cluster_name: cluster.to_string(),
            service_name: service.to_string(),
        },
        host_ref: ApiHostRef {
            host_id: role.hostname.clone(),
        },
        role_state: role.state,
        commission_state: role.commission_state,
    }
}
