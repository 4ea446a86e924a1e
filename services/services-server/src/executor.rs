// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Command execution
//!
//! The resource layer never changes cluster state itself; it hands a
//! [`CommandKind`] to a [`CommandExecutor`] and returns whatever command
//! record comes back. [`LocalCommandExecutor`] resolves synchronous commands
//! inline and runs asynchronous ones on background tokio tasks, keeping a
//! bounded history of commands for polling.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cluster_types::{ApiClusterRef, ApiCommand, ApiServiceRef, CommissionState, ServiceState};
use tokio::sync::Mutex;

use crate::config::MaintenancePolicy;
use crate::error::ServiceError;
use crate::registry::ClusterRegistry;

/// Message recorded on commands that were aborted before they finished.
pub const ABORTED_MESSAGE: &str = "Command aborted";

/// The service a command runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTarget {
    pub cluster: String,
    pub service: String,
}

impl CommandTarget {
    pub fn new(cluster: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
        }
    }

    fn service_ref(&self) -> ApiServiceRef {
        ApiServiceRef {
            cluster_name: self.cluster.clone(),
            service_name: self.service.clone(),
        }
    }
}

/// Work a command performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    EnterMaintenanceMode,
    ExitMaintenanceMode,
    Start,
    Stop,
    Restart,
    Decommission(Vec<String>),
    Recommission(Vec<String>),
    HdfsCreateTmpDir,
    CreateOozieDb,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::EnterMaintenanceMode => "EnterMaintenanceMode",
            CommandKind::ExitMaintenanceMode => "ExitMaintenanceMode",
            CommandKind::Start => "Start",
            CommandKind::Stop => "Stop",
            CommandKind::Restart => "Restart",
            CommandKind::Decommission(_) => "Decommission",
            CommandKind::Recommission(_) => "Recommission",
            CommandKind::HdfsCreateTmpDir => "HdfsCreateTmpDir",
            CommandKind::CreateOozieDb => "CreateOozieDb",
        }
    }

    /// Synchronous commands are resolved before the call returns.
    pub fn is_synchronous(&self) -> bool {
        matches!(
            self,
            CommandKind::EnterMaintenanceMode | CommandKind::ExitMaintenanceMode
        )
    }
}

/// Runs commands and tracks their lifecycle.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a synchronous command to completion
    async fn run_sync(
        &self,
        target: &CommandTarget,
        kind: CommandKind,
    ) -> Result<ApiCommand, ServiceError>;

    /// Queue an asynchronous command and return it while still active
    async fn submit(
        &self,
        target: &CommandTarget,
        kind: CommandKind,
    ) -> Result<ApiCommand, ServiceError>;

    /// Look up a command by id
    async fn command(&self, id: u64) -> Result<ApiCommand, ServiceError>;

    /// Commands still running against `target`, oldest first
    async fn active_commands(&self, target: &CommandTarget) -> Vec<ApiCommand>;

    /// Abort an active command
    async fn abort(&self, id: u64) -> Result<ApiCommand, ServiceError>;
}

// ============================================================================
// Command store
// ============================================================================

struct StoreInner {
    next_id: u64,
    commands: BTreeMap<u64, ApiCommand>,
}

/// Bounded command history
///
/// Once more than `history_limit` commands are stored, the oldest inactive
/// ones are evicted. Active commands and the command being inserted are
/// never evicted, so the history may briefly exceed the limit.
pub struct CommandStore {
    inner: Mutex<StoreInner>,
    history_limit: usize,
}

impl CommandStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                next_id: 1,
                commands: BTreeMap::new(),
            }),
            history_limit: history_limit.max(1),
        }
    }

    async fn insert(
        &self,
        name: &str,
        target: &CommandTarget,
        outcome: Option<(bool, String)>,
    ) -> ApiCommand {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let now = Utc::now();
        let (active, success, result_message, end_time) = match outcome {
            Some((success, msg)) => (false, Some(success), Some(msg), Some(now)),
            None => (true, None, None, None),
        };

        let command = ApiCommand {
            id,
            name: name.to_string(),
            start_time: now,
            end_time,
            active,
            success,
            result_message,
            cluster_ref: Some(ApiClusterRef {
                cluster_name: target.cluster.clone(),
            }),
            service_ref: Some(target.service_ref()),
        };
        inner.commands.insert(id, command.clone());

        let excess = inner.commands.len().saturating_sub(self.history_limit);
        if excess > 0 {
            let evict: Vec<u64> = inner
                .commands
                .values()
                .filter(|c| !c.active && c.id != id)
                .map(|c| c.id)
                .take(excess)
                .collect();
            for old in evict {
                inner.commands.remove(&old);
            }
        }

        command
    }

    pub async fn get(&self, id: u64) -> Option<ApiCommand> {
        self.inner.lock().await.commands.get(&id).cloned()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.commands.len()
    }

    async fn active_for(&self, target: &CommandTarget) -> Vec<ApiCommand> {
        let service_ref = target.service_ref();
        self.inner
            .lock()
            .await
            .commands
            .values()
            .filter(|c| c.active && c.service_ref.as_ref() == Some(&service_ref))
            .cloned()
            .collect()
    }

    async fn abort(&self, id: u64) -> Result<ApiCommand, ServiceError> {
        let mut inner = self.inner.lock().await;
        let command = inner
            .commands
            .get_mut(&id)
            .ok_or_else(|| ServiceError::command_not_found(id))?;

        if !command.active {
            return Err(ServiceError::Conflict(format!(
                "Command {} is not active",
                id
            )));
        }

        finish(command, false, ABORTED_MESSAGE.to_string());
        Ok(command.clone())
    }
}

fn finish(command: &mut ApiCommand, success: bool, message: String) {
    command.active = false;
    command.success = Some(success);
    command.result_message = Some(message);
    command.end_time = Some(Utc::now());
}

// ============================================================================
// Local executor
// ============================================================================

/// Executes commands in-process against the [`ClusterRegistry`].
pub struct LocalCommandExecutor {
    registry: Arc<ClusterRegistry>,
    store: Arc<CommandStore>,
    policy: MaintenancePolicy,
    delay: Duration,
}

impl LocalCommandExecutor {
    pub fn new(
        registry: Arc<ClusterRegistry>,
        store: Arc<CommandStore>,
        policy: MaintenancePolicy,
        delay: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            policy,
            delay,
        }
    }

    async fn toggle_maintenance(
        &self,
        target: &CommandTarget,
        on: bool,
    ) -> Result<String, ServiceError> {
        let previous = self
            .registry
            .set_maintenance_mode(&target.cluster, &target.service, on)
            .await?;

        let state = if on { "in" } else { "out of" };
        if previous == on {
            return match self.policy {
                MaintenancePolicy::Conflict => Err(ServiceError::Conflict(format!(
                    "Service '{}' is already {} maintenance mode",
                    target.service, state
                ))),
                MaintenancePolicy::Idempotent => Ok(format!(
                    "Service '{}' was already {} maintenance mode",
                    target.service, state
                )),
            };
        }

        Ok(format!("Service '{}' is now {} maintenance mode", target.service, state))
    }
}

#[async_trait]
impl CommandExecutor for LocalCommandExecutor {
    async fn run_sync(
        &self,
        target: &CommandTarget,
        kind: CommandKind,
    ) -> Result<ApiCommand, ServiceError> {
        let message = match &kind {
            CommandKind::EnterMaintenanceMode => self.toggle_maintenance(target, true).await?,
            CommandKind::ExitMaintenanceMode => self.toggle_maintenance(target, false).await?,
            other => {
                return Err(ServiceError::Internal(format!(
                    "{} is not a synchronous command",
                    other.name()
                )));
            }
        };

        let command = self.store.insert(kind.name(), target, Some((true, message))).await;

        tracing::info!(
            command_id = command.id,
            command = %command.name,
            cluster = %target.cluster,
            service = %target.service,
            "Synchronous command completed"
        );

        Ok(command)
    }

    async fn submit(
        &self,
        target: &CommandTarget,
        kind: CommandKind,
    ) -> Result<ApiCommand, ServiceError> {
        if kind.is_synchronous() {
            return Err(ServiceError::Internal(format!(
                "{} is not an asynchronous command",
                kind.name()
            )));
        }

        // Unknown services never get a command id.
        self.registry
            .service(&target.cluster, &target.service)
            .await?;

        if kind == CommandKind::CreateOozieDb
            && self
                .registry
                .oozie_schema_exists(&target.cluster, &target.service)
                .await?
        {
            return Err(ServiceError::Conflict(format!(
                "Oozie database schema already exists for service '{}'",
                target.service
            )));
        }

        let command = self.store.insert(kind.name(), target, None).await;

        tracing::info!(
            command_id = command.id,
            command = %command.name,
            cluster = %target.cluster,
            service = %target.service,
            "Command submitted"
        );

        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let delay = self.delay;
        let id = command.id;
        let target = target.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            complete(&store, &registry, id, &target, &kind).await;
        });

        Ok(command)
    }

    async fn command(&self, id: u64) -> Result<ApiCommand, ServiceError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| ServiceError::command_not_found(id))
    }

    async fn active_commands(&self, target: &CommandTarget) -> Vec<ApiCommand> {
        self.store.active_for(target).await
    }

    async fn abort(&self, id: u64) -> Result<ApiCommand, ServiceError> {
        let command = self.store.abort(id).await?;
        tracing::info!(command_id = id, command = %command.name, "Command aborted");
        Ok(command)
    }
}

/// Apply the effect of an asynchronous command and record its outcome.
///
/// The store lock is held across the registry update so an abort either
/// lands before the effect (and suppresses it) or after the command has
/// already finished.
async fn complete(
    store: &CommandStore,
    registry: &ClusterRegistry,
    id: u64,
    target: &CommandTarget,
    kind: &CommandKind,
) {
    let mut inner = store.inner.lock().await;
    let Some(command) = inner.commands.get_mut(&id).filter(|c| c.active) else {
        tracing::debug!(command_id = id, "Command no longer active, skipping");
        return;
    };

    let (success, message) = match apply(registry, target, kind).await {
        Ok(outcome) => outcome,
        Err(e) => (false, e.to_string()),
    };

    finish(command, success, message);

    if success {
        tracing::info!(command_id = id, command = kind.name(), "Command succeeded");
    } else {
        tracing::warn!(
            command_id = id,
            command = kind.name(),
            message = ?command.result_message,
            "Command failed"
        );
    }
}

async fn apply(
    registry: &ClusterRegistry,
    target: &CommandTarget,
    kind: &CommandKind,
) -> Result<(bool, String), ServiceError> {
    let (cluster, service) = (target.cluster.as_str(), target.service.as_str());

    let outcome = match kind {
        CommandKind::Start => {
            let previous = registry
                .set_run_state(cluster, service, ServiceState::Started)
                .await?;
            if previous == ServiceState::Started {
                (true, format!("Service '{}' was already started", service))
            } else {
                (true, format!("Service '{}' started", service))
            }
        }
        CommandKind::Stop => {
            let previous = registry
                .set_run_state(cluster, service, ServiceState::Stopped)
                .await?;
            if previous == ServiceState::Stopped {
                (true, format!("Service '{}' was already stopped", service))
            } else {
                (true, format!("Service '{}' stopped", service))
            }
        }
        CommandKind::Restart => {
            registry
                .set_run_state(cluster, service, ServiceState::Started)
                .await?;
            (true, format!("Service '{}' restarted", service))
        }
        CommandKind::Decommission(roles) => {
            registry
                .set_commission_state(cluster, service, roles, CommissionState::Decommissioned)
                .await?;
            (true, format!("Decommissioned {} role(s)", roles.len()))
        }
        CommandKind::Recommission(roles) => {
            registry
                .set_commission_state(cluster, service, roles, CommissionState::Commissioned)
                .await?;
            (true, format!("Recommissioned {} role(s)", roles.len()))
        }
        CommandKind::HdfsCreateTmpDir => {
            if registry.create_hdfs_tmp_dir(cluster, service).await? {
                (true, "Created /tmp directory on HDFS".to_string())
            } else {
                (true, "/tmp directory already exists on HDFS".to_string())
            }
        }
        CommandKind::CreateOozieDb => {
            if registry.create_oozie_schema(cluster, service).await? {
                (true, "Created Oozie database schema".to_string())
            } else {
                (false, "Oozie database schema already exists".to_string())
            }
        }
        CommandKind::EnterMaintenanceMode | CommandKind::ExitMaintenanceMode => {
            return Err(ServiceError::Internal(format!(
                "{} must run synchronously",
                kind.name()
            )));
        }
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopologyFile;

    fn registry() -> Arc<ClusterRegistry> {
        let topology: TopologyFile = serde_json::from_str(
            r#"{"clusters": [{"name": "c1", "services": [
                {"name": "hdfs1", "type": "HDFS", "roles": [
                    {"name": "dn1", "type": "DATANODE", "hostname": "node1",
                     "commission_state": "DECOMMISSIONED"}
                ]},
                {"name": "oozie1", "type": "OOZIE"}
            ]}]}"#,
        )
        .expect("parse topology");
        Arc::new(ClusterRegistry::new(&topology.clusters))
    }

    fn executor(
        registry: Arc<ClusterRegistry>,
        policy: MaintenancePolicy,
        delay: Duration,
    ) -> LocalCommandExecutor {
        LocalCommandExecutor::new(registry, Arc::new(CommandStore::new(100)), policy, delay)
    }

    async fn wait_for(exec: &LocalCommandExecutor, id: u64) -> ApiCommand {
        for _ in 0..200 {
            let cmd = exec.command(id).await.expect("command exists");
            if !cmd.active {
                return cmd;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("command {} never finished", id);
    }

    #[tokio::test]
    async fn test_maintenance_conflict_policy() {
        let exec = executor(registry(), MaintenancePolicy::Conflict, Duration::ZERO);
        let target = CommandTarget::new("c1", "hdfs1");

        let cmd = exec
            .run_sync(&target, CommandKind::EnterMaintenanceMode)
            .await
            .expect("enter");
        assert!(cmd.is_resolved());
        assert_eq!(cmd.success, Some(true));

        let err = exec
            .run_sync(&target, CommandKind::EnterMaintenanceMode)
            .await
            .expect_err("second enter");
        assert!(matches!(err, ServiceError::Conflict(_)));

        let cmd = exec
            .run_sync(&target, CommandKind::ExitMaintenanceMode)
            .await
            .expect("exit");
        assert_eq!(cmd.success, Some(true));
    }

    #[tokio::test]
    async fn test_maintenance_idempotent_policy() {
        let exec = executor(registry(), MaintenancePolicy::Idempotent, Duration::ZERO);
        let target = CommandTarget::new("c1", "hdfs1");

        let cmd = exec
            .run_sync(&target, CommandKind::ExitMaintenanceMode)
            .await
            .expect("exit while not in maintenance");
        assert_eq!(cmd.success, Some(true));
        assert!(
            cmd.result_message
                .as_deref()
                .is_some_and(|m| m.contains("already"))
        );
    }

    #[tokio::test]
    async fn test_run_sync_rejects_async_kind() {
        let exec = executor(registry(), MaintenancePolicy::Conflict, Duration::ZERO);
        let err = exec
            .run_sync(&CommandTarget::new("c1", "hdfs1"), CommandKind::Start)
            .await
            .expect_err("start is async");
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[tokio::test]
    async fn test_submit_returns_pending_then_completes() {
        let reg = registry();
        let exec = executor(Arc::clone(&reg), MaintenancePolicy::Conflict, Duration::ZERO);
        let target = CommandTarget::new("c1", "hdfs1");

        let cmd = exec
            .submit(&target, CommandKind::Recommission(vec!["dn1".to_string()]))
            .await
            .expect("submit");
        assert!(cmd.active);
        assert_eq!(cmd.success, None);

        let done = wait_for(&exec, cmd.id).await;
        assert_eq!(done.success, Some(true));
        assert!(done.end_time.is_some());

        let role = reg.role("c1", "hdfs1", "dn1").await.expect("role");
        assert_eq!(role.commission_state, CommissionState::Commissioned);
    }

    #[tokio::test]
    async fn test_submit_unknown_service() {
        let exec = executor(registry(), MaintenancePolicy::Conflict, Duration::ZERO);
        let err = exec
            .submit(&CommandTarget::new("c1", "ghost"), CommandKind::Start)
            .await
            .expect_err("unknown service");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_oozie_schema_conflict() {
        let exec = executor(registry(), MaintenancePolicy::Conflict, Duration::ZERO);
        let target = CommandTarget::new("c1", "oozie1");

        let cmd = exec
            .submit(&target, CommandKind::CreateOozieDb)
            .await
            .expect("first");
        let done = wait_for(&exec, cmd.id).await;
        assert_eq!(done.success, Some(true));

        let err = exec
            .submit(&target, CommandKind::CreateOozieDb)
            .await
            .expect_err("schema exists");
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_abort_suppresses_effect() {
        let reg = registry();
        let exec = executor(
            Arc::clone(&reg),
            MaintenancePolicy::Conflict,
            Duration::from_millis(200),
        );
        let target = CommandTarget::new("c1", "hdfs1");

        let cmd = exec.submit(&target, CommandKind::Start).await.expect("submit");
        assert_eq!(exec.active_commands(&target).await.len(), 1);

        let aborted = exec.abort(cmd.id).await.expect("abort");
        assert!(!aborted.active);
        assert_eq!(aborted.success, Some(false));
        assert_eq!(aborted.result_message.as_deref(), Some(ABORTED_MESSAGE));
        assert!(exec.active_commands(&target).await.is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let svc = reg.service("c1", "hdfs1").await.expect("service");
        assert_eq!(svc.service_state, ServiceState::Stopped);

        let err = exec.abort(cmd.id).await.expect_err("already aborted");
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_history_evicts_oldest_inactive() {
        let store = CommandStore::new(2);
        let target = CommandTarget::new("c1", "hdfs1");

        let first = store.insert("A", &target, Some((true, "ok".into()))).await;
        let pending = store.insert("B", &target, None).await;
        let third = store.insert("C", &target, Some((true, "ok".into()))).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(first.id).await.is_none());
        assert!(store.get(pending.id).await.is_some());
        assert!(store.get(third.id).await.is_some());
    }

    #[tokio::test]
    async fn test_history_keeps_new_resolved_command() {
        let store = CommandStore::new(1);
        let target = CommandTarget::new("c1", "hdfs1");

        let pending = store.insert("Start", &target, None).await;
        let resolved = store
            .insert("EnterMaintenanceMode", &target, Some((true, "ok".into())))
            .await;

        assert!(store.get(pending.id).await.is_some());
        assert_eq!(store.get(resolved.id).await, Some(resolved.clone()));
        assert_eq!(store.len().await, 2);

        // The next insert evicts the resolved command, not the pending one.
        let next = store.insert("Stop", &target, Some((true, "ok".into()))).await;
        assert!(store.get(resolved.id).await.is_none());
        assert!(store.get(pending.id).await.is_some());
        assert!(store.get(next.id).await.is_some());
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let store = CommandStore::new(10);
        let target = CommandTarget::new("c1", "hdfs1");
        let a = store.insert("A", &target, None).await;
        let b = store.insert("B", &target, None).await;
        assert!(b.id > a.id);
    }
}
