//! Query execution
//!
//! [`Engine::execute`] opens one session per context block and runs them
//! concurrently, bounded by a semaphore. Inside a session every top-level
//! field runs concurrently too. A session that fails to connect is dropped
//! from the result; a field that fails becomes an error node. The merged
//! document is finally reordered to follow the query.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::projection::FieldSelection;
use crate::engine::registry::{ActionRegistry, FieldTarget};
use crate::engine::runner::ActionRunner;
use crate::engine::transformers::TransformerRegistry;
use crate::engine::value::{Document, Value};
use crate::error::{HostqlError, Result, SessionError};
use crate::parser::ast::{ContextKind, Field, Query};
use crate::session::{LocalSession, RemoteSession, Session};

/// A session paired with the fields to collect from it.
pub type SessionTarget = (Box<dyn Session>, Vec<Field>);

#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<ActionRegistry>,
    transformers: Arc<TransformerRegistry>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        registry: Arc<ActionRegistry>,
        transformers: Arc<TransformerRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            transformers,
            config,
        }
    }

    /// An engine with every built-in action and transformer.
    pub fn with_defaults(config: EngineConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(ActionRegistry::with_defaults()?),
            Arc::new(TransformerRegistry::with_defaults()?),
            config,
        ))
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `query` and return the result document keyed by session alias.
    pub async fn execute(&self, query: &Query, cancel: CancellationToken) -> Result<Document> {
        let mut targets: Vec<SessionTarget> = Vec::with_capacity(query.contexts.len());
        for context in &query.contexts {
            match open_session(&context.kind) {
                Ok(session) => targets.push((session, context.selection.clone())),
                Err(err) => warn!(error = %err, "skipping context block"),
            }
        }
        self.execute_sessions(targets, cancel).await
    }

    /// Run prepared sessions. Entries keep the order of `targets`.
    pub async fn execute_sessions(
        &self,
        targets: Vec<SessionTarget>,
        cancel: CancellationToken,
    ) -> Result<Document> {
        let permits = Arc::new(Semaphore::new(self.config.session_permits(targets.len())));

        // transformers are bound once per query, before any session starts
        let plans: Vec<_> = targets
            .into_iter()
            .map(|(session, fields)| {
                let selections: Vec<FieldSelection> = fields
                    .iter()
                    .map(|field| FieldSelection::resolve(field, &self.transformers))
                    .collect();
                (session, fields, selections)
            })
            .collect();

        let runs = plans.into_iter().map(|(session, fields, selections)| {
            let permits = Arc::clone(&permits);
            let cancel = &cancel;
            async move {
                let _permit = permits
                    .acquire()
                    .await
                    .map_err(|_| HostqlError::Cancelled)?;
                let result = self.run_session(session, &fields, &selections, cancel).await?;
                Ok::<_, HostqlError>(result.map(|(alias, document)| (alias, document, selections)))
            }
        });

        let results = join_all(runs).await;
        if cancel.is_cancelled() {
            return Err(HostqlError::Cancelled);
        }

        let mut document = Document::new();
        for result in results {
            let Some((alias, values, selections)) = result? else {
                continue;
            };
            if document.contains_key(&alias) {
                warn!(alias = %alias, "duplicate session alias, dropping later result");
                continue;
            }
            let root = FieldSelection::group(alias.clone(), selections);
            document.insert(alias, root.reorder(&Value::Map(values)));
        }
        Ok(document)
    }

    /// Connect, collect every field, disconnect. `None` when the session
    /// could not connect.
    async fn run_session(
        &self,
        mut session: Box<dyn Session>,
        fields: &[Field],
        selections: &[FieldSelection],
        cancel: &CancellationToken,
    ) -> Result<Option<(String, Document)>> {
        if cancel.is_cancelled() {
            return Err(HostqlError::Cancelled);
        }

        if let Err(err) = session.connect(cancel).await {
            // tear down whatever connect left half open
            disconnect(&mut *session).await;
            return match err {
                SessionError::Cancelled => Err(HostqlError::Cancelled),
                err => {
                    warn!(session = %session.info(), error = %err, "could not connect, skipping session");
                    Ok(None)
                }
            };
        }
        info!(session = %session.info(), "session ready");

        let collected = self
            .collect_fields(session.as_ref(), fields, selections, cancel)
            .await;
        disconnect(&mut *session).await;

        let values = collected?;
        Ok(Some((session.alias().to_string(), values)))
    }

    async fn collect_fields(
        &self,
        session: &dyn Session,
        fields: &[Field],
        selections: &[FieldSelection],
        cancel: &CancellationToken,
    ) -> Result<Document> {
        let runner = ActionRunner {
            session,
            registry: &self.registry,
            config: &self.config,
            cancel,
        };

        let targets: Vec<(&Field, &FieldSelection, FieldTarget)> = fields
            .iter()
            .zip(selections)
            .map(|(field, selection)| (field, selection, self.registry.classify(&field.name)))
            .collect();

        let values = DashMap::new();
        let runs = targets.into_iter().map(|(field, selection, target)| {
            let runner = &runner;
            let values = &values;
            async move {
                let value = match target {
                    FieldTarget::Action => runner.run(field, selection, "").await?,
                    FieldTarget::Namespace => {
                        Value::Map(self.run_namespace(runner, field, selection).await?)
                    }
                };
                insert_once(values, &field.name, value);
                Ok::<_, HostqlError>(())
            }
        });
        self.drive(runs).await?;

        Ok(values.into_iter().collect())
    }

    /// Run every action selected under a namespace field.
    async fn run_namespace(
        &self,
        runner: &ActionRunner<'_>,
        namespace: &Field,
        selection: &FieldSelection,
    ) -> Result<Document> {
        let values = DashMap::new();
        let runs = namespace.selection.iter().zip(selection.children()).map(|(field, child)| {
            let values = &values;
            async move {
                let value = runner.run(field, child, &namespace.name).await?;
                insert_once(values, &field.name, value);
                Ok::<_, HostqlError>(())
            }
        });
        self.drive(runs).await?;

        Ok(values.into_iter().collect())
    }

    /// Await `runs` concurrently, or one by one in sync mode.
    async fn drive<I, F>(&self, runs: I) -> Result<()>
    where
        I: IntoIterator<Item = F>,
        F: std::future::Future<Output = Result<()>>,
    {
        if self.config.sync {
            for run in runs {
                run.await?;
            }
            return Ok(());
        }
        join_all(runs).await.into_iter().collect()
    }
}

/// Best-effort teardown; failures are only logged.
async fn disconnect(session: &mut dyn Session) {
    if let Err(err) = session.disconnect().await {
        warn!(session = %session.info(), error = %err, "disconnect failed");
    }
}

/// First writer wins; a repeated field name is logged and dropped.
fn insert_once(values: &DashMap<String, Value>, name: &str, value: Value) {
    match values.entry(name.to_string()) {
        Entry::Occupied(_) => {
            debug!(field = name, "field selected twice, keeping the first result");
        }
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
    }
}

fn open_session(kind: &ContextKind) -> std::result::Result<Box<dyn Session>, SessionError> {
    match kind {
        ContextKind::Local => Ok(Box::new(LocalSession::new())),
        ContextKind::Remote(arguments) => Ok(Box::new(RemoteSession::from_arguments(arguments)?)),
    }
}
