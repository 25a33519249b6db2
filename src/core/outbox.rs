//! Durable outbox of events awaiting confirmed remote delivery.
//!
//! Every operation opens its own connection on the blocking pool, does its
//! work in a short transaction and closes it. A record exists in the outbox
//! exactly as long as its event has not been confirmed by the remote store.

use crate::db::initialize::init_db;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{count_pending, delete_record, insert_record, load_pending};
use crate::errors::AppResult;
use crate::models::location_event::LocationEvent;
use crate::models::outbox_record::OutboxRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Outbox {
    path: PathBuf,
}

impl Outbox {
    /// Open (creating if needed) the outbox database and run migrations.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let pool = DbPool::new(&path)?;
        init_db(&pool.conn)?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run<F, T>(&self, op: F) -> AppResult<T>
    where
        F: FnOnce(&mut DbPool) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut pool = DbPool::new(&path)?;
            op(&mut pool)
        })
        .await?
    }

    /// Durably store an event. The row is committed before this returns.
    pub async fn enqueue(&self, event: &LocationEvent) -> AppResult<i64> {
        let ev = event.clone();
        let result = self
            .run(move |pool| insert_record(&mut pool.conn, &ev))
            .await;

        match &result {
            Ok(id) => debug!(outbox_id = id, user_id = event.user_id, code = event.code.code(), "event enqueued"),
            Err(e) => error!(user_id = event.user_id, error = %e, "failed to enqueue event"),
        }
        result
    }

    /// Pending records in insertion order, including those from earlier runs.
    pub async fn list_pending(&self) -> AppResult<Vec<OutboxRecord>> {
        self.run(|pool| load_pending(&pool.conn)).await
    }

    /// Removing an id that is already gone is not an error.
    pub async fn remove(&self, id: i64) -> AppResult<RemoveOutcome> {
        self.run(move |pool| {
            Ok(if delete_record(&pool.conn, id)? {
                RemoveOutcome::Removed
            } else {
                RemoveOutcome::NotFound
            })
        })
        .await
    }

    pub async fn pending_count(&self) -> AppResult<i64> {
        self.run(|pool| Ok(count_pending(&pool.conn)?)).await
    }

    /// Append a row to the internal `log` table.
    pub async fn log(&self, operation: &str, target: &str, message: &str) -> AppResult<()> {
        let (operation, target, message) =
            (operation.to_string(), target.to_string(), message.to_string());
        self.run(move |pool| ttlog(&pool.conn, &operation, &target, &message))
            .await
    }
}
