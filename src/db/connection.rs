use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Worker thread plus its task queue. Dropping the last handle closes the
/// queue and joins the thread once pending tasks have run.
struct Worker {
    tasks: Option<mpsc::Sender<DbTask>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.tasks.take());
        if let Some(thread) = self.thread.take() {
            if let Err(join_err) = thread.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// SQLite handle. All statements run on one dedicated worker thread; callers
/// await the reply.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    db_path: Arc<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database file and migrates it before the
    /// connection is handed to the worker thread.
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let mut conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open SQLite database {}", db_path.display()))?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!("Failed to enable WAL mode: {err}");
        }
        run_migrations(&mut conn).context("failed to run database migrations")?;

        let (task_tx, task_rx) = mpsc::channel::<DbTask>();
        let thread = thread::Builder::new()
            .name("crowdmeter-db".into())
            .spawn(move || {
                for task in task_rx {
                    task(&mut conn);
                }
                info!("Database thread shutting down");
            })
            .context("failed to spawn database worker thread")?;

        info!("Database initialized at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                tasks: Some(task_tx),
                thread: Some(thread),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self
            .worker
            .tasks
            .as_ref()
            .ok_or_else(|| anyhow!("database worker already shut down"))?;
        let (reply_tx, reply_rx) = oneshot::channel();

        let job: DbTask = Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                warn!("DB caller dropped before receiving result");
            }
        });

        sender
            .send(job)
            .map_err(|_| anyhow!("database worker is no longer accepting tasks"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn clones_keep_the_worker_alive() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("crowdmeter.sqlite3")).unwrap();
        let handle = db.clone();
        drop(db);

        let version: i64 = handle
            .execute(|conn| Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert!(version >= 1);
    }

    #[test]
    fn unreadable_file_fails_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crowdmeter.sqlite3");
        std::fs::write(&path, "this is not a sqlite database ".repeat(40)).unwrap();

        let err = Database::new(path).err().expect("corrupt file should not open");
        assert!(format!("{err:#}").contains("migrations"));
    }
}
