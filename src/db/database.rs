use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::DatabaseName;
use tokio::sync::watch;
use tokio_rusqlite::Connection;

use crate::error::Result;

use super::live::{live_query, LiveStream};
use super::schema::SCHEMA;

/// Tables whose changes can be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Poems,
    Notices,
    Texts,
}

struct ChangeCounters {
    poems: watch::Sender<u64>,
    notices: watch::Sender<u64>,
    texts: watch::Sender<u64>,
}

impl ChangeCounters {
    fn new() -> Self {
        Self {
            poems: watch::Sender::new(0),
            notices: watch::Sender::new(0),
            texts: watch::Sender::new(0),
        }
    }

    fn get(&self, table: Table) -> &watch::Sender<u64> {
        match table {
            Table::Poems => &self.poems,
            Table::Notices => &self.notices,
            Table::Texts => &self.texts,
        }
    }
}

/// Shared handle to the content database. Cloning is cheap; all clones talk
/// to the same connection thread and share change notifications.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    changes: Arc<ChangeCounters>,
}

impl Database {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref().to_path_buf()).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    /// Open `target`, copying the packaged `asset` database there first if
    /// no copy exists yet. The copy is made writable so status marks persist.
    pub async fn create_from_asset(asset: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<Self> {
        let (asset, target) = (asset.as_ref(), target.as_ref());

        if !tokio::fs::try_exists(target).await? {
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }

            if tokio::fs::try_exists(asset).await? {
                let staging = staging_path(target);
                tokio::fs::copy(asset, &staging).await?;
                make_writable(&staging).await?;
                tokio::fs::rename(&staging, target).await?;
                tracing::info!("Copied packaged database {:?} to {:?}", asset, target);
            } else {
                tracing::warn!("Packaged database {:?} not found, starting empty", asset);
            }
        }

        Self::open(target).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let read_only = conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(conn.is_readonly(DatabaseName::Main)?)
            })
            .await?;

        if read_only {
            tracing::warn!("Content database opened read-only; status changes will fail");
        }

        Ok(Self {
            conn,
            changes: Arc::new(ChangeCounters::new()),
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Signal that `table` changed so live queries re-run.
    pub fn notify(&self, table: Table) {
        self.changes.get(table).send_modify(|v| *v = v.wrapping_add(1));
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.changes.get(table).subscribe()
    }

    pub fn observe<T, F, Fut>(&self, table: Table, query: F) -> LiveStream<T>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        live_query(self.subscribe(table), query)
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".copying");
    target.with_file_name(name)
}

async fn make_writable(path: &Path) -> Result<()> {
    let mut permissions = tokio::fs::metadata(path).await?.permissions();
    if !permissions.readonly() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);

    tokio::fs::set_permissions(path, permissions).await?;
    Ok(())
}
