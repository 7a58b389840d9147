/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! File-backed session database.
//!
//! Each session gets a directory holding four files: `Session.xml` (a
//! small XML record of the sequence counters and CompIDs), `Index.txt`
//! (append-only `"<seq>:<offset>:<length>"` lines), `Messages.txt`
//! (append-only raw outbound bytes), and `Locked.txt` (presence marks an
//! exclusive lease held by the acquiring process). The index is
//! authoritative: a crash between a message-file append and its index
//! line leaves at most one trailing, unindexed message, and that tail is
//! simply never read back.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use ironfix_core::error::StoreError;
use ironfix_core::message::{MsgType, OwnedMessage};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::traits::MessageStore;

/// Errors specific to lease/lifecycle operations on the file-backed store,
/// distinct from the per-message [`StoreError`] the [`MessageStore`] trait
/// methods report.
#[derive(Debug, Error)]
pub enum StoreDbError {
    /// Another owner currently holds `Locked.txt` for this session.
    #[error("session {session_id} is locked")]
    SessionLocked {
        /// The session identifier that is locked.
        session_id: String,
    },
    /// `Session.xml` could not be parsed; requires operator intervention.
    #[error("corrupt session record for {session_id}: {reason}")]
    CorruptRecord {
        /// The session identifier whose record is corrupt.
        session_id: String,
        /// Description of the corruption.
        reason: String,
    },
    /// Underlying filesystem operation failed.
    #[error("session store i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreDbError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// The persisted record kept in `Session.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Next outbound sequence number.
    pub tx_sequence: u64,
    /// Next expected inbound sequence number.
    pub rx_sequence: u64,
    /// Sender CompID as parsed from the session id.
    pub sender_comp_id: String,
    /// Target CompID as parsed from the session id.
    pub target_comp_id: String,
}

impl SessionRecord {
    fn fresh(session_id: &str) -> Self {
        let (sender_comp_id, target_comp_id) = split_session_id(session_id);
        Self {
            tx_sequence: 1,
            rx_sequence: 1,
            sender_comp_id,
            target_comp_id,
        }
    }

    fn to_xml(&self) -> String {
        format!(
            "<session>\n  <tx_sequence>{}</tx_sequence>\n  <rx_sequence>{}</rx_sequence>\n  <sender_comp_id>{}</sender_comp_id>\n  <target_comp_id>{}</target_comp_id>\n</session>\n",
            self.tx_sequence, self.rx_sequence, self.sender_comp_id, self.target_comp_id
        )
    }

    fn from_xml(text: &str, session_id: &str) -> Result<Self, StoreDbError> {
        let doc = roxmltree::Document::parse(text).map_err(|e| StoreDbError::CorruptRecord {
            session_id: session_id.to_owned(),
            reason: e.to_string(),
        })?;
        let root = doc.root_element();
        let field = |name: &str| -> Result<String, StoreDbError> {
            root.children()
                .find(|n| n.has_tag_name(name))
                .and_then(|n| n.text())
                .map(str::to_owned)
                .ok_or_else(|| StoreDbError::CorruptRecord {
                    session_id: session_id.to_owned(),
                    reason: format!("missing <{name}>"),
                })
        };
        let parse_u64 = |name: &str| -> Result<u64, StoreDbError> {
            field(name)?.trim().parse::<u64>().map_err(|e| StoreDbError::CorruptRecord {
                session_id: session_id.to_owned(),
                reason: format!("invalid <{name}>: {e}"),
            })
        };
        Ok(Self {
            tx_sequence: parse_u64("tx_sequence")?,
            rx_sequence: parse_u64("rx_sequence")?,
            sender_comp_id: field("sender_comp_id")?,
            target_comp_id: field("target_comp_id")?,
        })
    }
}

fn split_session_id(session_id: &str) -> (String, String) {
    match session_id.split_once('-') {
        Some((a, b)) => (a.to_owned(), b.to_owned()),
        None => (session_id.to_owned(), String::new()),
    }
}

struct IndexEntry {
    seq: u64,
    offset: u64,
    length: u64,
}

struct Inner {
    index: Vec<IndexEntry>,
    message_file: File,
    index_file: File,
}

/// A leased, file-backed session database.
///
/// Implements [`MessageStore`] so it can be handed to
/// [`crate::MessageStore`] consumers directly; lease lifecycle
/// (`acquire`/`release`/`reset_session`) is managed through inherent
/// methods since those operations fall outside the trait's scope.
pub struct FileStore {
    dir: PathBuf,
    session_id: String,
    inner: AsyncMutex<Inner>,
    record: AsyncMutex<SessionRecord>,
    creation_time: SystemTime,
}

impl FileStore {
    /// Acquires the session directory under `root`, returning a
    /// `SessionLocked` error unless `Locked.txt` is absent or older than
    /// `lock_staleness`.
    ///
    /// # Errors
    /// Returns [`StoreDbError::SessionLocked`] if a fresh lease is already
    /// held, [`StoreDbError::CorruptRecord`] if `Session.xml` cannot be
    /// parsed, or [`StoreDbError::Io`] for filesystem failures.
    pub async fn acquire(root: impl AsRef<Path>, session_id: &str, lock_staleness: Duration) -> Result<Self, StoreDbError> {
        let dir = root.as_ref().join(session_id);
        fs::create_dir_all(&dir).await?;

        let lock_path = dir.join("Locked.txt");
        if let Ok(meta) = fs::metadata(&lock_path).await {
            let age = meta.modified().ok().and_then(|m| m.elapsed().ok()).unwrap_or(Duration::ZERO);
            if age < lock_staleness {
                return Err(StoreDbError::SessionLocked {
                    session_id: session_id.to_owned(),
                });
            }
            warn!(session = session_id, age_secs = age.as_secs(), "force-acquiring stale lease");
        }

        let record_path = dir.join("Session.xml");
        let record = match fs::read_to_string(&record_path).await {
            Ok(text) => SessionRecord::from_xml(&text, session_id)?,
            Err(_) => {
                let fresh = SessionRecord::fresh(session_id);
                fs::write(&record_path, fresh.to_xml()).await?;
                fresh
            }
        };

        let index = read_index(&dir.join("Index.txt")).await?;

        let message_file = OpenOptions::new().create(true).append(true).read(true).open(dir.join("Messages.txt")).await?;
        let index_file = OpenOptions::new().create(true).append(true).open(dir.join("Index.txt")).await?;
        fs::write(&lock_path, std::process::id().to_string()).await?;

        info!(session = session_id, entries = index.len(), "acquired session database");

        Ok(Self {
            dir,
            session_id: session_id.to_owned(),
            inner: AsyncMutex::new(Inner { index, message_file, index_file }),
            record: AsyncMutex::new(record),
            creation_time: SystemTime::now(),
        })
    }

    /// Releases the lease, deleting `Locked.txt`. If `record` is supplied
    /// it is written back to `Session.xml` first.
    ///
    /// # Errors
    /// Returns [`StoreDbError::Io`] if the filesystem operations fail.
    pub async fn release(&self, record: Option<SessionRecord>) -> Result<(), StoreDbError> {
        if let Some(record) = record {
            fs::write(self.dir.join("Session.xml"), record.to_xml()).await?;
        }
        let _ = fs::remove_file(self.dir.join("Locked.txt")).await;
        debug!(session = %self.session_id, "released session database lease");
        Ok(())
    }

    /// Deletes the three data files and writes a fresh record with both
    /// sequence counters at 1.
    ///
    /// # Errors
    /// Returns [`StoreDbError::Io`] if the filesystem operations fail.
    pub async fn reset_session(&self) -> Result<(), StoreDbError> {
        let mut inner = self.inner.lock().await;
        let mut record = self.record.lock().await;

        let fresh = SessionRecord::fresh(&self.session_id);
        fs::write(self.dir.join("Session.xml"), fresh.to_xml()).await?;

        inner.message_file = OpenOptions::new().create(true).write(true).truncate(true).read(true).open(self.dir.join("Messages.txt")).await?;
        inner.index_file = OpenOptions::new().create(true).write(true).truncate(true).open(self.dir.join("Index.txt")).await?;
        inner.index.clear();
        *record = fresh;

        info!(session = %self.session_id, "reset session database");
        Ok(())
    }

    /// Current session record snapshot.
    pub async fn record(&self) -> SessionRecord {
        self.record.lock().await.clone()
    }
}

async fn read_index(path: &Path) -> Result<Vec<IndexEntry>, StoreDbError> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(_) => return Ok(Vec::new()),
    };
    let mut entries = Vec::new();
    for line in text.lines() {
        let mut parts = line.splitn(3, ':');
        let (Some(seq), Some(offset), Some(length)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let (Ok(seq), Ok(offset), Ok(length)) = (seq.parse(), offset.parse(), length.parse()) else {
            continue;
        };
        entries.push(IndexEntry { seq, offset, length });
    }
    Ok(entries)
}

#[async_trait]
impl MessageStore for FileStore {
    async fn store(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        let offset = inner
            .message_file
            .metadata()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
            .len();

        inner.message_file.write_all(message).await.map_err(|e| {
            error!(session = %self.session_id, seq_num, error = %e, "failed to append to Messages.txt");
            StoreError::StoreFailed { seq_num, reason: e.to_string() }
        })?;
        inner.message_file.flush().await.map_err(|e| {
            error!(session = %self.session_id, seq_num, error = %e, "failed to flush Messages.txt");
            StoreError::StoreFailed { seq_num, reason: e.to_string() }
        })?;

        let line = format!("{}:{}:{}\n", seq_num, offset, message.len());
        inner.index_file.write_all(line.as_bytes()).await.map_err(|e| {
            error!(session = %self.session_id, seq_num, error = %e, "failed to append to Index.txt");
            StoreError::StoreFailed { seq_num, reason: e.to_string() }
        })?;
        inner.index_file.flush().await.map_err(|e| {
            error!(session = %self.session_id, seq_num, error = %e, "failed to flush Index.txt");
            StoreError::StoreFailed { seq_num, reason: e.to_string() }
        })?;

        inner.index.push(IndexEntry {
            seq: seq_num,
            offset,
            length: message.len() as u64,
        });

        self.record.lock().await.tx_sequence = seq_num + 1;

        Ok(())
    }

    async fn get_range(&self, begin: u64, end: u64) -> Result<Vec<OwnedMessage>, StoreError> {
        let end = if end == 0 { u64::MAX } else { end };
        let mut inner = self.inner.lock().await;

        let matches: Vec<(u64, u64)> = inner
            .index
            .iter()
            .filter(|e| e.seq >= begin && e.seq <= end)
            .map(|e| (e.offset, e.length))
            .collect();

        if matches.is_empty() {
            return Err(StoreError::RangeNotAvailable { range: begin..end.saturating_add(1) });
        }

        let mut result = Vec::with_capacity(matches.len());
        for (offset, length) in matches {
            let mut buf = vec![0u8; length as usize];
            inner.message_file.seek(SeekFrom::Start(offset)).await.map_err(|e| StoreError::RetrieveFailed {
                seq_num: 0,
                reason: e.to_string(),
            })?;
            inner.message_file.read_exact(&mut buf).await.map_err(|e| StoreError::RetrieveFailed {
                seq_num: 0,
                reason: e.to_string(),
            })?;
            result.push(OwnedMessage::new(bytes::Bytes::from(buf), MsgType::default(), vec![]));
        }

        Ok(result)
    }

    // `MessageStore`'s counters are synchronous; a contended `try_lock` here
    // only happens mid-`store`/`reset_session`, so the stale fallback is
    // momentary.
    fn next_sender_seq(&self) -> u64 {
        self.record.try_lock().map(|r| r.tx_sequence).unwrap_or(1)
    }

    fn next_target_seq(&self) -> u64 {
        self.record.try_lock().map(|r| r.rx_sequence).unwrap_or(1)
    }

    fn set_next_sender_seq(&self, seq: u64) {
        if let Ok(mut record) = self.record.try_lock() {
            record.tx_sequence = seq;
        }
    }

    fn set_next_target_seq(&self, seq: u64) {
        if let Ok(mut record) = self.record.try_lock() {
            record.rx_sequence = seq;
        }
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.reset_session().await.map_err(|e| StoreError::Io(e.to_string()))
    }

    fn creation_time(&self) -> SystemTime {
        self.creation_time
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let refreshed = read_index(&self.dir.join("Index.txt")).await.map_err(|e| StoreError::Io(e.to_string()))?;
        inner.index = refreshed;
        Ok(())
    }
}
