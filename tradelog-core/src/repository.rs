//! Trade repository — the journal's CRUD contract and two stores.
//!
//! [`JsonFileRepository`] keeps the whole journal as one pretty-printed JSON
//! array. Every mutation rewrites the file, so concurrent writers simply
//! race and the last write wins. A mutation whose write fails leaves the
//! in-memory journal untouched. [`InMemoryRepository`] has identical
//! semantics without the file and is what tests and embedders use.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{NewTrade, TradeId, TradePatch, TradeRecord};
use crate::position;

/// Errors from the trade store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("trade not found: {0}")]
    NotFound(TradeId),

    #[error("journal I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("journal is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// CRUD access to stored trades.
pub trait TradeRepository {
    /// All trades, newest-created first.
    fn list(&self) -> Result<Vec<TradeRecord>, RepositoryError>;

    fn get(&self, id: &TradeId) -> Result<TradeRecord, RepositoryError>;

    /// Book `trade` (see [`position::book`]), assign an ID and store it.
    fn create(&mut self, trade: NewTrade) -> Result<TradeRecord, RepositoryError>;

    /// Overwrite the fields present in `patch`.
    fn update(&mut self, id: &TradeId, patch: &TradePatch)
        -> Result<TradeRecord, RepositoryError>;

    /// Overwrite the stored record with the same ID, keeping its creation
    /// stamp. Used for full edits re-booked through [`position::rebook`].
    fn replace(&mut self, record: TradeRecord) -> Result<TradeRecord, RepositoryError>;

    fn delete(&mut self, id: &TradeId) -> Result<(), RepositoryError>;
}

/// In-memory trade list shared by both stores.
#[derive(Debug, Default, Clone)]
struct Journal {
    trades: Vec<TradeRecord>,
    sequence: u64,
}

impl Journal {
    fn from_trades(trades: Vec<TradeRecord>) -> Self {
        let sequence = trades.len() as u64;
        Self { trades, sequence }
    }

    fn next_id(&mut self, input: &NewTrade) -> TradeId {
        loop {
            self.sequence += 1;
            let seed = format!(
                "{}|{}|{}|{}",
                input.symbol,
                input.date,
                Utc::now().timestamp_nanos_opt().unwrap_or_default(),
                self.sequence
            );
            let id = TradeId::from_content(seed.as_bytes());
            if !self.trades.iter().any(|t| t.id == id) {
                return id;
            }
        }
    }

    fn list(&self) -> Vec<TradeRecord> {
        let mut trades = self.trades.clone();
        // Records without a creation stamp sort as oldest.
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        trades
    }

    fn get(&self, id: &TradeId) -> Result<TradeRecord, RepositoryError> {
        self.trades
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    /// Creation stamp strictly after every stored one, so newest-first
    /// listing is unambiguous even on coarse clocks.
    fn next_stamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.trades.iter().filter_map(|t| t.created_at).max() {
            Some(latest) if now <= latest => latest + Duration::nanoseconds(1),
            _ => now,
        }
    }

    fn create(&mut self, input: NewTrade) -> TradeRecord {
        let id = self.next_id(&input);
        let created_at = self.next_stamp();
        let mut record = position::book(id, input);
        record.created_at = Some(created_at);
        self.trades.push(record.clone());
        record
    }

    fn update(&mut self, id: &TradeId, patch: &TradePatch) -> Result<TradeRecord, RepositoryError> {
        let record = self
            .trades
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        patch.apply(record);
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    fn replace(&mut self, mut record: TradeRecord) -> Result<TradeRecord, RepositoryError> {
        let slot = self
            .trades
            .iter_mut()
            .find(|t| t.id == record.id)
            .ok_or_else(|| RepositoryError::NotFound(record.id.clone()))?;
        record.created_at = slot.created_at;
        record.updated_at = Some(Utc::now());
        *slot = record.clone();
        Ok(record)
    }

    fn delete(&mut self, id: &TradeId) -> Result<(), RepositoryError> {
        let before = self.trades.len();
        self.trades.retain(|t| &t.id != id);
        if self.trades.len() == before {
            return Err(RepositoryError::NotFound(id.clone()));
        }
        Ok(())
    }
}

/// Trade store held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    journal: Journal,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, kept as given.
    pub fn with_trades(trades: Vec<TradeRecord>) -> Self {
        Self {
            journal: Journal::from_trades(trades),
        }
    }
}

impl TradeRepository for InMemoryRepository {
    fn list(&self) -> Result<Vec<TradeRecord>, RepositoryError> {
        Ok(self.journal.list())
    }

    fn get(&self, id: &TradeId) -> Result<TradeRecord, RepositoryError> {
        self.journal.get(id)
    }

    fn create(&mut self, trade: NewTrade) -> Result<TradeRecord, RepositoryError> {
        Ok(self.journal.create(trade))
    }

    fn update(
        &mut self,
        id: &TradeId,
        patch: &TradePatch,
    ) -> Result<TradeRecord, RepositoryError> {
        self.journal.update(id, patch)
    }

    fn replace(&mut self, record: TradeRecord) -> Result<TradeRecord, RepositoryError> {
        self.journal.replace(record)
    }

    fn delete(&mut self, id: &TradeId) -> Result<(), RepositoryError> {
        self.journal.delete(id)
    }
}

/// Trade store backed by a JSON array file.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    journal: Journal,
}

impl JsonFileRepository {
    /// Open the journal at `path`. A missing file is an empty journal and
    /// is only created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let trades = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str::<Vec<TradeRecord>>(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };
        debug!(path = %path.display(), trades = trades.len(), "opened journal");
        Ok(Self {
            path,
            journal: Journal::from_trades(trades),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the journal and adopt the copy only once
    /// it is on disk.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Journal) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut staged = self.journal.clone();
        let out = change(&mut staged)?;
        self.save(&staged.trades)?;
        self.journal = staged;
        Ok(out)
    }

    fn save(&self, trades: &[TradeRecord]) -> Result<(), RepositoryError> {
        let io_err = |source| RepositoryError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(trades)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            io_err(source)
        })?;
        Ok(())
    }
}

impl TradeRepository for JsonFileRepository {
    fn list(&self) -> Result<Vec<TradeRecord>, RepositoryError> {
        Ok(self.journal.list())
    }

    fn get(&self, id: &TradeId) -> Result<TradeRecord, RepositoryError> {
        self.journal.get(id)
    }

    fn create(&mut self, trade: NewTrade) -> Result<TradeRecord, RepositoryError> {
        let record = self.commit(|journal| Ok(journal.create(trade)))?;
        info!(
            id = %record.id,
            symbol = %record.symbol,
            open = record.is_open(),
            "trade created"
        );
        Ok(record)
    }

    fn update(
        &mut self,
        id: &TradeId,
        patch: &TradePatch,
    ) -> Result<TradeRecord, RepositoryError> {
        let record = self.commit(|journal| journal.update(id, patch))?;
        info!(id = %id, "trade updated");
        Ok(record)
    }

    fn replace(&mut self, record: TradeRecord) -> Result<TradeRecord, RepositoryError> {
        let record = self.commit(|journal| journal.replace(record))?;
        info!(id = %record.id, pl = record.profit_loss, "trade replaced");
        Ok(record)
    }

    fn delete(&mut self, id: &TradeId) -> Result<(), RepositoryError> {
        self.commit(|journal| journal.delete(id))?;
        info!(id = %id, "trade deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeType;

    fn new_trade(symbol: &str, exit: Option<f64>) -> NewTrade {
        NewTrade {
            date: "2024-01-05".into(),
            symbol: symbol.into(),
            trade_type: TradeType::Long,
            quantity: 10.0,
            entry_price: 100.0,
            exit_price: exit,
            stop_loss: None,
            risk_amount: None,
            strategy: String::new(),
            notes: None,
        }
    }

    #[test]
    fn create_assigns_unique_ids() {
        let mut repo = InMemoryRepository::new();
        let a = repo.create(new_trade("AAPL", None)).unwrap();
        let b = repo.create(new_trade("AAPL", None)).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.created_at.is_some());
    }

    #[test]
    fn create_books_pl() {
        let mut repo = InMemoryRepository::new();
        let t = repo.create(new_trade("AAPL", Some(110.0))).unwrap();
        assert_eq!(t.profit_loss, 100.0);
        assert_eq!(t.strategy, "Untagged");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut repo = InMemoryRepository::new();
        let id = TradeId::new("nope");
        assert!(matches!(repo.get(&id), Err(RepositoryError::NotFound(_))));
        assert!(matches!(repo.delete(&id), Err(RepositoryError::NotFound(_))));
        assert!(matches!(
            repo.update(&id, &TradePatch::default()),
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn update_and_delete() {
        let mut repo = InMemoryRepository::new();
        let t = repo.create(new_trade("AAPL", None)).unwrap();
        let patch = TradePatch {
            notes: Some("added".into()),
            ..Default::default()
        };
        let updated = repo.update(&t.id, &patch).unwrap();
        assert_eq!(updated.notes.as_deref(), Some("added"));
        assert!(updated.updated_at.is_some());

        repo.delete(&t.id).unwrap();
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn replace_overwrites_and_keeps_creation_stamp() {
        let mut repo = InMemoryRepository::new();
        let t = repo.create(new_trade("AAPL", Some(110.0))).unwrap();
        let mut edited = t.clone();
        edited.exit_price = 120.0;
        edited.profit_loss = 200.0;
        edited.notes = None;
        edited.created_at = None;

        let stored = repo.replace(edited).unwrap();
        assert_eq!(stored.created_at, t.created_at);
        assert!(stored.updated_at.is_some());
        assert_eq!(repo.get(&t.id).unwrap().profit_loss, 200.0);

        let mut stranger = t.clone();
        stranger.id = TradeId::new("elsewhere");
        assert!(matches!(
            repo.replace(stranger),
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn seeded_records_without_stamp_keep_order() {
        let mut repo = InMemoryRepository::new();
        let a = repo.create(new_trade("A", None)).unwrap();
        let mut seeded = vec![a.clone()];
        let mut b = a.clone();
        b.id = TradeId::new("b");
        b.created_at = None;
        let mut c = b.clone();
        c.id = TradeId::new("c");
        seeded.push(b);
        seeded.push(c);
        let repo = InMemoryRepository::with_trades(seeded);
        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![a.id.0, "b".to_string(), "c".to_string()]);
    }
}
