//! [`SqliteStore`]: the SQLite implementation of [`StateStore`].

use std::{collections::BTreeSet, path::Path};

use dropwatch_core::{
  account::AccountId, item::ItemId, state::StateSnapshot, store::StateStore,
};

use crate::{Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dropwatch state store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn read_snapshot(&self) -> Result<StateSnapshot> {
    let (accounts, rows): (Vec<String>, Vec<(String, String)>) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT account_id FROM accounts")?;
        let accounts = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        let mut stmt =
          conn.prepare("SELECT account_id, item_id FROM seen_items")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, String)>>>()?;

        Ok((accounts, rows))
      })
      .await?;

    let mut snapshot: StateSnapshot = accounts
      .into_iter()
      .map(|a| (AccountId(a), BTreeSet::new()))
      .collect();
    let mut grouped: std::collections::BTreeMap<AccountId, BTreeSet<ItemId>> =
      Default::default();
    for (account, item) in rows {
      grouped.entry(AccountId(account)).or_default().insert(ItemId(item));
    }
    for (account, items) in grouped {
      snapshot.replace(account, items);
    }
    Ok(snapshot)
  }

  /// Drop every row and re-create the schema.
  async fn reset(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(
          "DROP TABLE IF EXISTS seen_items; DROP TABLE IF EXISTS accounts;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── StateStore impl ─────────────────────────────────────────────────────────

impl StateStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self) -> Result<StateSnapshot> {
    match self.read_snapshot().await {
      Ok(snapshot) => Ok(snapshot),
      Err(e) => {
        tracing::warn!(error = %e, "state database unreadable; re-initialising empty");
        self.reset().await?;
        Ok(StateSnapshot::new())
      }
    }
  }

  async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
    let rows: Vec<(String, Vec<String>)> = snapshot
      .iter()
      .map(|(account, items)| {
        (
          account.0.clone(),
          items.iter().map(|i| i.0.clone()).collect(),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM seen_items", [])?;
        tx.execute("DELETE FROM accounts", [])?;
        {
          let mut insert_account =
            tx.prepare("INSERT INTO accounts (account_id) VALUES (?1)")?;
          let mut insert_item = tx.prepare(
            "INSERT OR IGNORE INTO seen_items (account_id, item_id) VALUES (?1, ?2)",
          )?;
          for (account, items) in &rows {
            insert_account.execute(rusqlite::params![account])?;
            for item in items {
              insert_item.execute(rusqlite::params![account, item])?;
            }
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
