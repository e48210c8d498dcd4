use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::ledger_model::EntryChangeSet;
use super::ledger_traits::EntryRepositoryTrait;
use crate::accounts::AccountKind;
use crate::entries::{Entry, EntryId};
use crate::errors::{DatabaseError, Error, Result};

#[derive(Debug)]
struct StoredAccount {
    kind: AccountKind,
    entries: BTreeMap<EntryId, Entry>,
}

/// Entry repository kept entirely in memory.
///
/// Useful for tests and for hosts that persist ledgers by other means.
#[derive(Debug, Default)]
pub struct InMemoryEntryRepository {
    accounts: RwLock<HashMap<String, StoredAccount>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account, keeping its entries if it already exists.
    pub fn add_account(&self, account_id: &str, kind: AccountKind) -> Result<()> {
        let mut accounts = self.write()?;
        accounts
            .entry(account_id.to_string())
            .or_insert_with(|| StoredAccount {
                kind,
                entries: BTreeMap::new(),
            });
        Ok(())
    }

    /// Stores entries as they are, without any recalculation.
    pub fn seed_entries(&self, account_id: &str, entries: Vec<Entry>) -> Result<()> {
        let mut accounts = self.write()?;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| account_not_found(account_id))?;
        for entry in entries {
            account.entries.insert(entry.entry_id(), entry);
        }
        Ok(())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, StoredAccount>>> {
        self.accounts
            .read()
            .map_err(|e| Error::Repository(format!("Entry store lock poisoned: {}", e)))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, StoredAccount>>> {
        self.accounts
            .write()
            .map_err(|e| Error::Repository(format!("Entry store lock poisoned: {}", e)))
    }

    fn with_account<T>(
        &self,
        account_id: &str,
        f: impl FnOnce(&StoredAccount) -> Result<T>,
    ) -> Result<T> {
        let accounts = self.read()?;
        let account = accounts
            .get(account_id)
            .ok_or_else(|| account_not_found(account_id))?;
        f(account)
    }
}

fn account_not_found(account_id: &str) -> Error {
    Error::Database(DatabaseError::NotFound(format!(
        "Account {} not found",
        account_id
    )))
}

#[async_trait]
impl EntryRepositoryTrait for InMemoryEntryRepository {
    fn get_account_kind(&self, account_id: &str) -> Result<AccountKind> {
        self.with_account(account_id, |account| Ok(account.kind))
    }

    fn load_entries(
        &self,
        account_id: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Entry>> {
        self.with_account(account_id, |account| {
            Ok(account
                .entries
                .values()
                .filter(|entry| match range {
                    Some((start, end)) => {
                        entry.posting_date() >= start && entry.posting_date() <= end
                    }
                    None => true,
                })
                .cloned()
                .collect())
        })
    }

    fn get_entry(&self, account_id: &str, entry_id: EntryId) -> Result<Entry> {
        self.with_account(account_id, |account| {
            account.entries.get(&entry_id).cloned().ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!(
                    "Entry {} of account {} not found",
                    entry_id, account_id
                )))
            })
        })
    }

    fn get_next_older_by_date(&self, account_id: &str, date: NaiveDate) -> Result<Option<Entry>> {
        self.with_account(account_id, |account| {
            Ok(account
                .entries
                .values()
                .filter(|entry| entry.posting_date() < date)
                .max_by_key(|entry| (entry.posting_date(), entry.entry_id()))
                .cloned())
        })
    }

    fn get_next_younger_by_date(
        &self,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Entry>> {
        self.with_account(account_id, |account| {
            Ok(account
                .entries
                .values()
                .filter(|entry| entry.posting_date() > date)
                .min_by_key(|entry| (entry.posting_date(), entry.entry_id()))
                .cloned())
        })
    }

    fn get_max_entry_id(&self, account_id: &str) -> Result<Option<EntryId>> {
        self.with_account(account_id, |account| {
            Ok(account.entries.keys().next_back().copied())
        })
    }

    async fn apply_changes(&self, changes: EntryChangeSet) -> Result<()> {
        let mut accounts = self.write()?;
        let account = accounts
            .get_mut(&changes.account_id)
            .ok_or_else(|| account_not_found(&changes.account_id))?;

        for entry_id in &changes.deletions {
            account.entries.remove(entry_id);
        }
        for entry in changes.upserts {
            account.entries.insert(entry.entry_id(), entry);
        }
        Ok(())
    }
}
