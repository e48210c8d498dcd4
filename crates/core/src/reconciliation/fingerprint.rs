//! Fingerprints for exact duplicate detection.
//!
//! Two records share a fingerprint when they agree on account, posting date,
//! amount and (for stock entries) ticker. Amounts are normalized first so that
//! `10` and `10.00` hash alike. Each field is length-prefixed, so no account
//! or ticker text can shift bytes into a neighbouring field.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::entries::{Entry, EntryId};

/// Computes the duplicate fingerprint of a posting.
pub fn compute_fingerprint(
    account_id: &str,
    posting_date: NaiveDate,
    value_change: Decimal,
    ticker: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, account_id.as_bytes());
    update_field(&mut hasher, posting_date.format("%Y-%m-%d").to_string().as_bytes());
    update_field(&mut hasher, normalize_decimal(value_change).as_bytes());
    match ticker {
        Some(ticker) => {
            hasher.update([1u8]);
            update_field(&mut hasher, normalize_ticker(ticker).as_bytes());
        }
        None => hasher.update([0u8]),
    }

    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Canonical ticker form used by both fingerprints and fuzzy matching.
pub(crate) fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

pub fn entry_fingerprint(entry: &Entry) -> String {
    compute_fingerprint(
        entry.account_id(),
        entry.posting_date(),
        entry.value_change(),
        entry.details().ticker(),
    )
}

/// Remove trailing zeros for consistent hashing
fn normalize_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}

/// Entry ids grouped by fingerprint.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    entries: HashMap<String, Vec<EntryId>>,
}

impl FingerprintIndex {
    pub fn build<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.add(entry);
        }
        index
    }

    pub fn add(&mut self, entry: &Entry) {
        self.entries
            .entry(entry_fingerprint(entry))
            .or_default()
            .push(entry.entry_id());
    }

    /// Ids of every entry with this fingerprint, in the order they were added.
    pub fn get(&self, fingerprint: &str) -> &[EntryId] {
        self.entries
            .get(fingerprint)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
