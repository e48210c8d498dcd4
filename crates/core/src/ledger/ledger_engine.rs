//! Ordered, balance-consistent ledger of entries for one account.
//!
//! Entries live in an arena keyed by entry id. A second map orders them by
//! `(posting_date, sequence, entry_id)` ascending; reading that map backwards
//! yields the public layout, most recent first. Among entries sharing a posting
//! date the later insertion is the younger one. The sequence is stored on the
//! entry so a reloaded ledger keeps the same order.
//!
//! Balances start from the opening balance, the oldest entry's value minus its
//! change. Every mutation keeps it and plans the cascading recalculation before
//! committing, so a failing operation leaves the ledger exactly as it was.

use chrono::NaiveDate;
use log::{debug, error, warn};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::ledger_errors::LedgerError;
use super::ledger_model::{DuplicatePolicy, LedgerMutation};
use crate::accounts::AccountKind;
use crate::entries::{Entry, EntryId, EntryUpdate, NewEntry};
use crate::errors::Result;

/// Position of an entry in the sorted index.
type OrderKey = (NaiveDate, u64, EntryId);

fn day_start(date: NaiveDate) -> OrderKey {
    (date, 0, 0)
}

fn day_end(date: NaiveDate) -> OrderKey {
    (date, u64::MAX, EntryId::MAX)
}

fn order_key(entry: &Entry) -> OrderKey {
    (entry.posting_date(), entry.sequence(), entry.entry_id())
}

#[derive(Debug, Clone)]
struct Slot {
    entry: Entry,
    key: OrderKey,
}

/// New values produced by a recalculation pass, oldest first.
type RecalculationPlan = Vec<(EntryId, Decimal)>;

#[derive(Debug, Clone)]
pub struct Ledger {
    account_id: String,
    kind: AccountKind,
    slots: BTreeMap<EntryId, Slot>,
    order: BTreeMap<OrderKey, EntryId>,
    next_seq: u64,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new(account_id: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            account_id: account_id.into(),
            kind,
            slots: BTreeMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Rebuilds a ledger from a repository snapshot.
    ///
    /// Stored values are kept as they are; call [`Ledger::validate`] to check
    /// them or [`Ledger::recalculate_all`] to repair them. Entries sharing a
    /// posting date are ordered by their stored sequence, then by entry id.
    pub fn from_entries(
        account_id: impl Into<String>,
        kind: AccountKind,
        entries: Vec<Entry>,
    ) -> Result<Self> {
        let mut ledger = Self::new(account_id, kind);

        for entry in entries {
            ledger.check_account(entry.account_id())?;
            ledger.check_kind(entry.kind())?;
            if ledger.slots.contains_key(&entry.entry_id()) {
                return Err(LedgerError::DuplicateEntryId(entry.entry_id()).into());
            }
            let key = order_key(&entry);
            ledger.next_seq = ledger.next_seq.max(entry.sequence().saturating_add(1));
            ledger.order.insert(key, entry.entry_id());
            ledger.slots.insert(entry.entry_id(), Slot { entry, key });
        }

        Ok(ledger)
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, entry_id: EntryId) -> Option<&Entry> {
        self.slots.get(&entry_id).map(|slot| &slot.entry)
    }

    /// Entries from the most recent to the oldest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entry> + '_ {
        self.order.values().rev().filter_map(|id| self.get(*id))
    }

    /// Owned copy of the entries, most recent first.
    pub fn to_entries(&self) -> Vec<Entry> {
        self.iter().cloned().collect()
    }

    pub fn get_oldest(&self) -> Option<&Entry> {
        self.order.values().next().and_then(|id| self.get(*id))
    }

    pub fn get_youngest(&self) -> Option<&Entry> {
        self.order.values().next_back().and_then(|id| self.get(*id))
    }

    /// The youngest entry posted on `date`.
    pub fn get_by_date(&self, date: NaiveDate) -> Option<&Entry> {
        self.entries_on(date).next()
    }

    /// Entries posted on `date`, youngest first.
    pub fn entries_on(&self, date: NaiveDate) -> impl Iterator<Item = &Entry> + '_ {
        self.order
            .range(day_start(date)..=day_end(date))
            .rev()
            .filter_map(|(_, id)| self.get(*id))
    }

    /// Entries posted within `[start, end]`, most recent first.
    pub fn entries_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Entry> {
        if start > end {
            return Vec::new();
        }
        self.order
            .range(day_start(start)..=day_end(end))
            .rev()
            .filter_map(|(_, id)| self.get(*id))
            .collect()
    }

    /// The youngest entry posted strictly before `date`.
    pub fn get_next_older_by_date(&self, date: NaiveDate) -> Option<&Entry> {
        self.order
            .range(..day_start(date))
            .next_back()
            .and_then(|(_, id)| self.get(*id))
    }

    /// The oldest entry posted strictly after `date`.
    pub fn get_next_younger_by_date(&self, date: NaiveDate) -> Option<&Entry> {
        self.order
            .range((Bound::Excluded(day_end(date)), Bound::Unbounded))
            .next()
            .and_then(|(_, id)| self.get(*id))
    }

    /// The entry directly older than `entry_id`, honoring same-date tie-breaks.
    pub fn get_next_older(&self, entry_id: EntryId) -> Option<&Entry> {
        let key = self.slots.get(&entry_id)?.key;
        self.order
            .range(..key)
            .next_back()
            .and_then(|(_, id)| self.get(*id))
    }

    /// The entry directly younger than `entry_id`, honoring same-date tie-breaks.
    pub fn get_next_younger(&self, entry_id: EntryId) -> Option<&Entry> {
        let key = self.slots.get(&entry_id)?.key;
        self.order
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .and_then(|(_, id)| self.get(*id))
    }

    /// The entry in force on `date`: the youngest posted on or before it.
    pub fn anchor_at(&self, date: NaiveDate) -> Option<&Entry> {
        self.order
            .range(..=day_end(date))
            .next_back()
            .and_then(|(_, id)| self.get(*id))
    }

    /// An entry with exactly this posting date and change, if any.
    pub fn find_duplicate(&self, posting_date: NaiveDate, value_change: Decimal) -> Option<&Entry> {
        self.entries_on(posting_date)
            .find(|entry| entry.value_change() == value_change)
    }

    pub fn max_entry_id(&self) -> Option<EntryId> {
        self.slots.keys().next_back().copied()
    }

    /// Id the next inserted entry receives: max existing id + 1, or 0.
    pub fn next_entry_id(&self) -> Result<EntryId> {
        match self.max_entry_id() {
            None => Ok(0),
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| LedgerError::IdExhausted.into()),
        }
    }

    /// Inserts an entry, rejecting an exact `(posting_date, value_change)` duplicate.
    pub fn insert(&mut self, candidate: NewEntry) -> Result<LedgerMutation> {
        self.insert_with(candidate, DuplicatePolicy::Reject)
    }

    /// Inserts an entry even when a duplicate exists.
    pub fn force_insert(&mut self, candidate: NewEntry) -> Result<LedgerMutation> {
        self.insert_with(candidate, DuplicatePolicy::Allow)
    }

    pub fn insert_with(
        &mut self,
        candidate: NewEntry,
        policy: DuplicatePolicy,
    ) -> Result<LedgerMutation> {
        candidate.validate()?;
        self.check_account(&candidate.account_id)?;
        self.check_kind(candidate.details.kind())?;

        if policy == DuplicatePolicy::Reject {
            if let Some(existing) =
                self.find_duplicate(candidate.posting_date, candidate.value_change)
            {
                warn!(
                    "Duplicate entry for account {} on {} with change {} (existing entry {})",
                    self.account_id,
                    candidate.posting_date,
                    candidate.value_change,
                    existing.entry_id()
                );
                return Err(LedgerError::DuplicateEntry {
                    posting_date: candidate.posting_date,
                    value_change: candidate.value_change,
                    existing_id: existing.entry_id(),
                }
                .into());
            }
        }

        let entry_id = self.next_entry_id()?;
        let key = (candidate.posting_date, self.next_seq, entry_id);
        let becomes_oldest = self.order.keys().next().map_or(true, |first| key < *first);
        let opening = match candidate.value {
            Some(value) if becomes_oldest => value
                .checked_sub(candidate.value_change)
                .ok_or(LedgerError::Overflow(entry_id))?,
            _ => self.opening_base()?,
        };

        let entry = Entry::new(
            candidate.account_id,
            entry_id,
            candidate.posting_date,
            candidate.value.unwrap_or(candidate.value_change),
            candidate.value_change,
            candidate.details,
        )
        .with_sequence(self.next_seq)
        .with_labels(candidate.labels);

        self.order.insert(key, entry_id);
        self.slots.insert(entry_id, Slot { entry, key });

        let plan = match self.plan_recalculation(key, opening) {
            Ok(plan) => plan,
            Err(err) => {
                error!(
                    "Insert into account {} aborted: {}",
                    self.account_id, err
                );
                self.order.remove(&key);
                self.slots.remove(&entry_id);
                return Err(err);
            }
        };
        self.next_seq += 1;

        debug!(
            "Inserted entry {} into account {} ({} balances recalculated)",
            entry_id,
            self.account_id,
            plan.len()
        );
        self.commit(entry_id, plan)
    }

    /// Edits an entry's date, amount and metadata.
    ///
    /// The entry's own balance first shifts by the difference between the new
    /// and the old change; it is then moved to its new position and every
    /// younger balance is recalculated from the older of the two positions.
    /// A date change makes it the youngest entry of its new date.
    pub fn update(&mut self, entry_id: EntryId, update: EntryUpdate) -> Result<LedgerMutation> {
        update.validate()?;

        let old_slot = self
            .slots
            .get(&entry_id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if let Some(attempted) = update.entry_id {
            if attempted != entry_id {
                error!(
                    "Rejected update of entry {} in account {}: id change to {}",
                    entry_id, self.account_id, attempted
                );
                return Err(LedgerError::IdentityViolation {
                    entry_id,
                    field: "entryId".to_string(),
                }
                .into());
            }
        }
        if let Some(account_id) = &update.account_id {
            if account_id != &self.account_id {
                return Err(LedgerError::IdentityViolation {
                    entry_id,
                    field: "accountId".to_string(),
                }
                .into());
            }
        }
        if let Some(details) = &update.details {
            self.check_kind(details.kind())?;
        }

        let opening = self.opening_base()?;
        let old_entry = &old_slot.entry;
        let shifted_value = update
            .value_change
            .checked_sub(old_entry.value_change())
            .and_then(|delta| old_entry.value().checked_add(delta))
            .ok_or(LedgerError::Overflow(entry_id))?;

        let mut entry = old_entry.clone();
        entry.set_value(shifted_value);
        entry.set_value_change(update.value_change);
        entry.set_posting_date(update.posting_date);
        if let Some(labels) = update.labels {
            entry.set_labels(labels);
        }
        if let Some(details) = update.details {
            entry.set_details(details);
        }

        let new_key = if update.posting_date == old_slot.key.0 {
            old_slot.key
        } else {
            entry.set_sequence(self.next_seq);
            (update.posting_date, self.next_seq, entry_id)
        };

        self.order.remove(&old_slot.key);
        self.order.insert(new_key, entry_id);
        self.slots.insert(entry_id, Slot { entry, key: new_key });

        let from = old_slot.key.min(new_key);
        let plan = match self.plan_recalculation(from, opening) {
            Ok(plan) => plan,
            Err(err) => {
                error!(
                    "Update of entry {} in account {} aborted: {}",
                    entry_id, self.account_id, err
                );
                self.order.remove(&new_key);
                self.order.insert(old_slot.key, entry_id);
                self.slots.insert(entry_id, old_slot);
                return Err(err);
            }
        };
        if new_key != old_slot.key {
            self.next_seq += 1;
        }

        debug!(
            "Updated entry {} in account {} ({} balances recalculated)",
            entry_id,
            self.account_id,
            plan.len()
        );
        self.commit(entry_id, plan)
    }

    /// Deletes an entry; every younger balance loses its change.
    ///
    /// The returned mutation carries the removed entry as `entry`.
    pub fn remove(&mut self, entry_id: EntryId) -> Result<LedgerMutation> {
        let opening = self.opening_base()?;
        let slot = self
            .slots
            .remove(&entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        self.order.remove(&slot.key);

        let plan = match self.plan_recalculation(slot.key, opening) {
            Ok(plan) => plan,
            Err(err) => {
                error!(
                    "Removal of entry {} from account {} aborted: {}",
                    entry_id, self.account_id, err
                );
                self.order.insert(slot.key, entry_id);
                self.slots.insert(entry_id, slot);
                return Err(err);
            }
        };

        debug!(
            "Removed entry {} from account {} ({} balances recalculated)",
            entry_id,
            self.account_id,
            plan.len()
        );
        let recalculated = self.apply_plan(plan);
        Ok(LedgerMutation {
            entry: slot.entry,
            recalculated,
        })
    }

    /// Checks the balance invariant over the whole ledger.
    pub fn validate(&self) -> Result<()> {
        let mut base: Option<Decimal> = None;
        for entry in self.iter().rev() {
            if let Some(older_value) = base {
                let expected = older_value
                    .checked_add(entry.value_change())
                    .ok_or(LedgerError::Overflow(entry.entry_id()))?;
                if expected != entry.value() {
                    return Err(LedgerError::BalanceMismatch {
                        entry_id: entry.entry_id(),
                        expected,
                        actual: entry.value(),
                    }
                    .into());
                }
            }
            base = Some(entry.value());
        }
        Ok(())
    }

    /// Recomputes every balance from the oldest entry forward.
    ///
    /// Returns the entries whose value changed.
    pub fn recalculate_all(&mut self) -> Result<Vec<Entry>> {
        let Some(first) = self.order.keys().next().copied() else {
            return Ok(Vec::new());
        };
        let opening = self.opening_base()?;
        let plan = self.plan_recalculation(first, opening)?;
        Ok(self.apply_plan(plan))
    }

    /// Balance before the oldest entry: its value minus its change, or zero
    /// for an empty ledger.
    pub fn opening_base(&self) -> Result<Decimal> {
        match self.get_oldest() {
            None => Ok(Decimal::ZERO),
            Some(oldest) => oldest
                .value()
                .checked_sub(oldest.value_change())
                .ok_or_else(|| LedgerError::Overflow(oldest.entry_id()).into()),
        }
    }

    /// Walks from `from` toward the most recent end computing new balances.
    ///
    /// The base is the nearest entry strictly older than `from`, or `opening`
    /// when there is none.
    fn plan_recalculation(&self, from: OrderKey, opening: Decimal) -> Result<RecalculationPlan> {
        let mut base = self
            .order
            .range(..from)
            .next_back()
            .and_then(|(_, id)| self.get(*id))
            .map_or(opening, Entry::value);

        let mut plan = Vec::new();
        for (_, id) in self.order.range(from..) {
            let entry = self.get(*id).ok_or(LedgerError::EntryNotFound(*id))?;
            let value = base
                .checked_add(entry.value_change())
                .ok_or(LedgerError::Overflow(*id))?;
            if value != entry.value() {
                plan.push((*id, value));
            }
            base = value;
        }
        Ok(plan)
    }

    fn apply_plan(&mut self, plan: RecalculationPlan) -> Vec<Entry> {
        let mut changed = Vec::with_capacity(plan.len());
        for (id, value) in plan {
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.entry.set_value(value);
                changed.push(slot.entry.clone());
            }
        }
        changed
    }

    fn commit(&mut self, entry_id: EntryId, plan: RecalculationPlan) -> Result<LedgerMutation> {
        let recalculated = self
            .apply_plan(plan)
            .into_iter()
            .filter(|entry| entry.entry_id() != entry_id)
            .collect();
        let entry = self
            .get(entry_id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        Ok(LedgerMutation {
            entry,
            recalculated,
        })
    }

    fn check_account(&self, account_id: &str) -> Result<()> {
        if account_id != self.account_id {
            return Err(LedgerError::AccountMismatch {
                expected: self.account_id.clone(),
                found: account_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn check_kind(&self, kind: AccountKind) -> Result<()> {
        if kind != self.kind {
            return Err(LedgerError::KindMismatch {
                expected: self.kind,
                found: kind,
            }
            .into());
        }
        Ok(())
    }
}
