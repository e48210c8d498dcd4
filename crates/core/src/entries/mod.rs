//! Entries module - posted transactions and their kind-specific details.

mod entries_model;


pub use entries_model::{
    BondHolding, CurrencyDetails, Entry, EntryDetails, EntryId, EntryUpdate, NewEntry,
    StockDetails,
};
