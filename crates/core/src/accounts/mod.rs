//! Accounts module - account kinds shared by ledgers and entries.

mod accounts_model;

pub use accounts_model::AccountKind;
