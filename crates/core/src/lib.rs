//! FleetFlow domain core.
//!
//! Pure domain logic shared by the storage and API layers: the error
//! taxonomy, common type aliases, and the load/pallet tracking rules
//! (pallet-ID validation, status derivation, completion math). Nothing in
//! this crate performs I/O.

pub mod error;
pub mod load_pallet;
pub mod types;
