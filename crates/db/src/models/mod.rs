//! Storage models and request DTOs.

pub mod load_pallet;
