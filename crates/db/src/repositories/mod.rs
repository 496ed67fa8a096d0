//! Repository layer: one repository per collection.

pub mod load_pallet_repo;

pub use load_pallet_repo::LoadPalletRepo;
