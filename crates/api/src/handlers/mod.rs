pub mod load_pallets;
