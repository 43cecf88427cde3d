// src/lookup/sources/mod.rs
pub mod barcode_lookup;
pub mod national;
pub mod open_food_facts;
pub mod upc_item_db;

pub use barcode_lookup::BarcodeLookupSource;
pub use national::NationalDbSource;
pub use open_food_facts::OpenFoodFactsSource;
pub use upc_item_db::UpcItemDbSource;
