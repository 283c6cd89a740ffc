pub mod data;
pub mod listing;
pub mod settings;
pub mod store;
pub mod validation;
