pub mod activity;
pub mod settings;
pub mod store;
