pub mod auth;
pub mod background;
pub mod catalog;
pub mod identity;
pub mod ingest;
pub mod store;
