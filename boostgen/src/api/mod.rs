pub mod config;
pub mod decl;
pub mod destination;
pub mod filter;
pub mod generator;
pub mod header;
pub mod record;
