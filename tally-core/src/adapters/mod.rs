//! Adapters - concrete implementations of the ports

pub mod duckdb;
pub mod memory;

pub use duckdb::DuckDbRepository;
pub use memory::MemoryRepository;
