//! Driven adapters: the PostgreSQL container and in-memory repositories.

pub mod memory;
pub mod persistence;

pub use memory::InMemoryTaskRepository;
