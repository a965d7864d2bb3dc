/// Persisted match document and migration.
pub mod document;
/// Single-slot persistence backends.
pub mod slot_store;
/// Storage abstraction layer shared by the backends.
pub mod storage;
