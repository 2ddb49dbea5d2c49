// Job application records: typed model, validation boundary, repository
// backends, list queries and the CRUD handlers.

pub mod handlers;
pub mod models;
pub mod query;
pub mod store;
pub mod validation;

pub use store::{JobRepository, JsonFileJobStore, MemoryJobStore};
