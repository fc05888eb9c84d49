//! # Storage Module
//!
//! Everything that talks to the remote data store.
//!
//! ## Layout
//!
//! - **traits**: the slice of the store's API the backend consumes
//!   (authentication plus table-scoped select/insert/update)
//! - **supabase**: HTTP implementation against a hosted Supabase project
//! - **memory**: process-local implementation with failure injection
//! - **record_repository**: typed per-collection operations built on the traits
//!
//! Nothing here validates user input; that belongs to the domain layer.

pub mod memory;
pub mod record_repository;
pub mod supabase;
pub mod traits;

pub use memory::MemoryStore;
pub use record_repository::{RecordKind, RecordRepository, StoredFields};
pub use supabase::SupabaseStore;
pub use traits::{AuthGrant, AuthProvider, RemoteStore, TableStore};
