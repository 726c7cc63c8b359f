//! Mirror store adapters

pub mod supabase;

pub use supabase::{SupabaseStore, SupabaseStoreConfig};
