pub mod error;
pub mod memory;
pub mod postgrest;
pub mod state;
pub mod store;
pub mod supabase;

pub use error::{StoreError, StoreResult};
pub use state::AppState;
