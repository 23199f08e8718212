pub mod backend;
pub mod error;
pub mod provider;
pub mod store;
pub mod supabase;
pub mod types;

pub use backend::BackendClient;
pub use error::{ProviderError, ProviderResult};
pub use provider::IdentityProvider;
pub use store::{StoredAuth, TokenStore};
pub use supabase::SupabaseAuth;
pub use types::*;
