mod cache;
mod gate;
mod identity;
mod middleware;

pub use cache::AdminStatusCache;
pub use gate::{admin_union, resolve_admin};
#[cfg(feature = "dev-bypass")]
pub use identity::dev_bypass;
pub use identity::{IdentityClient, IdentityError};
pub use middleware::{AuthError, RequireAdmin, RequireAuth, extract_bearer_token};
