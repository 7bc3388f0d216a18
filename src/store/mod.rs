mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Emails are compared case-insensitively throughout (enforced by the
/// schema's NOCASE collation); callers still pass normalized lowercase.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Profile operations. Profiles are provisioned on first authenticated
    // request from the identity the external provider resolved.
    fn upsert_profile(&self, id: &str, email: &str) -> Result<()>;
    fn get_profile(&self, id: &str) -> Result<Option<Profile>>;
    fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>>;
    /// Sets the profile admin flag. Returns false when no profile has that
    /// email.
    fn set_profile_admin(&self, email: &str, is_admin: bool) -> Result<bool>;
    fn is_profile_admin(&self, email: &str) -> Result<bool>;
    fn list_admin_profiles(&self) -> Result<Vec<Profile>>;

    // Admin allowlist operations. Additive inserts are idempotent.
    /// Returns false when the email was already present.
    fn add_admin_email(&self, email: &str, added_by: Option<&str>) -> Result<bool>;
    fn remove_admin_email(&self, email: &str) -> Result<bool>;
    fn is_admin_email(&self, email: &str) -> Result<bool>;
    fn list_admin_emails(&self) -> Result<Vec<String>>;

    // Design operations (owner-scoped)
    fn create_design(&self, design: &Design) -> Result<()>;
    fn get_design(&self, id: &str) -> Result<Option<Design>>;
    fn list_designs(&self, owner_id: &str) -> Result<Vec<Design>>;
    fn update_design(&self, design: &Design) -> Result<()>;
    fn delete_design(&self, id: &str, owner_id: &str) -> Result<bool>;

    // Knowledge asset operations. Upserts are keyed by the unique
    // content-addressed object path, so re-registering the same object is a
    // no-op that returns the existing row.
    fn upsert_knowledge_asset(&self, asset: &KnowledgeAsset) -> Result<KnowledgeAsset>;
    fn get_knowledge_asset(&self, id: &str) -> Result<Option<KnowledgeAsset>>;
    fn list_knowledge_assets(&self) -> Result<Vec<KnowledgeAsset>>;
    /// Training-tagged assets, newest first.
    fn list_training_assets(&self, limit: i64) -> Result<Vec<KnowledgeAsset>>;
    fn set_asset_training(&self, id: &str, enabled: bool) -> Result<bool>;
}
