use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        email: row.get(1)?,
        is_admin: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn design_from_row(row: &Row<'_>) -> rusqlite::Result<Design> {
    Ok(Design {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        prompt: row.get(3)?,
        code: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<KnowledgeAsset> {
    Ok(KnowledgeAsset {
        id: row.get(0)?,
        object_path: row.get(1)?,
        filename: row.get(2)?,
        asset_type: row.get(3)?,
        size_bytes: row.get(4)?,
        content_type: row.get(5)?,
        uploaded_by: row.get(6)?,
        training_tagged: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

const PROFILE_COLS: &str = "id, email, is_admin, created_at, updated_at";
const DESIGN_COLS: &str = "id, owner_id, name, prompt, code, created_at, updated_at";
const ASSET_COLS: &str = "id, object_path, filename, asset_type, size_bytes, content_type, \
                          uploaded_by, training_tagged, created_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Profile operations

    fn upsert_profile(&self, id: &str, email: &str) -> Result<()> {
        let now = format_datetime(&Utc::now());
        self.conn().execute(
            "INSERT INTO profiles (id, email, is_admin, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?3)
             ON CONFLICT(id) DO UPDATE SET email = excluded.email, updated_at = excluded.updated_at",
            params![id, email, now],
        )?;
        Ok(())
    }

    fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROFILE_COLS} FROM profiles WHERE id = ?1"),
            params![id],
            profile_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROFILE_COLS} FROM profiles WHERE email = ?1"),
            params![email],
            profile_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn set_profile_admin(&self, email: &str, is_admin: bool) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE profiles SET is_admin = ?2, updated_at = ?3 WHERE email = ?1",
            params![email, is_admin, format_datetime(&Utc::now())],
        )?;
        Ok(changed > 0)
    }

    fn is_profile_admin(&self, email: &str) -> Result<bool> {
        let conn = self.conn();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM profiles WHERE email = ?1 AND is_admin = 1)",
            params![email],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn list_admin_profiles(&self) -> Result<Vec<Profile>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROFILE_COLS} FROM profiles WHERE is_admin = 1 ORDER BY email"
        ))?;
        let profiles = stmt
            .query_map([], profile_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }

    // Admin allowlist operations

    fn add_admin_email(&self, email: &str, added_by: Option<&str>) -> Result<bool> {
        let inserted = self.conn().execute(
            "INSERT INTO admin_emails (email, added_by, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO NOTHING",
            params![email, added_by, format_datetime(&Utc::now())],
        )?;
        Ok(inserted > 0)
    }

    fn remove_admin_email(&self, email: &str) -> Result<bool> {
        let removed = self
            .conn()
            .execute("DELETE FROM admin_emails WHERE email = ?1", params![email])?;
        Ok(removed > 0)
    }

    fn is_admin_email(&self, email: &str) -> Result<bool> {
        let conn = self.conn();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM admin_emails WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn list_admin_emails(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT email FROM admin_emails ORDER BY email")?;
        let emails = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(emails)
    }

    // Design operations

    fn create_design(&self, design: &Design) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO designs ({DESIGN_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                design.id,
                design.owner_id,
                design.name,
                design.prompt,
                design.code,
                format_datetime(&design.created_at),
                format_datetime(&design.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_design(&self, id: &str) -> Result<Option<Design>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {DESIGN_COLS} FROM designs WHERE id = ?1"),
            params![id],
            design_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_designs(&self, owner_id: &str) -> Result<Vec<Design>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DESIGN_COLS} FROM designs WHERE owner_id = ?1
             ORDER BY updated_at DESC, rowid DESC"
        ))?;
        let designs = stmt
            .query_map(params![owner_id], design_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(designs)
    }

    fn update_design(&self, design: &Design) -> Result<()> {
        self.conn().execute(
            "UPDATE designs SET name = ?2, prompt = ?3, code = ?4, updated_at = ?5 WHERE id = ?1",
            params![
                design.id,
                design.name,
                design.prompt,
                design.code,
                format_datetime(&design.updated_at),
            ],
        )?;
        Ok(())
    }

    fn delete_design(&self, id: &str, owner_id: &str) -> Result<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM designs WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(deleted > 0)
    }

    // Knowledge asset operations

    fn upsert_knowledge_asset(&self, asset: &KnowledgeAsset) -> Result<KnowledgeAsset> {
        let conn = self.conn();
        conn.execute(
            &format!(
                "INSERT INTO knowledge_assets ({ASSET_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(object_path) DO UPDATE SET
                     filename = excluded.filename,
                     asset_type = excluded.asset_type,
                     size_bytes = excluded.size_bytes,
                     content_type = excluded.content_type,
                     uploaded_by = excluded.uploaded_by,
                     training_tagged = excluded.training_tagged"
            ),
            params![
                asset.id,
                asset.object_path,
                asset.filename,
                asset.asset_type,
                asset.size_bytes,
                asset.content_type,
                asset.uploaded_by,
                asset.training_tagged,
                format_datetime(&asset.created_at),
            ],
        )?;

        // The stored row keeps its original id when the object was already
        // registered; return what the database actually holds.
        conn.query_row(
            &format!("SELECT {ASSET_COLS} FROM knowledge_assets WHERE object_path = ?1"),
            params![asset.object_path],
            asset_from_row,
        )
        .map_err(Error::from)
    }

    fn get_knowledge_asset(&self, id: &str) -> Result<Option<KnowledgeAsset>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ASSET_COLS} FROM knowledge_assets WHERE id = ?1"),
            params![id],
            asset_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_knowledge_assets(&self) -> Result<Vec<KnowledgeAsset>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ASSET_COLS} FROM knowledge_assets ORDER BY created_at DESC, rowid DESC"
        ))?;
        let assets = stmt
            .query_map([], asset_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assets)
    }

    fn list_training_assets(&self, limit: i64) -> Result<Vec<KnowledgeAsset>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ASSET_COLS} FROM knowledge_assets WHERE training_tagged = 1
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;
        let assets = stmt
            .query_map(params![limit], asset_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assets)
    }

    fn set_asset_training(&self, id: &str, enabled: bool) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE knowledge_assets SET training_tagged = ?2 WHERE id = ?1",
            params![id, enabled],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn test_asset(object_path: &str) -> KnowledgeAsset {
        KnowledgeAsset {
            id: uuid::Uuid::new_v4().to_string(),
            object_path: object_path.to_string(),
            filename: "examples.jsonl".to_string(),
            asset_type: "admin-upload".to_string(),
            size_bytes: 128,
            content_type: Some("application/jsonl".to_string()),
            uploaded_by: Some("admin@example.com".to_string()),
            training_tagged: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"profiles".to_string()));
        assert!(tables.contains(&"admin_emails".to_string()));
        assert!(tables.contains(&"designs".to_string()));
        assert!(tables.contains(&"knowledge_assets".to_string()));
    }

    #[test]
    fn test_upsert_profile_is_stable() {
        let (_temp, store) = test_store();

        store.upsert_profile("user-1", "user@example.com").unwrap();
        store.upsert_profile("user-1", "renamed@example.com").unwrap();

        let profile = store.get_profile("user-1").unwrap().unwrap();
        assert_eq!(profile.email, "renamed@example.com");
        assert!(!profile.is_admin);
    }

    #[test]
    fn test_add_admin_email_idempotent() {
        let (_temp, store) = test_store();

        assert!(store.add_admin_email("ops@example.com", None).unwrap());
        assert!(!store.add_admin_email("ops@example.com", None).unwrap());

        assert_eq!(store.list_admin_emails().unwrap().len(), 1);
        assert!(store.is_admin_email("ops@example.com").unwrap());

        assert!(store.remove_admin_email("ops@example.com").unwrap());
        assert!(!store.remove_admin_email("ops@example.com").unwrap());
        assert!(!store.is_admin_email("ops@example.com").unwrap());
    }

    #[test]
    fn test_admin_email_case_insensitive() {
        let (_temp, store) = test_store();

        store.add_admin_email("Mixed@Example.COM", None).unwrap();
        assert!(store.is_admin_email("mixed@example.com").unwrap());
        assert!(!store.add_admin_email("MIXED@EXAMPLE.COM", None).unwrap());
    }

    #[test]
    fn test_set_profile_admin() {
        let (_temp, store) = test_store();

        // No profile yet: nothing to flag.
        assert!(!store.set_profile_admin("user@example.com", true).unwrap());

        store.upsert_profile("user-1", "user@example.com").unwrap();
        assert!(store.set_profile_admin("User@Example.com", true).unwrap());
        assert!(store.is_profile_admin("user@example.com").unwrap());

        // Re-promoting stays true and succeeds.
        assert!(store.set_profile_admin("user@example.com", true).unwrap());
        assert!(store.is_profile_admin("user@example.com").unwrap());

        assert!(store.set_profile_admin("user@example.com", false).unwrap());
        assert!(!store.is_profile_admin("user@example.com").unwrap());
    }

    #[test]
    fn test_design_crud() {
        let (_temp, store) = test_store();
        store.upsert_profile("user-1", "user@example.com").unwrap();

        let now = Utc::now();
        let design = Design {
            id: "design-1".to_string(),
            owner_id: "user-1".to_string(),
            name: "bracket".to_string(),
            prompt: "a mounting bracket".to_string(),
            code: "module bracket() {}".to_string(),
            created_at: now,
            updated_at: now,
        };
        store.create_design(&design).unwrap();

        let fetched = store.get_design("design-1").unwrap().unwrap();
        assert_eq!(fetched.name, "bracket");

        let mut updated = fetched.clone();
        updated.code = "module bracket(w=10) {}".to_string();
        updated.updated_at = Utc::now();
        store.update_design(&updated).unwrap();
        let fetched = store.get_design("design-1").unwrap().unwrap();
        assert_eq!(fetched.code, "module bracket(w=10) {}");

        assert_eq!(store.list_designs("user-1").unwrap().len(), 1);
        assert!(store.list_designs("user-2").unwrap().is_empty());

        // Owner scoping on delete.
        assert!(!store.delete_design("design-1", "user-2").unwrap());
        assert!(store.delete_design("design-1", "user-1").unwrap());
        assert!(store.get_design("design-1").unwrap().is_none());
    }

    #[test]
    fn test_asset_upsert_keyed_by_object_path() {
        let (_temp, store) = test_store();

        let first = store.upsert_knowledge_asset(&test_asset("objects/aa/abc")).unwrap();
        let second = store.upsert_knowledge_asset(&test_asset("objects/aa/abc")).unwrap();

        // Same object path: the original row (and id) survives.
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_knowledge_assets().unwrap().len(), 1);

        let other = store.upsert_knowledge_asset(&test_asset("objects/bb/def")).unwrap();
        assert_ne!(other.id, first.id);
        assert_eq!(store.list_knowledge_assets().unwrap().len(), 2);
    }

    #[test]
    fn test_training_asset_listing() {
        let (_temp, store) = test_store();

        let a = store.upsert_knowledge_asset(&test_asset("objects/aa/a")).unwrap();
        let b = store.upsert_knowledge_asset(&test_asset("objects/bb/b")).unwrap();
        store.upsert_knowledge_asset(&test_asset("objects/cc/c")).unwrap();

        assert!(store.list_training_assets(5).unwrap().is_empty());

        assert!(store.set_asset_training(&a.id, true).unwrap());
        assert!(store.set_asset_training(&b.id, true).unwrap());
        assert!(!store.set_asset_training("no-such-id", true).unwrap());

        let tagged = store.list_training_assets(5).unwrap();
        assert_eq!(tagged.len(), 2);
        assert!(tagged.iter().all(|asset| asset.training_tagged));

        assert_eq!(store.list_training_assets(1).unwrap().len(), 1);

        assert!(store.set_asset_training(&a.id, false).unwrap());
        assert_eq!(store.list_training_assets(5).unwrap().len(), 1);
    }
}
