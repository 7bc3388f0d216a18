pub const SCHEMA: &str = r#"
-- Profiles mirror identities resolved by the external auth provider.
-- is_admin is one of three independent admin-membership sources.
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Admin allowlist: the second admin-membership source, independent of the
-- profile flag and the deploy-time env list.
CREATE TABLE IF NOT EXISTS admin_emails (
    email TEXT COLLATE NOCASE PRIMARY KEY,
    added_by TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Saved designs
CREATE TABLE IF NOT EXISTS designs (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    prompt TEXT NOT NULL,
    code TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Metadata for uploaded JSONL knowledge objects. object_path is the
-- content-addressed location in the knowledge object store.
CREATE TABLE IF NOT EXISTS knowledge_assets (
    id TEXT PRIMARY KEY,
    object_path TEXT NOT NULL UNIQUE,
    filename TEXT NOT NULL,
    asset_type TEXT NOT NULL DEFAULT 'admin-upload',
    size_bytes INTEGER NOT NULL,
    content_type TEXT,
    uploaded_by TEXT,
    training_tagged INTEGER NOT NULL DEFAULT 0,  -- included in generation sampling when 1
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_designs_owner ON designs(owner_id);
CREATE INDEX IF NOT EXISTS idx_assets_training ON knowledge_assets(training_tagged, created_at);
"#;
