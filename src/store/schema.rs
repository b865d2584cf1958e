pub const SCHEMA: &str = r#"
-- Users are the owning principals for tokens and meetings
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,    -- identity; immutable after creation
    name TEXT,
    image_url TEXT,
    hashed_password TEXT NOT NULL, -- argon2id hash with embedded salt
    max_concurrent_meetings INTEGER NOT NULL DEFAULT 1,
    data TEXT NOT NULL DEFAULT '{}',  -- JSON metadata; reserved key: webhook_url
    created_at TEXT DEFAULT (datetime('now'))
);

-- Tokens are auth credentials; every token belongs to a user
CREATE TABLE IF NOT EXISTS api_tokens (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    token TEXT NOT NULL,           -- opaque random value, globally unique
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Meetings are written by the rest of the platform; this service reads them
CREATE TABLE IF NOT EXISTS meetings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    platform TEXT NOT NULL,
    native_meeting_id TEXT,
    status TEXT NOT NULL DEFAULT 'requested',
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_api_tokens_token ON api_tokens(token);
CREATE INDEX IF NOT EXISTS idx_api_tokens_user ON api_tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_meetings_user ON meetings(user_id);
CREATE INDEX IF NOT EXISTS idx_meetings_user_status ON meetings(user_id, status);
"#;
