//! SQLite schema definition.

/// Storage key of the serialized session record.
pub const SESSION_RECORD_KEY: &str = "auth-storage";

/// Service name of the credential slot holding the bearer token.
pub const TOKEN_CREDENTIAL_SERVICE: &str = "rxorder.auth";

/// Username stored alongside the bearer token in the credential slot.
pub const TOKEN_CREDENTIAL_USERNAME: &str = "jwt";

/// Complete local schema for the client.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Key/value records (serialized client state)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,                          -- JSON document
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Credential slots
-- ============================================================================

CREATE TABLE IF NOT EXISTS credentials (
    service TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    secret TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
