pub const SCHEMA: &str = r#"
-- Users are keyed by username; report_key is the normalized username and
-- names exactly one owner
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    report_key TEXT NOT NULL UNIQUE,
    email TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Open set of role strings; only 'admin' is consumed today
CREATE TABLE IF NOT EXISTS user_roles (
    username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
    role TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (username, role)
);

-- Explicit report access grants, on top of ownership and admin rights
CREATE TABLE IF NOT EXISTS report_access (
    report_key TEXT NOT NULL,           -- normalized
    username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
    granted_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (report_key, username)
);

-- Comment threads on a report's milestones and signals
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    report_key TEXT NOT NULL,
    track_id TEXT NOT NULL,
    milestone INTEGER NOT NULL,
    signal_index INTEGER,               -- NULL = milestone-level comment
    author TEXT NOT NULL,
    text TEXT NOT NULL,
    parent_id TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Per-report milestone level, one row per track
CREATE TABLE IF NOT EXISTS report_milestones (
    report_key TEXT NOT NULL,
    track_id TEXT NOT NULL,
    milestone INTEGER NOT NULL,
    updated_at TEXT DEFAULT (datetime('now')),
    updated_by TEXT NOT NULL,
    PRIMARY KEY (report_key, track_id)
);

-- Archived flags per (track, milestone)
CREATE TABLE IF NOT EXISTS archived (
    report_key TEXT NOT NULL,
    track_id TEXT NOT NULL,
    milestone TEXT NOT NULL,
    value INTEGER NOT NULL,
    archived_at TEXT DEFAULT (datetime('now')),
    archived_by TEXT NOT NULL,
    PRIMARY KEY (report_key, track_id, milestone)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_user_roles_role ON user_roles(role);
CREATE INDEX IF NOT EXISTS idx_report_access_user ON report_access(username);
CREATE INDEX IF NOT EXISTS idx_comments_report_key ON comments(report_key);
CREATE INDEX IF NOT EXISTS idx_comments_track_milestone ON comments(track_id, milestone);
CREATE INDEX IF NOT EXISTS idx_archived_report_key ON archived(report_key);
"#;
