//! SQL schema for the Questline SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Accounts ────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    pen_name      TEXT NOT NULL,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,   -- SHA-256 hex of the bearer token
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- ── Progression ─────────────────────────────────────────────────────────────

-- `level` is not stored: it is always derived from `xp` on read.
-- `xp` is only ever changed by `xp = MAX(0, xp + ?)`.
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id             TEXT PRIMARY KEY REFERENCES users(user_id),
    xp                  INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
    daily_streak        INTEGER NOT NULL DEFAULT 0,
    last_active_on      TEXT,            -- YYYY-MM-DD
    tech_tier           TEXT NOT NULL DEFAULT 'beginner',
    interests           TEXT NOT NULL DEFAULT '[]',
    badges              TEXT NOT NULL DEFAULT '[]',
    learning_pace       TEXT,
    learning_style      TEXT,
    bio                 TEXT,
    onboarding_complete INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

-- Append-only record of every applied XP award.
CREATE TABLE IF NOT EXISTS xp_ledger (
    entry_id    TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    amount      INTEGER NOT NULL,
    source_kind TEXT NOT NULL,      -- content kind or 'bonus'
    source_id   TEXT,
    recorded_at TEXT NOT NULL
);

-- ── Catalog ─────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS arenas (
    arena_id    TEXT PRIMARY KEY,
    slug        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    icon        TEXT
);

CREATE TABLE IF NOT EXISTS challenges (
    challenge_id TEXT PRIMARY KEY,
    arena_id     TEXT REFERENCES arenas(arena_id),
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    difficulty   TEXT NOT NULL,
    xp_reward    INTEGER NOT NULL,
    language     TEXT NOT NULL,
    starter_code TEXT,
    test_cases   TEXT NOT NULL DEFAULT '[]',
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quests (
    quest_id    TEXT PRIMARY KEY,
    arena_id    TEXT REFERENCES arenas(arena_id),
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    period      TEXT NOT NULL,      -- 'daily' | 'weekly' | 'monthly'
    target      INTEGER NOT NULL CHECK (target > 0),
    xp_reward   INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    arena_id    TEXT REFERENCES arenas(arena_id),
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    difficulty  TEXT NOT NULL,
    xp_reward   INTEGER NOT NULL,
    lessons     TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS roadmaps (
    roadmap_id      TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL,
    difficulty      TEXT NOT NULL,
    xp_reward       INTEGER NOT NULL,
    estimated_weeks INTEGER NOT NULL,
    milestones      TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mentors (
    mentor_id TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    expertise TEXT NOT NULL DEFAULT '[]',
    bio       TEXT NOT NULL,
    rating    REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id      TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,     -- 'feed' | 'news'
    title        TEXT NOT NULL,
    body         TEXT NOT NULL,
    author       TEXT NOT NULL,
    tags         TEXT NOT NULL DEFAULT '[]',
    published_at TEXT NOT NULL
);

-- ── Activity ────────────────────────────────────────────────────────────────
-- One row per (user, content) pair; no row means not assigned.

CREATE TABLE IF NOT EXISTS user_challenges (
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    challenge_id TEXT NOT NULL REFERENCES challenges(challenge_id),
    status       TEXT NOT NULL,     -- 'in_progress' | 'completed'
    attempts     INTEGER NOT NULL DEFAULT 0,
    best_score   INTEGER,
    last_score   INTEGER,
    last_code    TEXT,
    started_at   TEXT NOT NULL,
    completed_at TEXT,
    PRIMARY KEY (user_id, challenge_id)
);

CREATE TABLE IF NOT EXISTS user_quests (
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    quest_id     TEXT NOT NULL REFERENCES quests(quest_id),
    status       TEXT NOT NULL,
    progress     INTEGER NOT NULL DEFAULT 0,
    target       INTEGER NOT NULL,
    assigned_at  TEXT NOT NULL,
    completed_at TEXT,
    PRIMARY KEY (user_id, quest_id)
);

CREATE TABLE IF NOT EXISTS user_courses (
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    course_id    TEXT NOT NULL REFERENCES courses(course_id),
    status       TEXT NOT NULL,
    progress     INTEGER NOT NULL DEFAULT 0,
    started_at   TEXT NOT NULL,
    completed_at TEXT,
    PRIMARY KEY (user_id, course_id)
);

CREATE TABLE IF NOT EXISTS user_roadmaps (
    user_id              TEXT NOT NULL REFERENCES users(user_id),
    roadmap_id           TEXT NOT NULL REFERENCES roadmaps(roadmap_id),
    status               TEXT NOT NULL,
    completed_milestones TEXT NOT NULL DEFAULT '[]',
    milestone_count      INTEGER NOT NULL,
    started_at           TEXT NOT NULL,
    completed_at         TEXT,
    PRIMARY KEY (user_id, roadmap_id)
);

-- ── Social ──────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS messages (
    message_id  TEXT PRIMARY KEY,
    sender_id   TEXT NOT NULL REFERENCES users(user_id),
    receiver_id TEXT NOT NULL REFERENCES users(user_id),
    content     TEXT NOT NULL,
    is_read     INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clans (
    clan_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    description TEXT NOT NULL,
    owner_id    TEXT NOT NULL REFERENCES users(user_id),
    max_members INTEGER NOT NULL CHECK (max_members > 0),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clan_members (
    clan_id   TEXT NOT NULL REFERENCES clans(clan_id),
    user_id   TEXT NOT NULL REFERENCES users(user_id),
    role      TEXT NOT NULL,        -- 'leader' | 'member'
    joined_at TEXT NOT NULL,
    PRIMARY KEY (clan_id, user_id)
);

CREATE INDEX IF NOT EXISTS sessions_user_idx        ON sessions(user_id);
CREATE INDEX IF NOT EXISTS xp_ledger_recorded_idx   ON xp_ledger(recorded_at);
CREATE INDEX IF NOT EXISTS challenges_arena_idx     ON challenges(arena_id);
CREATE INDEX IF NOT EXISTS posts_kind_idx           ON posts(kind, published_at);
CREATE INDEX IF NOT EXISTS user_challenges_done_idx ON user_challenges(status, completed_at);
CREATE INDEX IF NOT EXISTS messages_pair_idx        ON messages(sender_id, receiver_id, created_at);
CREATE INDEX IF NOT EXISTS messages_receiver_idx    ON messages(receiver_id, is_read);

PRAGMA user_version = 1;
";
