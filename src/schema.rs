pub const SCHEMA_VERSION: &str = "1";

pub const CREATE_SCHEMA_SQL: &str = r#"
BEGIN TRANSACTION;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');

-- One row per business. Names are case-sensitive and unique.
CREATE TABLE IF NOT EXISTS businesses (
    business_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- One row per uploaded schedule. Rows are never deleted; replacing a schedule
-- clears is_active on the previous generation.
CREATE TABLE IF NOT EXISTS schedule_generations (
    generation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    business_id INTEGER NOT NULL,
    raw_spec TEXT NOT NULL,            -- Schedule text exactly as uploaded
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,       -- Unix timestamp (UTC)
    FOREIGN KEY (business_id) REFERENCES businesses(business_id)
);

-- At most one active generation per business
CREATE UNIQUE INDEX IF NOT EXISTS idx_generations_active
    ON schedule_generations (business_id) WHERE is_active = 1;

CREATE INDEX IF NOT EXISTS idx_generations_business
    ON schedule_generations (business_id, generation_id);

-- Normalized intervals for a generation. Midnight-crossing ranges are already
-- split, so open_secs < close_secs always holds.
CREATE TABLE IF NOT EXISTS schedule_intervals (
    generation_id INTEGER NOT NULL,
    day INTEGER NOT NULL,              -- 0 = Mon ... 6 = Sun
    position INTEGER NOT NULL,         -- Order within the day
    open_secs INTEGER NOT NULL,        -- Seconds from midnight, inclusive
    close_secs INTEGER NOT NULL,       -- Seconds from midnight, exclusive
    PRIMARY KEY (generation_id, day, position),
    FOREIGN KEY (generation_id) REFERENCES schedule_generations(generation_id)
);

COMMIT;
"#;
