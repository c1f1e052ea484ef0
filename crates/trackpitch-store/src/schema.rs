//! Document store database schema.

/// SQL to create the documents table. The partition key is stored as its
/// joined string form; prefix addressing matches on component boundaries.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    partition_key TEXT NOT NULL,
    id            UUID NOT NULL,
    doc_type      TEXT NOT NULL,
    body          JSONB NOT NULL,
    etag          TEXT NOT NULL,
    ts            TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (partition_key, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_partition_ts
    ON documents (partition_key, ts);

CREATE INDEX IF NOT EXISTS idx_documents_type_ts
    ON documents (doc_type, ts);
";
