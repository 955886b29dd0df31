//! Relational schema.
//!
//! Statements are idempotent and run on every connect.

/// DDL statements, in dependency order.
pub const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS persons (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        kind        TEXT NOT NULL,
        legal_name  TEXT NOT NULL,
        trade_name  TEXT,
        tax_id      TEXT,
        status      TEXT NOT NULL DEFAULT 'ACTIVE'
    )",
    "CREATE INDEX IF NOT EXISTS idx_persons_tax_id ON persons (tax_id)",
    "CREATE TABLE IF NOT EXISTS classifications (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        kind        TEXT NOT NULL,
        description TEXT NOT NULL,
        status      TEXT NOT NULL DEFAULT 'ACTIVE'
    )",
    "CREATE TABLE IF NOT EXISTS movements (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        kind            TEXT NOT NULL,
        invoice_number  TEXT,
        issue_date      TEXT,
        description     TEXT NOT NULL,
        total_amount    REAL NOT NULL,
        supplier_id     INTEGER NOT NULL REFERENCES persons (id),
        billed_to_id    INTEGER NOT NULL REFERENCES persons (id),
        status          TEXT NOT NULL DEFAULT 'ACTIVE'
    )",
    "CREATE TABLE IF NOT EXISTS installments (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        label        TEXT NOT NULL,
        due_date     TEXT,
        amount       REAL NOT NULL,
        paid_amount  REAL NOT NULL DEFAULT 0,
        balance      REAL NOT NULL,
        status       TEXT NOT NULL DEFAULT 'OPEN',
        movement_id  INTEGER NOT NULL REFERENCES movements (id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS movement_classifications (
        movement_id        INTEGER NOT NULL REFERENCES movements (id) ON DELETE CASCADE,
        classification_id  INTEGER NOT NULL REFERENCES classifications (id),
        PRIMARY KEY (movement_id, classification_id)
    )",
];

/// Tables cleared by a full reset, children first.
pub const RESET_ORDER: &[&str] = &[
    "movement_classifications",
    "installments",
    "movements",
    "classifications",
    "persons",
];
