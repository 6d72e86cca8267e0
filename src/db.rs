use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::model::{CategoryCode, CompanyRecord};
use crate::sync::Store;

/// SQLite-backed store. Each call opens its own connection, so the store can
/// be shared across tasks.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let store = SqliteStore {
            path: path.to_path_buf(),
        };
        init_schema(&store.connect()?)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }

    // ── Category codes ──

    pub fn add_category_code(&self, code: &str, name: &str) -> Result<bool> {
        let conn = self.connect()?;
        let n = conn.execute(
            "INSERT OR IGNORE INTO category_codes (code, name) VALUES (?1, ?2)",
            rusqlite::params![code, name],
        )?;
        Ok(n > 0)
    }

    pub fn remove_category_code(&self, code: &str) -> Result<bool> {
        let conn = self.connect()?;
        let n = conn.execute("DELETE FROM category_codes WHERE code = ?1", [code])?;
        Ok(n > 0)
    }

    // ── Recipients ──

    pub fn add_recipient(&self, email: &str) -> Result<bool> {
        let conn = self.connect()?;
        let n = conn.execute("INSERT OR IGNORE INTO recipients (email) VALUES (?1)", [email])?;
        Ok(n > 0)
    }

    pub fn remove_recipient(&self, email: &str) -> Result<bool> {
        let conn = self.connect()?;
        let n = conn.execute("DELETE FROM recipients WHERE email = ?1", [email])?;
        Ok(n > 0)
    }

    // ── Saved companies ──

    pub fn fetch_saved(&self, limit: usize) -> Result<Vec<CompanyRecord>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {} FROM companies ORDER BY founded_date DESC, organization_number LIMIT ?1",
            COMPANY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([limit as i64], company_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn find_company(&self, organization_id: &str) -> Result<Option<CompanyRecord>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {} FROM companies WHERE organization_number = ?1",
            COMPANY_COLUMNS
        );
        let row = conn
            .query_row(&sql, [organization_id], company_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn get_stats(&self) -> Result<Stats> {
        let conn = self.connect()?;
        let companies: usize = conn.query_row("SELECT COUNT(*) FROM companies", [], |r| r.get(0))?;
        let codes: usize =
            conn.query_row("SELECT COUNT(*) FROM category_codes", [], |r| r.get(0))?;
        let recipients: usize =
            conn.query_row("SELECT COUNT(*) FROM recipients", [], |r| r.get(0))?;
        let enriched: usize = conn.query_row(
            "SELECT COUNT(*) FROM companies
             WHERE description IS NOT NULL OR ceo IS NOT NULL OR sni IS NOT NULL",
            [],
            |r| r.get(0),
        )?;
        Ok(Stats {
            companies,
            enriched,
            codes,
            recipients,
        })
    }
}

const COMPANY_COLUMNS: &str = "organization_number, name, founded_date, location, detail_url,
     description, ceo, sni, category_code, category_name";

fn company_from_row(row: &rusqlite::Row) -> rusqlite::Result<CompanyRecord> {
    Ok(CompanyRecord {
        organization_id: row.get(0)?,
        name: row.get(1)?,
        founded_date: row.get(2)?,
        location: row.get(3)?,
        detail_url: row.get(4)?,
        description: row.get(5)?,
        ceo: row.get(6)?,
        classification_codes: row.get(7)?,
        category_code: row.get(8)?,
        category_name: row.get(9)?,
        sample: false,
    })
}

pub struct Stats {
    pub companies: usize,
    pub enriched: usize,
    pub codes: usize,
    pub recipients: usize,
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS companies (
            organization_number TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            founded_date  TEXT NOT NULL,
            location      TEXT NOT NULL,
            detail_url    TEXT,
            description   TEXT,
            ceo           TEXT,
            sni           TEXT,
            category_code TEXT,
            category_name TEXT,
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_companies_code ON companies(category_code);

        CREATE TABLE IF NOT EXISTS category_codes (
            id   INTEGER PRIMARY KEY,
            code TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipients (
            id    INTEGER PRIMARY KEY,
            email TEXT UNIQUE NOT NULL
        );
        ",
    )?;
    Ok(())
}

impl Store for SqliteStore {
    fn known_ids(&self) -> Result<HashSet<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT organization_number FROM companies")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(ids)
    }

    /// Upsert by organisation number, all rows in one transaction.
    fn upsert_companies(&self, records: &[CompanyRecord]) -> Result<usize> {
        let conn = self.connect()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO companies
                 (organization_number, name, founded_date, location, detail_url,
                  description, ceo, sni, category_code, category_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(organization_number) DO UPDATE SET
                    name = excluded.name,
                    founded_date = excluded.founded_date,
                    location = excluded.location,
                    detail_url = COALESCE(excluded.detail_url, detail_url),
                    description = COALESCE(excluded.description, description),
                    ceo = COALESCE(excluded.ceo, ceo),
                    sni = COALESCE(excluded.sni, sni),
                    category_code = COALESCE(excluded.category_code, category_code),
                    category_name = COALESCE(excluded.category_name, category_name),
                    updated_at = datetime('now')",
            )?;
            for r in records {
                count += stmt.execute(rusqlite::params![
                    r.organization_id, r.name, r.founded_date, r.location, r.detail_url,
                    r.description, r.ceo, r.classification_codes, r.category_code,
                    r.category_name,
                ])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    fn recipients(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT email FROM recipients ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    fn category_codes(&self) -> Result<Vec<CategoryCode>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, code, name FROM category_codes ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryCode {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ── Tests ──
