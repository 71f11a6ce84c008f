#![allow(dead_code)]

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SCHEMA: &str = r#"
    CREATE TABLE weights (rsid TEXT, gene TEXT, weight REAL, ref_allele TEXT, eff_allele TEXT, pval REAL, N INTEGER, cis INTEGER);
    CREATE TABLE extra (gene TEXT, genename TEXT, R2 REAL, "n.snps" INTEGER);
"#;

/// (rsid, gene, weight, ref, eff, pval, N, cis) in insertion order.
pub const WEIGHTS: &[(&str, &str, f64, &str, &str, f64, i64, i64)] = &[
    ("rs1", "A", 0.2, "C", "T", 0.1, 3, 1),
    ("rs2", "A", 0.1, "A", "G", 0.2, 3, 2),
    ("rs3", "A", 0.05, "G", "A", 0.3, 3, 3),
    ("rs4", "B", 0.4, "T", "C", 0.4, 2, 4),
    ("rs5", "B", 0.3, "C", "T", 0.5, 2, 5),
    ("rs6", "C", 0.5, "T", "C", 0.6, 1, 6),
    ("rs1", "D", 0.6, "T", "C", 0.7, 1, 7),
];

/// (gene, genename, R2, n.snps) in insertion order.
pub const EXTRA: &[(&str, &str, f64, i64)] = &[
    ("A", "gene1", 0.9, 3),
    ("B", "gene2", 0.8, 2),
    ("C", "gene3", 0.7, 1),
    ("D", "gene4", 0.6, 1),
];

pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

/// The four-gene, seven-row weight database most tests run against.
pub fn sample_db() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("test.db");
    let conn = Connection::open(&path).expect("open sqlite");
    conn.execute_batch(SCHEMA).expect("schema");
    insert_weights(&conn, WEIGHTS);
    for (gene, name, r2, n_snps) in EXTRA {
        conn.execute(
            r#"INSERT INTO extra (gene, genename, R2, "n.snps") VALUES (?1, ?2, ?3, ?4)"#,
            rusqlite::params![gene, name, r2, n_snps],
        )
        .expect("insert extra");
    }
    Fixture { dir, path }
}

pub fn insert_weights(conn: &Connection, rows: &[(&str, &str, f64, &str, &str, f64, i64, i64)]) {
    for (rsid, gene, weight, r, e, pval, n, cis) in rows {
        conn.execute(
            "INSERT INTO weights (rsid, gene, weight, ref_allele, eff_allele, pval, N, cis) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![rsid, gene, weight, r, e, pval, n, cis],
        )
        .expect("insert weight");
    }
}

/// Runs arbitrary SQL against a fresh database file and returns its path.
pub fn db_from_sql(dir: &Path, name: &str, sql: &str) -> PathBuf {
    let path = dir.join(name);
    let conn = Connection::open(&path).expect("open sqlite");
    conn.execute_batch(sql).expect("seed sqlite");
    path
}
