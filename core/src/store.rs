use crate::error::{Result, WeightDbError};
use crate::record::{GeneSummaryRecord, WeightRecord};
use rusqlite::{params, Connection, OpenFlags, Row, Statement};
use std::path::{Path, PathBuf};

pub const WEIGHTS_TABLE: &str = "weights";
pub const EXTRA_TABLE: &str = "extra";

const WEIGHTS_COLUMNS: &[&str] = &["rsid", "gene", "weight", "ref_allele", "eff_allele", "pval", "N", "cis"];
const EXTRA_COLUMNS: &[&str] = &["gene", "genename", "R2", "n.snps"];

const SELECT_WEIGHTS: &str =
    "SELECT rsid, gene, weight, ref_allele, eff_allele, pval, N, cis FROM weights ORDER BY rowid";
const SELECT_WEIGHTS_FOR_GENE: &str =
    "SELECT rsid, gene, weight, ref_allele, eff_allele, pval, N, cis FROM weights WHERE gene = ?1 ORDER BY rowid";
const SELECT_EXTRA: &str = r#"SELECT gene, genename, R2, "n.snps" FROM extra ORDER BY rowid"#;
const SELECT_EXTRA_FOR_GENE: &str = r#"SELECT gene, genename, R2, "n.snps" FROM extra WHERE gene = ?1 ORDER BY rowid"#;
const SELECT_GENE_IDS: &str = "SELECT gene FROM extra GROUP BY gene ORDER BY MIN(rowid)";

/// Auxiliary value handed to every callback invocation of a single [`WeightDb::load_weights`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadContext {
    /// Distinct per `load_weights` call on the same accessor, starting at 1.
    pub load_id: u64,
    pub gene_filter: Option<String>,
}

/// Observer invoked once per decoded weight row, in store order.
pub trait WeightCallback {
    fn on_weight(&mut self, weight: &WeightRecord, context: &LoadContext);
}

impl<F> WeightCallback for F
where
    F: FnMut(&WeightRecord, &LoadContext),
{
    fn on_weight(&mut self, weight: &WeightRecord, context: &LoadContext) {
        self(weight, context)
    }
}

enum ConnectionState {
    Unopened,
    Open(Connection),
}

/// Lazily opened, read-only accessor over a weight database.
pub struct WeightDb {
    path: PathBuf,
    state: ConnectionState,
    loads: u64,
}

impl WeightDb {
    /// Does no I/O; the store is opened by the first operation that needs it.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), state: ConnectionState::Unopened, loads: 0 }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn is_open(&self) -> bool { matches!(self.state, ConnectionState::Open(_)) }

    /// Opens the store unless a connection is already held. Safe to call repeatedly.
    pub fn open_if_necessary(&mut self) -> Result<&Connection> {
        match self.state {
            ConnectionState::Open(ref conn) => Ok(conn),
            ConnectionState::Unopened => {
                let conn = open_readonly(&self.path)?;
                tracing::info!(path = %self.path.display(), "opened weight database");
                self.state = ConnectionState::Open(conn);
                // takes the `Open` arm now
                self.open_if_necessary()
            }
        }
    }

    /// Drops the connection. A later read opens a fresh one.
    pub fn close(&mut self) {
        if let ConnectionState::Open(_) = std::mem::replace(&mut self.state, ConnectionState::Unopened) {
            tracing::debug!(path = %self.path.display(), "closed weight database");
        }
    }

    /// Rows of the `extra` table in store order, optionally restricted to one gene.
    pub fn load_summary_data(&mut self, gene: Option<&str>) -> Result<Vec<GeneSummaryRecord>> {
        let conn = self.open_if_necessary()?;
        let (sql, filter) = match gene {
            Some(g) => (SELECT_EXTRA_FOR_GENE, Some(g)),
            None => (SELECT_EXTRA, None),
        };
        let mut stmt = conn.prepare(sql).map_err(|e| query_error(EXTRA_TABLE, e))?;
        let mut summaries = Vec::new();
        for_each_row(&mut stmt, EXTRA_TABLE, filter, |row| {
            summaries.push(decode_summary(row)?);
            Ok(())
        })?;
        tracing::debug!(rows = summaries.len(), gene = ?gene, "loaded gene summaries");
        Ok(summaries)
    }

    /// Rows of the `weights` table in store order, optionally restricted to one gene.
    ///
    /// When a callback is given it sees each record right after decoding, before the record
    /// is appended to the returned vector, together with a [`LoadContext`] fixed for this call.
    pub fn load_weights(
        &mut self,
        mut callback: Option<&mut dyn WeightCallback>,
        gene: Option<&str>,
    ) -> Result<Vec<WeightRecord>> {
        self.loads += 1;
        let context = LoadContext { load_id: self.loads, gene_filter: gene.map(str::to_owned) };
        let conn = self.open_if_necessary()?;
        let (sql, filter) = match gene {
            Some(g) => (SELECT_WEIGHTS_FOR_GENE, Some(g)),
            None => (SELECT_WEIGHTS, None),
        };
        let mut stmt = conn.prepare(sql).map_err(|e| query_error(WEIGHTS_TABLE, e))?;
        let mut weights = Vec::new();
        for_each_row(&mut stmt, WEIGHTS_TABLE, filter, |row| {
            let weight = decode_weight(row)?;
            if let Some(cb) = callback.as_deref_mut() {
                cb.on_weight(&weight, &context);
            }
            weights.push(weight);
            Ok(())
        })?;
        tracing::debug!(rows = weights.len(), gene = ?gene, load_id = context.load_id, "loaded weights");
        Ok(weights)
    }

    /// Distinct genes of the `extra` table, in the order they first appear.
    pub fn load_gene_identifiers(&mut self) -> Result<Vec<String>> {
        let conn = self.open_if_necessary()?;
        let mut stmt = conn.prepare(SELECT_GENE_IDS).map_err(|e| query_error(EXTRA_TABLE, e))?;
        let mut genes = Vec::new();
        for_each_row(&mut stmt, EXTRA_TABLE, None, |row| {
            genes.push(row.get(0)?);
            Ok(())
        })?;
        Ok(genes)
    }
}

fn open_readonly(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(WeightDbError::configuration(path, "file does not exist"));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| WeightDbError::configuration(path, e.to_string()))?;
    conn.execute_batch("PRAGMA query_only=ON; PRAGMA temp_store=MEMORY;")
        .map_err(|e| WeightDbError::configuration(path, e.to_string()))?;
    verify_table(&conn, path, WEIGHTS_TABLE, WEIGHTS_COLUMNS)?;
    verify_table(&conn, path, EXTRA_TABLE, EXTRA_COLUMNS)?;
    Ok(conn)
}

fn verify_table(conn: &Connection, path: &Path, table: &str, required: &[&str]) -> Result<()> {
    let present = table_columns(conn, table).map_err(|e| WeightDbError::configuration(path, e.to_string()))?;
    if present.is_empty() {
        return Err(WeightDbError::configuration(path, format!("missing table '{table}'")));
    }
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !present.iter().any(|p| p.eq_ignore_ascii_case(col)))
        .collect();
    if !missing.is_empty() {
        return Err(WeightDbError::configuration(
            path,
            format!("table '{table}' lacks columns {}", missing.join(", ")),
        ));
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let names = stmt.query_map([table], |r| r.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Steps through `stmt`, keeping stepping failures (`Query`) apart from per-row decoding
/// failures (`Decode`).
fn for_each_row<F>(stmt: &mut Statement<'_>, table: &'static str, gene: Option<&str>, mut f: F) -> Result<()>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<()>,
{
    let mut rows = match gene {
        Some(g) => stmt.query(params![g]),
        None => stmt.query(params![]),
    }
    .map_err(|e| query_error(table, e))?;
    let mut index = 0usize;
    while let Some(row) = rows.next().map_err(|e| query_error(table, e))? {
        f(row).map_err(|source| WeightDbError::Decode { table, row: index, source })?;
        index += 1;
    }
    Ok(())
}

fn query_error(table: &'static str, source: rusqlite::Error) -> WeightDbError {
    WeightDbError::Query { table, source }
}

fn decode_weight(row: &Row<'_>) -> rusqlite::Result<WeightRecord> {
    Ok(WeightRecord {
        rsid: row.get(0)?,
        gene: row.get(1)?,
        weight: row.get(2)?,
        ref_allele: row.get(3)?,
        eff_allele: row.get(4)?,
        pval: row.get(5)?,
        n: row.get(6)?,
        cis: row.get(7)?,
    })
}

fn decode_summary(row: &Row<'_>) -> rusqlite::Result<GeneSummaryRecord> {
    Ok(GeneSummaryRecord {
        gene: row.get(0)?,
        gene_name: row.get(1)?,
        r2: row.get(2)?,
        n_snp: row.get(3)?,
    })
}
