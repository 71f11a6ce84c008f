use crate::error::Result;
use crate::record::{GeneSummaryRecord, WeightRecord};
use crate::store::WeightDb;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub type Gene = String;
pub type Rsid = String;

/// Lookups over a whole weight database, materialized once and read-only afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightIndex {
    weights_by_gene: HashMap<Gene, HashMap<Rsid, WeightRecord>>,
    gene_data_for_gene: HashMap<Gene, GeneSummaryRecord>,
    genes_for_an_rsid: HashMap<Rsid, Vec<Gene>>, // genes in weight-row order
}

impl WeightIndex {
    /// Opens the database at `path` and indexes both of its tables.
    pub fn build<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut db = WeightDb::new(path);
        Self::from_store(&mut db)
    }

    /// Reads every summary row, then every weight row, from `db`. Nothing is returned unless
    /// both reads succeed.
    pub fn from_store(db: &mut WeightDb) -> Result<Self> {
        let summaries = db.load_summary_data(None)?;
        let weights = db.load_weights(None, None)?;
        let index = Self::from_records(summaries, weights);
        tracing::info!(
            path = %db.path().display(),
            genes = index.num_genes(),
            rsids = index.num_rsids(),
            "weight index built"
        );
        Ok(index)
    }

    /// Groups already decoded records. `weights` must be in store row order.
    pub fn from_records(summaries: Vec<GeneSummaryRecord>, weights: Vec<WeightRecord>) -> Self {
        let mut index = Self::default();
        for summary in summaries {
            index.gene_data_for_gene.insert(summary.gene.clone(), summary);
        }
        let mut overwritten = 0usize;
        for weight in weights {
            if index.insert_weight(weight) {
                overwritten += 1;
            }
        }
        if overwritten > 0 {
            tracing::debug!(overwritten, "duplicate (gene, rsid) rows replaced earlier rows");
        }
        index.check_gene_sets();
        index
    }

    /// Insert-or-overwrite into the gene's rsid map and append to the rsid's gene list.
    /// Returns true when an earlier row for the same (gene, rsid) was replaced.
    fn insert_weight(&mut self, weight: WeightRecord) -> bool {
        self.genes_for_an_rsid.entry(weight.rsid.clone()).or_default().push(weight.gene.clone());
        let by_rsid = self.weights_by_gene.entry(weight.gene.clone()).or_default();
        let previous = by_rsid.insert(weight.rsid.clone(), weight);
        if let Some(prev) = &previous {
            tracing::warn!(gene = %prev.gene, rsid = %prev.rsid, "duplicate weight row; keeping the later one");
        }
        previous.is_some()
    }

    fn check_gene_sets(&self) {
        let without_summary: Vec<&str> = self
            .weights_by_gene
            .keys()
            .filter(|g| !self.gene_data_for_gene.contains_key(*g))
            .map(String::as_str)
            .collect();
        let without_weights: Vec<&str> = self
            .gene_data_for_gene
            .keys()
            .filter(|g| !self.weights_by_gene.contains_key(*g))
            .map(String::as_str)
            .collect();
        if !without_summary.is_empty() {
            tracing::warn!(genes = ?without_summary, "genes with weights but no summary row");
        }
        if !without_weights.is_empty() {
            tracing::warn!(genes = ?without_weights, "genes with a summary row but no weights");
        }
    }

    pub fn weights_by_gene(&self) -> &HashMap<Gene, HashMap<Rsid, WeightRecord>> { &self.weights_by_gene }

    pub fn gene_data_for_gene(&self) -> &HashMap<Gene, GeneSummaryRecord> { &self.gene_data_for_gene }

    pub fn genes_for_an_rsid(&self) -> &HashMap<Rsid, Vec<Gene>> { &self.genes_for_an_rsid }

    pub fn weights_for_gene(&self, gene: &str) -> Option<&HashMap<Rsid, WeightRecord>> {
        self.weights_by_gene.get(gene)
    }

    pub fn gene_data(&self, gene: &str) -> Option<&GeneSummaryRecord> {
        self.gene_data_for_gene.get(gene)
    }

    /// Genes carrying `rsid`, one entry per weight row. Empty for an unknown rsid.
    pub fn genes_for_rsid(&self, rsid: &str) -> &[Gene] {
        self.genes_for_an_rsid.get(rsid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The weight of `rsid` in the first gene it was read for.
    pub fn an_entry_with_rsid(&self, rsid: &str) -> Option<&WeightRecord> {
        let gene = self.genes_for_rsid(rsid).first()?;
        self.weights_by_gene.get(gene)?.get(rsid)
    }

    pub fn num_genes(&self) -> usize { self.weights_by_gene.len() }

    pub fn num_rsids(&self) -> usize { self.genes_for_an_rsid.len() }

    /// Distinct (gene, rsid) pairs held.
    pub fn num_weights(&self) -> usize { self.weights_by_gene.values().map(HashMap::len).sum() }
}
