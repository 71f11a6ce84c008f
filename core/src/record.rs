use serde::{Deserialize, Serialize};

/// One row of the `weights` table: the coefficient of a variant in a gene's model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub rsid: String,
    pub gene: String,
    pub weight: f64,
    pub ref_allele: String,
    pub eff_allele: String,
    pub pval: f64,
    /// Sample size, column `N`.
    pub n: i64,
    pub cis: i64,
}

/// One row of the `extra` table: model quality for a single gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSummaryRecord {
    pub gene: String,
    /// Column `genename`.
    pub gene_name: String,
    /// Column `R2`.
    pub r2: f64,
    /// Column `n.snps`.
    pub n_snp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_record_serializes_with_field_names() {
        let w = WeightRecord {
            rsid: "rs1".into(),
            gene: "A".into(),
            weight: 0.2,
            ref_allele: "C".into(),
            eff_allele: "T".into(),
            pval: 0.1,
            n: 3,
            cis: 1,
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["rsid"], "rs1");
        assert_eq!(json["gene"], "A");
        assert_eq!(json["n"], 3);
        assert_eq!(json["eff_allele"], "T");
    }
}
