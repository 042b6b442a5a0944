use super::ExportError;
use crate::scenarios::RankedEntry;
use serde::Serialize;
use std::io::Write;

pub const COLUMNS: [&str; 10] = [
    "SupplierID",
    "Rank",
    "Name",
    "Industry",
    "Environmental Score",
    "Social Score",
    "Governance Score",
    "Composite Score",
    "Risk Penalty",
    "Final Score",
];

#[derive(Debug, Serialize)]
struct TableRow<'a> {
    supplier_id: &'a str,
    rank: usize,
    name: &'a str,
    industry: &'a str,
    environmental: String,
    social: String,
    governance: String,
    composite: String,
    risk_penalty: String,
    final_score: String,
}

impl<'a> From<&'a RankedEntry> for TableRow<'a> {
    fn from(entry: &'a RankedEntry) -> Self {
        let scored = &entry.supplier;
        Self {
            supplier_id: &scored.supplier_id,
            rank: entry.rank,
            name: &scored.name,
            industry: &scored.industry,
            environmental: fixed(scored.environmental),
            social: fixed(scored.social),
            governance: fixed(scored.governance),
            composite: fixed(scored.composite),
            risk_penalty: fixed(scored.risk_penalty),
            final_score: fixed(scored.final_score),
        }
    }
}

/// Writes one ranked table. The header is always written, even for an empty
/// table, so every export has the same shape.
pub fn write_csv<W: Write>(entries: &[RankedEntry], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for entry in entries {
        csv_writer.serialize(TableRow::from(entry))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_bytes(entries: &[RankedEntry]) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    write_csv(entries, &mut bytes)?;
    Ok(bytes)
}

/// Four decimal places; negative zero prints as zero.
fn fixed(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::rank_by_final_score;
    use crate::scoring::{RiskLevel, ScoredSupplier};

    fn scored(id: &str, name: &str, final_score: f64) -> ScoredSupplier {
        ScoredSupplier {
            supplier_id: id.to_string(),
            name: name.to_string(),
            industry: "Textiles".to_string(),
            environmental: 71.234_56,
            social: 60.0,
            governance: 55.5,
            composite: 63.0,
            risk_factor: 0.21,
            risk_level: RiskLevel::Medium,
            risk_penalty: 0.0,
            completeness_ratio: 1.0,
            completeness_capped: false,
            final_score,
            imputed_metrics: Vec::new(),
        }
    }

    #[test]
    fn header_matches_fixed_schema_for_empty_tables() {
        let bytes = to_csv_bytes(&[]).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(
            text,
            "SupplierID,Rank,Name,Industry,Environmental Score,Social Score,Governance Score,Composite Score,Risk Penalty,Final Score\n"
        );
    }

    #[test]
    fn rows_follow_rank_order_with_rounded_scores() {
        let entries = rank_by_final_score(vec![
            scored("S-1", "Acme, Ltd", 40.0),
            scored("S-2", "Borealis", 62.987_64),
        ]);
        let text = String::from_utf8(to_csv_bytes(&entries).expect("csv")).expect("utf8");
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "S-2,1,Borealis,Textiles,71.2346,60.0000,55.5000,63.0000,0.0000,62.9876"
        );
        assert!(lines[2].starts_with("S-1,2,\"Acme, Ltd\",Textiles,"));
    }

    #[test]
    fn negative_zero_is_written_as_zero() {
        assert_eq!(fixed(-0.000_01), "0.0000");
        assert_eq!(fixed(12.5), "12.5000");
    }
}
