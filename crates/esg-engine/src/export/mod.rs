//! Ranked tables as CSV, and multi-variant scenarios as a zip of CSVs.

pub mod archive;
pub mod table;

pub use table::{to_csv_bytes, write_csv, COLUMNS};

use crate::scenarios::{ScenarioKind, ScenarioResult, ScenarioRun};
use serde::Serialize;
use std::collections::BTreeSet;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv table: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to build archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// The bytes handed back to the caller, with the name and media type they
/// should travel under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Serialises a completed run. S1 yields a single CSV; every other scenario
/// yields one CSV per variant bundled into a zip, in variant order.
pub fn export_run(run: &ScenarioRun, output_name: &str) -> Result<ExportArtifact, ExportError> {
    let stem = output_stem(output_name, run.scenario);

    let artifact = match run.scenario {
        ScenarioKind::Utility => {
            let entries = run
                .results
                .first()
                .map(|result| result.entries.as_slice())
                .unwrap_or_default();
            ExportArtifact {
                file_name: format!("{stem}.csv"),
                content_type: CSV_CONTENT_TYPE,
                bytes: to_csv_bytes(entries)?,
            }
        }
        _ => ExportArtifact {
            file_name: format!("{stem}.zip"),
            content_type: ZIP_CONTENT_TYPE,
            bytes: bundle_results(&run.results)?,
        },
    };

    tracing::info!(
        scenario = run.scenario.id(),
        file_name = %artifact.file_name,
        tables = run.results.len(),
        bytes = artifact.bytes.len(),
        "exported scenario artifact"
    );
    Ok(artifact)
}

fn bundle_results(results: &[ScenarioResult]) -> Result<Vec<u8>, ExportError> {
    let mut taken = BTreeSet::new();
    let mut files = Vec::with_capacity(results.len());
    for result in results {
        let mut name = entry_name(result.scenario, &result.variant);
        let mut suffix = 2;
        while !taken.insert(name.clone()) {
            name = format!(
                "{}_{}_{suffix}.csv",
                result.scenario.slug(),
                variant_slug(&result.variant)
            );
            suffix += 1;
        }
        files.push((name, to_csv_bytes(&result.entries)?));
    }

    archive::bundle(
        files
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
    )
}

/// `<scenario>_<variant-slug>.csv`, e.g. `s2_plus10pct_weights.csv`.
pub fn entry_name(scenario: ScenarioKind, variant: &str) -> String {
    format!("{}_{}.csv", scenario.slug(), variant_slug(variant))
}

/// Lower-case slug of a variant label: `+` becomes `plus`, a minus sign in
/// front of a number becomes `minus`, `%` becomes `pct` and any other run of
/// non-alphanumerics collapses to one `_`.
pub fn variant_slug(label: &str) -> String {
    let chars: Vec<char> = label.trim().chars().collect();
    let mut slug = String::with_capacity(label.len() + 8);

    for (index, ch) in chars.iter().copied().enumerate() {
        let word = match ch {
            '+' => Some("plus"),
            '%' => Some("pct"),
            '-' if is_sign(&chars, index) => Some("minus"),
            _ => None,
        };

        match word {
            Some(word) => {
                if slug.ends_with(|c: char| c.is_ascii_digit()) && word != "pct" {
                    slug.push('_');
                }
                slug.push_str(word);
            }
            None if ch.is_ascii_alphanumeric() => slug.push(ch.to_ascii_lowercase()),
            None => {
                if !slug.is_empty() && !slug.ends_with('_') {
                    slug.push('_');
                }
            }
        }
    }

    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "variant".to_string()
    } else {
        slug
    }
}

// A '-' is a sign when it starts the label or a word and a digit follows.
fn is_sign(chars: &[char], index: usize) -> bool {
    let starts_word = index == 0 || !chars[index - 1].is_ascii_alphanumeric();
    let before_digit = chars
        .get(index + 1)
        .is_some_and(|next| next.is_ascii_digit());
    starts_word && before_digit
}

/// File-safe stem for the artifact. A trailing `.csv` or `.zip` is dropped
/// since the exporter picks the extension; an empty name falls back to
/// `<scenario>_results`.
pub fn output_stem(output_name: &str, scenario: ScenarioKind) -> String {
    let trimmed = output_name.trim();
    let trimmed = [".csv", ".zip"]
        .iter()
        .find_map(|ext| {
            trimmed
                .len()
                .checked_sub(ext.len())
                .filter(|&at| trimmed.is_char_boundary(at))
                .filter(|&at| trimmed[at..].eq_ignore_ascii_case(ext))
                .map(|at| &trimmed[..at])
        })
        .unwrap_or(trimmed);

    let sanitised: String = trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let sanitised = sanitised.trim_matches(|ch| ch == '_' || ch == '.');

    if sanitised.is_empty() {
        format!("{}_results", scenario.slug())
    } else {
        sanitised.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_slugs_are_file_safe_and_distinct() {
        assert_eq!(variant_slug("+10% weights"), "plus10pct_weights");
        assert_eq!(variant_slug("-20% weights"), "minus20pct_weights");
        assert_eq!(variant_slug("MCAR 5% + KNN"), "mcar_5pct_plus_knn");
        assert_eq!(variant_slug("MCAR 12.5% + mean"), "mcar_12_5pct_plus_mean");
        assert_eq!(variant_slug("normalization off"), "normalization_off");
        assert_eq!(variant_slug("margin >= -5%"), "margin_minus5pct");
        assert_eq!(variant_slug("  "), "variant");
    }

    #[test]
    fn entry_names_carry_the_scenario_slug() {
        assert_eq!(
            entry_name(ScenarioKind::Sensitivity, "+20% weights"),
            "s2_plus20pct_weights.csv"
        );
        assert_eq!(
            entry_name(ScenarioKind::Ablation, "normalization on"),
            "s4_normalization_on.csv"
        );
    }

    #[test]
    fn output_names_are_sanitised() {
        assert_eq!(
            output_stem("q3 report.zip", ScenarioKind::Sensitivity),
            "q3_report"
        );
        assert_eq!(
            output_stem("../../etc/passwd", ScenarioKind::Utility),
            "etc_passwd"
        );
        assert_eq!(output_stem("", ScenarioKind::Missingness), "s3_results");
        assert_eq!(
            output_stem("ranking.CSV", ScenarioKind::Utility),
            "ranking"
        );
    }
}
