mod common;

use esg_engine::export::export_run;
use esg_engine::pipeline::{rank_suppliers, PipelineError};
use esg_engine::scenarios::{
    ImputationStrategy, KnnParams, DistanceMetric, ScenarioError, ScenarioKind,
    ScenarioParameterError, ScenarioParams, VariantDetail,
};
use esg_engine::scoring::composite::{COMPLETENESS_CAP, COMPLETENESS_THRESHOLD};
use esg_engine::scoring::{NormalizationMode, Pillar};
use std::collections::BTreeSet;

fn ids(entries: &[esg_engine::scenarios::RankedEntry]) -> Vec<&str> {
    entries
        .iter()
        .map(|entry| entry.supplier.supplier_id.as_str())
        .collect()
}

fn utility_params(min_margin: f64) -> ScenarioParams {
    ScenarioParams {
        min_margin: Some(min_margin),
        ..ScenarioParams::default()
    }
}

#[test]
fn utility_ranks_eligible_suppliers_by_emission_intensity() {
    let dataset = common::dataset();
    let run = common::runner()
        .run(ScenarioKind::Utility, &dataset.suppliers, &utility_params(0.10))
        .expect("s1 runs");

    assert_eq!(run.results.len(), 1);
    let result = &run.results[0];
    assert_eq!(result.variant, "margin >= 10%");
    assert_eq!(
        ids(&result.entries),
        vec!["SUP-003", "SUP-001", "SUP-004", "SUP-007", "SUP-009", "SUP-005"]
    );
    let ranks: Vec<_> = result.entries.iter().map(|entry| entry.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);

    match &result.detail {
        VariantDetail::Utility {
            min_margin,
            excluded,
        } => {
            assert_eq!(*min_margin, 0.10);
            assert_eq!(excluded, &vec!["SUP-002", "SUP-006", "SUP-008", "SUP-010"]);
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn utility_requires_a_margin_before_any_work() {
    let dataset = common::dataset();
    let runner = common::runner();

    let missing = runner.run(
        ScenarioKind::Utility,
        &dataset.suppliers,
        &ScenarioParams::default(),
    );
    assert_eq!(
        missing,
        Err(ScenarioError::Parameter(ScenarioParameterError::MissingMargin))
    );

    let out_of_range = runner.run(ScenarioKind::Utility, &dataset.suppliers, &utility_params(2.0));
    assert_eq!(
        out_of_range,
        Err(ScenarioError::Parameter(ScenarioParameterError::InvalidMargin(2.0)))
    );
}

#[test]
fn sensitivity_tables_keep_the_same_suppliers() {
    let dataset = common::dataset();
    let run = common::runner()
        .run(
            ScenarioKind::Sensitivity,
            &dataset.suppliers,
            &ScenarioParams::default(),
        )
        .expect("s2 runs");

    let labels: Vec<_> = run.results.iter().map(|result| result.variant.as_str()).collect();
    assert_eq!(
        labels,
        vec!["-20% weights", "-10% weights", "+10% weights", "+20% weights"]
    );

    let expected: BTreeSet<_> = dataset.suppliers.iter().map(|s| s.id.as_str()).collect();
    for result in &run.results {
        let members: BTreeSet<_> = ids(&result.entries).into_iter().collect();
        assert_eq!(members, expected, "{}", result.variant);

        match &result.detail {
            VariantDetail::Sensitivity {
                pillar,
                pillar_weights,
                ..
            } => {
                assert_eq!(*pillar, Pillar::Environmental);
                assert!((pillar_weights.sum() - 1.0).abs() < 1e-9);
                assert_eq!(result.settings.pillar_weights, *pillar_weights);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }
}

#[test]
fn sensitivity_can_target_another_pillar() {
    let dataset = common::dataset();
    let params = ScenarioParams {
        target_pillar: Some(Pillar::Governance),
        ..ScenarioParams::default()
    };
    let run = common::runner()
        .run(ScenarioKind::Sensitivity, &dataset.suppliers, &params)
        .expect("s2 runs");

    let lowered = &run.results[0].settings.pillar_weights;
    let raised = &run.results[3].settings.pillar_weights;
    assert!(lowered.governance < 0.3);
    assert!(raised.governance > 0.3);
}

#[test]
fn missingness_produces_four_tables_in_fixed_order() {
    let dataset = common::dataset();
    let run = common::runner()
        .run(
            ScenarioKind::Missingness,
            &dataset.suppliers,
            &ScenarioParams::default(),
        )
        .expect("s3 runs");

    assert_eq!(run.seed, 42);
    let labels: Vec<_> = run.results.iter().map(|result| result.variant.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "MCAR 5% + mean",
            "MCAR 5% + KNN",
            "MCAR 10% + mean",
            "MCAR 10% + KNN"
        ]
    );

    // both strategies of one rate see the same masked collection
    let blanked: Vec<_> = run
        .results
        .iter()
        .map(|result| match &result.detail {
            VariantDetail::Missingness {
                blanked_values,
                imputation,
                ..
            } => (*imputation, *blanked_values),
            other => panic!("unexpected detail {other:?}"),
        })
        .collect();
    assert_eq!(blanked[0].0, ImputationStrategy::Mean);
    assert_eq!(blanked[1].0, ImputationStrategy::NearestNeighbours);
    assert_eq!(blanked[0].1, blanked[1].1);
    assert_eq!(blanked[2].1, blanked[3].1);
}

#[test]
fn missingness_is_reproducible_for_a_seed() {
    let dataset = common::dataset();
    let params = ScenarioParams {
        seed: Some(7),
        missing_rates: Some(vec![0.3]),
        knn: Some(KnnParams {
            k: 2,
            distance: DistanceMetric::Manhattan,
        }),
        ..ScenarioParams::default()
    };

    let runner = common::runner();
    let first = runner
        .run(ScenarioKind::Missingness, &dataset.suppliers, &params)
        .expect("s3 runs");
    let second = runner
        .run(ScenarioKind::Missingness, &dataset.suppliers, &params)
        .expect("s3 runs");
    assert_eq!(first, second);

    let first_bytes = export_run(&first, "s3").expect("export").bytes;
    let second_bytes = export_run(&second, "s3").expect("export").bytes;
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn missingness_rejects_invalid_rates() {
    let dataset = common::dataset();
    let params = ScenarioParams {
        missing_rates: Some(vec![0.05, 1.5]),
        ..ScenarioParams::default()
    };
    let error = common::runner()
        .run(ScenarioKind::Missingness, &dataset.suppliers, &params)
        .expect_err("rate out of range");
    assert_eq!(
        error,
        ScenarioError::Parameter(ScenarioParameterError::InvalidMissingRate(1.5))
    );
}

#[test]
fn ablation_with_normalization_on_matches_the_baseline() {
    let dataset = common::dataset();
    let runner = common::runner();
    let run = runner
        .run(
            ScenarioKind::Ablation,
            &dataset.suppliers,
            &ScenarioParams::default(),
        )
        .expect("s4 runs");

    assert_eq!(run.results.len(), 2);
    assert_eq!(run.results[0].variant, "normalization off");
    assert_eq!(run.results[1].variant, "normalization on");
    assert_eq!(
        run.results[0].detail,
        VariantDetail::Ablation {
            normalization: NormalizationMode::Disabled
        }
    );

    let baseline = rank_suppliers(runner.engine(), &dataset.suppliers);
    assert_eq!(run.results[1].entries, baseline.entries);
}

#[test]
fn completeness_law_holds_in_every_scenario_table() {
    let dataset = common::dataset();
    let runner = common::runner();
    for kind in ScenarioKind::ALL {
        let run = runner
            .run(kind, &dataset.suppliers, &utility_params(0.0))
            .expect("scenario runs");
        for result in &run.results {
            for entry in &result.entries {
                let supplier = &entry.supplier;
                if supplier.completeness_ratio < COMPLETENESS_THRESHOLD {
                    assert!(
                        supplier.final_score <= COMPLETENESS_CAP,
                        "{kind} {} {}",
                        result.variant,
                        supplier.supplier_id
                    );
                }
            }
        }
    }
}

#[test]
fn pipeline_rejects_unknown_kinds() {
    let error = common::context()
        .run_scenario("s5", &ScenarioParams::default(), "out")
        .expect_err("unknown kind");
    assert!(matches!(
        error,
        PipelineError::Scenario(ScenarioError::Parameter(
            ScenarioParameterError::UnsupportedKind(kind)
        )) if kind == "s5"
    ));
}
