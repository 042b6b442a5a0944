#![allow(dead_code)]

use esg_engine::config::EngineConfig;
use esg_engine::scoring::{BandRepository, ScoringEngine, ScoringSettings};
use esg_engine::{Dataset, EngineContext, ScenarioRunner};
use std::sync::Arc;

const BANDS: &[u8] = include_bytes!("../../../../data/bands_v1.json");
const SUPPLIERS: &[u8] = include_bytes!("../../../../data/suppliers.json");
const SETTINGS: &[u8] = include_bytes!("../../../../data/settings.json");

pub fn bands() -> Arc<BandRepository> {
    Arc::new(BandRepository::from_reader(BANDS).expect("fixture bands load"))
}

pub fn dataset() -> Dataset {
    Dataset::from_reader(SUPPLIERS).expect("fixture dataset loads")
}

pub fn settings() -> ScoringSettings {
    ScoringSettings::from_reader(SETTINGS).expect("fixture settings load")
}

pub fn engine() -> ScoringEngine {
    ScoringEngine::new(bands(), ScoringSettings::default()).expect("engine builds")
}

pub fn runner() -> ScenarioRunner {
    ScenarioRunner::new(engine())
}

pub fn context() -> EngineContext {
    EngineContext::new(
        bands(),
        ScoringSettings::default(),
        dataset(),
        &EngineConfig::default(),
    )
    .expect("context builds")
}
