//! Command implementations.

pub mod batch;
pub mod config;
pub mod process;

use std::path::Path;
use std::sync::Arc;

use docflow_core::{
    DocumentPipeline, FsContentStore, InMemoryDocumentStore, PatternExtractor, PipelineConfig,
    SimulatedEngine,
};

/// Load configuration from an explicit path or fall back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match config_path {
        Some(path) => Ok(PipelineConfig::from_file(Path::new(path))?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Build a pipeline for a CLI run: document records live in memory for the
/// duration of the invocation, content goes to the configured upload
/// directory.
pub fn build_pipeline(config: &PipelineConfig) -> anyhow::Result<DocumentPipeline> {
    build_pipeline_with_engine(config, SimulatedEngine::new())
}

pub fn build_pipeline_with_engine(
    config: &PipelineConfig,
    engine: SimulatedEngine,
) -> anyhow::Result<DocumentPipeline> {
    let contents = FsContentStore::new(config.storage.upload_dir.clone())?;
    Ok(DocumentPipeline::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(contents),
        Arc::new(engine),
        Box::new(PatternExtractor::new()),
        config.clone(),
    ))
}
