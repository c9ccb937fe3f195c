use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::OnceLock;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// ONNX Runtime settings applied when the pipeline session is created.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

// GraphOptimizationLevel is neither Clone nor Copy.
fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

/// Parses "disable", "1", "2" or "3" into an optimization level.
pub fn parse_optimization_level(value: &str) -> Option<GraphOptimizationLevel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "disable" | "0" => Some(GraphOptimizationLevel::Disable),
        "1" | "level1" => Some(GraphOptimizationLevel::Level1),
        "2" | "level2" => Some(GraphOptimizationLevel::Level2),
        "3" | "level3" => Some(GraphOptimizationLevel::Level3),
        _ => None,
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init().with_name("gazette").commit()?;
    Ok(())
}

/// Initializes the process-wide ONNX Runtime environment once. A failed
/// initialization is remembered and reported on every call.
pub fn ensure_initialized() -> Result<(), String> {
    INIT.get_or_init(|| init_onnx_environment().map_err(|e| e.to_string()))
        .clone()
}

pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    if let Err(e) = ensure_initialized() {
        log::warn!("ONNX Runtime environment init failed, using defaults: {}", e);
    }
    let mut builder = Session::builder()?;

    // Configure threading
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optimization_level() {
        assert!(matches!(
            parse_optimization_level("disable"),
            Some(GraphOptimizationLevel::Disable)
        ));
        assert!(matches!(
            parse_optimization_level(" Level2 "),
            Some(GraphOptimizationLevel::Level2)
        ));
        assert!(parse_optimization_level("fast").is_none());
    }

    #[test]
    fn test_config_clone_keeps_values() {
        let config = RuntimeConfig {
            inter_threads: 2,
            intra_threads: 4,
            optimization_level: GraphOptimizationLevel::Level1,
        };
        let cloned = config.clone();
        assert_eq!(cloned.inter_threads, 2);
        assert_eq!(cloned.intra_threads, 4);
        assert!(matches!(cloned.optimization_level, GraphOptimizationLevel::Level1));
    }
}
