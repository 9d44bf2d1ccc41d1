pub mod aggregator;
pub mod artifact_writer;
pub mod cache;
pub mod compiler;
pub mod labels;
pub mod registry;
pub mod renderer;
pub mod store;
pub mod trend_analyzer;

pub use aggregator::EvaluationAggregator;
pub use artifact_writer::{ArtifactWriter, WrittenArtifact};
pub use cache::TtlCache;
pub use compiler::{CompileRequest, ReportCompiler};
pub use labels::label;
pub use registry::{InMemoryRegistry, ReportRegistry};
pub use renderer::{JsonRenderer, Renderer};
pub use store::{InMemoryStore, StudentStore};
pub use trend_analyzer::{Confidence, TopikTrendAnalyzer, TrendAnalysis, TrendPattern};
