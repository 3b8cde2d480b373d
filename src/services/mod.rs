pub mod archive_writer;
pub mod engine;
pub mod metric_extractor;
pub mod offender_summarizer;
pub mod point_builder;

pub use archive_writer::{ArchiveWriter, DEFAULT_ARCHIVE_PATH};
pub use engine::{AnalysisEngine, BrowserEngine};
pub use metric_extractor::flatten_metrics;
pub use offender_summarizer::{summarize, summarize_batch, OffenderSummary};
pub use point_builder::{BuiltPoint, DropReason, DroppedField, PointBuilder};
