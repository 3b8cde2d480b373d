pub mod loaders;
pub mod ordered_map;
pub mod point;
pub mod request;
pub mod result;

pub use loaders::{load_batch_file, requests_from_input};
pub use ordered_map::OrderedMap;
pub use point::{FieldValue, PointTags, TimeSeriesPoint, MEASUREMENT};
pub use request::{AuditOptions, AuditRequest, DEFAULT_DEVICE};
pub use result::{AuditParams, AuditResult, MetricValue, ResultBatch, ToolOutput};
