pub mod influx_client;
pub mod js_executor;

pub use influx_client::{InfluxClient, InfluxSettings, TimeSeriesSink};
pub use js_executor::JsExecutor;
