pub mod config;
pub mod dom;
pub mod error;
pub mod storage;
pub mod tracking;
pub mod types;

pub use config::{AppConfig, ConfigProvider, InertPolicy, SinkConfig, SinkKind};
pub use error::{OptimizeError, OptimizeResult};
pub use storage::KeyValueStore;
pub use types::{Conditional, ConditionalType, DataType, Operator, Optimization, Variant};
