pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod model;
pub mod palette;
pub mod postprocess;

pub use config::EvalConfig;
pub use error::EvalError;
pub use metrics::StreamingMeanIou;
pub use model::{DilatedNet, DilatedNetConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
