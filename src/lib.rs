pub mod app;
pub mod config;
pub mod electricity;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod mode;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::{resolve_data_path, resolve_port, TrackerConfig};
pub use state::{AppData, AppState};
pub use storage::load_store;
