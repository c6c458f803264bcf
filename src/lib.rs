pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notices;
pub mod remote;
pub mod state;
pub mod storage;
pub mod sync;
pub mod tap;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::ProgressStore;
