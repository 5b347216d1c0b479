pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use server::Server;
pub use state::AppState;
pub use tasks::{BackgroundTasks, TaskKind};
