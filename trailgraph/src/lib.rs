pub mod commands;
pub mod handlers;

pub use handlers::{build_run_options, handle_analyze, init_tracing, resolve_path};
