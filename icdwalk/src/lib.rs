pub mod commands;
pub mod handlers;

pub use handlers::{
    HarvestConfig, format_harvest_stats, harvest_config_from_args, load_documents,
    progress_message, resolve_output_dir, run_harvest,
};
