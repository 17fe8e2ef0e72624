pub mod logging;

pub use logging::{init_log_file, init_subscriber, log_startup, print_final_stats, truncate_text};
