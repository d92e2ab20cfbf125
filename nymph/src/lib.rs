// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler helpers for convenience
pub use handlers::{
    GlobalArgs, delay_arg, describe_slot, load_orders, log_level, parse_row_index, resolve_path,
};
