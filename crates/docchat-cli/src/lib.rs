//! Terminal UI helpers for docchat

mod ui;

pub use ui::{display_banner, is_affirmative, print_response, prompt_confirm, read_query};
