pub mod engine;

pub use engine::{collect_values, parse_data_pairs, PromptOptions};
