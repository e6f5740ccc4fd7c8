mod assets;
pub mod provider;

pub mod assistant;
pub mod completion;
pub mod config;
pub mod model;
pub mod session;

#[cfg(test)]
pub mod test_utils;

pub use crate::assets::get_data_dir;
pub use crate::provider::llm::get_completion_llm;
