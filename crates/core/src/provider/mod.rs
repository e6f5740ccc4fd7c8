pub mod llm;
pub mod t5;
pub mod test_provider;
