//! Nova: a browser chat for small text-to-text language models.
pub mod cli;
pub mod log;
pub mod svc;
pub mod web;

#[cfg(test)]
pub mod test_utils;
