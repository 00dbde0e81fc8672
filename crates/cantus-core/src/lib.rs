pub mod domain;
pub mod dto;
pub mod errors;
pub mod ports;
pub mod search;
pub mod services;
pub mod time_serde;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::CoreError;
