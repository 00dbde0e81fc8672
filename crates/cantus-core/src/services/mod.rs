mod access;
pub mod details;
pub mod media_service;
pub mod synonyms;

pub use media_service::MediaService;
