mod config;
mod errors;

pub use config::{AppConfig, EXPORT_FILE_NAME};
pub use errors::ErrorKind;
