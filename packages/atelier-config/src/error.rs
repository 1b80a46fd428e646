use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read configuration at {path:?}.")]
	Read { path: PathBuf, source: io::Error },
	#[error("Failed to parse configuration at {path:?}: {source}")]
	Parse { path: PathBuf, source: toml::de::Error },
	#[error("{message}")]
	Validation { message: String },
}
