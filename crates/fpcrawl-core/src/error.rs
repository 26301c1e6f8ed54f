use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalogs file {path}: {source}")]
    CatalogsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalogs file: {0}")]
    CatalogsFileParse(#[from] serde_yaml::Error),

    #[error("catalogs validation failed: {0}")]
    Validation(String),
}
