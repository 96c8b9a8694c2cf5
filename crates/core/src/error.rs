use thiserror::Error;

#[derive(Error, Debug)]
pub enum HerdError {
    #[error("initial worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("load threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: u64,
        #[source]
        source: std::io::Error,
    },
}
