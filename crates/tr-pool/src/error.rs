use tr_core::{CoreError, WorkerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("failed to spawn thread for {worker}: {source}")]
    Spawn {
        worker: WorkerId,
        #[source]
        source: std::io::Error,
    },

    #[error("{} worker(s) still active after timeout", active.len())]
    Stalled { active: Vec<WorkerId> },
}

pub type PoolResult<T> = Result<T, PoolError>;
