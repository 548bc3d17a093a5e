use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("grid {width}x{height} is empty or exceeds the signed 32-bit cell index range")]
    OutOfRange { width: usize, height: usize },
    #[error("cell ({row}, {col}) is outside the {width}x{height} grid")]
    IndexOutOfBounds {
        row: isize,
        col: isize,
        width: usize,
        height: usize,
    },
    #[error("gpu unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("kernel build failed: {log}\n--- kernel source ---\n{kernel}")]
    BuildFailure { log: String, kernel: String },
    #[error("gpu execution failed: {0}")]
    LaunchFailure(String),
    #[error("worker interrupted: {0}")]
    WorkerInterrupted(String),
    #[error("cannot start worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, LifeError>;
