//! Error types for wrapview

use thiserror::Error;

/// Main error type for wrapview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Invalid data: {0}")]
    InvalidData(String),
    
    #[error("Algorithm error: {0}")]
    Algorithm(String),
    
    #[error("Visualization error: {0}")]
    Visualization(String),
}

/// Result type alias for wrapview operations
pub type Result<T> = std::result::Result<T, Error>;
