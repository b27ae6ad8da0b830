// location-bingo/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BingoError {
    #[error("Cell index {0} is outside the card")]
    CellOutOfRange(usize),
    #[error("Decoded state has {0} cells instead of {expected}", expected = crate::defs::CELLCOUNT)]
    InvalidStateLength(usize),
    #[error("State parameter is not valid base64: {0}")]
    InvalidStateEncoding(String),
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, BingoError>;
