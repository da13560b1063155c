use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Difficulty must be a number between 0 and 100")]
    InvalidDifficulty,
    #[error("Sector shape does not match the sector size")]
    InvalidBoardShape,
    #[error("Saved game is corrupt or does not match its seed")]
    CorruptSave,
}

pub type Result<T> = core::result::Result<T, GameError>;
