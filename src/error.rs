/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
use thiserror::Error;

/// Errors produced while loading, comparing and ranking signals.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Length error: {0}")]
    Length(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
