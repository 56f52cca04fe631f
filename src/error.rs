//! Error taxonomy for the generation pipeline.
//!
//! Configuration and classification failures are fatal: they indicate a
//! defective rule table or octave profile, never a transient condition.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    /// Invalid level or map parameters, detected at validation time.
    /// Generation must not proceed past this.
    #[error("invalid generation config: {0}")]
    Config(String),

    /// No biome rule matched a cell. Indicates a gap in the rule table; the
    /// offending inputs are carried for diagnosis.
    #[error(
        "no biome rule matched cell ({x}, {y}): temperature {temperature}, \
         rainfall {rainfall}, elevation {elevation}"
    )]
    Classification {
        x: usize,
        y: usize,
        temperature: f32,
        rainfall: f32,
        elevation: u8,
    },

    /// Malformed or truncated save blob. The in-memory map is left untouched
    /// when this surfaces from a load.
    #[error("malformed save data: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GenResult<T> = Result<T, GenError>;
