use crate::tokenizer::TokenizerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Invalid chunk configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
}
