use std::sync::{Arc, RwLock};

pub mod codec;
pub mod model;
pub mod model_header;
pub mod trainer;

pub use codec::{Decoder, Encoder};
pub use model::{Model, Pack};

/// Sentinel for an absent table entry, both as a character id and as a
/// successor rank.
pub const INVALID_ID: u8 = 0xFF;

/// Most successor characters a single code word can carry.
pub const MAX_SUCCESSOR_N: usize = 7;

#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum DecodeError {
    /// The first byte of a code word has four or more leading one bits, or
    /// selects a pack the model does not define.
    #[error("invalid code word header at byte {0}")]
    InvalidHeader(usize),
    /// The stream ends in the middle of a code word or of an escape pair.
    #[error("compressed input truncated at byte {0}")]
    Truncated(usize),
}

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid model configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed parsing the model header: {0}")]
    HeaderParse(String),
}

static DEFAULT_MODEL: RwLock<Option<Arc<Model>>> = RwLock::new(None);

/// Returns the process-wide default model, building the bundled English
/// model on first use.
pub fn default_model() -> Arc<Model> {
    if let Some(model) = DEFAULT_MODEL.read().unwrap().as_ref() {
        return Arc::clone(model);
    }

    let mut slot = DEFAULT_MODEL.write().unwrap();
    Arc::clone(slot.get_or_insert_with(|| Arc::new(model::english::english_model())))
}

/// Replaces the process-wide default model. Calls already running keep the
/// handle they started with.
pub fn set_default_model(model: Arc<Model>) {
    *DEFAULT_MODEL.write().unwrap() = Some(model);
}

/// Compresses `input` with the default model.
///
/// A NUL byte terminates the input; see [`Encoder::encode`].
pub fn compress(input: &[u8]) -> Vec<u8> {
    Encoder::new(&default_model()).encode_to_vec(input)
}

/// Decompresses `input` with the default model.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Decoder::new(&default_model()).decode_to_vec(input)
}
