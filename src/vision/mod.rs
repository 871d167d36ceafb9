//! Normalization of uploaded images into the single encoded form sent
//! to the model.
mod normalize;

pub use normalize::{ImageEncoding, ImagePayload, normalize};
