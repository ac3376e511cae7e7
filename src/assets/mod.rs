/// MIME gate and image decoding.
pub mod decode;
/// Decoded layers and load slots.
pub mod resource;
