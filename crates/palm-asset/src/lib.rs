//! Provide asset handling for the palm renderer.
//!
//! This library provides a scene document structured upon GLTF, typed
//! access into its binary payload, and decoded keyframe data for the
//! skeleton evaluator. Fetching raw bytes and images is isolated behind
//! [`source::AssetSource`], so the document can come from a directory,
//! from memory, or from anything else able to hand over bytes.
//!
pub mod accessor;
pub mod animation;
pub mod document;
pub mod error;
/// Model loaders
pub mod loader;
pub mod mesh;
pub mod node;
pub mod skin;
pub mod source;
pub mod texture;

pub use document::SceneDocument;
pub use error::AssetError;
