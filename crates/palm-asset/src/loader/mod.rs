/// GLTF and GLB loader with `gltf` crate.
pub mod gltf;

/// Buffer URI schemes.
pub mod scheme;
