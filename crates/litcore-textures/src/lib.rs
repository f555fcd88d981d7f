//! Transient texture & render-target pooling (`spec.md` §4.3), grounded on
//! `ard-render-textures::factory` for the module boundary.

pub mod cache;
pub mod key;

pub use cache::{CacheConfig, ResourceCache};
pub use key::{Swizzle, TextureKey};
