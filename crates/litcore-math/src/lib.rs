//! Re-exports `glam` as the core's vector/matrix type, the way `ard-math`
//! wraps it for the rest of the workspace. Keeping this indirection means a
//! future swap to a different linear-algebra crate touches one `Cargo.toml`.
pub use glam::*;
