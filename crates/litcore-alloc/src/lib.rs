pub mod arena;

pub use arena::{ArenaScope, TypedArena};
