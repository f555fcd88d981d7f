/// A linear bump allocator over a reused `Vec<T>`.
///
/// Unlike a general-purpose arena, `TypedArena<T>` is homogeneous: it hands
/// out `&mut [T]` slices by bumping a cursor through a backing `Vec<T>` that
/// is grown (never shrunk) as needed and is never reallocated away between
/// frames. This is the "per-render-pass linear bump allocator" of
/// `SPEC_FULL.md` §2 component A, specialized per element type instead of
/// byte-addressable, which avoids every use of `unsafe` an arena over raw
/// bytes would otherwise require.
///
/// Per invariant C-I1, callers must [`TypedArena::reset`] this once per
/// frame (typically from the view's `begin_frame`); no allocation handed
/// out before a reset is valid to read after it.
pub struct TypedArena<T> {
    storage: Vec<T>,
    cursor: usize,
}

impl<T: Clone + Default> Default for TypedArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Default> TypedArena<T> {
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            cursor: 0,
        }
    }

    /// Rewinds the cursor to zero. Backing storage capacity is retained.
    #[inline]
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// A token identifying the current cursor position, for use with
    /// [`TypedArena::rewind`] or [`ArenaScope`].
    #[inline]
    pub fn mark(&self) -> usize {
        self.cursor
    }

    /// Rewinds the cursor to a previously recorded mark.
    #[inline]
    pub fn rewind(&mut self, mark: usize) {
        debug_assert!(mark <= self.cursor);
        self.cursor = mark;
    }

    /// Bumps the cursor by `count` elements and returns them, freshly
    /// zeroed via `T::default()`. Grows the backing `Vec` if needed.
    pub fn alloc(&mut self, count: usize) -> &mut [T] {
        let start = self.cursor;
        let end = start + count;
        if end > self.storage.len() {
            self.storage.resize(end, T::default());
        } else {
            for v in &mut self.storage[start..end] {
                *v = T::default();
            }
        }
        self.cursor = end;
        &mut self.storage[start..end]
    }

    /// Total elements currently allocated (since the last reset/rewind).
    #[inline]
    pub fn len(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }
}

/// An RAII guard owning a sub-region of a [`TypedArena`]; rewinds the arena
/// back to the mark recorded at construction when dropped.
///
/// Used for allocations whose lifetime is scoped tighter than a whole
/// frame, e.g. scratch used only while froxelizing a single view.
pub struct ArenaScope<'a, T: Clone + Default> {
    arena: &'a mut TypedArena<T>,
    mark: usize,
}

impl<'a, T: Clone + Default> ArenaScope<'a, T> {
    pub fn new(arena: &'a mut TypedArena<T>) -> Self {
        let mark = arena.mark();
        Self { arena, mark }
    }

    pub fn alloc(&mut self, count: usize) -> &mut [T] {
        self.arena.alloc(count)
    }
}

impl<'a, T: Clone + Default> Drop for ArenaScope<'a, T> {
    fn drop(&mut self) {
        self.arena.rewind(self.mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_reclaims_capacity_without_reallocating() {
        let mut arena: TypedArena<u32> = TypedArena::new();
        {
            let slice = arena.alloc(16);
            slice[0] = 42;
        }
        assert_eq!(arena.len(), 16);
        let cap_before = arena.storage.capacity();
        arena.reset();
        assert_eq!(arena.len(), 0);
        let slice = arena.alloc(16);
        // Re-zeroed, not left with stale data.
        assert_eq!(slice[0], 0);
        assert_eq!(arena.storage.capacity(), cap_before);
    }

    #[test]
    fn scope_rewinds_on_drop() {
        let mut arena: TypedArena<u32> = TypedArena::new();
        arena.alloc(4);
        assert_eq!(arena.mark(), 4);
        {
            let mut scope = ArenaScope::new(&mut arena);
            scope.alloc(8);
        }
        assert_eq!(arena.mark(), 4);
    }
}
