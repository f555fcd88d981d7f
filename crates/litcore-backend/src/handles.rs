/// Opaque handles returned by a [`crate::CommandStreamBackend`]. All are
/// newtypes over `u64` so an invalid handle (backend allocation failure,
/// per `spec.md` §4.3.5/§7) can be represented as `u64::MAX` without an
/// `Option` wrapper at every call site — matching how the backend itself
/// reports failures (an invalid handle, not a panic).
macro_rules! handle {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const INVALID: Self = Self(u64::MAX);

            #[inline(always)]
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            #[inline(always)]
            pub fn raw(self) -> u64 {
                self.0
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self.0 != u64::MAX
            }
        }
    };
}

handle!(BufferHandle);
handle!(TextureHandle);
handle!(RenderTargetHandle);
handle!(PipelineHandle);
handle!(SyncHandle);
