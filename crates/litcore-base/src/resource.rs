/// Opaque identifier for a slot in a resource table (`litcore-textures`'
/// in-use map, `litcore-renderers`' material/mesh lookups).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(usize);

impl From<ResourceId> for usize {
    #[inline(always)]
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl From<usize> for ResourceId {
    #[inline(always)]
    fn from(value: usize) -> Self {
        ResourceId(value)
    }
}
