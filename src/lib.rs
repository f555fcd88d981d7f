pub mod math {
    pub use litcore_math::*;
}

pub mod log {
    pub use litcore_log::*;
}

pub mod alloc {
    pub use litcore_alloc::*;
}

pub mod base {
    pub use litcore_base::*;
}

pub mod backend {
    pub use litcore_backend::*;
}

pub mod lighting {
    pub use litcore_lighting::*;
}

pub mod camera {
    pub use litcore_camera::*;
}

pub mod objects {
    pub use litcore_objects::*;
}

pub mod renderers {
    pub use litcore_renderers::*;
}

pub mod textures {
    pub use litcore_textures::*;
}

pub mod view {
    pub use litcore_view::*;
}

pub mod prelude {
    pub use crate::backend::CommandStreamBackend;
    pub use crate::camera::{CameraInfo, Froxelizer, Viewport};
    pub use crate::lighting::Light;
    pub use crate::objects::{LightSoa, RenderableSoa};
    pub use crate::renderers::{Command, RenderPass};
    pub use crate::textures::{ResourceCache, TextureKey};
    pub use crate::view::View;
}
