pub mod canvas;
pub mod compositor;
pub mod handler;
mod service;
pub mod skin;

pub use canvas::{Canvas, Region};
pub use compositor::{FACE_SIZE, HAT_FRONT, HEAD_FRONT, derive_face, is_fully_transparent, resample};
pub use handler::create_face_router;
pub use service::FaceService;
