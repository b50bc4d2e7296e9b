//! Frame plumbing: software canvas, timing, frame callbacks and surfaces.

pub mod canvas;
pub mod clock;
pub mod frame;
pub mod gpu_context;
pub mod surface;
pub mod surface_renderer;
pub mod timer;

pub use canvas::{Canvas, DrawOp, GradientAxis, QuadFill};
pub use clock::AnimationClock;
pub use frame::{Frame, FrameLoop, FrameToken};
pub use gpu_context::GpuContext;
pub use surface::{BufferMount, MountPoint, RenderSurface, SurfaceProbe, SurfaceSize};
pub use surface_renderer::SurfaceRenderer;
pub use timer::{Interval, Throttle};
