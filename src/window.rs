use std::sync::Arc;

use winit::event::MouseScrollDelta;
use winit::keyboard::KeyCode;
use winit::window::Window as WinitWindow;

use crate::core::{MountPoint, RenderSurface, SurfaceRenderer, SurfaceSize};
use crate::error::Result;
use crate::math::Rgb;

/// Pixels scrolled per mouse-wheel line
pub const WHEEL_LINE: f32 = 40.0;
pub const PAGE_STEP: f32 = 600.0;
pub const ARROW_STEP: f32 = 120.0;

/// A winit window as the scene's mount point
pub struct WindowMount {
    inner: Arc<WinitWindow>,
    fallback: Option<Rgb>,
}

impl WindowMount {
    pub fn new(window: Arc<WinitWindow>) -> Self {
        Self {
            inner: window,
            fallback: None,
        }
    }

    pub fn inner(&self) -> &Arc<WinitWindow> {
        &self.inner
    }

    pub fn request_redraw(&self) {
        self.inner.request_redraw();
    }

    /// Colour shown in place of the animation, if the surface was lost
    pub fn fallback(&self) -> Option<Rgb> {
        self.fallback
    }
}

impl MountPoint for WindowMount {
    fn size(&self) -> SurfaceSize {
        let size = self.inner.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn acquire_surface(&mut self) -> Result<Box<dyn RenderSurface>> {
        let renderer = SurfaceRenderer::new(Arc::clone(&self.inner))?;
        Ok(Box::new(renderer))
    }

    fn show_fallback(&mut self, color: Rgb) {
        if self.fallback.is_none() {
            log::info!("animation unavailable, static background {}", color);
            self.inner.set_title(&format!("{} (static)", self.inner.title()));
        }
        self.fallback = Some(color);
    }
}

/// Scroll distance of a mouse-wheel event; positive scrolls down the page
pub fn wheel_scroll(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, lines) => -lines * WHEEL_LINE,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}

/// Scroll distance of a navigation key, None for other keys
pub fn key_scroll(key: KeyCode) -> Option<f32> {
    match key {
        KeyCode::PageDown => Some(PAGE_STEP),
        KeyCode::PageUp => Some(-PAGE_STEP),
        KeyCode::ArrowDown => Some(ARROW_STEP),
        KeyCode::ArrowUp => Some(-ARROW_STEP),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn wheel_lines_scale_to_pixels() {
        assert_eq!(wheel_scroll(MouseScrollDelta::LineDelta(0.0, -3.0)), 120.0);
        assert_eq!(wheel_scroll(MouseScrollDelta::LineDelta(0.0, 1.0)), -40.0);
    }

    #[test]
    fn pixel_deltas_pass_through() {
        let delta = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -75.0));
        assert_eq!(wheel_scroll(delta), 75.0);
    }

    #[test]
    fn navigation_keys_scroll() {
        assert_eq!(key_scroll(KeyCode::PageDown), Some(600.0));
        assert_eq!(key_scroll(KeyCode::ArrowUp), Some(-120.0));
        assert_eq!(key_scroll(KeyCode::KeyW), None);
    }
}
