use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{EngineError, Result};
use crate::math::Rgb;

/// Pixel dimensions of a drawable area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGBA byte length of a frame this size
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Something a finished RGBA frame can be presented to
pub trait RenderSurface {
    fn size(&self) -> SurfaceSize;

    fn resize(&mut self, size: SurfaceSize);

    /// Present a full frame of `size().byte_len()` bytes
    fn present(&mut self, pixels: &[u8]) -> Result<()>;
}

/// Host element the scene attaches to
///
/// Owns nothing of the scene; it only hands out a surface, or accepts a
/// static fallback colour when no surface can be provided.
pub trait MountPoint {
    fn size(&self) -> SurfaceSize;

    fn acquire_surface(&mut self) -> Result<Box<dyn RenderSurface>>;

    fn show_fallback(&mut self, color: Rgb);
}

/// What a [`BufferMount`] has observed, shared with its surfaces
#[derive(Debug, Default)]
pub struct SurfaceProbe {
    pub size: SurfaceSize,
    pub presented: u64,
    pub last_frame: Vec<u8>,
    pub acquired: u32,
    pub released: u32,
    pub fallback: Option<Rgb>,
}

/// In-memory mount point, used for headless runs and tests
#[derive(Debug, Clone)]
pub struct BufferMount {
    probe: Rc<RefCell<SurfaceProbe>>,
    available: bool,
}

impl BufferMount {
    pub fn new(width: u32, height: u32) -> Self {
        let probe = SurfaceProbe {
            size: SurfaceSize::new(width, height),
            ..Default::default()
        };
        Self {
            probe: Rc::new(RefCell::new(probe)),
            available: true,
        }
    }

    /// A mount whose surface can never be acquired
    pub fn unavailable(width: u32, height: u32) -> Self {
        Self {
            available: false,
            ..Self::new(width, height)
        }
    }

    pub fn presented(&self) -> u64 {
        self.probe.borrow().presented
    }

    pub fn last_frame(&self) -> Vec<u8> {
        self.probe.borrow().last_frame.clone()
    }

    /// Number of acquired surfaces that are still alive
    pub fn live_surfaces(&self) -> u32 {
        let probe = self.probe.borrow();
        probe.acquired - probe.released
    }

    pub fn fallback(&self) -> Option<Rgb> {
        self.probe.borrow().fallback
    }

    /// Pixel at (x, y) of the last presented frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let probe = self.probe.borrow();
        if x >= probe.size.width || y >= probe.size.height {
            return None;
        }
        let idx = ((y * probe.size.width + x) * 4) as usize;
        probe
            .last_frame
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

impl MountPoint for BufferMount {
    fn size(&self) -> SurfaceSize {
        self.probe.borrow().size
    }

    fn acquire_surface(&mut self) -> Result<Box<dyn RenderSurface>> {
        if !self.available {
            return Err(EngineError::SurfaceUnavailable(
                "buffer mount has no surface".to_string(),
            ));
        }
        self.probe.borrow_mut().acquired += 1;
        Ok(Box::new(BufferSurface {
            probe: Rc::clone(&self.probe),
        }))
    }

    fn show_fallback(&mut self, color: Rgb) {
        self.probe.borrow_mut().fallback = Some(color);
    }
}

struct BufferSurface {
    probe: Rc<RefCell<SurfaceProbe>>,
}

impl RenderSurface for BufferSurface {
    fn size(&self) -> SurfaceSize {
        self.probe.borrow().size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.probe.borrow_mut().size = size;
    }

    fn present(&mut self, pixels: &[u8]) -> Result<()> {
        let mut probe = self.probe.borrow_mut();
        if pixels.len() != probe.size.byte_len() {
            return Err(EngineError::SurfaceUnavailable(format!(
                "frame of {} bytes does not fit a {}x{} surface",
                pixels.len(),
                probe.size.width,
                probe.size.height
            )));
        }
        probe.presented += 1;
        probe.last_frame.clear();
        probe.last_frame.extend_from_slice(pixels);
        Ok(())
    }
}

impl Drop for BufferSurface {
    fn drop(&mut self) {
        self.probe.borrow_mut().released += 1;
    }
}
