use std::sync::Arc;

use wgpu::{BindGroup, BindGroupLayout, Device, RenderPipeline, Sampler, Surface, SurfaceConfiguration};
use winit::window::Window;

use super::gpu_context::GpuContext;
use super::surface::{RenderSurface, SurfaceSize};
use crate::error::{EngineError, Result};

/// sRGB-encoded RGBA, the layout `Canvas` produces
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// GPU copy of the CPU frame and the bind group that exposes it to the shader
struct FrameTexture {
    texture: wgpu::Texture,
    bind_group: BindGroup,
    size: SurfaceSize,
}

impl FrameTexture {
    fn new(device: &Device, layout: &BindGroupLayout, sampler: &Sampler, size: SurfaceSize) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tile frame"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tile frame bindings"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Self { texture, bind_group, size }
    }

    fn upload(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        queue.write_texture(
            self.texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.size.width),
                rows_per_image: Some(self.size.height),
            },
            extent(self.size),
        );
    }
}

fn extent(size: SurfaceSize) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

/// Window surface that shows software-rendered frames
///
/// Each frame is uploaded to a texture and stretched over the window with a
/// single fullscreen triangle.
pub struct SurfaceRenderer {
    gpu: GpuContext,
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    pipeline: RenderPipeline,
    layout: BindGroupLayout,
    sampler: Sampler,
    frame: FrameTexture,
}

impl SurfaceRenderer {
    /// Acquire a presentable surface for `window`
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let inner = window.inner_size();
        let size = SurfaceSize::new(inner.width.max(1), inner.height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| EngineError::SurfaceUnavailable(e.to_string()))?;
        let (gpu, adapter) = pollster::block_on(GpuContext::new_with_surface(&instance, &surface))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| EngineError::SurfaceUnavailable("surface reports no formats".to_string()))?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &config);

        let device = gpu.device();
        let layout = frame_layout(device);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tile frame sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let pipeline = display_pipeline(device, &layout, format);
        let frame = FrameTexture::new(device, &layout, &sampler, size);

        log::info!(
            "surface ready: {}x{} {:?} on {}",
            size.width,
            size.height,
            format,
            adapter.get_info().name
        );

        Ok(Self {
            gpu,
            surface,
            config,
            pipeline,
            layout,
            sampler,
            frame,
        })
    }

    /// Upload `pixels` and show them; a lost or outdated surface skips the frame
    pub fn render_pixels(&self, pixels: &[u8]) -> Result<()> {
        if pixels.len() != self.frame.size.byte_len() {
            return Err(EngineError::SurfaceUnavailable(format!(
                "frame of {} bytes does not fit a {}x{} surface",
                pixels.len(),
                self.frame.size.width,
                self.frame.size.height
            )));
        }
        self.frame.upload(self.gpu.queue(), pixels);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(self.gpu.device(), &self.config);
                return Ok(());
            }
            Err(e) => return Err(EngineError::SurfaceUnavailable(e.to_string())),
        };
        let target = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("tile frame") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tile frame"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.frame.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.gpu.queue().submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.frame.size.width, self.frame.size.height)
    }
}

impl RenderSurface for SurfaceRenderer {
    fn size(&self) -> SurfaceSize {
        self.frame.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() || size == self.frame.size {
            return;
        }

        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(self.gpu.device(), &self.config);
        self.frame = FrameTexture::new(self.gpu.device(), &self.layout, &self.sampler, size);
    }

    fn present(&mut self, pixels: &[u8]) -> Result<()> {
        self.render_pixels(pixels)
    }
}

fn frame_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("tile frame layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn display_pipeline(device: &Device, layout: &BindGroupLayout, format: wgpu::TextureFormat) -> RenderPipeline {
    let shader = device.create_shader_module(wgpu::include_wgsl!("../display.wgsl"));
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("tile display layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("tile display"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
