use std::{
    borrow::Cow,
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    iter,
    sync::Arc,
};

use log::{debug, error, info, warn};
use wgpu::{
    util::{
        backend_bits_from_env, initialize_adapter_from_env, power_preference_from_env,
        BufferInitDescriptor, DeviceExt,
    },
    Backends, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindingResource, Buffer, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, CompositeAlphaMode, Device, DeviceDescriptor, Extent3d,
    FragmentState, ImageCopyTexture, ImageDataLayout, Instance, InstanceDescriptor, LoadOp,
    MultisampleState, Operations, Origin3d, PipelineCompilationOptions, PipelineLayoutDescriptor,
    PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPipeline,
    RenderPipelineDescriptor, RequestAdapterOptions, Sampler, ShaderModuleDescriptor,
    ShaderSource, StoreOp, Surface, SurfaceConfiguration, SurfaceError, TextureAspect,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexState,
};

use palm_asset::texture::ImageAsset;

use super::{
    depth_texture::DepthTexture, BindGroupResources, BufferDescriptor, DrawCall,
    GraphicsBackend, SamplerDescriptor,
};
use crate::{
    error::RenderError,
    renderer::pipeline::{PipelineDescriptor, ALPHA_CUTOFF_CONSTANT},
    RenderTarget,
};

#[derive(Debug)]
pub enum WgpuBackendError {
    Surface(SurfaceError),
    TextureTooLarge { width: u32, height: u32, limit: u32 },
    WriteOutOfBounds { end: u64, size: u64 },
}

impl Display for WgpuBackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WgpuBackendError::Surface(error) => write!(f, "Surface error: {}", error),
            WgpuBackendError::TextureTooLarge {
                width,
                height,
                limit,
            } => write!(
                f,
                "Texture of {}x{} exceeds the device limit of {}",
                width, height, limit
            ),
            WgpuBackendError::WriteOutOfBounds { end, size } => write!(
                f,
                "Buffer write ends at {}, but the buffer has {} bytes",
                end, size
            ),
        }
    }
}

impl Error for WgpuBackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WgpuBackendError::Surface(error) => Some(error),
            _ => None,
        }
    }
}

impl From<SurfaceError> for WgpuBackendError {
    fn from(error: SurfaceError) -> Self {
        WgpuBackendError::Surface(error)
    }
}

pub struct WgpuTexture {
    #[allow(unused)]
    texture: wgpu::Texture,
    view: TextureView,
}

pub struct WgpuPipeline {
    render_pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
}

/// Draws into the surface of a window.
pub struct WgpuBackend<T: RenderTarget> {
    target: Arc<T>,
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    depth_texture: DepthTexture,
}

impl<T: RenderTarget> WgpuBackend<T> {
    pub async fn new(target: Arc<T>) -> Result<Self, RenderError> {
        let size = target.inner_size();
        let instance = Instance::new(InstanceDescriptor {
            backends: backend_bits_from_env().unwrap_or(Backends::all()),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target.clone())
            .map_err(RenderError::backend)?;
        let adapter = match initialize_adapter_from_env(&instance, Some(&surface)) {
            Some(adapter) => adapter,
            None => instance
                .request_adapter(&RequestAdapterOptions {
                    power_preference: power_preference_from_env().unwrap_or(PowerPreference::None),
                    force_fallback_adapter: false,
                    compatible_surface: Some(&surface),
                })
                .await
                .ok_or_else(|| RenderError::backend("no compatible graphic adapter"))?,
        };
        info!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Device"),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(RenderError::backend)?;
        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            error!("Uncaptured wgpu error: {}", error);
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        // The texture is sampled as plain unorm, so keep the output linear too.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::backend("surface is not supported by the adapter"))?;
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&CompositeAlphaMode::PreMultiplied)
        {
            CompositeAlphaMode::PreMultiplied
        } else {
            warn!(
                "Surface can't be composited premultiplied, supported: {:?}",
                surface_caps.alpha_modes
            );
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(CompositeAlphaMode::Auto)
        };
        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        debug!(
            "Configured {}x{} surface as {:?}, {:?}",
            config.width, config.height, config.format, config.alpha_mode
        );

        let depth_texture = DepthTexture::new(&device, (config.width, config.height));
        Ok(Self {
            target,
            surface,
            device,
            queue,
            config,
            depth_texture,
        })
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 {
            return;
        }
        self.config.width = size.0;
        self.config.height = size.1;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = DepthTexture::new(&self.device, size);
    }
}

impl<T: RenderTarget> GraphicsBackend for WgpuBackend<T> {
    type Buffer = Buffer;
    type Texture = WgpuTexture;
    type Sampler = Sampler;
    type Pipeline = WgpuPipeline;
    type BindGroup = BindGroup;
    type Error = WgpuBackendError;

    fn create_buffer_init(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<Buffer, WgpuBackendError> {
        Ok(self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some(descriptor.label),
            contents,
            usage: descriptor.usage,
        }))
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        size: u64,
    ) -> Result<Buffer, WgpuBackendError> {
        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(descriptor.label),
            size,
            usage: descriptor.usage,
            mapped_at_creation: false,
        }))
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &ImageAsset,
    ) -> Result<WgpuTexture, WgpuBackendError> {
        let limit = self.device.limits().max_texture_dimension_2d;
        let (width, height) = image.size();
        if width > limit || height > limit {
            return Err(WgpuBackendError::TextureTooLarge {
                width,
                height,
                limit,
            });
        }
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            image.pixels(),
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(image.bytes_per_row()),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&TextureViewDescriptor::default());
        Ok(WgpuTexture { texture, view })
    }

    fn create_sampler(
        &mut self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Sampler, WgpuBackendError> {
        Ok(self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(descriptor.label),
            mag_filter: descriptor.mag_filter,
            min_filter: descriptor.min_filter,
            ..Default::default()
        }))
    }

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor,
    ) -> Result<WgpuPipeline, WgpuBackendError> {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(descriptor.label),
            source: ShaderSource::Wgsl(Cow::Borrowed(descriptor.shader_source)),
        });
        let bind_group_layout = self
            .device
            .create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some(descriptor.label),
                entries: &descriptor.bindings,
            });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(descriptor.label),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
        let constants = HashMap::from([(
            ALPHA_CUTOFF_CONSTANT.to_string(),
            descriptor.alpha_cutoff as f64,
        )]);
        let render_pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(descriptor.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: &shader_module,
                    entry_point: descriptor.vertex_entry_name,
                    compilation_options: Default::default(),
                    buffers: &descriptor.vertex_buffers,
                },
                fragment: Some(FragmentState {
                    module: &shader_module,
                    entry_point: descriptor.fragment_entry_name,
                    compilation_options: PipelineCompilationOptions {
                        constants: &constants,
                        ..Default::default()
                    },
                    targets: &[Some(ColorTargetState {
                        format: self.config.format,
                        blend: Some(descriptor.blend),
                        write_mask: ColorWrites::all(),
                    })],
                }),
                primitive: descriptor.primitive,
                depth_stencil: Some(descriptor.depth_stencil.clone()),
                multisample: MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });
        Ok(WgpuPipeline {
            render_pipeline,
            bind_group_layout,
        })
    }

    fn create_bind_group(
        &mut self,
        label: &str,
        pipeline: &WgpuPipeline,
        resources: &BindGroupResources<Self>,
    ) -> Result<BindGroup, WgpuBackendError> {
        Ok(self.device.create_bind_group(&BindGroupDescriptor {
            label: Some(label),
            layout: &pipeline.bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: resources.uniforms.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: resources.bones.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::TextureView(&resources.texture.view),
                },
                BindGroupEntry {
                    binding: 3,
                    resource: BindingResource::Sampler(resources.sampler),
                },
            ],
        }))
    }

    fn write_buffer(
        &mut self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), WgpuBackendError> {
        let end = offset + data.len() as u64;
        if end > buffer.size() {
            return Err(WgpuBackendError::WriteOutOfBounds {
                end,
                size: buffer.size(),
            });
        }
        self.queue.write_buffer(buffer, offset, data);
        Ok(())
    }

    fn submit(&mut self, draw: &DrawCall<Self>) -> Result<(), WgpuBackendError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(error @ (SurfaceError::Lost | SurfaceError::Outdated)) => {
                debug!("Surface {:?}, reconfiguring", error);
                self.surface.configure(&self.device, &self.config);
                return Err(error.into());
            }
            Err(error) => return Err(error.into()),
        };
        let view = output
            .texture
            .create_view(&TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(draw.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: self.depth_texture.texture_view(),
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&draw.pipeline.render_pipeline);
            render_pass.set_bind_group(0, draw.bind_group, &[]);
            for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            render_pass.set_index_buffer(draw.index_buffer.slice(..), draw.index_format);
            render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
        self.queue.submit(iter::once(encoder.finish()));
        self.target.pre_present_notify();
        output.present();
        Ok(())
    }
}
