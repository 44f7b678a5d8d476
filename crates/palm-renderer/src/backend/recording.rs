use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use wgpu::{BufferUsages, Color, FilterMode, IndexFormat};

use palm_asset::texture::ImageAsset;

use super::{BindGroupResources, BufferDescriptor, DrawCall, GraphicsBackend, SamplerDescriptor};
use crate::renderer::pipeline::PipelineDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer {
        handle: Handle,
        label: String,
        usage: BufferUsages,
        size: u64,
    },
    CreateTexture {
        handle: Handle,
        width: u32,
        height: u32,
    },
    CreateSampler {
        handle: Handle,
        mag_filter: FilterMode,
        min_filter: FilterMode,
    },
    CreatePipeline {
        handle: Handle,
        label: String,
        alpha_cutoff: f32,
    },
    CreateBindGroup {
        handle: Handle,
        bindings: [Handle; 4],
    },
    WriteBuffer {
        buffer: Handle,
        offset: u64,
        size: usize,
    },
    Submit {
        vertex_buffers: [Handle; 4],
        index_buffer: Handle,
        index_format: IndexFormat,
        index_count: u32,
        clear_color: Color,
    },
}

impl Command {
    pub fn is_creation(&self) -> bool {
        !matches!(self, Command::WriteBuffer { .. } | Command::Submit { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    Injected(&'static str),
    UnknownBuffer(Handle),
    OutOfBounds {
        buffer: Handle,
        end: u64,
        size: u64,
    },
}

impl Display for RecordingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::Injected(operation) => write!(f, "Injected {} failure", operation),
            RecordingError::UnknownBuffer(handle) => write!(f, "Unknown buffer #{}", handle.0),
            RecordingError::OutOfBounds { buffer, end, size } => write!(
                f,
                "Write to buffer #{} ends at {}, but it has {} bytes",
                buffer.0, end, size
            ),
        }
    }
}

impl Error for RecordingError {}

/// Keeps buffer contents in memory and logs every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    buffers: Vec<(String, Vec<u8>)>,
    next_handle: usize,
    failing_writes: usize,
    failing_submits: usize,
    failing_creations: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` buffer writes fail.
    pub fn fail_writes(&mut self, count: usize) {
        self.failing_writes = count;
    }

    /// Make the next `count` submissions fail.
    pub fn fail_submits(&mut self, count: usize) {
        self.failing_submits = count;
    }

    pub fn fail_creations(&mut self, fail: bool) {
        self.failing_creations = fail;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn created_resources(&self) -> usize {
        self.commands.iter().filter(|command| command.is_creation()).count()
    }

    pub fn submissions(&self) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::Submit { .. }))
            .collect()
    }

    pub fn writes(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::WriteBuffer { .. }))
            .count()
    }

    pub fn buffer(&self, label: &str) -> Option<&[u8]> {
        self.buffers
            .iter()
            .find(|(buffer_label, _)| buffer_label == label)
            .map(|(_, contents)| contents.as_slice())
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    fn allocate(&mut self) -> Result<Handle, RecordingError> {
        if self.failing_creations {
            return Err(RecordingError::Injected("creation"));
        }
        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        Ok(handle)
    }

    fn insert_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: Vec<u8>,
    ) -> Result<(usize, Handle), RecordingError> {
        let handle = self.allocate()?;
        self.commands.push(Command::CreateBuffer {
            handle,
            label: descriptor.label.to_string(),
            usage: descriptor.usage,
            size: contents.len() as u64,
        });
        self.buffers.push((descriptor.label.to_string(), contents));
        Ok((self.buffers.len() - 1, handle))
    }
}

/// Buffer handle paired with its slot in the content table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedBuffer {
    slot: usize,
    handle: Handle,
}

impl GraphicsBackend for RecordingBackend {
    type Buffer = RecordedBuffer;
    type Texture = Handle;
    type Sampler = Handle;
    type Pipeline = Handle;
    type BindGroup = Handle;
    type Error = RecordingError;

    fn create_buffer_init(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<RecordedBuffer, RecordingError> {
        let (slot, handle) = self.insert_buffer(descriptor, contents.to_vec())?;
        Ok(RecordedBuffer { slot, handle })
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        size: u64,
    ) -> Result<RecordedBuffer, RecordingError> {
        let (slot, handle) = self.insert_buffer(descriptor, vec![0; size as usize])?;
        Ok(RecordedBuffer { slot, handle })
    }

    fn create_texture(&mut self, _label: &str, image: &ImageAsset) -> Result<Handle, RecordingError> {
        let handle = self.allocate()?;
        self.commands.push(Command::CreateTexture {
            handle,
            width: image.width(),
            height: image.height(),
        });
        Ok(handle)
    }

    fn create_sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<Handle, RecordingError> {
        let handle = self.allocate()?;
        self.commands.push(Command::CreateSampler {
            handle,
            mag_filter: descriptor.mag_filter,
            min_filter: descriptor.min_filter,
        });
        Ok(handle)
    }

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor,
    ) -> Result<Handle, RecordingError> {
        let handle = self.allocate()?;
        self.commands.push(Command::CreatePipeline {
            handle,
            label: descriptor.label.to_string(),
            alpha_cutoff: descriptor.alpha_cutoff,
        });
        Ok(handle)
    }

    fn create_bind_group(
        &mut self,
        _label: &str,
        _pipeline: &Handle,
        resources: &BindGroupResources<Self>,
    ) -> Result<Handle, RecordingError> {
        let handle = self.allocate()?;
        self.commands.push(Command::CreateBindGroup {
            handle,
            bindings: [
                resources.uniforms.handle,
                resources.bones.handle,
                *resources.texture,
                *resources.sampler,
            ],
        });
        Ok(handle)
    }

    fn write_buffer(
        &mut self,
        buffer: &RecordedBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), RecordingError> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(RecordingError::Injected("write"));
        }
        let (_, contents) = self
            .buffers
            .get_mut(buffer.slot)
            .ok_or(RecordingError::UnknownBuffer(buffer.handle))?;
        let end = offset + data.len() as u64;
        if end > contents.len() as u64 {
            return Err(RecordingError::OutOfBounds {
                buffer: buffer.handle,
                end,
                size: contents.len() as u64,
            });
        }
        contents[offset as usize..end as usize].copy_from_slice(data);
        self.commands.push(Command::WriteBuffer {
            buffer: buffer.handle,
            offset,
            size: data.len(),
        });
        Ok(())
    }

    fn submit(&mut self, draw: &DrawCall<Self>) -> Result<(), RecordingError> {
        if self.failing_submits > 0 {
            self.failing_submits -= 1;
            return Err(RecordingError::Injected("submit"));
        }
        self.commands.push(Command::Submit {
            vertex_buffers: draw.vertex_buffers.map(|buffer| buffer.handle),
            index_buffer: draw.index_buffer.handle,
            index_format: draw.index_format,
            index_count: draw.index_count,
            clear_color: draw.clear_color,
        });
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_past_end_is_rejected() {
        let mut backend = RecordingBackend::new();
        let descriptor = BufferDescriptor {
            label: "Bones",
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
        };
        let buffer = backend.create_buffer(&descriptor, 8).unwrap();
        backend.write_buffer(&buffer, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.buffer("Bones"), Some(&[0, 0, 0, 0, 1, 2, 3, 4][..]));
        assert_eq!(
            backend.write_buffer(&buffer, 6, &[0; 4]),
            Err(RecordingError::OutOfBounds {
                buffer: Handle(0),
                end: 10,
                size: 8
            })
        );
        assert_eq!(backend.writes(), 1);
    }

    #[test]
    fn test_injected_failures_run_out() {
        let mut backend = RecordingBackend::new();
        let descriptor = BufferDescriptor {
            label: "Uniforms",
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        };
        let buffer = backend.create_buffer(&descriptor, 4).unwrap();
        backend.fail_writes(1);
        assert!(backend.write_buffer(&buffer, 0, &[1; 4]).is_err());
        assert!(backend.write_buffer(&buffer, 0, &[1; 4]).is_ok());

        backend.fail_creations(true);
        assert_eq!(
            backend.create_buffer(&descriptor, 4),
            Err(RecordingError::Injected("creation"))
        );
        assert_eq!(backend.created_resources(), 1);
    }
}
