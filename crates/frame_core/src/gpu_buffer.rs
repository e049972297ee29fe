//! CPU-writable, GPU-readable buffers on the upload heap.
//!
//! Geometry is written once through [`GpuBufferPool::create_static`].
//! Per-object constants live in a [`MappedConstantBuffer`] that stays mapped
//! until it is dropped; writes through it are only issued while the GPU is
//! idle (every frame ends with a full fence drain), so no lock guards it.

use std::marker::PhantomData;
use std::ptr::NonNull;

use bytemuck::Pod;
use tracing::debug;

use crate::backend::Backend;
use crate::backend::Device;
use crate::backend::UploadBuffer;
use crate::desc::CONSTANT_BUFFER_ALIGNMENT;
use crate::error::GpuError;
use crate::error::GpuResult;

/// Rounds `size` up to the next multiple of 256 bytes.
pub const fn align_constant_size(size: usize) -> usize {
    (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

/// Fails const evaluation unless `T` fills whole 256-byte blocks.
///
/// ```
/// use frame_core::gpu_buffer::assert_constant_layout;
///
/// #[repr(C)]
/// #[derive(Clone, Copy)]
/// struct Padded([f32; 64]);
///
/// const _: () = assert_constant_layout::<Padded>();
/// ```
///
/// An 80-byte layout does not build:
///
/// ```compile_fail
/// use frame_core::gpu_buffer::assert_constant_layout;
///
/// #[repr(C)]
/// #[derive(Clone, Copy)]
/// struct Unpadded([f32; 20]);
///
/// const _: () = assert_constant_layout::<Unpadded>();
/// ```
pub const fn assert_constant_layout<T>() {
    let size = std::mem::size_of::<T>();
    assert!(
        size != 0 && size % CONSTANT_BUFFER_ALIGNMENT == 0,
        "constant buffer layouts must be a non-zero multiple of 256 bytes"
    );
}

/// Plain data that may be written into a constant buffer.
pub trait ConstantData: Pod {
    /// Evaluated whenever a buffer for `Self` is created.
    const LAYOUT_CHECK: () = assert_constant_layout::<Self>();
}

/// Write-once buffer; mapped, filled and unmapped at creation.
pub struct StaticBuffer<B: Backend> {
    buffer: B::Buffer,
    len: u64,
}

impl<B: Backend> StaticBuffer<B> {
    pub fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Vertex data plus the stride and count it is drawn with.
pub struct VertexBuffer<B: Backend> {
    data: StaticBuffer<B>,
    stride: u32,
    vertex_count: u32,
}

impl<B: Backend> VertexBuffer<B> {
    pub fn buffer(&self) -> &B::Buffer {
        self.data.buffer()
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Constant buffer mapped for its whole lifetime.
pub struct MappedConstantBuffer<B: Backend, T: ConstantData> {
    mapped: NonNull<u8>,
    buffer: B::Buffer,
    _data: PhantomData<T>,
}

impl<B: Backend, T: ConstantData> MappedConstantBuffer<B, T> {
    /// Overwrites the buffer contents. Only called between full GPU drains.
    pub fn write(&mut self, value: &T) {
        let bytes = bytemuck::bytes_of(value);
        // SAFETY: `mapped` points at `buffer.size() >= size_of::<T>()` writable
        // bytes that stay mapped until drop, and the GPU is idle between drains.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped.as_ptr(), bytes.len());
        }
    }

    /// Reads back the current contents.
    pub fn read(&self) -> T {
        // SAFETY: see `write`; the mapping is at least `size_of::<T>()` bytes.
        unsafe { std::ptr::read_unaligned(self.mapped.as_ptr() as *const T) }
    }

    pub fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }
}

impl<B: Backend, T: ConstantData> Drop for MappedConstantBuffer<B, T> {
    fn drop(&mut self) {
        self.buffer.unmap();
    }
}

pub struct GpuBufferPool;

impl GpuBufferPool {
    /// Allocates a buffer of exactly `bytes.len()` bytes and copies `bytes`
    /// into it once.
    pub fn create_static<B: Backend>(
        device: &B::Device,
        bytes: &[u8],
        name: &str,
    ) -> GpuResult<StaticBuffer<B>> {
        let len = bytes.len() as u64;
        let buffer = device.create_upload_buffer(len, name)?;
        let mapped = buffer.map()?;
        // SAFETY: the mapping covers `len` bytes and nothing else references it.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.as_ptr(), bytes.len());
        }
        buffer.unmap();
        debug!(name, len, "Created static buffer");
        Ok(StaticBuffer { buffer, len })
    }

    pub fn create_vertex_buffer<B: Backend, V: Pod>(
        device: &B::Device,
        vertices: &[V],
        name: &str,
    ) -> GpuResult<VertexBuffer<B>> {
        let data = Self::create_static(device, bytemuck::cast_slice(vertices), name)?;
        Ok(VertexBuffer {
            data,
            stride: std::mem::size_of::<V>() as u32,
            vertex_count: vertices.len() as u32,
        })
    }

    /// Allocates a 256-byte aligned buffer for `T` and maps it until drop.
    pub fn create_persistently_mapped<B: Backend, T: ConstantData>(
        device: &B::Device,
        name: &str,
    ) -> GpuResult<MappedConstantBuffer<B, T>> {
        let () = T::LAYOUT_CHECK;
        let size = align_constant_size(std::mem::size_of::<T>()) as u64;
        let buffer = device.create_upload_buffer(size, name)?;
        if buffer.size() % CONSTANT_BUFFER_ALIGNMENT as u64 != 0 {
            return Err(GpuError::Map(format!(
                "{name} allocated with unaligned size {}",
                buffer.size()
            )));
        }
        let mapped = buffer.map()?;
        let mut constants = MappedConstantBuffer {
            mapped,
            buffer,
            _data: PhantomData,
        };
        constants.write(&T::zeroed());
        debug!(name, size, "Created persistently mapped constant buffer");
        Ok(constants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;
    use crate::desc::AdapterKind;
    use crate::headless::Headless;
    use crate::scene::PerObjectConstants;

    #[test]
    fn align_rounds_up_to_256() {
        assert_eq!(align_constant_size(1), 256);
        assert_eq!(align_constant_size(80), 256);
        assert_eq!(align_constant_size(256), 256);
        assert_eq!(align_constant_size(257), 512);
        for size in 1..2048 {
            let aligned = align_constant_size(size);
            assert_eq!(aligned % 256, 0);
            assert!(aligned >= size && aligned - size < 256);
        }
    }

    #[test]
    fn static_buffer_holds_copied_bytes() {
        let device = Headless::default()
            .create_device(AdapterKind::Hardware)
            .unwrap();
        let bytes: Vec<u8> = (0..36u8).collect();
        let vb = GpuBufferPool::create_static::<Headless>(&device, &bytes, "VertexBuffer").unwrap();
        assert_eq!(vb.len(), 36);
        assert_eq!(vb.buffer().contents(), bytes);
        assert!(!vb.buffer().is_mapped());
    }

    #[test]
    fn constant_buffer_stays_mapped_until_drop() {
        let device = Headless::default()
            .create_device(AdapterKind::Hardware)
            .unwrap();
        let mut cb =
            GpuBufferPool::create_persistently_mapped::<Headless, PerObjectConstants>(
                &device,
                "ConstantBuffer",
            )
            .unwrap();
        assert_eq!(cb.size() % 256, 0);
        assert!(cb.buffer().is_mapped());

        let mut constants = PerObjectConstants::zeroed();
        constants.rotation = 1.25;
        cb.write(&constants);
        assert_eq!(cb.read().rotation, 1.25);

        let buffer_state = cb.buffer().clone();
        drop(cb);
        assert!(!buffer_state.is_mapped());
    }
}
