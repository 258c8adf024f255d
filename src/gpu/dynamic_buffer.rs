//! Growable GPU buffers backing vertex, index, and particle data.
//!
//! Buffers grow with a 2x strategy when an upload exceeds capacity and
//! never shrink, so a particle stream that fluctuates in size settles on
//! a single allocation.

/// A GPU buffer that can grow dynamically.
pub struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: usize, // bytes
    len: usize,      // bytes of valid data
    usage: wgpu::BufferUsages,
    label: String,
}

impl DynamicBuffer {
    /// Minimum allocation in bytes.
    const MIN_CAPACITY: usize = 64;

    /// Empty buffer with the given initial byte capacity.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        initial_capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let capacity = initial_capacity.max(Self::MIN_CAPACITY);
        let buffer = Self::allocate(device, label, capacity, usage);

        Self {
            buffer,
            capacity,
            len: 0,
            usage,
            label: label.to_owned(),
        }
    }

    fn allocate(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Replace the buffer contents with `data`, growing if necessary.
    ///
    /// Writes are padded to the 4-byte copy alignment wgpu requires; `len`
    /// still reports the unpadded size.
    ///
    /// Returns `true` if the buffer was reallocated.
    pub fn write_bytes(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
    ) -> bool {
        let needed = data.len();
        let padded = needed.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize);

        let reallocated = if padded > self.capacity {
            // 2x growth, minimum 1KB
            let new_capacity = (padded * 2).max(self.capacity + 1024);
            self.buffer =
                Self::allocate(device, &self.label, new_capacity, self.usage);
            self.capacity = new_capacity;
            log::debug!(
                "{}: grew to {} bytes",
                self.label,
                self.capacity
            );
            true
        } else {
            false
        };

        if needed > 0 {
            if padded == needed {
                queue.write_buffer(&self.buffer, 0, data);
            } else {
                let mut staged = data.to_vec();
                staged.resize(padded, 0);
                queue.write_buffer(&self.buffer, 0, &staged);
            }
        }
        self.len = needed;

        reallocated
    }

    /// The underlying wgpu buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Bytes of valid data from the last write.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the last write was empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
