//! GPU mirror of externally owned particle positions.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;

use crate::gpu::{BufferHandle, BufferKind, BufferUsage, RenderBackend};

/// Particle positions shared between a simulation (the owner) and the
/// renderer (a reader).
pub type ParticleSource = Rc<RefCell<Vec<Vec3>>>;

/// Copies particle positions into a GPU vertex buffer once per tick.
///
/// The stream holds only a weak reference: the simulation owns the data,
/// and a dropped source reads as absent.
#[derive(Debug, Default)]
pub struct ParticleStream {
    source: Option<Weak<RefCell<Vec<Vec3>>>>,
    buffer: Option<BufferHandle>,
    count: u32,
}

impl ParticleStream {
    /// A stream with no source and no buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the stream at new data. Takes effect at the next
    /// [`resync`](Self::resync).
    pub fn set_source(&mut self, source: &ParticleSource) {
        self.source = Some(Rc::downgrade(source));
    }

    /// Detach from the current source.
    pub fn clear_source(&mut self) {
        self.source = None;
    }

    /// Re-upload the source's positions.
    ///
    /// An absent, dropped, or empty source sets the count to zero without
    /// touching the GPU. The buffer is created on the first non-empty
    /// upload and reused afterwards.
    pub fn resync<G: RenderBackend + ?Sized>(&mut self, gpu: &mut G) {
        let Some(source) = self.source.as_ref().and_then(Weak::upgrade) else {
            self.count = 0;
            return;
        };
        let Ok(positions) = source.try_borrow() else {
            log::warn!("particle source is being modified; keeping last upload");
            return;
        };
        if positions.is_empty() {
            self.count = 0;
            return;
        }

        let buffer = match self.buffer {
            Some(buffer) => buffer,
            None => {
                let Some(buffer) =
                    gpu.create_buffer("particle positions", BufferKind::Vertex)
                else {
                    log::warn!("particle buffer creation failed");
                    self.count = 0;
                    return;
                };
                log::debug!("created particle buffer");
                self.buffer = Some(buffer);
                buffer
            }
        };

        gpu.upload_buffer(
            buffer,
            bytemuck::cast_slice(positions.as_slice()),
            BufferUsage::Stream,
        );
        self.count = positions.len() as u32;
    }

    /// Particles in the last upload.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mirror buffer, once created.
    #[must_use]
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Release the mirror buffer. Safe to call repeatedly.
    pub fn teardown<G: RenderBackend + ?Sized>(&mut self, gpu: &mut G) {
        if let Some(buffer) = self.buffer.take() {
            gpu.release_buffer(buffer);
        }
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::{Call, RecordingGpu};

    fn source(n: usize) -> ParticleSource {
        Rc::new(RefCell::new(vec![Vec3::ONE; n]))
    }

    #[test]
    fn no_source_means_zero_and_no_gpu_work() {
        let mut gpu = RecordingGpu::new();
        let mut stream = ParticleStream::new();
        stream.resync(&mut gpu);
        assert_eq!(stream.count(), 0);
        assert!(gpu.calls.is_empty());
    }

    #[test]
    fn empty_source_uploads_nothing() {
        let mut gpu = RecordingGpu::new();
        let mut stream = ParticleStream::new();
        let data = source(0);
        stream.set_source(&data);
        stream.resync(&mut gpu);
        assert_eq!(stream.count(), 0);
        assert!(gpu.uploads().is_empty());
        assert!(stream.buffer().is_none());
    }

    #[test]
    fn resync_creates_buffer_once_and_streams() {
        let mut gpu = RecordingGpu::new();
        let mut stream = ParticleStream::new();
        let data = source(3);
        stream.set_source(&data);
        stream.resync(&mut gpu);
        data.borrow_mut().push(Vec3::ZERO);
        stream.resync(&mut gpu);

        assert_eq!(stream.count(), 4);
        assert_eq!(
            gpu.count(|call| matches!(call, Call::CreateBuffer(..))),
            1
        );
        let uploads = gpu.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].1, 3 * 12);
        assert_eq!(uploads[1].1, 4 * 12);
        assert!(uploads.iter().all(|u| u.2 == BufferUsage::Stream));
    }

    #[test]
    fn source_emptied_after_upload_drops_count() {
        let mut gpu = RecordingGpu::new();
        let mut stream = ParticleStream::new();
        let data = source(5);
        stream.set_source(&data);
        stream.resync(&mut gpu);
        data.borrow_mut().clear();
        stream.resync(&mut gpu);
        assert_eq!(stream.count(), 0);
        assert_eq!(gpu.uploads().len(), 1);
    }

    #[test]
    fn dropped_source_reads_as_absent() {
        let mut gpu = RecordingGpu::new();
        let mut stream = ParticleStream::new();
        let data = source(2);
        stream.set_source(&data);
        stream.resync(&mut gpu);
        drop(data);
        stream.resync(&mut gpu);
        assert_eq!(stream.count(), 0);
    }

    #[test]
    fn teardown_releases_buffer_once() {
        let mut gpu = RecordingGpu::new();
        let mut stream = ParticleStream::new();
        let data = source(2);
        stream.set_source(&data);
        stream.resync(&mut gpu);
        stream.teardown(&mut gpu);
        stream.teardown(&mut gpu);
        assert_eq!(gpu.live_handles(), 0);
        assert_eq!(stream.count(), 0);
    }
}
