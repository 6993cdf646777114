// THEORY:
// The `ParallelPipeline` processes many independent frames at once. The engine
// itself stays single-threaded per frame: parallelism comes only from running
// several frames side by side, each on its own worker.
//
// Key architectural principles:
// 1.  **Owned Frames**: A frame handed to the pool must outlive the caller's
//     borrow, so it travels as an `OwnedFrame` and is only borrowed back into a
//     `PixelBuffer` on the worker.
// 2.  **Dispatcher + Workers**: A single dispatcher task receives every
//     `FrameTask` and hands them round-robin to `num_cpus` worker tasks. Each
//     worker runs the engine inside `spawn_blocking`, since a scan is pure CPU
//     work that must not stall the async runtime.
// 3.  **Oneshot Replies**: Every task carries its own `oneshot` sender, so a
//     result always finds its way back to the caller that submitted it, whatever
//     order the workers finish in.
// 4.  **No Shared Frame State**: Workers share only the immutable `BlobPipeline`
//     (thresholds, config, converter). Nothing computed for one frame is ever
//     visible to another.

use crate::core_modules::blob::Blob;
use crate::core_modules::pixel_buffer::{pack_rgb565_image, PixelBuffer};
use crate::error::{BlobError, Result};
use crate::pipeline::BlobPipeline;
use futures::future::join_all;
use image::{GrayImage, RgbImage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Pixel storage owned by a frame in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedPixels {
    Grayscale(Vec<u8>),
    Rgb565(Vec<u16>),
}

/// A frame that can be moved onto a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: OwnedPixels,
}

impl OwnedFrame {
    pub fn grayscale(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: OwnedPixels::Grayscale(data),
        }
    }

    pub fn rgb565(width: u32, height: u32, data: Vec<u16>) -> Self {
        Self {
            width,
            height,
            pixels: OwnedPixels::Rgb565(data),
        }
    }

    pub fn from_gray_image(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::grayscale(width, height, image.into_raw())
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::rgb565(width, height, pack_rgb565_image(image))
    }

    /// Borrows the frame as the engine's read-only view.
    pub fn as_buffer(&self) -> Result<PixelBuffer<'_>> {
        match &self.pixels {
            OwnedPixels::Grayscale(data) => PixelBuffer::grayscale(self.width, self.height, data),
            OwnedPixels::Rgb565(data) => PixelBuffer::rgb565(self.width, self.height, data),
        }
    }
}

/// The blobs found in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBlobs {
    /// Submission sequence number assigned by the `ParallelPipeline`.
    pub frame_id: u64,
    pub blobs: Vec<Blob>,
}

pub struct FrameTask {
    pub frame: OwnedFrame,
    pub frame_id: u64,
    pub result_sender: oneshot::Sender<Result<FrameBlobs>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and `worker_count` workers on the current tokio
    /// runtime. A count of zero is raised to one.
    pub fn new(pipeline: BlobPipeline, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let pipeline = Arc::new(pipeline);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task
                        .result_sender
                        .send(Err(BlobError::WorkerPool(format!("worker {worker_idx} has stopped"))));
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        let workers = worker_receivers
            .into_iter()
            .map(|mut worker_receiver| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        let result = Self::process_frame_worker(Arc::clone(&pipeline), task.frame, task.frame_id).await;
                        let _ = task.result_sender.send(result);
                    }
                })
            })
            .collect();

        debug!(workers = worker_count, "Worker pool started");
        Self { task_sender, workers }
    }

    async fn process_frame_worker(pipeline: Arc<BlobPipeline>, frame: OwnedFrame, frame_id: u64) -> Result<FrameBlobs> {
        tokio::task::spawn_blocking(move || -> Result<FrameBlobs> {
            let blobs = pipeline.process(&frame.as_buffer()?)?;
            Ok(FrameBlobs { frame_id, blobs })
        })
        .await
        .map_err(|e| BlobError::WorkerPool(format!("frame {frame_id} task failed: {e}")))?
    }

    pub async fn process_frame(&self, frame: OwnedFrame, frame_id: u64) -> Result<FrameBlobs> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = FrameTask {
            frame,
            frame_id,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| BlobError::WorkerPool("failed to send task to worker pool".to_string()))?;

        result_receiver
            .await
            .map_err(|_| BlobError::WorkerPool("failed to receive result from worker".to_string()))?
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    frame_counter: AtomicU64,
}

impl ParallelPipeline {
    /// Uses one worker per logical CPU.
    pub fn new(pipeline: BlobPipeline) -> Self {
        Self::with_workers(pipeline, num_cpus::get())
    }

    pub fn with_workers(pipeline: BlobPipeline, worker_count: usize) -> Self {
        Self {
            worker_pool: WorkerPool::new(pipeline, worker_count),
            frame_counter: AtomicU64::new(0),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    pub async fn process_frame(&self, frame: OwnedFrame) -> Result<FrameBlobs> {
        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        self.worker_pool.process_frame(frame, frame_id).await
    }

    /// Analyses all frames concurrently. The result at index `i` belongs to
    /// `frames[i]`; one frame failing does not affect the others.
    pub async fn process_batch(&self, frames: Vec<OwnedFrame>) -> Vec<Result<FrameBlobs>> {
        let count = frames.len();
        let results = join_all(frames.into_iter().map(|frame| self.process_frame(frame))).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(frames = count, failed, "Some frames in the batch failed");
        }
        debug!(frames = count, "Batch finished");
        results
    }
}
