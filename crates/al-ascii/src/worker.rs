use std::thread;

use al_core::config::RenderConfig;
use al_core::error::CoreError;
use al_core::frame::{FrameBuffer, GridDims, IndexGrid};
use al_core::traits::GlyphSurface;
use al_render::canvas::GlyphCanvas;
use anyhow::{Context, Result};
use flume::{Receiver, Sender, TryRecvError};

use crate::backend::{RenderBackend, Submission};
use crate::map::FrameMapper;

/// Messages from the render loop to the worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// First grid size. Sent once.
    Init { cols: u32, rows: u32 },
    /// Grid size changed after `Init`.
    Resize { cols: u32, rows: u32 },
    /// Captured frame to convert. Moved, never copied.
    Frame(FrameBuffer),
}

/// Messages from the worker back to the render loop.
#[derive(Debug)]
pub enum WorkerReply {
    /// One grid per `Frame`. Empty (0×0) when the frame could not be mapped.
    Grid(IndexGrid),
}

/// Worker side of the protocol, independent of threads and channels.
///
/// # Example
/// ```
/// use al_ascii::worker::{GridWorker, WorkerReply, WorkerRequest};
/// use al_core::config::RenderConfig;
/// use al_core::frame::FrameBuffer;
///
/// let mut worker = GridWorker::new(&RenderConfig::default()).unwrap();
/// assert!(worker.handle(WorkerRequest::Init { cols: 4, rows: 2 }).is_none());
/// let Some(WorkerReply::Grid(grid)) = worker.handle(WorkerRequest::Frame(FrameBuffer::new(8, 8)))
/// else { panic!("frames are always answered") };
/// assert_eq!(grid.cells.len(), 8);
/// ```
pub struct GridWorker {
    mapper: FrameMapper,
    dims: Option<GridDims>,
    pool: Vec<Vec<u8>>,
}

/// Grid buffers kept for reuse.
const POOL_CAP: usize = 2;

impl GridWorker {
    /// # Errors
    /// Returns an error if the ramp, cutoff or gamma are invalid.
    pub fn new(config: &RenderConfig) -> Result<Self, CoreError> {
        Ok(Self {
            mapper: FrameMapper::new(config)?,
            dims: None,
            pool: Vec::with_capacity(POOL_CAP),
        })
    }

    /// Process one request. Only `Frame` produces a reply.
    pub fn handle(&mut self, request: WorkerRequest) -> Option<WorkerReply> {
        match request {
            WorkerRequest::Init { cols, rows } | WorkerRequest::Resize { cols, rows } => {
                self.dims = Some(GridDims::new(cols, rows));
                None
            }
            WorkerRequest::Frame(frame) => Some(WorkerReply::Grid(self.convert(frame))),
        }
    }

    /// Return a drawn grid's buffer to the pool.
    pub fn recycle(&mut self, buffer: Vec<u8>) {
        if self.pool.len() < POOL_CAP {
            self.pool.push(buffer);
        }
    }

    fn convert(&mut self, frame: FrameBuffer) -> IndexGrid {
        let Some(dims) = self.dims.filter(|d| !d.is_empty()) else {
            log::debug!("GridWorker: frame before init, released");
            return IndexGrid::new(GridDims::default());
        };
        let buffer = self.pool.pop().unwrap_or_default();
        let mut grid = IndexGrid::from_buffer(buffer, dims);
        match self.mapper.map_into(frame, &mut grid) {
            Ok(true) => grid,
            Ok(false) => {
                self.recycle(grid.into_buffer());
                IndexGrid::new(GridDims::default())
            }
            Err(e) => {
                log::warn!("GridWorker: cannot map frame: {e:#}");
                self.recycle(grid.into_buffer());
                IndexGrid::new(GridDims::default())
            }
        }
    }
}

/// Worker thread body. Runs until the request channel disconnects.
fn worker_loop(
    mut worker: GridWorker,
    request_rx: &Receiver<WorkerRequest>,
    reply_tx: &Sender<WorkerReply>,
    recycle_rx: &Receiver<Vec<u8>>,
) {
    while let Ok(request) = request_rx.recv() {
        for buffer in recycle_rx.try_iter() {
            worker.recycle(buffer);
        }
        if let Some(reply) = worker.handle(request)
            && reply_tx.send(reply).is_err()
        {
            break;
        }
    }
    log::debug!("al-ascii-worker: stopped");
}

/// Backend that maps frames on a dedicated worker thread.
///
/// Frames are moved to the worker and grids are moved back; drawn grid
/// buffers return through a recycle channel. At most one frame is in flight:
/// a frame submitted while busy is dropped, never queued.
pub struct OffloadedBackend {
    request_tx: Option<Sender<WorkerRequest>>,
    reply_rx: Receiver<WorkerReply>,
    recycle_tx: Sender<Vec<u8>>,
    dims: Option<GridDims>,
    busy: bool,
    handle: Option<thread::JoinHandle<()>>,
}

impl OffloadedBackend {
    /// Start the worker thread.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the thread cannot
    /// be spawned.
    pub fn spawn(config: &RenderConfig) -> Result<Self> {
        let worker = GridWorker::new(config)?;
        let (request_tx, request_rx) = flume::unbounded();
        let (reply_tx, reply_rx) = flume::unbounded();
        let (recycle_tx, recycle_rx) = flume::bounded(POOL_CAP);

        let handle = thread::Builder::new()
            .name("al-ascii-worker".to_string())
            .spawn(move || worker_loop(worker, &request_rx, &reply_tx, &recycle_rx))
            .context("cannot spawn the glyph worker thread")?;

        let mut backend = Self::with_channels(request_tx, reply_rx, recycle_tx);
        backend.handle = Some(handle);
        Ok(backend)
    }

    /// Backend talking to an externally driven worker.
    #[must_use]
    pub fn with_channels(
        request_tx: Sender<WorkerRequest>,
        reply_rx: Receiver<WorkerReply>,
        recycle_tx: Sender<Vec<u8>>,
    ) -> Self {
        Self {
            request_tx: Some(request_tx),
            reply_rx,
            recycle_tx,
            dims: None,
            busy: false,
            handle: None,
        }
    }

    /// Disconnect the request channel and join the worker.
    ///
    /// A grid still being computed is discarded with its reply channel.
    fn shutdown(&mut self) {
        self.request_tx = None;
        self.busy = false;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("OffloadedBackend: worker thread panicked");
        }
    }

    fn send(&mut self, request: WorkerRequest) -> bool {
        let Some(tx) = &self.request_tx else {
            return false;
        };
        if tx.send(request).is_ok() {
            return true;
        }
        log::warn!("OffloadedBackend: worker is gone");
        self.request_tx = None;
        false
    }
}

impl<S: GlyphSurface> RenderBackend<S> for OffloadedBackend {
    fn name(&self) -> &'static str {
        "offloaded"
    }

    fn resize(&mut self, dims: GridDims) {
        let request = match self.dims {
            Some(current) if current == dims => return,
            // `Init` carries the first usable size; an empty one is not known yet.
            None if dims.is_empty() => return,
            Some(_) => WorkerRequest::Resize {
                cols: dims.cols,
                rows: dims.rows,
            },
            None => WorkerRequest::Init {
                cols: dims.cols,
                rows: dims.rows,
            },
        };
        if self.send(request) {
            self.dims = Some(dims);
        }
    }

    fn submit_frame(&mut self, frame: FrameBuffer, _canvas: &mut GlyphCanvas<S>) -> Submission {
        if self.busy || !self.dims.is_some_and(|d| !d.is_empty()) {
            return Submission::Dropped;
        }
        if self.send(WorkerRequest::Frame(frame)) {
            self.busy = true;
            Submission::Submitted
        } else {
            Submission::Dropped
        }
    }

    fn poll(&mut self, canvas: &mut GlyphCanvas<S>) -> bool {
        let mut drawn = false;
        loop {
            match self.reply_rx.try_recv() {
                Ok(WorkerReply::Grid(grid)) => {
                    self.busy = false;
                    if grid.is_empty() {
                        continue;
                    }
                    drawn |= canvas.draw_grid(&grid);
                    // A full recycle channel just means the pool is stocked.
                    let _ = self.recycle_tx.try_send(grid.into_buffer());
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.busy {
                        log::warn!("OffloadedBackend: worker stopped with a frame in flight");
                        self.busy = false;
                    }
                    break;
                }
            }
        }
        drawn
    }

    fn is_busy(&self) -> bool {
        self.busy
    }

    fn dispose(&mut self) {
        self.shutdown();
    }
}

impl Drop for OffloadedBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
