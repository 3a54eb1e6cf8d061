use crate::dispatch::{DispatchReport, DispatchTable, FrameHandler};
use crate::error::{RouterError, RouterResult};
use crate::link::{Link, LinkReader, LinkWriter};
use crate::stats::RouterStats;
use bridge_codec::{encode_frame, FrameDecoder};
use bridge_types::{Frame, FrameHeader, MessageId, MAX_PAYLOAD_SIZE};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const READ_BUFFER_SIZE: usize = 4096;

/// Upper bound on one frame write; a peer that stops reading is dropped
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Log every malformed frame up to this count, then every 100th
const MALFORMED_LOG_BURST: u64 = 10;

struct AttachedWriter {
    generation: u64,
    name: String,
    writer: LinkWriter,
    shutdown: Arc<Notify>,
}

/// Shared link handle: serialised writer plus inbound dispatcher
pub struct Router {
    writer: Mutex<Option<AttachedWriter>>,
    attached: AtomicBool,
    generation: AtomicU64,
    handlers: DispatchTable,
    stats: RouterStats,
    max_payload: usize,
    write_timeout: Duration,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_max_frame_size(FrameHeader::SIZE + MAX_PAYLOAD_SIZE)
    }

    /// Router that rejects inbound frames larger than `max_frame_size`
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            writer: Mutex::new(None),
            attached: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            handlers: DispatchTable::default(),
            stats: RouterStats::default(),
            max_payload: max_frame_size
                .saturating_sub(FrameHeader::SIZE)
                .min(MAX_PAYLOAD_SIZE),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Bound each frame write by `timeout`
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Serialise `frame` onto the link
    ///
    /// Encoding happens before the writer lock is taken; the lock covers only
    /// the byte write, which is bounded by the write timeout. A failed or
    /// timed-out write detaches the link.
    pub async fn send(&self, frame: &Frame) -> RouterResult<()> {
        let bytes = encode_frame(frame)?;

        let mut guard = self.writer.lock().await;
        let Some(attached) = guard.as_mut() else {
            self.stats.record_send_failure();
            return Err(RouterError::link_unavailable("no link attached"));
        };

        let write = async {
            attached.writer.write_all(&bytes).await?;
            attached.writer.flush().await
        };
        let reason = match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => {
                self.stats.record_sent(bytes.len());
                return Ok(());
            }
            Ok(Err(e)) => format!("write failed: {}", e),
            Err(_) => format!("write timed out after {:?}", self.write_timeout),
        };

        self.stats.record_send_failure();
        warn!(link = %attached.name, reason = %reason, "Link write failed, detaching");
        if let Some(lost) = guard.take() {
            self.attached.store(false, Ordering::Release);
            lost.shutdown.notify_one();
        }
        Err(RouterError::link_unavailable(reason))
    }

    /// Register `handler` for every id in `ids`
    ///
    /// Handlers for the same id run in registration order.
    pub fn register(&self, unit: &str, ids: &[MessageId], handler: Arc<dyn FrameHandler>) {
        if ids.is_empty() {
            return;
        }
        debug!(unit, ids = ?ids, "Registered frame handler");
        self.handlers.register(unit, ids, handler);
    }

    /// Units that will receive frames with `id`, in order
    pub fn handlers_for(&self, id: MessageId) -> Vec<String> {
        self.handlers.units_for(id)
    }

    /// Run every handler registered for the frame's id
    pub fn dispatch(&self, frame: &Frame) -> DispatchReport {
        let report = self.handlers.dispatch(frame);
        if report.is_unhandled() {
            self.stats.record_unhandled();
            debug!(message_id = %frame.message_id, "No handler for frame");
        }
        if !report.failures.is_empty() {
            self.stats.record_handler_failures(report.failures.len());
        }
        report
    }

    /// Take ownership of `link`, replacing any attached one
    ///
    /// Returns the reader task handle; it completes when the link is lost or
    /// detached, which is the supervisor's cue to reconnect.
    pub async fn attach(self: &Arc<Self>, link: Link) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let shutdown = Arc::new(Notify::new());
        let Link {
            name,
            reader,
            writer,
        } = link;

        {
            let mut guard = self.writer.lock().await;
            if let Some(previous) = guard.take() {
                info!(link = %previous.name, "Replacing attached link");
                previous.shutdown.notify_one();
            }
            *guard = Some(AttachedWriter {
                generation,
                name: name.clone(),
                writer,
                shutdown: Arc::clone(&shutdown),
            });
        }
        self.attached.store(true, Ordering::Release);
        self.stats.record_attach();
        info!(link = %name, generation, "Link attached");

        let router = Arc::clone(self);
        tokio::spawn(async move {
            router.read_loop(&name, reader, shutdown).await;
            router.detach_generation(generation).await;
        })
    }

    /// Drop the attached link, if any
    pub async fn detach(&self) {
        let mut guard = self.writer.lock().await;
        if let Some(previous) = guard.take() {
            self.attached.store(false, Ordering::Release);
            previous.shutdown.notify_one();
            info!(link = %previous.name, "Link detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    /// Detach only if `generation` is still the attached link
    async fn detach_generation(&self, generation: u64) {
        let mut guard = self.writer.lock().await;
        if guard.as_ref().map(|w| w.generation) == Some(generation) {
            if let Some(lost) = guard.take() {
                self.attached.store(false, Ordering::Release);
                info!(link = %lost.name, "Link lost, writer detached");
            }
        }
    }

    async fn read_loop(&self, name: &str, mut reader: LinkReader, shutdown: Arc<Notify>) {
        let mut decoder = FrameDecoder::with_max_payload(self.max_payload);
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let mut malformed = 0u64;

        loop {
            let read = tokio::select! {
                _ = shutdown.notified() => {
                    debug!(link = %name, "Reader stopped");
                    return;
                }
                read = reader.read(&mut buffer) => read,
            };

            match read {
                Ok(0) => {
                    info!(link = %name, "Link closed by remote");
                    return;
                }
                Ok(n) => {
                    decoder.extend(&buffer[..n]);
                    while let Some(result) = decoder.next_frame() {
                        match result {
                            Ok(frame) => {
                                self.stats.record_received();
                                self.dispatch(&frame);
                            }
                            Err(e) => {
                                malformed += 1;
                                self.stats.record_malformed();
                                if malformed <= MALFORMED_LOG_BURST || malformed % 100 == 0 {
                                    warn!(link = %name, error = %e, malformed, "Dropped malformed frame");
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(link = %name, error = %e, "Link read failed");
                    return;
                }
            }
        }
    }
}
