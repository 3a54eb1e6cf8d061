//! Inbound handler table

use bridge_types::{Frame, MessageId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{trace, warn};

/// Error returned by a frame handler
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Receiver of inbound frames for the ids it was registered under
///
/// Called on the link's reader task. Implementations must not block; heavy
/// work belongs on the unit's own task. A panic is caught and reported as a
/// failure of that handler only.
pub trait FrameHandler: Send + Sync {
    fn handle_frame(&self, frame: &Frame) -> HandlerResult;
}

impl<F> FrameHandler for F
where
    F: Fn(&Frame) -> HandlerResult + Send + Sync,
{
    fn handle_frame(&self, frame: &Frame) -> HandlerResult {
        self(frame)
    }
}

struct Registration {
    unit: String,
    handler: Arc<dyn FrameHandler>,
}

/// One handler that returned an error during dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub unit: String,
    pub error: String,
}

/// Outcome of dispatching one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub message_id: MessageId,
    /// Handlers that returned `Ok`
    pub delivered: usize,
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    /// Number of handlers that ran
    pub fn invoked(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// No handler is registered for this id
    pub fn is_unhandled(&self) -> bool {
        self.invoked() == 0
    }
}

/// `MessageId -> [handler]` in registration order
#[derive(Default)]
pub(crate) struct DispatchTable {
    handlers: RwLock<HashMap<MessageId, Vec<Registration>>>,
}

impl DispatchTable {
    pub(crate) fn register(&self, unit: &str, ids: &[MessageId], handler: Arc<dyn FrameHandler>) {
        let mut table = self.handlers.write();
        for id in ids {
            table.entry(*id).or_default().push(Registration {
                unit: unit.to_string(),
                handler: Arc::clone(&handler),
            });
        }
    }

    /// Units registered for `id`, in invocation order
    pub(crate) fn units_for(&self, id: MessageId) -> Vec<String> {
        self.handlers
            .read()
            .get(&id)
            .map(|regs| regs.iter().map(|r| r.unit.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn dispatch(&self, frame: &Frame) -> DispatchReport {
        // Snapshot so handlers run without the table lock held
        let targets: Vec<(String, Arc<dyn FrameHandler>)> = self
            .handlers
            .read()
            .get(&frame.message_id)
            .map(|regs| {
                regs.iter()
                    .map(|r| (r.unit.clone(), Arc::clone(&r.handler)))
                    .collect()
            })
            .unwrap_or_default();

        let mut report = DispatchReport {
            message_id: frame.message_id,
            delivered: 0,
            failures: Vec::new(),
        };

        for (unit, handler) in targets {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle_frame(frame)))
                .unwrap_or_else(|panic| Err(panic_message(panic.as_ref()).into()));
            match outcome {
                Ok(()) => {
                    trace!(unit = %unit, message_id = %frame.message_id, "Frame delivered");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(unit = %unit, message_id = %frame.message_id, error = %e, "Frame handler failed");
                    report.failures.push(HandlerFailure {
                        unit,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_string());
    format!("handler panicked: {}", detail)
}
