//! # Event Subscription Bridge
//!
//! Turns solver lifecycle events into window refreshes and animation.
//!
//! ```text
//! solver thread ──EventSender::send──▶ [bounded queue] ──pump()──┐
//!                                                               ▼
//! caller ─────────────────────────────────────────────────▶ dispatch()
//!                                                               │
//!                      callbacks for (session, event), in registration order
//! ```
//!
//! Dispatch copies the matching callbacks out of the registry before
//! calling them, so a callback may register or unregister others. An error
//! or panic in one callback is logged and the rest still run. Dispatch on
//! a bridge from inside one of its own callbacks, on the same thread, is
//! suppressed; other bridges are unaffected.

use crate::manager::WindowsManager;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use fluxview_shared::{EventInfo, SessionId, SolverEvent, SolverNotification};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Error type callbacks may return.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result type of a callback.
pub type CallbackResult = Result<(), CallbackError>;

type Callback = Arc<dyn Fn(&SolverNotification) -> CallbackResult + Send + Sync>;

/// Marks the current thread as dispatching on one bridge until dropped.
struct DispatchGuard<'a> {
    active: &'a Mutex<Vec<ThreadId>>,
    thread: ThreadId,
}

impl<'a> DispatchGuard<'a> {
    fn enter(active: &'a Mutex<Vec<ThreadId>>) -> Option<Self> {
        let thread = thread::current().id();
        let mut threads = active.lock();
        if threads.contains(&thread) {
            return None;
        }
        threads.push(thread);
        Some(Self { active, thread })
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.active.lock().retain(|thread| *thread != self.thread);
    }
}

/// Handle returned by [`EventBridge::register_callback`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

struct Registration {
    id: CallbackId,
    session: SessionId,
    event: SolverEvent,
    callback: Callback,
}

/// Outcome of one dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Callbacks called.
    pub invoked: usize,
    /// Callbacks that returned an error or panicked.
    pub failed: usize,
    /// The dispatch was nested inside a callback and did nothing.
    pub suppressed: bool,
}

/// What [`bind_windows`] does on each event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowAction {
    /// Refresh the session's cells.
    Refresh,
    /// Start animation on the session's cells.
    Animate,
}

/// Ordered callback registry keyed by session and event kind.
pub struct EventBridge {
    registrations: Mutex<Vec<Registration>>,
    dispatching: Mutex<Vec<ThreadId>>,
    next_id: AtomicU64,
    sender: Sender<SolverNotification>,
    receiver: Receiver<SolverNotification>,
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("callbacks", &self.registrations.lock().len())
            .field("pending", &self.receiver.len())
            .finish()
    }
}

impl EventBridge {
    /// Bridge with the default queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Bridge whose queue holds at most `capacity` notifications.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            registrations: Mutex::new(Vec::new()),
            dispatching: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            sender,
            receiver,
        }
    }

    /// Registers `callback` for `event` on `session`. Callbacks for the same
    /// key run in registration order.
    pub fn register_callback<F>(&self, session: impl Into<SessionId>, event: SolverEvent, callback: F) -> CallbackId
    where
        F: Fn(&SolverNotification) -> CallbackResult + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let session = session.into();
        tracing::debug!(session_id = %session, %event, callback = id.0, "callback registered");
        self.registrations.lock().push(Registration {
            id,
            session,
            event,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes a callback. Returns whether it was registered.
    pub fn unregister_callback(&self, id: CallbackId) -> bool {
        let mut registrations = self.registrations.lock();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        registrations.len() != before
    }

    /// Number of callbacks registered for `event` on `session`.
    #[must_use]
    pub fn callback_count(&self, session: &SessionId, event: SolverEvent) -> usize {
        self.registrations
            .lock()
            .iter()
            .filter(|r| r.session == *session && r.event == event)
            .count()
    }

    /// Calls every callback registered for `event` on `session`.
    pub fn dispatch(&self, session: &SessionId, event: SolverEvent, info: EventInfo) -> DispatchReport {
        self.dispatch_notification(&SolverNotification::new(session.clone(), event, info))
    }

    /// Calls every callback registered for the notification's key.
    pub fn dispatch_notification(&self, notification: &SolverNotification) -> DispatchReport {
        let Some(_guard) = DispatchGuard::enter(&self.dispatching) else {
            tracing::debug!(
                session_id = %notification.session,
                event = %notification.event,
                "nested dispatch suppressed"
            );
            return DispatchReport {
                suppressed: true,
                ..DispatchReport::default()
            };
        };

        let callbacks: Vec<(CallbackId, Callback)> = self
            .registrations
            .lock()
            .iter()
            .filter(|r| r.session == notification.session && r.event == notification.event)
            .map(|r| (r.id, Arc::clone(&r.callback)))
            .collect();

        let mut report = DispatchReport::default();
        for (id, callback) in callbacks {
            report.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| callback(notification))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::error!(
                        session_id = %notification.session,
                        event = %notification.event,
                        callback = id.0,
                        error = %err,
                        "event callback failed"
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    tracing::error!(
                        session_id = %notification.session,
                        event = %notification.event,
                        callback = id.0,
                        panic = panic_message(panic.as_ref()),
                        "event callback panicked"
                    );
                }
            }
        }
        report
    }

    /// Handle for the solver's notification thread.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Notifications waiting for [`Self::pump`].
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Dispatches every queued notification. Returns how many were taken
    /// off the queue.
    ///
    /// Called from inside one of this bridge's callbacks, it leaves the
    /// queue alone and returns 0; an outer `pump` picks the notifications
    /// up.
    pub fn pump(&self) -> usize {
        if self.dispatching.lock().contains(&thread::current().id()) {
            tracing::debug!(pending = self.receiver.len(), "nested pump skipped, notifications stay queued");
            return 0;
        }
        let mut pumped = 0;
        while let Ok(notification) = self.receiver.try_recv() {
            self.dispatch_notification(&notification);
            pumped += 1;
        }
        pumped
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Queues notifications for [`EventBridge::pump`].
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: Sender<SolverNotification>,
}

impl EventSender {
    /// Queues a notification without blocking. Returns `false` (and logs)
    /// when the queue is full or the bridge is gone.
    pub fn send(&self, notification: SolverNotification) -> bool {
        match self.sender.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    session_id = %dropped.session,
                    event = %dropped.event,
                    "event queue full, notification dropped"
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Maps `events` on `session` to a manager-wide refresh or animation.
///
/// Each event gets its own callback; the fan-out covers every registered
/// window, and a window failure fails the callback so it is logged.
pub fn bind_windows(
    bridge: &EventBridge,
    manager: &Arc<WindowsManager>,
    session: &SessionId,
    events: &[SolverEvent],
    action: WindowAction,
) -> Vec<CallbackId> {
    events
        .iter()
        .map(|&event| {
            let manager = Arc::clone(manager);
            bridge.register_callback(session.clone(), event, move |notification| {
                let report = match action {
                    WindowAction::Refresh => manager.refresh_windows(&notification.session, None),
                    WindowAction::Animate => manager.animate_windows(&notification.session, None),
                };
                if report.is_ok() {
                    Ok(())
                } else {
                    Err(format!("{} window(s) failed on {}", report.failed.len(), notification.event).into())
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let bridge = EventBridge::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bridge.register_callback("s1", SolverEvent::TimestepEnded, move |_| {
                order.lock().push(tag);
                Ok(())
            });
        }
        let report = bridge.dispatch(&SessionId::new("s1"), SolverEvent::TimestepEnded, EventInfo::default());
        assert_eq!(report.invoked, 3);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dispatch_filters_by_session_and_event() {
        let bridge = EventBridge::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bridge.register_callback("s1", SolverEvent::DataRead, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bridge.dispatch(&SessionId::new("s2"), SolverEvent::DataRead, EventInfo::default());
        bridge.dispatch(&SessionId::new("s1"), SolverEvent::TimestepEnded, EventInfo::default());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bridge.dispatch(&SessionId::new("s1"), SolverEvent::DataRead, EventInfo::default());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_callback() {
        let bridge = EventBridge::new();
        let id = bridge.register_callback("s1", SolverEvent::IterationEnded, |_| Ok(()));
        assert_eq!(bridge.callback_count(&SessionId::new("s1"), SolverEvent::IterationEnded), 1);
        assert!(bridge.unregister_callback(id));
        assert!(!bridge.unregister_callback(id));
        assert_eq!(bridge.callback_count(&SessionId::new("s1"), SolverEvent::IterationEnded), 0);
    }

    #[test]
    fn test_nested_dispatch_is_suppressed() {
        let bridge = Arc::new(EventBridge::new());
        let inner = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&inner);
        let nested_bridge = Arc::downgrade(&bridge);
        bridge.register_callback("s1", SolverEvent::SolutionInitialized, move |n| {
            if let Some(bridge) = nested_bridge.upgrade() {
                *captured.lock() = Some(bridge.dispatch(&n.session, n.event, EventInfo::default()));
            }
            Ok(())
        });

        let outer = bridge.dispatch(&SessionId::new("s1"), SolverEvent::SolutionInitialized, EventInfo::default());
        assert_eq!(outer.invoked, 1);
        assert!(inner.lock().is_some_and(|report| report.suppressed && report.invoked == 0));

        // The guard is released after the outer dispatch.
        let again = bridge.dispatch(&SessionId::new("s1"), SolverEvent::DataRead, EventInfo::default());
        assert!(!again.suppressed);
    }

    #[test]
    fn test_dispatch_into_another_bridge_runs() {
        let downstream = Arc::new(EventBridge::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        downstream.register_callback("s2", SolverEvent::DataRead, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let upstream = EventBridge::new();
        let forward = Arc::clone(&downstream);
        let forwarded = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&forwarded);
        upstream.register_callback("s1", SolverEvent::DataRead, move |n| {
            *captured.lock() = Some(forward.dispatch(&SessionId::new("s2"), n.event, n.info.clone()));
            Ok(())
        });

        upstream.dispatch(&SessionId::new("s1"), SolverEvent::DataRead, EventInfo::default());
        assert!(forwarded.lock().is_some_and(|report| !report.suppressed && report.invoked == 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pump_inside_callback_keeps_queue() {
        let bridge = Arc::new(EventBridge::new());
        let steps = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&steps);
        bridge.register_callback("s1", SolverEvent::TimestepEnded, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let nested_pumps = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&nested_pumps);
        let nested_bridge = Arc::downgrade(&bridge);
        bridge.register_callback("s1", SolverEvent::IterationEnded, move |_| {
            if let Some(bridge) = nested_bridge.upgrade() {
                captured.lock().push(bridge.pump());
            }
            Ok(())
        });

        let sender = bridge.sender();
        assert!(sender.send(SolverNotification::new(
            SessionId::new("s1"),
            SolverEvent::TimestepEnded,
            EventInfo::at_index(1),
        )));

        // Direct dispatch: the nested pump leaves the timestep queued.
        bridge.dispatch(&SessionId::new("s1"), SolverEvent::IterationEnded, EventInfo::default());
        assert_eq!(*nested_pumps.lock(), vec![0]);
        assert_eq!(bridge.pending(), 1);
        assert_eq!(steps.load(Ordering::SeqCst), 0);

        // Queued behind an iteration: the outer pump still delivers it.
        assert!(sender.send(SolverNotification::new(
            SessionId::new("s1"),
            SolverEvent::IterationEnded,
            EventInfo::default(),
        )));
        assert_eq!(bridge.pump(), 2);
        assert_eq!(steps.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.pending(), 0);
    }

    #[test]
    fn test_queue_and_pump() {
        let bridge = EventBridge::with_capacity(2);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        bridge.register_callback("s1", SolverEvent::IterationEnded, move |n| {
            assert_eq!(n.info.index, Some(7));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let sender = bridge.sender();
        let note = SolverNotification::new(SessionId::new("s1"), SolverEvent::IterationEnded, EventInfo::at_index(7));
        assert!(sender.send(note.clone()));
        assert!(sender.send(note.clone()));
        assert!(!sender.send(note));
        assert_eq!(bridge.pending(), 2);

        assert_eq!(bridge.pump(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bridge.pending(), 0);
    }
}
