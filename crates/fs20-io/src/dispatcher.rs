//! Receive-event dispatcher
//!
//! A worker thread polls a [`Receiver`] and hands every decoded event to
//! the registered listeners and to async subscribers:
//!
//! ```text
//!                     +--> listeners: exact -> address -> command -> any
//! Receiver --poll--> dispatch
//!                     +--> broadcast channel (subscribe())
//! ```
//!
//! Listeners are grouped by a [`ListenerKey`] derived from their optional
//! address and command filters. Commands are matched by opcode, so a
//! listener for `ON` also sees `ON_BRIGHTNESS_LEVEL_16`.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use fs20_protocol::{Address, Command, ReceivedEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::config::DispatcherConfig;
use crate::error::Fs20Error;
use crate::receiver::Receiver;

/// Name of the worker thread
pub const WORKER_NAME: &str = "fs20-dispatcher";

/// Callback invoked for matching events
pub type Listener = Arc<dyn Fn(&ReceivedEvent) + Send + Sync>;

/// Registry key derived from a listener's filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKey {
    /// Address and command both given
    Exact { address: Address, opcode: u8 },
    /// Address only
    Address(Address),
    /// Command opcode only
    Command(u8),
    /// No filter
    Any,
}

impl ListenerKey {
    pub fn for_filter(address: Option<Address>, command: Option<Command>) -> Self {
        match (address, command) {
            (Some(address), Some(command)) => ListenerKey::Exact {
                address,
                opcode: command.opcode(),
            },
            (Some(address), None) => ListenerKey::Address(address),
            (None, Some(command)) => ListenerKey::Command(command.opcode()),
            (None, None) => ListenerKey::Any,
        }
    }

    /// Keys an event is delivered under, most specific first
    pub fn for_event(event: &ReceivedEvent) -> [ListenerKey; 4] {
        let opcode = event.opcode();
        [
            ListenerKey::Exact {
                address: event.address,
                opcode,
            },
            ListenerKey::Address(event.address),
            ListenerKey::Command(opcode),
            ListenerKey::Any,
        ]
    }
}

/// Worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Running,
    Stopped,
}

/// Listener registry plus event broadcast
///
/// Cloning yields another handle to the same registry and channel.
#[derive(Clone)]
pub struct Dispatcher {
    listeners: Arc<Mutex<HashMap<ListenerKey, Vec<Listener>>>>,
    events: broadcast::Sender<ReceivedEvent>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            events,
            config,
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<ListenerKey, Vec<Listener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a callback for events matching the given filters
    ///
    /// May be called while the worker is running.
    pub fn add_listener<F>(&self, callback: F, address: Option<Address>, command: Option<Command>)
    where
        F: Fn(&ReceivedEvent) + Send + Sync + 'static,
    {
        let key = ListenerKey::for_filter(address, command);
        debug!("Adding listener for {:?}", key);
        self.registry()
            .entry(key)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.registry().values().map(Vec::len).sum()
    }

    /// Receive every decoded event asynchronously
    pub fn subscribe(&self) -> broadcast::Receiver<ReceivedEvent> {
        self.events.subscribe()
    }

    /// Deliver an event to matching listeners and subscribers
    ///
    /// A panicking listener is logged and skipped. Returns the number of
    /// listeners invoked.
    pub fn dispatch(&self, event: &ReceivedEvent) -> usize {
        // snapshot so listeners may register further listeners
        let matching: Vec<Listener> = {
            let registry = self.registry();
            ListenerKey::for_event(event)
                .iter()
                .filter_map(|key| registry.get(key))
                .flatten()
                .cloned()
                .collect()
        };

        for listener in &matching {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                warn!("Listener panicked while handling {}", event);
            }
        }

        // no subscribers is fine
        let _ = self.events.send(event.clone());
        matching.len()
    }

    /// Start polling `receiver` on a worker thread
    pub fn start(&self, receiver: Receiver) -> Result<DispatcherHandle, Fs20Error> {
        let stop = Arc::new(AtomicBool::new(false));
        let dispatcher = self.clone();
        let flag = stop.clone();

        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || dispatcher.run(receiver, flag))
            .map_err(|e| Fs20Error::Worker(format!("failed to spawn {}: {}", WORKER_NAME, e)))?;

        Ok(DispatcherHandle {
            stop,
            worker: Some(worker),
        })
    }

    fn run(self, mut receiver: Receiver, stop: Arc<AtomicBool>) -> Receiver {
        let poll_interval = self.config.poll_interval();
        info!("Event dispatcher started (polling every {:?})", poll_interval);

        while !stop.load(Ordering::Acquire) {
            match receiver.next_event() {
                Ok(event) => {
                    debug!("Received {}", event);
                    self.dispatch(&event);
                }
                Err(Fs20Error::Protocol(e)) if e.is_invalid_response() => {
                    trace!("Idle poll: {}", e);
                }
                Err(e) => warn!("Receiver error: {}", e),
            }
            thread::sleep(poll_interval);
        }

        info!("Event dispatcher stopped");
        receiver
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

/// Control handle for a running dispatcher
///
/// Dropping the handle stops the worker without waiting for it.
pub struct DispatcherHandle {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Receiver>>,
}

impl DispatcherHandle {
    /// Ask the worker to stop after its current poll
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn state(&self) -> DispatcherState {
        match &self.worker {
            Some(worker) if !worker.is_finished() && !self.stop.load(Ordering::Acquire) => {
                DispatcherState::Running
            }
            _ => DispatcherState::Stopped,
        }
    }

    /// Stop the worker, wait for it and take the receiver back
    pub fn join(mut self) -> Result<Receiver, Fs20Error> {
        self.stop();
        let worker = self
            .worker
            .take()
            .ok_or_else(|| Fs20Error::Worker("dispatcher already joined".to_string()))?;
        worker
            .join()
            .map_err(|_| Fs20Error::Worker(format!("{} panicked", WORKER_NAME)))
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    use fs20_detect::{UsbError, UsbHandle};
    use proptest::prelude::*;

    use super::*;

    fn event(address: &str, command: Command) -> ReceivedEvent {
        let address: Address = address.parse().unwrap();
        let frame = fs20_protocol::receive::encode_frame(address, command, None, 22);
        fs20_protocol::receive::parse_frame(&frame).unwrap().0
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> impl Fn(&ReceivedEvent) + Send + Sync + 'static {
        let log = log.clone();
        move |_| log.lock().unwrap().push(tag)
    }

    #[test]
    fn test_for_filter() {
        let address: Address = "1111-1111-1111".parse().unwrap();
        assert_eq!(
            ListenerKey::for_filter(Some(address), Some(Command::On)),
            ListenerKey::Exact { address, opcode: 0x10 }
        );
        assert_eq!(ListenerKey::for_filter(Some(address), None), ListenerKey::Address(address));
        assert_eq!(ListenerKey::for_filter(None, Some(Command::Toggle)), ListenerKey::Command(0x12));
        assert_eq!(ListenerKey::for_filter(None, None), ListenerKey::Any);
    }

    #[test]
    fn test_dispatch_order() {
        let dispatcher = Dispatcher::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let address: Address = "1111-1111-1111".parse().unwrap();

        dispatcher.add_listener(recorder(&log, "any"), None, None);
        dispatcher.add_listener(recorder(&log, "command"), None, Some(Command::On));
        dispatcher.add_listener(recorder(&log, "address"), Some(address), None);
        dispatcher.add_listener(recorder(&log, "exact"), Some(address), Some(Command::On));
        dispatcher.add_listener(recorder(&log, "any2"), None, None);

        let invoked = dispatcher.dispatch(&event("1111-1111-1111", Command::OnBrightnessLevel16));
        assert_eq!(invoked, 5);
        assert_eq!(*log.lock().unwrap(), vec!["exact", "address", "command", "any", "any2"]);
    }

    #[test]
    fn test_dispatch_filters() {
        let dispatcher = Dispatcher::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let address: Address = "1111-1111-1111".parse().unwrap();

        dispatcher.add_listener(recorder(&log, "exact"), Some(address), Some(Command::Off));
        dispatcher.add_listener(recorder(&log, "address"), Some(address), None);

        assert_eq!(dispatcher.dispatch(&event("4444-4444-4444", Command::Off)), 0);
        assert_eq!(dispatcher.dispatch(&event("1111-1111-1111", Command::Toggle)), 1);
        assert_eq!(*log.lock().unwrap(), vec!["address"]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let dispatcher = Dispatcher::default();
        let hits = Arc::new(AtomicUsize::new(0));

        dispatcher.add_listener(|_| panic!("listener failure"), None, None);
        let counter = hits.clone();
        dispatcher.add_listener(
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            None,
            None,
        );

        assert_eq!(dispatcher.dispatch(&event("1111-1111-1111", Command::Off)), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    proptest! {
        #[test]
        fn matching_filters_always_deliver(
            raw in any::<[u8; 3]>(),
            opcode in 0u8..0x20,
            by_address in any::<bool>(),
            by_command in any::<bool>(),
        ) {
            prop_assume!(Command::try_from(opcode).is_ok());
            let command = Command::try_from(opcode).unwrap();
            let address = Address::from_packed(raw);
            let ev = event(&address.to_string(), command);

            let dispatcher = Dispatcher::default();
            dispatcher.add_listener(
                |_| {},
                by_address.then_some(address),
                by_command.then_some(command),
            );
            prop_assert_eq!(dispatcher.dispatch(&ev), 1);
        }
    }

    /// Fails once with an I/O error, then delivers one frame, then idles
    struct FlakyHandle {
        reads: Vec<Result<Vec<u8>, UsbError>>,
    }

    impl UsbHandle for FlakyHandle {
        fn read(&mut self, _: u8, _: usize, _: Duration) -> Result<Vec<u8>, UsbError> {
            if self.reads.is_empty() {
                return Err(UsbError::Timeout);
            }
            self.reads.remove(0)
        }

        fn write(&mut self, _: u8, _: &[u8]) -> Result<usize, UsbError> {
            Err(UsbError::Io("receiver is read only".to_string()))
        }
    }

    #[test]
    fn test_worker_continues_after_usb_error() {
        let address: Address = "1111-1111-1111".parse().unwrap();
        let frame = fs20_protocol::receive::encode_frame(address, Command::Toggle, None, 22);
        let receiver = Receiver::new(Box::new(FlakyHandle {
            reads: vec![Err(UsbError::Io("pipe stalled".to_string())), Ok(frame.to_vec())],
        }));

        let dispatcher = Dispatcher::new(DispatcherConfig {
            poll_interval_ms: 1,
            event_buffer: 4,
        });
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        dispatcher.add_listener(
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            Some(address),
            None,
        );

        let handle = dispatcher.start(receiver).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while hits.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(handle.state(), DispatcherState::Running);

        let receiver = handle.join().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(receiver.firmware_version().unwrap().to_string(), "v2.2");
    }

    #[test]
    fn test_listener_may_register_listener() {
        let dispatcher = Dispatcher::default();
        let inner = dispatcher.clone();
        dispatcher.add_listener(move |_| inner.add_listener(|_| {}, None, None), None, None);

        dispatcher.dispatch(&event("1111-1111-1111", Command::Off));
        assert_eq!(dispatcher.listener_count(), 2);
    }
}
