use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crate::acquisition::camera::{CameraDevice, StreamConstraints, StreamGuard};
use crate::assets::decode::decode_image;
use crate::assets::resource::{ImageResource, Layer};
use crate::foundation::error::{DeviceFailure, SynthError, SynthResult};

/// Shared cancellation flag for background jobs.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Completion events delivered back to the session.
pub(crate) enum JobEvent {
    Decoded {
        layer: Layer,
        generation: u64,
        result: SynthResult<ImageResource>,
    },
    CameraGranted {
        ticket: u64,
        stream: StreamGuard,
    },
    CameraDenied {
        ticket: u64,
        failure: DeviceFailure,
    },
}

/// Background work for one session: decodes and device requests on a private rayon pool.
///
/// Jobs never touch session state. They post a [`JobEvent`] that the session applies on its own
/// thread. Once the token is cancelled, jobs drop their results; a dropped grant releases its
/// device through [`StreamGuard`].
pub(crate) struct Jobs {
    pool: rayon::ThreadPool,
    tx: mpsc::Sender<JobEvent>,
    rx: mpsc::Receiver<JobEvent>,
    cancel: CancelToken,
    in_flight: Arc<AtomicUsize>,
}

impl Jobs {
    pub(crate) fn new(threads: usize) -> SynthResult<Self> {
        let pool = build_thread_pool(threads)?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            pool,
            tx,
            rx,
            cancel: CancelToken::default(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub(crate) fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn spawn_decode(&self, layer: Layer, generation: u64, bytes: Vec<u8>) {
        self.spawn(move |cancel| {
            if cancel.is_cancelled() {
                return None;
            }
            let result = decode_image(&bytes);
            if cancel.is_cancelled() {
                return None;
            }
            Some(JobEvent::Decoded {
                layer,
                generation,
                result,
            })
        });
    }

    pub(crate) fn spawn_camera_request(
        &self,
        ticket: u64,
        device: Arc<dyn CameraDevice>,
        constraints: StreamConstraints,
    ) {
        self.spawn(move |cancel| {
            if cancel.is_cancelled() {
                return None;
            }
            match device.open(&constraints) {
                Ok(stream) => {
                    let stream = StreamGuard::new(stream);
                    if cancel.is_cancelled() {
                        tracing::debug!(ticket, "camera granted after teardown, releasing");
                        return None;
                    }
                    Some(JobEvent::CameraGranted { ticket, stream })
                }
                Err(failure) => Some(JobEvent::CameraDenied { ticket, failure }),
            }
        });
    }

    pub(crate) fn try_recv(&self) -> Option<JobEvent> {
        self.rx.try_recv().ok()
    }

    pub(crate) fn recv_timeout(&self, timeout: Duration) -> Option<JobEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    fn spawn(&self, job: impl FnOnce(&CancelToken) -> Option<JobEvent> + Send + 'static) {
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);
        self.pool.spawn(move || {
            if let Some(event) = job(&cancel) {
                // A closed channel means the session is gone; dropping the event releases it.
                let _ = tx.send(event);
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

fn build_thread_pool(threads: usize) -> SynthResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(SynthError::invalid_input("worker_threads must be >= 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("hairsynth-job-{i}"))
        .build()
        .map_err(|e| SynthError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}
