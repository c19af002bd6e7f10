//! Background health sweeper

use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use tracing::{debug, error};

use crate::pool::Shared;
use crate::resource::Resource;

/// Handle to the recurring sweep thread
///
/// The thread only holds a weak reference to the pool, so it also ends on its
/// own once the pool is gone.
pub(crate) struct Sweeper {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn start<R: Resource>(
        shared: Weak<Shared<R>>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let interval = interval.max(Duration::from_millis(1));
        let (stop, stopped) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("resourcepool-sweeper".to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "health sweeper started");
                let ticker = channel::tick(interval);
                loop {
                    crossbeam::select! {
                        recv(ticker) -> _ => {
                            let Some(shared) = shared.upgrade() else {
                                break;
                            };
                            shared.sweep();
                        }
                        recv(stopped) -> _ => break,
                    }
                }
                debug!("health sweeper stopped");
            })?;

        Ok(Self { stop, handle })
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            error!("health sweeper panicked");
        }
    }
}
