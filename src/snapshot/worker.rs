//! Runs a blocking [`Capturer`] on its own thread behind an async handle.

use super::{CaptureOptions, CaptureTarget, Capturer, RasterImage, SnapshotRenderer};
use crate::{Error, Result};
use futures::future::BoxFuture;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Capture(CaptureTarget, CaptureOptions, oneshot::Sender<Result<RasterImage>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly capture handle backed by a dedicated worker thread.
///
/// The worker thread owns the synchronous [`Capturer`] and executes capture
/// commands sent from async tasks, so backends that are not `Send` can still
/// serve an async caller. Commands run one at a time in arrival order.
#[derive(Clone)]
pub struct CaptureWorker {
    cmd_tx: Sender<Command>,
}

impl CaptureWorker {
    /// Spawn the worker thread and build the capturer on it.
    pub async fn spawn<C, F>(make: F) -> Result<Self>
    where
        C: Capturer + 'static,
        F: FnOnce() -> Result<C> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut capturer = match make() {
                Ok(c) => c,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Capture(target, options, resp) => {
                        let res = capturer.capture(&target, &options);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(capturer.close());
                        break;
                    }
                }
            }
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Capture worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Capture `target` on the worker thread.
    pub async fn capture(
        &self,
        target: &CaptureTarget,
        options: &CaptureOptions,
    ) -> Result<RasterImage> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Capture(target.clone(), options.clone(), tx))
            .map_err(|_| Error::SnapshotFailed("capture worker has shut down".into()))?;
        rx.await
            .map_err(|e| Error::SnapshotFailed(format!("Capture canceled: {}", e)))?
    }

    /// Close the capturer and stop the worker thread.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Close(tx)).is_err() {
            return Ok(());
        }
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}

impl SnapshotRenderer for CaptureWorker {
    fn capture<'a>(
        &'a self,
        target: &'a CaptureTarget,
        options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<RasterImage>> {
        Box::pin(CaptureWorker::capture(self, target, options))
    }
}
