//! Message-passing bridge to the removal worker thread.

use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use photoglow_common::config::BackgroundRemovalConfig;
use photoglow_common::error::{PhotoglowError, PhotoglowResult};

use crate::remover::BackgroundRemover;

/// The worker's answer to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RemovalReply {
    Success { image: Vec<u8> },
    Failure { error: String },
}

/// A unit of work for the worker. Answered exactly once on `reply`.
#[derive(Debug)]
pub struct RemovalRequest {
    pub image: Vec<u8>,
    pub config: BackgroundRemovalConfig,
    reply: oneshot::Sender<RemovalReply>,
}

/// Owns the worker thread. Dropping the bridge stops and joins it.
#[derive(Debug)]
pub struct BgRemovalBridge {
    tx: Option<mpsc::Sender<RemovalRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl BgRemovalBridge {
    /// Start a worker that serves requests with `remover`, one at a time.
    pub fn spawn(remover: Box<dyn BackgroundRemover>) -> PhotoglowResult<Self> {
        let (tx, rx) = mpsc::channel::<RemovalRequest>();
        let worker = std::thread::Builder::new()
            .name("photoglow-bg-removal".to_string())
            .spawn(move || worker_loop(remover, rx))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue a request and return the channel its reply arrives on.
    pub fn submit(
        &self,
        image: Vec<u8>,
        config: BackgroundRemovalConfig,
    ) -> PhotoglowResult<oneshot::Receiver<RemovalReply>> {
        let (reply, rx) = oneshot::channel();
        let request = RemovalRequest {
            image,
            config,
            reply,
        };
        self.tx
            .as_ref()
            .ok_or_else(|| PhotoglowError::background_removal("worker is shut down"))?
            .send(request)
            .map_err(|_| PhotoglowError::background_removal("worker is not running"))?;
        Ok(rx)
    }

    /// Submit and wait, turning a `Failure` reply into an error.
    pub async fn remove(
        &self,
        image: Vec<u8>,
        config: BackgroundRemovalConfig,
    ) -> PhotoglowResult<Vec<u8>> {
        let rx = self.submit(image, config)?;
        match rx.await {
            Ok(RemovalReply::Success { image }) => Ok(image),
            Ok(RemovalReply::Failure { error }) => Err(PhotoglowError::background_removal(error)),
            Err(_) => Err(PhotoglowError::background_removal(
                "worker dropped the request without replying",
            )),
        }
    }
}

impl Drop for BgRemovalBridge {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Background removal worker panicked");
            }
        }
    }
}

fn worker_loop(remover: Box<dyn BackgroundRemover>, rx: mpsc::Receiver<RemovalRequest>) {
    tracing::debug!(remover = remover.name(), "Background removal worker started");
    while let Ok(request) = rx.recv() {
        let RemovalRequest {
            image,
            config,
            reply,
        } = request;

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| remover.remove(&image, &config)));
        let answer = match result {
            Ok(Ok(image)) => RemovalReply::Success { image },
            Ok(Err(err)) => RemovalReply::Failure {
                error: err.to_string(),
            },
            Err(_) => RemovalReply::Failure {
                error: format!("{} panicked", remover.name()),
            },
        };

        if let RemovalReply::Failure { error } = &answer {
            tracing::warn!(%error, "Background removal failed");
        }
        if reply.send(answer).is_err() {
            tracing::debug!("Removal requester went away before the reply");
        }
    }
    tracing::debug!("Background removal worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Reverses the bytes, fails on "bad", panics on "boom".
    struct FakeRemover {
        dropped: Arc<AtomicBool>,
    }

    impl BackgroundRemover for FakeRemover {
        fn remove(&self, image: &[u8], _config: &BackgroundRemovalConfig) -> PhotoglowResult<Vec<u8>> {
            match image {
                b"bad" => Err(PhotoglowError::background_removal("no subject found")),
                b"boom" => panic!("model crashed"),
                _ => Ok(image.iter().rev().copied().collect()),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    impl Drop for FakeRemover {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    fn bridge() -> (BgRemovalBridge, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        let remover = FakeRemover {
            dropped: dropped.clone(),
        };
        (BgRemovalBridge::spawn(Box::new(remover)).unwrap(), dropped)
    }

    #[tokio::test]
    async fn test_success_reply() {
        let (bridge, _) = bridge();
        let out = bridge
            .remove(b"abc".to_vec(), BackgroundRemovalConfig::default())
            .await
            .unwrap();
        assert_eq!(out, b"cba");
    }

    #[tokio::test]
    async fn test_failure_reply_becomes_error() {
        let (bridge, _) = bridge();
        let reply = bridge
            .submit(b"bad".to_vec(), BackgroundRemovalConfig::default())
            .unwrap()
            .await
            .unwrap();
        assert!(matches!(reply, RemovalReply::Failure { ref error } if error.contains("no subject")));

        let err = bridge
            .remove(b"bad".to_vec(), BackgroundRemovalConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoglowError::BackgroundRemoval { .. }));
    }

    #[tokio::test]
    async fn test_panicking_remover_still_replies() {
        let (bridge, _) = bridge();
        let reply = bridge
            .submit(b"boom".to_vec(), BackgroundRemovalConfig::default())
            .unwrap()
            .await
            .unwrap();
        assert!(matches!(reply, RemovalReply::Failure { .. }));

        // the worker survives and keeps serving
        let out = bridge
            .remove(b"xy".to_vec(), BackgroundRemovalConfig::default())
            .await
            .unwrap();
        assert_eq!(out, b"yx");
    }

    #[tokio::test]
    async fn test_requests_are_answered_in_order() {
        let (bridge, _) = bridge();
        let first = bridge.submit(b"12".to_vec(), BackgroundRemovalConfig::default()).unwrap();
        let second = bridge.submit(b"bad".to_vec(), BackgroundRemovalConfig::default()).unwrap();
        let third = bridge.submit(b"34".to_vec(), BackgroundRemovalConfig::default()).unwrap();

        assert_eq!(first.await.unwrap(), RemovalReply::Success { image: b"21".to_vec() });
        assert!(matches!(second.await.unwrap(), RemovalReply::Failure { .. }));
        assert_eq!(third.await.unwrap(), RemovalReply::Success { image: b"43".to_vec() });
    }

    #[test]
    fn test_drop_joins_worker() {
        let (bridge, dropped) = bridge();
        assert!(!dropped.load(Ordering::SeqCst));
        drop(bridge);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_reply_wire_format() {
        let reply = RemovalReply::Failure {
            error: "no subject found".to_string(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error"], "no subject found");

        let back: RemovalReply = serde_json::from_value(json).unwrap();
        assert_eq!(back, reply);
    }
}
