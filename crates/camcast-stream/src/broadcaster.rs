use futures_core::Stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// One JPEG image, shared by every subscriber that receives it.
pub type CompressedFrame = Arc<[u8]>;

struct Shared {
    current: watch::Sender<Option<CompressedFrame>>,
    published: AtomicU64,
}

/// Holds the most recent frame and hands it to any number of subscribers.
///
/// Each subscription tracks on its own whether it has seen the current
/// frame, so it behaves like a private one-slot mailbox that `publish`
/// overwrites. A subscriber that is busy when frames arrive simply finds the
/// newest one when it next asks; nothing queues up behind it, and `publish`
/// never waits for anyone.
///
/// Cloning yields another handle to the same broadcaster.
#[derive(Clone)]
pub struct FrameBroadcaster {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for FrameBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.published_count())
            .finish()
    }
}

impl Default for FrameBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBroadcaster {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                current,
                published: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the current frame and wake every subscriber.
    pub fn publish(&self, frame: impl Into<CompressedFrame>) {
        self.shared.current.send_replace(Some(frame.into()));
        self.shared.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Start receiving frames published from now on.
    ///
    /// The frame that is current at subscription time is not delivered.
    /// Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> FrameSubscription {
        FrameSubscription {
            receiver: self.shared.current.subscribe(),
        }
    }

    /// The most recently published frame, if any.
    pub fn latest(&self) -> Option<CompressedFrame> {
        self.shared.current.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.current.receiver_count()
    }

    /// Number of `publish` calls so far.
    pub fn published_count(&self) -> u64 {
        self.shared.published.load(Ordering::Relaxed)
    }
}

/// One consumer's view of a [`FrameBroadcaster`].
pub struct FrameSubscription {
    receiver: watch::Receiver<Option<CompressedFrame>>,
}

impl std::fmt::Debug for FrameSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSubscription").finish_non_exhaustive()
    }
}

impl FrameSubscription {
    /// Wait for the next frame published after the last one this
    /// subscription returned.
    ///
    /// Returns `None` only once every broadcaster handle has been dropped.
    pub async fn next_frame(&mut self) -> Option<CompressedFrame> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(frame) = self.receiver.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }

    /// Turn the subscription into a lazy stream of frames.
    pub fn into_stream(self) -> impl Stream<Item = CompressedFrame> + Send + 'static {
        futures_util::stream::unfold(self, |mut subscription| async move {
            let frame = subscription.next_frame().await?;
            Some((frame, subscription))
        })
    }
}
