//! Stream throttling

use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait to add throttling to any Stream
pub trait ThrottleExt: Stream {
    /// Emit at most once per `period`, keeping only the latest item seen
    /// since the previous emission.
    fn throttle(self, period: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, period)
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    /// Latest-wins rate limiter
    pub struct Throttle<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        latest: Option<S::Item>,
        done: bool,
    }
}

impl<S: Stream> Throttle<S> {
    pub fn new(stream: S, period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { stream, interval, latest: None, done: false }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        while !*this.done {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.latest = Some(item),
                Poll::Ready(None) => *this.done = true,
                Poll::Pending => break,
            }
        }

        if this.latest.is_some() {
            // The first tick completes immediately.
            return match this.interval.poll_tick(cx) {
                Poll::Ready(_) => Poll::Ready(this.latest.take()),
                Poll::Pending => Poll::Pending,
            };
        }

        if *this.done { Poll::Ready(None) } else { Poll::Pending }
    }
}
