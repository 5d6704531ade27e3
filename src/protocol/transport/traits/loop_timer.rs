//! Asynchronous pause between two iterations of the bridge loop.
use embassy_time::Duration;
use futures_util::future::Future;

/// Timer trait abstraction driving [`Bridge::run`](crate::bridge::Bridge::run).
pub trait LoopTimer {
    /// Asynchronously wait for `duration`.
    fn delay<'a>(&'a mut self, duration: Duration) -> impl Future<Output = ()> + 'a;
}
