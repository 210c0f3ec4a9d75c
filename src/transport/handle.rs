/// Control surface of one mounted video element.
///
/// The transport is the only caller. Implementations wrap a platform media element (or the
/// in-memory [`SimVideo`](crate::transport::sim::SimVideo)); none of the methods may fail. A
/// platform error is swallowed by the implementation and shows up as a position that did not
/// move, which the transport's bounded waits absorb.
pub trait PlaybackHandle {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;
    /// Start seeking to `secs`. Completion is observed through [`Self::is_seeking`].
    fn seek(&mut self, secs: f64);
    /// `true` until the most recent seek has been applied.
    fn is_seeking(&self) -> bool;
    /// Set the native playback rate.
    fn set_playback_rate(&mut self, rate: f64);
    /// Start native playback.
    fn play(&mut self);
    /// Stop native playback.
    fn pause(&mut self);
}
