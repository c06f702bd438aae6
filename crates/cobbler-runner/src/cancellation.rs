use std::sync::OnceLock;

use tokio::sync::watch;

/// Process-wide cancellation signal (spec.md §5 "Cancellation semantics").
///
/// `SIGINT` on the driver must kill the active subprocess, if any, without
/// threading a cancellation handle through every call site that builds a
/// [`crate::CommandSpec`]. A `watch` channel gives late subscribers (a
/// runner spawned after cancellation was requested) the correct current
/// value immediately, unlike a `Notify`, which only wakes tasks already
/// waiting.
fn channel() -> &'static (watch::Sender<bool>, watch::Receiver<bool>) {
    static CHANNEL: OnceLock<(watch::Sender<bool>, watch::Receiver<bool>)> = OnceLock::new();
    CHANNEL.get_or_init(|| watch::channel(false))
}

/// Marks the process as cancelled. Idempotent. Called from the `SIGINT`
/// handler installed at the CLI boundary (spec.md §A.6).
pub fn request_cancellation() {
    let _ = channel().0.send(true);
}

/// True once [`request_cancellation`] has been called at least once.
#[must_use]
pub fn is_cancelled() -> bool {
    *channel().1.borrow()
}

pub(crate) fn receiver() -> watch::Receiver<bool> {
    channel().1.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The cancellation flag is process-wide and monotonic (never resets to
    /// `false`), so this only asserts the one-directional transition —
    /// other tests in this binary may have already cancelled it.
    #[test]
    fn request_cancellation_is_observed_by_a_fresh_receiver() {
        request_cancellation();
        assert!(is_cancelled());
        let rx = receiver();
        assert!(*rx.borrow());
    }
}
