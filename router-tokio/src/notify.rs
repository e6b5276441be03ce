//! # `notify` channel
//!
//! A small notification channel wrapping [`tokio::sync::mpsc`] with the
//! extra property that if multiple notifications are sent before the
//! receiver calls [`Receiver::recv`], the receiver is only woken once,
//! preventing duplicate work.
//!
//! - `tx.send()` instead of `let _ = tx.try_send(())`.
//! - `rx.recv()` instead of matching on `Option<()>` to ignore a dropped
//!   sender (if every [`Sender`] is dropped, [`Receiver::recv`] never
//!   resolves, matching how an event-loop `select!` branch should just sit
//!   out forever rather than busy-loop).

use tokio::sync::mpsc;

/// Create a new `notify` channel, analogous to `mpsc::channel(1)`.
pub fn channel() -> (Sender, Receiver) {
    let (tx, rx) = mpsc::channel(1);
    (Sender(tx), Receiver(rx))
}

/// `notify` sender, analogous to `mpsc::Sender<()>`.
#[derive(Clone)]
pub struct Sender(mpsc::Sender<()>);

/// `notify` receiver, analogous to `mpsc::Receiver<()>`.
pub struct Receiver(mpsc::Receiver<()>);

impl Sender {
    /// Send a notification. A full channel (i.e. an unconsumed pending
    /// notification) is not an error - that's the whole point.
    pub fn send(&self) {
        let _ = self.0.try_send(());
    }
}

impl Receiver {
    /// Wait until a notification is received. Completes immediately if one
    /// was already sent.
    pub async fn recv(&mut self) {
        match self.0.recv().await {
            Some(()) => (),
            None => std::future::pending().await,
        }
    }

    /// Clears out any pending notification.
    pub fn clear(&mut self) {
        while self.0.try_recv().is_ok() {}
    }
}
