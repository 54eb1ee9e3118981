use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Creates a single-slot mailbox: the UI only ever sees the newest item and a
/// slow renderer never lets frames pile up.
pub fn latest_only<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let (tx, rx) = bounded(1);
    (
        MailboxSender {
            tx,
            evict: rx.clone(),
        },
        MailboxReceiver { rx },
    )
}

#[derive(Debug)]
pub struct MailboxSender<T> {
    tx: Sender<T>,
    evict: Receiver<T>,
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            evict: self.evict.clone(),
        }
    }
}

impl<T> MailboxSender<T> {
    /// Stores `item`, replacing an unread one.
    pub fn publish(&self, item: T) {
        let mut item = item;
        loop {
            match self.tx.try_send(item) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.evict.try_recv();
                    item = rejected;
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct MailboxReceiver<T> {
    rx: Receiver<T>,
}

impl<T> MailboxReceiver<T> {
    pub fn take_latest(&self) -> Option<T> {
        let mut latest = None;
        while let Ok(item) = self.rx.try_recv() {
            latest = Some(item);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_item_replaces_unread_one() {
        let (tx, rx) = latest_only();
        tx.publish(1);
        tx.publish(2);
        tx.publish(3);
        assert_eq!(rx.take_latest(), Some(3));
        assert_eq!(rx.take_latest(), None);
    }

    #[test]
    fn empty_mailbox_yields_nothing() {
        let (_tx, rx) = latest_only::<u8>();
        assert_eq!(rx.take_latest(), None);
    }

    #[test]
    fn cloned_senders_share_the_slot() {
        let (tx, rx) = latest_only();
        let other = tx.clone();
        tx.publish("stale");
        other.publish("fresh");
        assert_eq!(rx.take_latest(), Some("fresh"));
    }
}
