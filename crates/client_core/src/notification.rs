use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub variant: NotificationVariant,
    pub message: String,
}

/// Fan-out channel for transient user-facing messages.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn send(&self, variant: NotificationVariant, message: impl Into<String>) {
        let notification = Notification {
            variant,
            message: message.into(),
        };
        tracing::debug!(variant = ?notification.variant, message = %notification.message, "notification");
        let _ = self.tx.send(notification);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NotificationVariant::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.send(NotificationVariant::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NotificationVariant::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_notifications_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.success("saved");
        notifier.error("failed");

        assert_eq!(rx.recv().await.expect("first").variant, NotificationVariant::Success);
        let second = rx.recv().await.expect("second");
        assert_eq!(second.variant, NotificationVariant::Error);
        assert_eq!(second.message, "failed");
    }

    #[test]
    fn sending_without_subscribers_is_harmless() {
        Notifier::new().warning("nobody listening");
    }
}
