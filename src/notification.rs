const APP_NAME: &str = "duskswitch";

pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);
}

/// Desktop notifications through the freedesktop notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        if let Err(err) = notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(summary)
            .body(body)
            .show()
        {
            tracing::warn!("system notification failed: {err}");
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, summary: &str, body: &str) {
        tracing::debug!(summary, body, "notification suppressed");
    }
}
