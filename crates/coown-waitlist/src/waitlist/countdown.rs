use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use super::domain::UserType;

/// Community invite links a visitor is sent to after joining.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunityLinks {
    pub co_owner: Option<Url>,
    pub realtor: Option<Url>,
}

impl CommunityLinks {
    pub fn link_for(&self, user_type: UserType) -> Option<&Url> {
        match user_type {
            UserType::CoOwner => self.co_owner.as_ref(),
            UserType::Realtor => self.realtor.as_ref(),
        }
    }
}

/// Side effect performed when a countdown reaches zero.
pub trait Redirector: Send + Sync + 'static {
    fn redirect(&self, target: &Url);
}

/// Cancellable one-second countdown ending in a single redirect.
///
/// The background task is aborted on [`RedirectCountdown::cancel`] or drop, so a
/// countdown owned by a torn-down session never fires.
#[derive(Debug)]
pub struct RedirectCountdown {
    target: Url,
    remaining: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl RedirectCountdown {
    /// Spawns the countdown on the current tokio runtime.
    pub fn start(target: Url, seconds: u64, redirector: Arc<dyn Redirector>) -> Self {
        let remaining = Arc::new(AtomicU64::new(seconds));
        let ticker = Arc::clone(&remaining);
        let destination = target.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // first tick resolves immediately
            interval.tick().await;
            while ticker.load(Ordering::Acquire) > 0 {
                interval.tick().await;
                ticker.fetch_sub(1, Ordering::AcqRel);
            }
            debug!(url = %destination, "countdown elapsed, redirecting");
            redirector.redirect(&destination);
        });

        Self {
            target,
            remaining,
            handle: Some(handle),
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits until the redirect has fired or the countdown was cancelled.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            let _ = handle.await;
        }
        self.handle = None;
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RedirectCountdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRedirector {
        targets: Mutex<Vec<String>>,
    }

    impl RecordingRedirector {
        fn targets(&self) -> Vec<String> {
            self.targets.lock().expect("redirect mutex").clone()
        }
    }

    impl Redirector for RecordingRedirector {
        fn redirect(&self, target: &Url) {
            self.targets
                .lock()
                .expect("redirect mutex")
                .push(target.to_string());
        }
    }

    fn invite() -> Url {
        Url::parse("https://chat.example.com/coowners").expect("valid url")
    }

    #[tokio::test(start_paused = true)]
    async fn redirects_once_after_countdown() {
        let redirector = Arc::new(RecordingRedirector::default());
        let countdown = RedirectCountdown::start(invite(), 5, redirector.clone());

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(countdown.seconds_remaining(), 3);
        assert!(redirector.targets().is_empty());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(countdown.seconds_remaining(), 0);
        assert_eq!(redirector.targets(), vec!["https://chat.example.com/coowners"]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(redirector.targets().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_countdown_prevents_redirect() {
        let redirector = Arc::new(RecordingRedirector::default());
        let countdown = RedirectCountdown::start(invite(), 5, redirector.clone());

        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(countdown);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(redirector.targets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_after_redirect() {
        let redirector = Arc::new(RecordingRedirector::default());
        let mut countdown = RedirectCountdown::start(invite(), 2, redirector.clone());

        countdown.wait().await;
        assert!(!countdown.is_active());
        assert_eq!(redirector.targets().len(), 1);
    }

    #[test]
    fn link_for_selects_by_user_type() {
        let links = CommunityLinks {
            co_owner: Some(invite()),
            realtor: None,
        };
        assert_eq!(links.link_for(UserType::CoOwner), Some(&invite()));
        assert!(links.link_for(UserType::Realtor).is_none());
    }
}
