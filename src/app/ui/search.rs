//! Search box dismissal and search-as-you-type debouncing

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Input(String),
    Focus,
    ClickInside,
    ClickOutside,
    Escape,
}

/// Results dropdown of the search box
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchBox {
    query: String,
    open: bool,
}

impl SearchBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Applies `event`; returns the query to hand to the debouncer, if any
    pub fn handle(&mut self, event: SearchEvent) -> Option<String> {
        match event {
            SearchEvent::Input(query) => {
                self.open = !query.trim().is_empty();
                self.query = query;
                self.open.then(|| self.query.clone())
            }
            SearchEvent::Focus => {
                self.open = !self.query.trim().is_empty();
                None
            }
            SearchEvent::ClickInside => None,
            SearchEvent::ClickOutside | SearchEvent::Escape => {
                self.open = false;
                None
            }
        }
    }
}

/// Coalesces bursts of values into one call after a quiet window
///
/// Each pushed value restarts the window; only the latest value is
/// delivered. A value still pending when the debouncer is finished is
/// delivered immediately.
#[derive(Debug)]
pub struct Debouncer<T> {
    sender: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn<F, Fut>(window: Duration, mut on_fire: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                match pending.take() {
                    None => match receiver.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    },
                    Some(value) => {
                        tokio::select! {
                            next = receiver.recv() => match next {
                                Some(newer) => pending = Some(newer),
                                None => {
                                    on_fire(value).await;
                                    break;
                                }
                            },
                            _ = tokio::time::sleep(window) => {
                                debug!("Debounce window of {}ms elapsed", window.as_millis());
                                on_fire(value).await;
                            }
                        }
                    }
                }
            }
        });

        Self { sender, task }
    }

    /// Queues `value`, restarting the window; false if the debouncer stopped
    pub fn push(&self, value: T) -> bool {
        self.sender.send(value).is_ok()
    }

    /// Stops accepting values and waits for the last delivery
    pub async fn finish(self) {
        drop(self.sender);
        if let Err(e) = self.task.await {
            warn!("Debouncer task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn recording() -> (
        Arc<Mutex<Vec<String>>>,
        impl FnMut(String) -> futures::future::BoxFuture<'static, ()> + Send + 'static,
    ) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let log = fired.clone();
        let on_fire = move |query: String| {
            let log = log.clone();
            let fut: futures::future::BoxFuture<'static, ()> =
                Box::pin(async move { log.lock().await.push(query) });
            fut
        };
        (fired, on_fire)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_fires_once_with_last_value() {
        let (fired, on_fire) = recording();
        let debouncer = Debouncer::spawn(Duration::from_millis(300), on_fire);

        for query in ["a", "ab", "abc"] {
            assert!(debouncer.push(query.to_string()));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*fired.lock().await, vec!["abc".to_string()]);
        debouncer.finish().await;
        assert_eq!(fired.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_input_fires_each_value() {
        let (fired, on_fire) = recording();
        let debouncer = Debouncer::spawn(Duration::from_millis(300), on_fire);

        debouncer.push("dune".to_string());
        tokio::time::sleep(Duration::from_millis(500)).await;
        debouncer.push("alien".to_string());
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*fired.lock().await, vec!["dune".to_string(), "alien".to_string()]);
        debouncer.finish().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_flushes_pending_value() {
        let (fired, on_fire) = recording();
        let debouncer = Debouncer::spawn(Duration::from_millis(300), on_fire);

        debouncer.push("heat".to_string());
        debouncer.finish().await;
        assert_eq!(*fired.lock().await, vec!["heat".to_string()]);
    }

    #[test]
    fn test_search_box_dismissal() {
        let mut search = SearchBox::new();
        assert_eq!(
            search.handle(SearchEvent::Input("ran".to_string())),
            Some("ran".to_string())
        );
        assert!(search.is_open());

        search.handle(SearchEvent::ClickInside);
        assert!(search.is_open());

        search.handle(SearchEvent::ClickOutside);
        assert!(!search.is_open());
        assert_eq!(search.query(), "ran");

        search.handle(SearchEvent::Focus);
        assert!(search.is_open());

        search.handle(SearchEvent::Escape);
        assert!(!search.is_open());
    }

    #[test]
    fn test_clearing_query_closes() {
        let mut search = SearchBox::new();
        search.handle(SearchEvent::Input("x".to_string()));
        assert_eq!(search.handle(SearchEvent::Input(String::new())), None);
        assert!(!search.is_open());
        search.handle(SearchEvent::Focus);
        assert!(!search.is_open());
    }
}
