//! Local feed loader: save, load, and validate against a [`FeedStore`].
//!
//! ### Save
//! Delete the current record, then insert the new feed stamped with the
//! clock. A failed delete never reaches insert.
//!
//! ### Load
//! | retrieval              | result              |
//! |------------------------|---------------------|
//! | failure                | the store error     |
//! | found, fresh           | the cached feed     |
//! | found, stale           | empty feed          |
//! | empty                  | empty feed          |
//!
//! Load never deletes anything; eviction is left to validate.
//!
//! ### Validate
//! Delete the record when retrieval fails or the record is stale.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::{CachePolicy, FeedStore, RetrievalOutcome, to_local, to_models};
use crate::Error;
use crate::clock::{Clock, SystemClock};
use crate::delivery::{Completion, DeliveryToken, Liveness};
use crate::feed::{FeedEntry, FeedLoader};

struct Shared<S, C> {
    store: S,
    clock: C,
    policy: CachePolicy,
}

impl<S: FeedStore, C: Clock> Shared<S, C> {
    async fn save(&self, feed: &[FeedEntry], token: &DeliveryToken) -> Result<(), Error> {
        self.store.delete_cached_feed().await?;

        if !token.is_alive() {
            tracing::debug!("loader released after delete; skipping insert");
            return Ok(());
        }

        self.store.insert(to_local(feed), self.clock.now()).await
    }

    async fn load(&self) -> Result<Vec<FeedEntry>, Error> {
        match self.store.retrieve().await {
            RetrievalOutcome::Failure(e) => Err(e),
            RetrievalOutcome::Found { feed, timestamp } if self.policy.validate(timestamp, self.clock.now()) => {
                Ok(to_models(feed))
            }
            RetrievalOutcome::Found { timestamp, .. } => {
                tracing::debug!(%timestamp, "cached feed is stale; returning empty feed");
                Ok(Vec::new())
            }
            RetrievalOutcome::Empty => Ok(Vec::new()),
        }
    }

    async fn validate(&self, token: &DeliveryToken) {
        let outcome = self.store.retrieve().await;

        if !token.is_alive() {
            return;
        }

        match outcome {
            RetrievalOutcome::Failure(e) => {
                tracing::warn!(error = %e, "cache retrieval failed; deleting cached feed");
                self.evict().await;
            }
            RetrievalOutcome::Found { timestamp, .. } if !self.policy.validate(timestamp, self.clock.now()) => {
                tracing::warn!(%timestamp, max_age_days = self.policy.max_age_days(), "cached feed expired; deleting");
                self.evict().await;
            }
            RetrievalOutcome::Found { .. } | RetrievalOutcome::Empty => {}
        }
    }

    async fn evict(&self) {
        if let Err(e) = self.store.delete_cached_feed().await {
            tracing::warn!(error = %e, "failed to delete cached feed");
        }
    }
}

/// Loads the feed from, and saves it to, a local store.
///
/// The store may be shared with other loaders (wrap it in an `Arc`).
/// Dropping the loader stops delivery of results from operations started
/// with the `spawn_*` methods; their store calls still run to completion.
pub struct LocalFeedLoader<S, C = SystemClock> {
    shared: Arc<Shared<S, C>>,
    liveness: Liveness,
}

impl<S: FeedStore + 'static> LocalFeedLoader<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S, C> LocalFeedLoader<S, C>
where
    S: FeedStore + 'static,
    C: Clock + 'static,
{
    pub fn with_clock(store: S, clock: C) -> Self {
        Self::with_policy(store, clock, CachePolicy::default())
    }

    pub fn with_policy(store: S, clock: C, policy: CachePolicy) -> Self {
        Self { shared: Arc::new(Shared { store, clock, policy }), liveness: Liveness::new() }
    }

    pub fn policy(&self) -> CachePolicy {
        self.shared.policy
    }

    /// Replace the cached feed with `feed`.
    pub async fn save(&self, feed: &[FeedEntry]) -> Result<(), Error> {
        self.shared.save(feed, &self.liveness.token()).await
    }

    /// Evict the cached feed if it is stale or unreadable.
    pub async fn validate_cache(&self) {
        self.shared.validate(&self.liveness.token()).await
    }

    /// Save on a background task and report through `on_complete`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_save<F>(&self, feed: Vec<FeedEntry>, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<(), Error>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let token = self.liveness.token();
        tokio::spawn(async move {
            let result = shared.save(&feed, &token).await;
            token.deliver(on_complete, result);
        })
    }

    /// Load on a background task and report through `on_complete`.
    pub fn spawn_load<F>(&self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<FeedEntry>, Error>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let token = self.liveness.token();
        tokio::spawn(async move {
            let result = shared.load().await;
            token.deliver(on_complete, result);
        })
    }

    /// Validate on a background task. `on_complete` runs once the
    /// maintenance pass has finished, unless the loader was dropped.
    pub fn spawn_validate(&self, on_complete: Option<Completion<()>>) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let token = self.liveness.token();
        tokio::spawn(async move {
            shared.validate(&token).await;
            if let Some(on_complete) = on_complete {
                token.deliver(on_complete, ());
            }
        })
    }
}

#[async_trait]
impl<S, C> FeedLoader for LocalFeedLoader<S, C>
where
    S: FeedStore + 'static,
    C: Clock + 'static,
{
    type Error = Error;

    async fn load(&self) -> Result<Vec<FeedEntry>, Error> {
        self.shared.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachedFeed, InMemoryFeedStore, LocalFeedEntry};
    use chrono::{DateTime, Days, Duration, Local, TimeZone, Utc};
    use std::sync::Mutex;
    use tokio::sync::oneshot;
    use url::Url;
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    enum Message {
        Delete,
        Insert(Vec<LocalFeedEntry>, DateTime<Utc>),
        Retrieve,
    }

    /// Records every store call and holds it open until the test completes it.
    #[derive(Default)]
    struct FeedStoreSpy {
        messages: Mutex<Vec<Message>>,
        deletions: Mutex<Vec<Option<oneshot::Sender<Result<(), Error>>>>>,
        insertions: Mutex<Vec<Option<oneshot::Sender<Result<(), Error>>>>>,
        retrievals: Mutex<Vec<Option<oneshot::Sender<RetrievalOutcome>>>>,
    }

    impl FeedStoreSpy {
        fn messages(&self) -> Vec<Message> {
            self.messages.lock().unwrap().clone()
        }

        async fn until_received(&self, count: usize) {
            for _ in 0..1_000 {
                if self.messages.lock().unwrap().len() >= count {
                    return;
                }
                tokio::task::yield_now().await;
            }
            panic!("expected {count} store messages, got {:?}", self.messages());
        }

        fn complete_deletion(&self, index: usize, result: Result<(), Error>) {
            let sender = self.deletions.lock().unwrap()[index].take().unwrap();
            let _ = sender.send(result);
        }

        fn complete_insertion(&self, index: usize, result: Result<(), Error>) {
            let sender = self.insertions.lock().unwrap()[index].take().unwrap();
            let _ = sender.send(result);
        }

        fn complete_retrieval(&self, index: usize, outcome: RetrievalOutcome) {
            let sender = self.retrievals.lock().unwrap()[index].take().unwrap();
            let _ = sender.send(outcome);
        }
    }

    fn dropped() -> Error {
        Error::Io(std::io::Error::other("spy completion dropped"))
    }

    #[async_trait]
    impl FeedStore for FeedStoreSpy {
        async fn delete_cached_feed(&self) -> Result<(), Error> {
            let (tx, rx) = oneshot::channel();
            self.deletions.lock().unwrap().push(Some(tx));
            self.messages.lock().unwrap().push(Message::Delete);
            rx.await.unwrap_or_else(|_| Err(dropped()))
        }

        async fn insert(&self, feed: Vec<LocalFeedEntry>, timestamp: DateTime<Utc>) -> Result<(), Error> {
            let (tx, rx) = oneshot::channel();
            self.insertions.lock().unwrap().push(Some(tx));
            self.messages.lock().unwrap().push(Message::Insert(feed, timestamp));
            rx.await.unwrap_or_else(|_| Err(dropped()))
        }

        async fn retrieve(&self) -> RetrievalOutcome {
            let (tx, rx) = oneshot::channel();
            self.retrievals.lock().unwrap().push(Some(tx));
            self.messages.lock().unwrap().push(Message::Retrieve);
            rx.await.unwrap_or_else(|_| RetrievalOutcome::Failure(dropped()))
        }
    }

    fn unique_entry() -> FeedEntry {
        FeedEntry {
            id: Uuid::new_v4(),
            description: Some("any".into()),
            location: Some("any".into()),
            image_url: Url::parse("http://any-url.com").unwrap(),
        }
    }

    fn unique_feed() -> (Vec<FeedEntry>, Vec<LocalFeedEntry>) {
        let models = vec![unique_entry(), unique_entry()];
        let local = to_local(&models);
        (models, local)
    }

    fn any_error() -> Error {
        Error::Io(std::io::Error::other("any error"))
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    /// `days` calendar days before `now`, on the same calendar the loader uses.
    fn days_before(now: DateTime<Utc>, days: u64) -> DateTime<Utc> {
        now.with_timezone(&Local).checked_sub_days(Days::new(days)).unwrap().with_timezone(&Utc)
    }

    fn make_sut() -> (LocalFeedLoader<Arc<FeedStoreSpy>, fn() -> DateTime<Utc>>, Arc<FeedStoreSpy>) {
        let store = Arc::new(FeedStoreSpy::default());
        let sut = LocalFeedLoader::with_clock(Arc::clone(&store), fixed_now as fn() -> DateTime<Utc>);
        (sut, store)
    }

    type Captured<T> = Arc<Mutex<Vec<T>>>;

    fn capture<T: Send + 'static>() -> (Captured<T>, impl FnOnce(T) + Send + 'static) {
        let received: Captured<T> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        (received, move |value| sink.lock().unwrap().push(value))
    }

    #[test]
    fn test_init_does_not_message_store() {
        let (_sut, store) = make_sut();
        assert!(store.messages().is_empty());
    }

    #[tokio::test]
    async fn test_save_requests_cache_deletion() {
        let (sut, store) = make_sut();

        let _handle = sut.spawn_save(unique_feed().0, |_| {});
        store.until_received(1).await;

        assert_eq!(store.messages(), vec![Message::Delete]);
    }

    #[tokio::test]
    async fn test_save_does_not_request_insertion_on_deletion_error() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<(), Error>>();

        let handle = sut.spawn_save(unique_feed().0, on_complete);
        store.until_received(1).await;
        store.complete_deletion(0, Err(any_error()));
        handle.await.unwrap();

        assert_eq!(store.messages(), vec![Message::Delete]);
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0], Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_save_requests_insertion_with_timestamp_on_successful_deletion() {
        let (sut, store) = make_sut();
        let (models, local) = unique_feed();

        let _handle = sut.spawn_save(models, |_| {});
        store.until_received(1).await;
        store.complete_deletion(0, Ok(()));
        store.until_received(2).await;

        assert_eq!(store.messages(), vec![Message::Delete, Message::Insert(local, fixed_now())]);
    }

    #[tokio::test]
    async fn test_save_fails_on_insertion_error() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<(), Error>>();

        let handle = sut.spawn_save(unique_feed().0, on_complete);
        store.until_received(1).await;
        store.complete_deletion(0, Ok(()));
        store.until_received(2).await;
        store.complete_insertion(0, Err(any_error()));
        handle.await.unwrap();

        let received = received.lock().unwrap();
        assert!(matches!(received.as_slice(), [Err(Error::Io(_))]));
    }

    #[tokio::test]
    async fn test_save_succeeds_on_successful_insertion() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<(), Error>>();

        let handle = sut.spawn_save(unique_feed().0, on_complete);
        store.until_received(1).await;
        store.complete_deletion(0, Ok(()));
        store.until_received(2).await;
        store.complete_insertion(0, Ok(()));
        handle.await.unwrap();

        assert!(matches!(received.lock().unwrap().as_slice(), [Ok(())]));
    }

    #[tokio::test]
    async fn test_save_does_not_deliver_deletion_error_after_release() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<(), Error>>();

        let handle = sut.spawn_save(unique_feed().0, on_complete);
        store.until_received(1).await;
        drop(sut);
        store.complete_deletion(0, Err(any_error()));
        handle.await.unwrap();

        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_does_not_insert_after_release_during_deletion() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<(), Error>>();

        let handle = sut.spawn_save(unique_feed().0, on_complete);
        store.until_received(1).await;
        drop(sut);
        store.complete_deletion(0, Ok(()));
        handle.await.unwrap();

        assert_eq!(store.messages(), vec![Message::Delete]);
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_does_not_deliver_insertion_error_after_release() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<(), Error>>();

        let handle = sut.spawn_save(unique_feed().0, on_complete);
        store.until_received(1).await;
        store.complete_deletion(0, Ok(()));
        store.until_received(2).await;
        drop(sut);
        store.complete_insertion(0, Err(any_error()));
        handle.await.unwrap();

        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_requests_cache_retrieval() {
        let (sut, store) = make_sut();

        let _handle = sut.spawn_load(|_| {});
        store.until_received(1).await;

        assert_eq!(store.messages(), vec![Message::Retrieve]);
    }

    #[tokio::test]
    async fn test_load_fails_on_retrieval_error() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<Vec<FeedEntry>, Error>>();

        let handle = sut.spawn_load(on_complete);
        store.until_received(1).await;
        store.complete_retrieval(0, RetrievalOutcome::Failure(any_error()));
        handle.await.unwrap();

        assert!(matches!(received.lock().unwrap().as_slice(), [Err(Error::Io(_))]));
    }

    #[tokio::test]
    async fn test_load_has_no_side_effects_on_retrieval_error() {
        let (sut, store) = make_sut();

        let handle = sut.spawn_load(|_| {});
        store.until_received(1).await;
        store.complete_retrieval(0, RetrievalOutcome::Failure(any_error()));
        handle.await.unwrap();

        assert_eq!(store.messages(), vec![Message::Retrieve]);
    }

    #[tokio::test]
    async fn test_load_delivers_no_entries_on_empty_cache() {
        let sut = LocalFeedLoader::with_clock(InMemoryFeedStore::new(), fixed_now);
        assert!(sut.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_delivers_cached_entries_on_less_than_seven_days_old_cache() {
        let (models, local) = unique_feed();
        let timestamp = days_before(fixed_now(), 7) + Duration::seconds(1);
        let store = InMemoryFeedStore::with_record(CachedFeed { feed_items: local, timestamp });
        let sut = LocalFeedLoader::with_clock(store, fixed_now);

        assert_eq!(sut.load().await.unwrap(), models);
    }

    #[tokio::test]
    async fn test_load_delivers_no_entries_on_seven_days_old_cache() {
        let (_, local) = unique_feed();
        let timestamp = days_before(fixed_now(), 7);
        let store = InMemoryFeedStore::with_record(CachedFeed { feed_items: local, timestamp });
        let sut = LocalFeedLoader::with_clock(store, fixed_now);

        assert!(sut.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_delivers_no_entries_on_more_than_seven_days_old_cache() {
        let (_, local) = unique_feed();
        let timestamp = days_before(fixed_now(), 7) - Duration::seconds(1);
        let store = Arc::new(InMemoryFeedStore::with_record(CachedFeed { feed_items: local.clone(), timestamp }));
        let sut = LocalFeedLoader::with_clock(Arc::clone(&store), fixed_now);

        assert!(sut.load().await.unwrap().is_empty());
        // load is read-only: the stale record is still there
        assert_eq!(store.snapshot().await.map(|r| r.feed_items), Some(local));
    }

    #[tokio::test]
    async fn test_load_respects_configured_policy() {
        let (models, local) = unique_feed();
        let timestamp = days_before(fixed_now(), 20);
        let store = InMemoryFeedStore::with_record(CachedFeed { feed_items: local, timestamp });
        let sut = LocalFeedLoader::with_policy(store, fixed_now, CachePolicy::new(30));

        assert_eq!(sut.load().await.unwrap(), models);
    }

    #[tokio::test]
    async fn test_load_does_not_deliver_result_after_release() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<Result<Vec<FeedEntry>, Error>>();

        let handle = sut.spawn_load(on_complete);
        store.until_received(1).await;
        drop(sut);
        store.complete_retrieval(0, RetrievalOutcome::Empty);
        handle.await.unwrap();

        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validate_deletes_cache_on_retrieval_error() {
        let (sut, store) = make_sut();

        let handle = sut.spawn_validate(None);
        store.until_received(1).await;
        store.complete_retrieval(0, RetrievalOutcome::Failure(any_error()));
        store.until_received(2).await;
        store.complete_deletion(0, Ok(()));
        handle.await.unwrap();

        assert_eq!(store.messages(), vec![Message::Retrieve, Message::Delete]);
    }

    #[tokio::test]
    async fn test_validate_does_not_delete_on_empty_cache() {
        let (sut, store) = make_sut();

        let handle = sut.spawn_validate(None);
        store.until_received(1).await;
        store.complete_retrieval(0, RetrievalOutcome::Empty);
        handle.await.unwrap();

        assert_eq!(store.messages(), vec![Message::Retrieve]);
    }

    #[tokio::test]
    async fn test_validate_does_not_delete_fresh_cache() {
        let (sut, store) = make_sut();
        let (_, local) = unique_feed();

        let handle = sut.spawn_validate(None);
        store.until_received(1).await;
        store.complete_retrieval(
            0,
            RetrievalOutcome::Found { feed: local, timestamp: days_before(fixed_now(), 7) + Duration::seconds(1) },
        );
        handle.await.unwrap();

        assert_eq!(store.messages(), vec![Message::Retrieve]);
    }

    #[tokio::test]
    async fn test_validate_deletes_seven_days_old_cache() {
        let (_, local) = unique_feed();
        let store = Arc::new(InMemoryFeedStore::with_record(CachedFeed {
            feed_items: local,
            timestamp: days_before(fixed_now(), 7),
        }));
        let sut = LocalFeedLoader::with_clock(Arc::clone(&store), fixed_now);

        sut.validate_cache().await;

        assert!(store.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_validate_reports_completion() {
        let sut = LocalFeedLoader::with_clock(InMemoryFeedStore::new(), fixed_now);
        let (received, on_complete) = capture::<()>();

        sut.spawn_validate(Some(Box::new(on_complete))).await.unwrap();

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_does_not_delete_after_release() {
        let (sut, store) = make_sut();
        let (received, on_complete) = capture::<()>();

        let handle = sut.spawn_validate(Some(Box::new(on_complete)));
        store.until_received(1).await;
        drop(sut);
        store.complete_retrieval(0, RetrievalOutcome::Failure(any_error()));
        handle.await.unwrap();

        assert_eq!(store.messages(), vec![Message::Retrieve]);
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = Arc::new(InMemoryFeedStore::new());
        let sut = LocalFeedLoader::with_clock(Arc::clone(&store), fixed_now);
        let (models, _) = unique_feed();

        sut.save(&models).await.unwrap();

        assert_eq!(store.snapshot().await.map(|r| r.timestamp), Some(fixed_now()));
        assert_eq!(sut.load().await.unwrap(), models);
    }
}
