use std::sync::{Arc, Mutex, Weak};

use chrono::NaiveDate;
use tokio::sync::watch;

use crate::auth::{AuthError, AuthProvider, IdentityState, UserInfo};
use crate::core::day_record::DayRecord;
use crate::core::ledger::Ledger;
use crate::core::profile::{DEFAULT_QUOTE, DailyQuote, Profile};
use crate::core::summary::{SummaryMap, compute_summaries};
use crate::store::{
    AbortOnDrop, DocumentStore, QUOTE_COLLECTION, StoreError, daily_quote_doc, day_doc,
    days_collection, user_doc,
};

/// The application core handed to the presentation layer.
///
/// Binds the active day's ledger, the calendar summary map, and the
/// profile to the authenticated identity's lifecycle. State is exposed
/// through watch channels; actions are plain methods. Mutating actions
/// update local state synchronously and persist in the background — the
/// store's own subscription echo closes the loop.
///
/// Construction spawns the identity listener, so a tokio runtime must be
/// current. Clones share the same session.
pub struct Session<S: DocumentStore, A: AuthProvider> {
    inner: Arc<SessionInner<S, A>>,
}

impl<S: DocumentStore, A: AuthProvider> Clone for Session<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<S, A> {
    store: S,
    auth: A,
    phase: watch::Sender<IdentityState>,
    ledger: watch::Sender<Ledger>,
    summaries: watch::Sender<SummaryMap>,
    profile: watch::Sender<Profile>,
    daily_quote: watch::Sender<Option<DailyQuote>>,
    binding: Mutex<Binding>,
}

/// Subscription guards for the identity currently bound. Dropping a
/// guard is the unsubscribe.
#[derive(Default)]
struct Binding {
    user: Option<UserInfo>,
    day_feed: Option<AbortOnDrop>,
    summary_feed: Option<AbortOnDrop>,
    profile_feed: Option<AbortOnDrop>,
}

impl Binding {
    fn clear_feeds(&mut self) {
        self.day_feed = None;
        self.summary_feed = None;
        self.profile_feed = None;
    }
}

impl<S: DocumentStore, A: AuthProvider> Session<S, A> {
    /// Create a session with today as the selected date.
    pub fn new(store: S, auth: A) -> Self {
        Self::with_date(store, auth, chrono::Local::now().date_naive())
    }

    pub fn with_date(store: S, auth: A, date: NaiveDate) -> Self {
        let identity = auth.identity_changes();
        let inner = Arc::new(SessionInner {
            store,
            auth,
            phase: watch::Sender::new(IdentityState::SignedOut),
            ledger: watch::Sender::new(Ledger::new(date)),
            summaries: watch::Sender::new(SummaryMap::new()),
            profile: watch::Sender::new(Profile::default()),
            daily_quote: watch::Sender::new(None),
            binding: Mutex::new(Binding::default()),
        });
        tokio::spawn(identity_loop(Arc::downgrade(&inner), identity));
        Self { inner }
    }

    // --- reactive surface -------------------------------------------------

    pub fn phase(&self) -> IdentityState {
        self.inner.phase.borrow().clone()
    }

    pub fn watch_phase(&self) -> watch::Receiver<IdentityState> {
        self.inner.phase.subscribe()
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.inner.ledger.borrow().date
    }

    /// Snapshot of the active day: selected date, tasks, category order.
    pub fn ledger(&self) -> Ledger {
        self.inner.ledger.borrow().clone()
    }

    pub fn watch_ledger(&self) -> watch::Receiver<Ledger> {
        self.inner.ledger.subscribe()
    }

    pub fn summaries(&self) -> SummaryMap {
        self.inner.summaries.borrow().clone()
    }

    pub fn watch_summaries(&self) -> watch::Receiver<SummaryMap> {
        self.inner.summaries.subscribe()
    }

    pub fn profile(&self) -> Profile {
        self.inner.profile.borrow().clone()
    }

    pub fn watch_profile(&self) -> watch::Receiver<Profile> {
        self.inner.profile.subscribe()
    }

    pub fn daily_quote(&self) -> Option<DailyQuote> {
        self.inner.daily_quote.borrow().clone()
    }

    pub fn watch_daily_quote(&self) -> watch::Receiver<Option<DailyQuote>> {
        self.inner.daily_quote.subscribe()
    }

    // --- identity actions -------------------------------------------------

    /// Errors propagate so the caller can show a message; success is
    /// observed through the phase feed once the session has re-bound.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        self.inner.auth.login(email, password).await
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        self.inner.auth.signup(email, password).await
    }

    pub async fn logout(&self) {
        self.inner.auth.logout().await;
    }

    // --- date & task actions ----------------------------------------------

    /// Switch the active date. The day-record subscription is swapped;
    /// tasks keep showing the previous date's state until the new feed's
    /// first push lands.
    pub fn select_date(&self, date: NaiveDate) {
        let inner = &self.inner;
        let changed = inner.ledger.send_if_modified(|ledger| {
            if ledger.date == date {
                false
            } else {
                ledger.date = date;
                true
            }
        });
        if !changed {
            return;
        }
        let mut binding = inner.binding.lock().unwrap();
        if let Some(user) = binding.user.clone() {
            // Drop the old feed before subscribing the new date so a
            // stale push can't overwrite fresh state.
            binding.day_feed = None;
            binding.day_feed = Some(inner.spawn_day_feed(user.id, date));
        }
    }

    pub fn toggle_task(&self, category: &str, index: usize) {
        self.mutate("toggle_task", |ledger| ledger.toggle_task(category, index));
    }

    pub fn add_task(&self, category: &str, title: &str) {
        self.mutate("add_task", |ledger| ledger.add_task(category, title));
    }

    pub fn edit_task_text(&self, category: &str, index: usize, new_title: &str) {
        self.mutate("edit_task_text", |ledger| {
            ledger.edit_task_text(category, index, new_title)
        });
    }

    pub fn rename_category(&self, old_name: &str, new_name: &str) {
        self.mutate("rename_category", |ledger| {
            ledger.rename_category(old_name, new_name)
        });
    }

    pub fn delete_task(&self, category: &str, index: usize) {
        self.mutate("delete_task", |ledger| ledger.delete_task(category, index));
    }

    /// Apply a ledger mutation and, when it changed state, persist the
    /// full snapshot keyed by the date that was active at call time.
    fn mutate(&self, op: &'static str, apply: impl FnOnce(&mut Ledger) -> bool) {
        let inner = &self.inner;
        let mut snapshot = None;
        inner.ledger.send_if_modified(|ledger| {
            if apply(ledger) {
                snapshot = Some((ledger.date, ledger.record()));
                true
            } else {
                log::debug!("{} rejected; state unchanged", op);
                false
            }
        });
        let Some((date, record)) = snapshot else { return };
        let Some(user) = inner.current_user() else {
            // Signed out: the edit stays local.
            return;
        };
        let path = day_doc(&user.id, date);
        let store = inner.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.write_merge(&path, record.to_document()).await {
                log::error!("failed to persist day record {}: {}", path, e);
            }
        });
    }

    // --- profile actions ----------------------------------------------------

    pub fn set_profile_quote(&self, quote: &str) {
        let quote = quote.trim();
        if quote.is_empty() {
            return;
        }
        self.inner
            .profile
            .send_modify(|profile| profile.quote = quote.to_string());
        self.write_profile_field("profileQuote", quote.into());
    }

    pub fn set_profile_photo_url(&self, url: &str) {
        self.inner
            .profile
            .send_modify(|profile| profile.photo_url = Some(url.to_string()));
        self.write_profile_field("photoURL", url.into());
    }

    fn write_profile_field(&self, field: &'static str, value: serde_json::Value) {
        let Some(user) = self.inner.current_user() else { return };
        let path = user_doc(&user.id);
        let store = self.inner.store.clone();
        tokio::spawn(async move {
            let mut patch = crate::store::Document::new();
            patch.insert(field.to_string(), value);
            if let Err(e) = store.write_merge(&path, patch).await {
                log::error!("failed to persist profile field {}: {}", field, e);
            }
        });
    }

    // --- one-shot reads (monthly performance view) --------------------------

    /// Read any date's record without touching the live subscription.
    /// Absent records stay absent here; only the live feed seeds them.
    pub async fn read_day_once(&self, date: NaiveDate) -> Result<Option<DayRecord>, StoreError> {
        let Some(user) = self.inner.current_user() else {
            return Ok(None);
        };
        let doc = self.inner.store.read_once(&day_doc(&user.id, date)).await?;
        Ok(doc.map(|doc| DayRecord::from_document(&doc)))
    }

    pub async fn read_summaries_once(&self) -> Result<SummaryMap, StoreError> {
        let Some(user) = self.inner.current_user() else {
            return Ok(SummaryMap::new());
        };
        let listing = self
            .inner
            .store
            .read_collection(&days_collection(&user.id))
            .await?;
        let records: Vec<(String, DayRecord)> = listing
            .iter()
            .map(|(date, doc)| (date.clone(), DayRecord::from_document(doc)))
            .collect();
        Ok(compute_summaries(&records))
    }
}

async fn identity_loop<S: DocumentStore, A: AuthProvider>(
    inner: Weak<SessionInner<S, A>>,
    mut identity: watch::Receiver<IdentityState>,
) {
    loop {
        let state = identity.borrow_and_update().clone();
        let Some(session) = inner.upgrade() else { return };
        match &state {
            IdentityState::SignedIn(user) => session.bind(user.clone()),
            IdentityState::SignedOut => session.reset_all(),
            IdentityState::Resolving => {}
        }
        session.phase.send_replace(state);
        drop(session);
        if identity.changed().await.is_err() {
            return;
        }
    }
}

impl<S: DocumentStore, A: AuthProvider> SessionInner<S, A> {
    fn current_user(&self) -> Option<UserInfo> {
        self.binding.lock().unwrap().user.clone()
    }

    /// Subscribe the day record, summary collection, and profile of a
    /// newly authenticated identity. Re-binding the same identity is a
    /// no-op; a different identity tears the previous feeds down first.
    fn bind(self: &Arc<Self>, user: UserInfo) {
        let mut binding = self.binding.lock().unwrap();
        if binding.user.as_ref().is_some_and(|u| u.id == user.id) {
            return;
        }
        binding.clear_feeds();
        log::info!("binding session to user {}", user.id);

        self.profile.send_replace(Profile {
            photo_url: user.photo_url.clone(),
            quote: DEFAULT_QUOTE.to_string(),
        });

        let date = self.ledger.borrow().date;
        binding.day_feed = Some(self.spawn_day_feed(user.id.clone(), date));
        binding.summary_feed = Some(self.spawn_summary_feed(user.id.clone()));
        binding.profile_feed = Some(self.spawn_profile_feed(user.clone()));
        binding.user = Some(user.clone());
        drop(binding);

        self.spawn_daily_quote(user.id);
    }

    /// Drop every feed and restore defaults. Idempotent; also the
    /// mandatory logout transition so the next identity can never see
    /// the previous identity's cached state.
    fn reset_all(&self) {
        {
            let mut binding = self.binding.lock().unwrap();
            if binding.user.take().is_some() {
                log::info!("unbinding session");
            }
            binding.clear_feeds();
        }
        self.ledger.send_modify(|ledger| ledger.reset_record());
        self.summaries.send_replace(SummaryMap::new());
        self.profile.send_replace(Profile::default());
        self.daily_quote.send_replace(None);
    }

    fn spawn_day_feed(self: &Arc<Self>, user_id: String, date: NaiveDate) -> AbortOnDrop {
        let mut feed = self.store.subscribe_document(&day_doc(&user_id, date));
        let store = self.store.clone();
        let weak = Arc::downgrade(self);
        AbortOnDrop::spawn(async move {
            while let Some(push) = feed.recv().await {
                let Some(session) = weak.upgrade() else { return };
                match push {
                    Some(doc) => {
                        let record = DayRecord::from_document(&doc);
                        session.ledger.send_if_modified(|ledger| {
                            // Stale-feed guard: never apply to a different date.
                            if ledger.date != date || ledger.record() == record {
                                false
                            } else {
                                ledger.apply_remote(record);
                                true
                            }
                        });
                    }
                    None => {
                        session.ledger.send_if_modified(|ledger| {
                            if ledger.date != date {
                                return false;
                            }
                            ledger.reset_record();
                            true
                        });
                        // Seed the default record so the date exists for
                        // aggregation from now on.
                        let store = store.clone();
                        let path = day_doc(&user_id, date);
                        tokio::spawn(async move {
                            if let Err(e) = store
                                .write_merge(&path, DayRecord::default().to_document())
                                .await
                            {
                                log::error!("failed to seed day record {}: {}", path, e);
                            }
                        });
                    }
                }
            }
            log::debug!("day feed for {} ended", date);
        })
    }

    fn spawn_summary_feed(self: &Arc<Self>, user_id: String) -> AbortOnDrop {
        let mut feed = self.store.subscribe_collection(&days_collection(&user_id));
        let weak = Arc::downgrade(self);
        AbortOnDrop::spawn(async move {
            while let Some(listing) = feed.recv().await {
                let Some(session) = weak.upgrade() else { return };
                let records: Vec<(String, DayRecord)> = listing
                    .iter()
                    .map(|(date, doc)| (date.clone(), DayRecord::from_document(doc)))
                    .collect();
                session.summaries.send_replace(compute_summaries(&records));
            }
        })
    }

    fn spawn_profile_feed(self: &Arc<Self>, user: UserInfo) -> AbortOnDrop {
        let mut feed = self.store.subscribe_document(&user_doc(&user.id));
        let weak = Arc::downgrade(self);
        AbortOnDrop::spawn(async move {
            while let Some(push) = feed.recv().await {
                let Some(session) = weak.upgrade() else { return };
                // An absent profile document keeps the defaults seeded
                // at bind time.
                if let Some(doc) = push {
                    let profile = Profile::from_document(&doc, user.photo_url.as_deref());
                    session.profile.send_replace(profile);
                }
            }
        })
    }

    /// Fetch (or choose and cache) today's motivational quote.
    fn spawn_daily_quote(self: &Arc<Self>, user_id: String) {
        let store = self.store.clone();
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let today = chrono::Local::now().date_naive();
            let cache_path = daily_quote_doc(&user_id, today);
            let quote = match store.read_once(&cache_path).await {
                Ok(Some(doc)) => DailyQuote::from_document(&doc),
                Ok(None) => match store.read_collection(QUOTE_COLLECTION).await {
                    Ok(listing) => {
                        let catalog: Vec<DailyQuote> = listing
                            .iter()
                            .filter_map(|(_, doc)| DailyQuote::from_document(doc))
                            .collect();
                        match DailyQuote::pick(&catalog, today) {
                            Some(quote) => {
                                if let Err(e) = store
                                    .write_merge(
                                        &cache_path,
                                        quote.to_cache_document(&user_id, today),
                                    )
                                    .await
                                {
                                    log::error!(
                                        "failed to cache daily quote {}: {}",
                                        cache_path, e
                                    );
                                }
                                Some(quote)
                            }
                            None => None,
                        }
                    }
                    Err(e) => {
                        log::warn!("failed to load quote catalog: {}", e);
                        None
                    }
                },
                Err(e) => {
                    log::warn!("failed to read daily quote {}: {}", cache_path, e);
                    None
                }
            };
            let Some(quote) = quote else { return };
            let Some(session) = weak.upgrade() else { return };
            // Only publish if this identity is still the bound one.
            let still_bound = session
                .binding
                .lock()
                .unwrap()
                .user
                .as_ref()
                .is_some_and(|u| u.id == user_id);
            if still_bound {
                session.daily_quote.send_replace(Some(quote));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryAuth;
    use crate::core::day_record::date_key;
    use crate::store::memory::MemoryStore;
    use std::time::Duration;

    const EMAIL: &str = "mo@example.com";
    const PASSWORD: &str = "secret1";

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    async fn signed_in_session() -> (Session<MemoryStore, MemoryAuth>, MemoryStore, UserInfo) {
        let store = MemoryStore::new();
        let auth = MemoryAuth::new();
        auth.register(EMAIL, PASSWORD);
        let session = Session::with_date(store.clone(), auth, date(1));
        let user = session.login(EMAIL, PASSWORD).await.unwrap();
        let mut phase = session.watch_phase();
        wait_until(&mut phase, |p| matches!(p, IdentityState::SignedIn(_))).await;
        // Let the default record seed land before tests mutate; a later
        // seed write would otherwise race the mutation's write.
        wait_for_document(&store, &day_doc(&user.id, date(1)), |_| true).await;
        (session, store, user)
    }

    async fn wait_until<T: Clone>(
        rx: &mut watch::Receiver<T>,
        mut pred: impl FnMut(&T) -> bool,
    ) -> T {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let current = rx.borrow_and_update();
                    if pred(&current) {
                        return current.clone();
                    }
                }
                rx.changed().await.expect("watch closed");
            }
        })
        .await
        .expect("condition not reached in time")
    }

    async fn wait_for_document(
        store: &MemoryStore,
        path: &str,
        pred: impl Fn(&crate::store::Document) -> bool,
    ) -> crate::store::Document {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(doc) = store.document(path) {
                    if pred(&doc) {
                        return doc;
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("document condition not reached in time")
    }

    fn titles(record: &DayRecord, category: &str) -> Vec<String> {
        record.tasks[category].iter().map(|t| t.title.clone()).collect()
    }

    #[tokio::test]
    async fn first_login_shows_defaults_and_seeds_record() {
        let (session, store, user) = signed_in_session().await;

        let ledger = session.ledger();
        assert_eq!(ledger.categories, vec!["Category1", "Category2"]);
        assert!(ledger.tasks["Category1"].is_empty());

        // The absent record is written back so the date aggregates.
        let seeded = wait_for_document(&store, &day_doc(&user.id, date(1)), |_| true).await;
        let record = DayRecord::from_document(&seeded);
        assert_eq!(record, DayRecord::default());
    }

    #[tokio::test]
    async fn add_task_round_trip_reaches_summary() {
        let (session, _store, _user) = signed_in_session().await;

        session.add_task("Category1", "Buy milk");
        assert_eq!(titles(&session.ledger().record(), "Category1"), vec!["Buy milk"]);

        let mut summaries = session.watch_summaries();
        let map = wait_until(&mut summaries, |m| {
            m.get(&date_key(date(1))).is_some_and(|s| s.remaining == 1)
        })
        .await;
        assert!(!map[&date_key(date(1))].is_all_done);

        session.toggle_task("Category1", 0);
        wait_until(&mut summaries, |m| {
            m.get(&date_key(date(1)))
                .is_some_and(|s| s.remaining == 0 && s.is_all_done)
        })
        .await;
    }

    #[tokio::test]
    async fn writes_target_the_date_active_at_call_time() {
        let (session, store, user) = signed_in_session().await;

        session.add_task("Category1", "Buy milk");
        // Switch away immediately; the in-flight write must still land
        // on the date that was selected when add_task ran.
        session.select_date(date(2));

        let day1 = wait_for_document(&store, &day_doc(&user.id, date(1)), |doc| {
            !DayRecord::from_document(doc).tasks["Category1"].is_empty()
        })
        .await;
        assert_eq!(titles(&DayRecord::from_document(&day1), "Category1"), vec!["Buy milk"]);

        let day2 = wait_for_document(&store, &day_doc(&user.id, date(2)), |_| true).await;
        assert!(DayRecord::from_document(&day2).tasks["Category1"].is_empty());
    }

    #[tokio::test]
    async fn select_date_swaps_between_records() {
        let (session, _store, _user) = signed_in_session().await;
        let mut ledger_rx = session.watch_ledger();

        session.add_task("Category1", "Buy milk");
        session.select_date(date(2));
        // The empty date resets to defaults once its feed pushes.
        wait_until(&mut ledger_rx, |l| {
            l.date == date(2) && l.tasks["Category1"].is_empty()
        })
        .await;

        // Back to the first date: its record echoes back in.
        session.select_date(date(1));
        let ledger = wait_until(&mut ledger_rx, |l| {
            l.date == date(1) && !l.tasks["Category1"].is_empty()
        })
        .await;
        assert_eq!(ledger.tasks["Category1"][0].title, "Buy milk");
    }

    #[tokio::test]
    async fn rename_category_persists_order_position() {
        let (session, store, user) = signed_in_session().await;

        session.add_task("Category1", "A");
        session.rename_category("Category1", "Focus");
        assert_eq!(session.ledger().categories, vec!["Focus", "Category2"]);

        let doc = wait_for_document(&store, &day_doc(&user.id, date(1)), |doc| {
            DayRecord::from_document(doc).categories == vec!["Focus", "Category2"]
        })
        .await;
        let record = DayRecord::from_document(&doc);
        assert_eq!(titles(&record, "Focus"), vec!["A"]);
        assert!(!record.tasks.contains_key("Category1"));
    }

    #[tokio::test]
    async fn logout_resets_all_reactive_state() {
        let (session, _store, _user) = signed_in_session().await;

        session.add_task("Category1", "Buy milk");
        session.set_profile_quote("keep going");
        session.logout().await;

        let mut phase = session.watch_phase();
        wait_until(&mut phase, |p| *p == IdentityState::SignedOut).await;

        assert_eq!(session.ledger().record(), DayRecord::default());
        assert!(session.summaries().is_empty());
        assert_eq!(session.profile(), Profile::default());
        assert_eq!(session.daily_quote(), None);
    }

    #[tokio::test]
    async fn second_identity_never_sees_first_identitys_state() {
        let store = MemoryStore::new();
        let auth = MemoryAuth::new();
        auth.register(EMAIL, PASSWORD);
        auth.register("other@example.com", PASSWORD);
        let session = Session::with_date(store.clone(), auth, date(1));
        let mut phase = session.watch_phase();

        let first = session.login(EMAIL, PASSWORD).await.unwrap();
        wait_until(&mut phase, |p| matches!(p, IdentityState::SignedIn(_))).await;
        wait_for_document(&store, &day_doc(&first.id, date(1)), |_| true).await;
        session.add_task("Category1", "Buy milk");
        wait_for_document(&store, &day_doc(&first.id, date(1)), |doc| {
            !DayRecord::from_document(doc).tasks["Category1"].is_empty()
        })
        .await;

        session.logout().await;
        wait_until(&mut phase, |p| *p == IdentityState::SignedOut).await;

        session.login("other@example.com", PASSWORD).await.unwrap();
        wait_until(&mut phase, |p| {
            matches!(p, IdentityState::SignedIn(u) if u.email == "other@example.com")
        })
        .await;

        let mut ledger_rx = session.watch_ledger();
        let ledger = wait_until(&mut ledger_rx, |l| l.date == date(1)).await;
        assert!(ledger.tasks["Category1"].is_empty());
        let mut summaries = session.watch_summaries();
        let map = wait_until(&mut summaries, |m| !m.is_empty()).await;
        assert!(map.values().all(|s| s.remaining == 0));
    }

    #[tokio::test]
    async fn profile_quote_persists_and_echoes() {
        let (session, store, user) = signed_in_session().await;

        session.set_profile_quote("keep going");
        assert_eq!(session.profile().quote, "keep going");

        let doc = wait_for_document(&store, &user_doc(&user.id), |doc| {
            doc.get("profileQuote").is_some()
        })
        .await;
        assert_eq!(doc["profileQuote"], "keep going");

        // Blank quotes are rejected without touching state.
        session.set_profile_quote("   ");
        assert_eq!(session.profile().quote, "keep going");
    }

    #[tokio::test]
    async fn daily_quote_is_chosen_and_cached() {
        let store = MemoryStore::new();
        let mut catalog = crate::store::Document::new();
        catalog.insert("text".into(), "one step at a time".into());
        catalog.insert("author".into(), "anon".into());
        store.write_merge("quote/q1", catalog).await.unwrap();

        let auth = MemoryAuth::new();
        auth.register(EMAIL, PASSWORD);
        let session = Session::with_date(store.clone(), auth, date(1));
        let user = session.login(EMAIL, PASSWORD).await.unwrap();

        let mut quote_rx = session.watch_daily_quote();
        let quote = wait_until(&mut quote_rx, Option::is_some).await.unwrap();
        assert_eq!(quote.text, "one step at a time");

        let today = chrono::Local::now().date_naive();
        let cached = wait_for_document(&store, &daily_quote_doc(&user.id, today), |_| true).await;
        assert_eq!(cached["text"], "one step at a time");
        assert_eq!(cached["userId"], user.id.as_str());
    }

    #[tokio::test]
    async fn read_day_once_does_not_seed_absent_records() {
        let (session, store, user) = signed_in_session().await;

        assert_eq!(session.read_day_once(date(20)).await.unwrap(), None);
        assert!(store.document(&day_doc(&user.id, date(20))).is_none());

        // The live date was seeded, so summaries cover it.
        wait_for_document(&store, &day_doc(&user.id, date(1)), |_| true).await;
        let summaries = session.read_summaries_once().await.unwrap();
        assert!(summaries.contains_key(&date_key(date(1))));
    }
}
