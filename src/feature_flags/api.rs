use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;
use url::form_urlencoded;

use crate::feature_flags::cache::{QueryCache, QuerySnapshot, QueryState};
use crate::feature_flags::constants::{DOMAIN_NAME_QUERY_PARAM, FEATURE_FLAGS_PATH};
use crate::feature_flags::error::{internal_error, invalid_payload, FlagsResult};
use crate::feature_flags::flag_set::{FeatureFlagsResult, FlagSet};
use crate::feature_flags::settings::FeatureFlagSettings;
use crate::platform::runtime::{sleep, spawn_cancellable, spawn_detached, TaskGuard};
use crate::rest::{
    ApiClient, ErrorReporter, FetchOptions, HttpMethod, HttpTransport, LogErrorReporter,
    ReportContext, ReqwestTransport,
};

/// Feature flag service context.
///
/// Build one at start-up and hand clones to consumers; clones share the API client, the
/// default snapshot and the query cache.
#[derive(Clone)]
pub struct FeatureFlags {
    inner: Arc<FeatureFlagsInner>,
}

struct FeatureFlagsInner {
    settings: FeatureFlagSettings,
    client: ApiClient,
    defaults: Arc<FeatureFlagsResult>,
    cache: QueryCache<FeatureFlagsResult>,
    watches: Mutex<HashMap<String, KeyWatch>>,
}

/// Live subscriptions for one cache key. Polling subscriptions share a single poller.
#[derive(Default)]
struct KeyWatch {
    subscribers: usize,
    pollers: usize,
    poller: Option<TaskGuard>,
}

impl FeatureFlags {
    /// Creates a service backed by `reqwest` that reports failures through `log`.
    pub fn new(settings: FeatureFlagSettings) -> FlagsResult<Self> {
        let transport = ReqwestTransport::new().map_err(|err| internal_error(err.to_string()))?;
        Ok(Self::with_transport(
            settings,
            Arc::new(transport),
            Arc::new(LogErrorReporter),
        ))
    }

    /// Same as [`FeatureFlags::new`] with [`FeatureFlagSettings::from_env`].
    pub fn from_env() -> FlagsResult<Self> {
        Self::new(FeatureFlagSettings::from_env()?)
    }

    /// Creates a service with a custom transport and error reporter.
    pub fn with_transport(
        settings: FeatureFlagSettings,
        transport: Arc<dyn HttpTransport>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let client = ApiClient::new(settings.api_base_url(), transport, reporter)
            .with_timeout(settings.fetch_timeout());
        Self {
            inner: Arc::new(FeatureFlagsInner {
                settings,
                client,
                defaults: Arc::new(FeatureFlagsResult::defaults()),
                cache: QueryCache::new(),
                watches: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn settings(&self) -> &FeatureFlagSettings {
        &self.inner.settings
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// The default snapshot served whenever remote data is unavailable.
    pub fn defaults(&self) -> Arc<FeatureFlagsResult> {
        Arc::clone(&self.inner.defaults)
    }

    /// Fetches flags for `domain_name` and merges them over the defaults.
    ///
    /// Never fails: on any error the default snapshot is returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use domain_profile_flags::feature_flags::{FeatureFlagSettings, FeatureFlags};
    ///
    /// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
    /// let flags = FeatureFlags::new(FeatureFlagSettings::default())?;
    /// let result = flags.fetch_feature_flags(Some("brad.crypto")).await;
    /// let chat = result.variations.get_bool("ecommerceServiceUsersEnableChat");
    /// println!("chat enabled: {chat:?}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_feature_flags(&self, domain_name: Option<&str>) -> FeatureFlagsResult {
        self.fetch_with(domain_name, false).await
    }

    async fn fetch_with(&self, domain_name: Option<&str>, force_refresh: bool) -> FeatureFlagsResult {
        let path = feature_flags_path(domain_name);
        let options = FetchOptions::new().with_force_refresh(force_refresh);

        match self.try_fetch(&path, options.clone()).await {
            Ok(result) => result,
            Err(err) => {
                let context = ReportContext {
                    url: self.inner.client.build_url(&path, None),
                    method: HttpMethod::Get,
                    status: None,
                    response: None,
                    options,
                };
                self.inner.client.reporter().report(&err, &context);
                (*self.inner.defaults).clone()
            }
        }
    }

    async fn try_fetch(&self, path: &str, options: FetchOptions) -> FlagsResult<FeatureFlagsResult> {
        let Some(payload) = self.inner.client.fetch_api::<JsonValue>(path, options).await else {
            return Ok((*self.inner.defaults).clone());
        };

        let JsonValue::Object(remote) = payload else {
            return Err(invalid_payload(format!(
                "expected a JSON object of flag values, got {}",
                json_type_name(&payload)
            )));
        };

        let mut set = FlagSet::defaults();
        let report = set.merge_remote(&remote);
        log::debug!(
            "merged {} remote feature flags ({} unknown, {} mismatched)",
            report.applied,
            report.unknown_keys.len(),
            report.mismatched_keys.len()
        );
        Ok(FeatureFlagsResult::from(&set))
    }

    /// Cached read accessor keyed by domain name.
    ///
    /// The first subscription for a key starts a fetch in the background. With
    /// `should_refetch` the key is refetched every poll interval until the last polling
    /// subscription for it is dropped; subscriptions on the same key share one poller.
    pub fn use_feature_flags(
        &self,
        should_refetch: bool,
        domain_name: Option<&str>,
    ) -> FeatureFlagsSubscription {
        let key = cache_key(domain_name);

        self.watch(&key, should_refetch);

        if self.inner.cache.snapshot(&key).state == QueryState::Uninitialized {
            self.spawn_resolve(key.clone());
        }

        FeatureFlagsSubscription {
            flags: self.clone(),
            key,
            polling: should_refetch,
        }
    }

    fn watch(&self, key: &str, polling: bool) {
        let mut watches = self.inner.watches.lock().unwrap();
        let watch = watches.entry(key.to_string()).or_default();
        watch.subscribers += 1;
        if polling {
            watch.pollers += 1;
            if watch.poller.is_none() {
                watch.poller = Some(self.spawn_poller(key.to_string()));
            }
        }
    }

    fn unwatch(&self, key: &str, polling: bool) {
        let mut watches = self.inner.watches.lock().unwrap();
        let Some(watch) = watches.get_mut(key) else {
            return;
        };
        watch.subscribers = watch.subscribers.saturating_sub(1);
        if polling {
            watch.pollers = watch.pollers.saturating_sub(1);
            if watch.pollers == 0 {
                watch.poller = None;
            }
        }
        if watch.subscribers == 0 {
            watches.remove(key);
        }
    }

    fn is_watched(&self, key: &str) -> bool {
        self.inner.watches.lock().unwrap().contains_key(key)
    }

    fn spawn_resolve(&self, key: String) {
        let flags = self.clone();
        spawn_detached(async move {
            flags.resolve(&key).await;
        });
    }

    fn spawn_poller(&self, key: String) -> TaskGuard {
        let flags = self.clone();
        let interval = self.inner.settings.poll_interval();
        spawn_cancellable(async move {
            loop {
                sleep(interval).await;
                flags.refresh_key(&key).await;
            }
        })
    }

    async fn resolve(&self, key: &str) -> Arc<FeatureFlagsResult> {
        self.inner
            .cache
            .get_or_fetch(key, || self.fetch_with(domain_from_key(key), false))
            .await
    }

    async fn refresh_key(&self, key: &str) -> Arc<FeatureFlagsResult> {
        self.inner
            .cache
            .refetch(key, || self.fetch_with(domain_from_key(key), true))
            .await
    }

    /// Refetches flags for `domain_name` with a forced refresh and updates the cache.
    pub async fn refresh(&self, domain_name: Option<&str>) -> Arc<FeatureFlagsResult> {
        self.refresh_key(&cache_key(domain_name)).await
    }

    pub fn query_snapshot(&self, domain_name: Option<&str>) -> QuerySnapshot<FeatureFlagsResult> {
        self.inner.cache.snapshot(&cache_key(domain_name))
    }

    /// Drops the cached flags for `domain_name`.
    ///
    /// Keys that live subscriptions still watch are fetched again in the background.
    pub fn invalidate(&self, domain_name: Option<&str>) -> bool {
        let key = cache_key(domain_name);
        let removed = self.inner.cache.invalidate(&key);
        if removed && self.is_watched(&key) {
            self.spawn_resolve(key);
        }
        removed
    }

    pub fn invalidate_all(&self) {
        self.inner.cache.clear();
        let watched: Vec<String> = self.inner.watches.lock().unwrap().keys().cloned().collect();
        for key in watched {
            self.spawn_resolve(key);
        }
    }

    #[cfg(test)]
    fn running_pollers(&self) -> usize {
        self.inner
            .watches
            .lock()
            .unwrap()
            .values()
            .filter(|watch| watch.poller.is_some())
            .count()
    }
}

impl fmt::Debug for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureFlags")
            .field("api_base_url", &self.inner.settings.api_base_url())
            .field("cached_keys", &self.inner.cache.len())
            .finish()
    }
}

/// Handle returned by [`FeatureFlags::use_feature_flags`].
///
/// Dropping the last polling subscription for a key stops its poller. Values already in
/// the cache stay there.
pub struct FeatureFlagsSubscription {
    flags: FeatureFlags,
    key: String,
    polling: bool,
}

impl FeatureFlagsSubscription {
    pub fn domain_name(&self) -> Option<&str> {
        domain_from_key(&self.key)
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Latest cached flags, or the default snapshot while nothing has resolved yet.
    pub fn current(&self) -> Arc<FeatureFlagsResult> {
        self.flags
            .inner
            .cache
            .get(&self.key)
            .unwrap_or_else(|| self.flags.defaults())
    }

    pub fn state(&self) -> QueryState {
        self.flags.inner.cache.snapshot(&self.key).state
    }

    pub fn is_loading(&self) -> bool {
        self.state() != QueryState::Ready
    }

    pub fn snapshot(&self) -> QuerySnapshot<FeatureFlagsResult> {
        self.flags.inner.cache.snapshot(&self.key)
    }

    /// Waits until the key holds a value and returns it.
    pub async fn resolved(&self) -> Arc<FeatureFlagsResult> {
        self.flags.resolve(&self.key).await
    }
}

impl Drop for FeatureFlagsSubscription {
    fn drop(&mut self) {
        self.flags.unwatch(&self.key, self.polling);
    }
}

impl fmt::Debug for FeatureFlagsSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureFlagsSubscription")
            .field("domain_name", &self.domain_name())
            .field("state", &self.state().as_str())
            .field("polling", &self.is_polling())
            .finish()
    }
}

fn cache_key(domain_name: Option<&str>) -> String {
    domain_name.unwrap_or_default().to_string()
}

fn domain_from_key(key: &str) -> Option<&str> {
    (!key.is_empty()).then_some(key)
}

fn feature_flags_path(domain_name: Option<&str>) -> String {
    match domain_name.filter(|name| !name.is_empty()) {
        Some(name) => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair(DOMAIN_NAME_QUERY_PARAM, name)
                .finish();
            format!("{FEATURE_FLAGS_PATH}?{query}")
        }
        None => FEATURE_FLAGS_PATH.to_string(),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
