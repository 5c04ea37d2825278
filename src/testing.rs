//! In-memory render client for pipeline tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::ScraperError;
use crate::ghost::{
    search_url, QueryUnit, DETAILS_SELECTOR, FEED_SELECTOR, PHONE_SELECTOR, WEBSITE_SELECTOR,
};
use crate::traits::{RenderClient, ResultEntry, Surface};

#[derive(Debug, Clone, Default)]
pub struct FakeListing {
    text: String,
    website: Option<String>,
    phone: Option<String>,
    pane: String,
    failing: bool,
}

impl FakeListing {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn with_website(mut self, href: &str) -> Self {
        self.website = Some(href.to_string());
        self
    }

    /// Accessible label of the phone button, e.g. "Phone: 555-0100".
    pub fn with_phone(mut self, label: &str) -> Self {
        self.phone = Some(label.to_string());
        self
    }

    pub fn with_pane(mut self, text: &str) -> Self {
        self.pane = text.to_string();
        self
    }

    /// Reading the listing text fails.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeFeed {
    listings: Vec<FakeListing>,
    lazy: Vec<FakeListing>,
    has_feed: bool,
    reachable: bool,
}

impl FakeFeed {
    pub fn new(listings: Vec<FakeListing>) -> Self {
        Self {
            listings,
            lazy: Vec::new(),
            has_feed: true,
            reachable: true,
        }
    }

    /// Navigation to this query fails.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(Vec::new())
        }
    }

    /// Listings that only render after the feed is scrolled.
    pub fn with_lazy(mut self, lazy: Vec<FakeListing>) -> Self {
        self.lazy = lazy;
        self
    }

    /// Listings render without a scrollable feed container.
    pub fn without_feed(mut self) -> Self {
        self.has_feed = false;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    scrolls: AtomicUsize,
}

/// Called after every scroll with the running scroll count.
pub type ScrollHook = Arc<dyn Fn(usize) -> BoxFuture<'static, ()> + Send + Sync>;

pub struct FakeClient {
    base_url: String,
    feeds: Arc<HashMap<String, FakeFeed>>,
    counters: Arc<Counters>,
    navigation_delay: Duration,
    scroll_hook: Option<ScrollHook>,
}

impl FakeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            feeds: Arc::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
            navigation_delay: Duration::ZERO,
            scroll_hook: None,
        }
    }

    pub fn with_feed(mut self, unit: &QueryUnit, feed: FakeFeed) -> Self {
        Arc::make_mut(&mut self.feeds).insert(search_url(&self.base_url, unit), feed);
        self
    }

    /// Serve `feed` at an arbitrary URL, e.g. a web search page whose
    /// listings stand in for result snippets.
    pub fn with_page(mut self, url: &str, feed: FakeFeed) -> Self {
        Arc::make_mut(&mut self.feeds).insert(url.to_string(), feed);
        self
    }

    pub fn with_scroll_hook(mut self, hook: ScrollHook) -> Self {
        self.scroll_hook = Some(hook);
        self
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.counters.max_active.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.counters.scrolls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderClient for FakeClient {
    type Surface = FakeSurface;

    async fn new_surface(&self) -> Result<FakeSurface, ScraperError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(FakeSurface {
            feeds: self.feeds.clone(),
            counters: self.counters.clone(),
            navigation_delay: self.navigation_delay,
            scroll_hook: self.scroll_hook.clone(),
            state: Arc::new(Mutex::new(PageState::default())),
            closed: AtomicBool::new(false),
        })
    }
}

#[derive(Debug, Default)]
struct PageState {
    feed: Option<FakeFeed>,
    scrolled: bool,
    selected: Option<FakeListing>,
}

pub struct FakeSurface {
    feeds: Arc<HashMap<String, FakeFeed>>,
    counters: Arc<Counters>,
    navigation_delay: Duration,
    scroll_hook: Option<ScrollHook>,
    state: Arc<Mutex<PageState>>,
    closed: AtomicBool,
}

impl FakeSurface {
    fn state(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Surface for FakeSurface {
    type Entry = FakeEntry;

    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        if !self.navigation_delay.is_zero() {
            tokio::time::sleep(self.navigation_delay).await;
        }
        let feed = self.feeds.get(url).cloned();
        if let Some(feed) = &feed {
            if !feed.reachable {
                return Err(ScraperError::Navigation(format!("{} unreachable", url)));
            }
        }
        self.state().feed = feed;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), ScraperError> {
        let found = selector == FEED_SELECTOR
            && self.state().feed.as_ref().map(|f| f.has_feed).unwrap_or(false);
        if found {
            Ok(())
        } else {
            Err(ScraperError::Timeout(selector.to_string()))
        }
    }

    async fn scroll_by(&self, _selector: &str, _distance: u32) -> Result<(), ScraperError> {
        let count = self.counters.scrolls.fetch_add(1, Ordering::SeqCst) + 1;
        self.state().scrolled = true;
        if let Some(hook) = &self.scroll_hook {
            hook(count).await;
        }
        Ok(())
    }

    async fn entries(&self, _selector: &str) -> Result<Vec<FakeEntry>, ScraperError> {
        let state = self.state();
        let Some(feed) = &state.feed else {
            return Ok(Vec::new());
        };

        let mut listings = feed.listings.clone();
        if state.scrolled {
            listings.extend(feed.lazy.iter().cloned());
        }
        Ok(listings
            .into_iter()
            .map(|listing| FakeEntry {
                listing,
                page: self.state.clone(),
            })
            .collect())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError> {
        if selector == PHONE_SELECTOR && name == "aria-label" {
            return Ok(self.state().selected.as_ref().and_then(|l| l.phone.clone()));
        }
        Ok(None)
    }

    async fn text(&self, selector: &str) -> Result<String, ScraperError> {
        match (selector, &self.state().selected) {
            (DETAILS_SELECTOR, Some(listing)) => Ok(listing.pane.clone()),
            _ => Err(ScraperError::ElementNotFound(selector.to_string())),
        }
    }

    async fn click(&self, _selector: &str) -> Result<bool, ScraperError> {
        Ok(false)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError> {
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<(), ScraperError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.counters.active.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub struct FakeEntry {
    listing: FakeListing,
    page: Arc<Mutex<PageState>>,
}

#[async_trait]
impl ResultEntry for FakeEntry {
    async fn text(&self) -> Result<String, ScraperError> {
        if self.listing.failing {
            return Err(ScraperError::JavaScript("stale element".into()));
        }
        Ok(self.listing.text.clone())
    }

    async fn count(&self, selector: &str) -> Result<usize, ScraperError> {
        Ok(usize::from(selector == WEBSITE_SELECTOR && self.listing.website.is_some()))
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError> {
        if selector == WEBSITE_SELECTOR && name == "href" {
            return Ok(self.listing.website.clone());
        }
        Ok(None)
    }

    async fn click(&self) -> Result<(), ScraperError> {
        self.page.lock().unwrap().selected = Some(self.listing.clone());
        Ok(())
    }
}
