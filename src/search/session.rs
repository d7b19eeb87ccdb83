//! Paginated search session.
//!
//! ```text
//!   Idle --start(non-empty, token)--> Active --extend(new token)--> Active
//!    |  \--start(non-empty, no token)--> Exhausted <--extend(empty | no token | same token)--/
//!    \--start(empty)--> Idle
//! ```
//!
//! Results only grow, in server arrival order. A failed request leaves the
//! session exactly as it was.

use serde_json::Value;
use tracing::{debug, info};

use super::page::Page;
use super::query::QueryParams;
use crate::api::{ApiError, Transport};
use crate::models::Record;

/// Where a session is in its continuation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing loaded: not started, or the search found nothing.
    Idle,
    /// Results loaded and a continuation token is held.
    Active,
    /// Results loaded and no further pages will be requested.
    Exhausted,
}

/// Result of a `start` or `extend` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    /// Records added by this call.
    pub received: usize,
    /// State after the call.
    pub state: SessionState,
}

/// Accumulated results of one search.
#[derive(Debug, Clone)]
pub struct SearchSession {
    query: QueryParams,
    state: SessionState,
    results: Vec<Record>,
    token: Option<String>,
    pages: usize,
}

impl SearchSession {
    pub fn new(query: QueryParams) -> Self {
        Self {
            query,
            state: SessionState::Idle,
            results: Vec::new(),
            token: None,
            pages: 0,
        }
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn results(&self) -> &[Record] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Record> {
        self.results
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Number of non-empty pages accumulated.
    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn can_extend(&self) -> bool {
        self.state == SessionState::Active && self.token.is_some()
    }

    /// Drop results and token, returning to `Idle` with the same query.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.results.clear();
        self.token = None;
        self.pages = 0;
    }

    async fn fetch_page<T: Transport + ?Sized>(
        &self,
        api: &T,
        token: Option<&str>,
    ) -> Result<Page, ApiError> {
        let request = match token {
            Some(token) => self.query.continuation_request(token),
            None => self.query.initial_request(),
        };
        let body: Value = api.send(request).await?.into_json()?;
        Page::parse(self.query.record_kind(), self.query.results_key(), body)
    }

    /// Issue the initial request. Only valid from `Idle`.
    pub async fn start<T: Transport + ?Sized>(&mut self, api: &T) -> Result<PageOutcome, ApiError> {
        if self.state != SessionState::Idle {
            return Err(ApiError::precondition(
                "search already started; reset it or start a new search",
            ));
        }

        let page = self.fetch_page(api, None).await?;
        if page.is_empty() {
            info!("{} search found nothing", self.query.name());
            return Ok(PageOutcome {
                received: 0,
                state: self.state,
            });
        }

        let received = page.records.len();
        self.results = page.records;
        self.pages = 1;
        self.token = page.token;
        self.state = if self.token.is_some() {
            SessionState::Active
        } else {
            SessionState::Exhausted
        };

        info!(
            "{} search returned {} records (more: {})",
            self.query.name(),
            received,
            self.token.is_some()
        );
        Ok(PageOutcome {
            received,
            state: self.state,
        })
    }

    /// Request the next page with the stored token and append it.
    pub async fn extend<T: Transport + ?Sized>(&mut self, api: &T) -> Result<PageOutcome, ApiError> {
        let token = match (self.state, &self.token) {
            (SessionState::Active, Some(token)) => token.clone(),
            (SessionState::Idle, _) => {
                return Err(ApiError::precondition("no search has been started"))
            }
            _ => return Err(ApiError::precondition("search has no more results")),
        };

        let page = self.fetch_page(api, Some(&token)).await?;

        if page.is_empty() {
            // A token with no progress must not keep the session polling.
            self.token = None;
            self.state = SessionState::Exhausted;
            info!("{} search exhausted", self.query.name());
            return Ok(PageOutcome {
                received: 0,
                state: self.state,
            });
        }

        let received = page.records.len();
        self.results.extend(page.records);
        self.pages += 1;

        match page.token {
            Some(next) if next != token => self.token = Some(next),
            _ => {
                self.token = None;
                self.state = SessionState::Exhausted;
            }
        }

        debug!(
            "Extended {} search by {} records ({} total)",
            self.query.name(),
            received,
            self.results.len()
        );
        Ok(PageOutcome {
            received,
            state: self.state,
        })
    }

    /// Start (if idle) and keep extending until `max_pages` pages are held
    /// or the search is exhausted. Stops at the first failure, keeping
    /// whatever was already accumulated.
    pub async fn fetch_pages<T: Transport + ?Sized>(
        &mut self,
        api: &T,
        max_pages: usize,
    ) -> Result<SessionState, ApiError> {
        if self.state == SessionState::Idle {
            let outcome = self.start(api).await?;
            if outcome.state == SessionState::Idle {
                return Ok(SessionState::Idle);
            }
        }
        while self.can_extend() && self.pages < max_pages {
            self.extend(api).await?;
        }
        Ok(self.state)
    }
}
