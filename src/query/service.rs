use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use super::client::QueryClient;
use super::state::{FetchRequest, ListState};
use crate::api::InventoryApi;
use crate::error::QueryError;
use crate::messages::{FetchOutcome, QueryRequest, ServiceResponse};

/// Message shown when a listing fetch fails without a server message.
pub const LOAD_FAILED: &str = "Failed to load products";

/// Owner of the listing criteria, the page cursor and the visible page.
///
/// All state lives in this one task. Commands, fetch completions and the
/// debounce timer are multiplexed in [`QueryService::run`], so each state
/// change and each arbitration check happens within a single turn.
///
/// Arbitration is by sequence number: every fetch gets the next number, and a
/// completion only touches the visible state when it carries the latest
/// number issued. Superseded fetches are never aborted; their results are
/// dropped on arrival.
pub struct QueryService {
    receiver: mpsc::Receiver<QueryRequest>,
    completions_tx: mpsc::UnboundedSender<FetchOutcome>,
    completions: mpsc::UnboundedReceiver<FetchOutcome>,
    api: Arc<dyn InventoryApi>,
    debounce: Duration,
    debounce_deadline: Option<Instant>,
    sequence: u64,
    /// Fetch whose page is displayed or about to be.
    in_effect: Option<FetchRequest>,
    last_accepted: Option<FetchRequest>,
    view: ListState,
    state: watch::Sender<ListState>,
}

impl QueryService {
    pub fn new(
        buffer_size: usize,
        api: Arc<dyn InventoryApi>,
        debounce: Duration,
        page_size: u32,
    ) -> (Self, QueryClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let view = ListState::new(page_size.max(1));
        let (state, state_rx) = watch::channel(view.clone());

        let service = Self {
            receiver,
            completions_tx,
            completions,
            api,
            debounce,
            debounce_deadline: None,
            sequence: 0,
            in_effect: None,
            last_accepted: None,
            view,
            state,
        };
        let client = QueryClient::new(sender, state_rx);
        (service, client)
    }

    #[instrument(name = "query_service", skip(self))]
    pub async fn run(mut self) {
        info!("QueryService starting");

        loop {
            let deadline = self.debounce_deadline;
            tokio::select! {
                biased;

                Some(outcome) = self.completions.recv() => {
                    self.handle_fetch_outcome(outcome);
                }
                msg = self.receiver.recv() => match msg {
                    Some(QueryRequest::Shutdown) | None => {
                        info!("QueryService shutting down");
                        break;
                    }
                    Some(msg) => self.handle_request(msg),
                },
                () = sleep_until(deadline) => {
                    self.handle_debounce_elapsed();
                }
            }
            self.publish();
        }

        info!("QueryService stopped");
    }

    fn handle_request(&mut self, msg: QueryRequest) {
        match msg {
            QueryRequest::SetSearch { text, respond_to } => {
                self.view.criteria.search = text;
                self.arm_debounce();
                self.ack(respond_to);
            }
            QueryRequest::SetCategory { text, respond_to } => {
                self.view.criteria.category = text;
                self.arm_debounce();
                self.ack(respond_to);
            }
            QueryRequest::SetPageSize { size, respond_to } => {
                self.handle_set_page_size(size, respond_to);
            }
            QueryRequest::GoToPage { page, respond_to } => {
                debug!(page, "Processing go_to_page request");
                self.view.page_number = page;
                self.issue();
                self.ack(respond_to);
            }
            QueryRequest::Refresh { respond_to } => {
                debug!("Processing refresh request");
                self.issue();
                self.ack(respond_to);
            }
            QueryRequest::ReportError { message, respond_to } => {
                warn!(error = %message, "Operation failed");
                self.view.error = Some(message);
                self.ack(respond_to);
            }
            QueryRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(Ok(self.view.clone()));
            }
            QueryRequest::Shutdown => {}
        }
    }

    /// Search and category edits move back to the first page and restart the
    /// quiescence window shared by both fields.
    fn arm_debounce(&mut self) {
        self.view.page_number = 0;
        self.debounce_deadline = Some(Instant::now() + self.debounce);
        debug!(
            search = %self.view.criteria.search,
            category = %self.view.criteria.category,
            "Criteria edited; debounce armed"
        );
    }

    fn handle_set_page_size(&mut self, size: u32, respond_to: ServiceResponse<(), QueryError>) {
        if size == 0 {
            let _ = respond_to.send(Err(QueryError::InvalidPageSize(size)));
            return;
        }
        debug!(size, "Processing set_page_size request");
        self.view.criteria.page_size = size;
        // The cursor reset must precede the fetch so the request reads page 0.
        self.view.page_number = 0;
        self.issue();
        self.ack(respond_to);
    }

    fn handle_debounce_elapsed(&mut self) {
        self.debounce_deadline = None;
        let unchanged = self
            .in_effect
            .as_ref()
            .is_some_and(|req| req.targets(&self.view.criteria, self.view.page_number));
        if unchanged {
            debug!("Criteria match the page in effect; fetch suppressed");
            return;
        }
        self.issue();
    }

    /// Issues a fetch for the current criteria and cursor.
    ///
    /// An immediate fetch already reflects every pending edit, so it also
    /// disarms the debounce.
    fn issue(&mut self) {
        self.debounce_deadline = None;
        self.sequence += 1;
        let request = FetchRequest {
            sequence: self.sequence,
            criteria: self.view.criteria.clone(),
            page_number: self.view.page_number,
        };

        self.view.issued = request.sequence;
        self.view.loading = true;
        self.view.error = None;
        self.in_effect = Some(request.clone());

        info!(
            sequence = request.sequence,
            page = request.page_number,
            size = request.criteria.page_size,
            "Issuing fetch"
        );

        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();
        let span = info_span!("fetch", sequence = request.sequence);
        tokio::spawn(
            async move {
                let result = api.list_products(request.query()).await;
                // The coordinator may have stopped; nothing is waiting then.
                let _ = completions.send(FetchOutcome { request, result });
            }
            .instrument(span),
        );
    }

    #[instrument(
        fields(sequence = outcome.request.sequence, latest = self.sequence),
        skip(self, outcome)
    )]
    fn handle_fetch_outcome(&mut self, outcome: FetchOutcome) {
        let FetchOutcome { request, result } = outcome;

        if request.sequence != self.sequence {
            self.view.discarded += 1;
            debug!("Discarding superseded response");
            return;
        }

        self.view.loading = false;
        match result {
            Ok(page) if page.is_empty() && request.page_number > 0 => {
                if self.debounce_deadline.is_some() {
                    // A pending edit will fetch page 0 with the new criteria.
                    debug!("Empty page while an edit is pending; waiting for it");
                    self.in_effect = self.last_accepted.clone();
                    return;
                }
                let fallback = (request.page_number - 1).min(page.total_pages.saturating_sub(1));
                info!(
                    from = request.page_number,
                    to = fallback,
                    "Page no longer exists; stepping back"
                );
                self.view.page_number = fallback;
                self.issue();
            }
            Ok(page) => {
                info!(
                    items = page.content.len(),
                    total = page.total_elements,
                    "Page accepted"
                );
                self.view.page = Some(page);
                self.view.accepted = request.sequence;
                self.view.error = None;
                self.last_accepted = Some(request);
            }
            Err(e) => {
                warn!(error = %e, "Fetch failed; keeping previous page");
                self.view.error = Some(e.user_message(LOAD_FAILED));
                self.in_effect = self.last_accepted.clone();
            }
        }
    }

    /// Publishes the new state before confirming, so a caller that awaited the
    /// command always observes its effect.
    fn ack(&self, respond_to: ServiceResponse<(), QueryError>) {
        self.publish();
        let _ = respond_to.send(Ok(()));
    }

    fn publish(&self) {
        self.state.send_if_modified(|current| {
            if *current == self.view {
                false
            } else {
                *current = self.view.clone();
                true
            }
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::mock_framework::{create_mock_api, expect_list, page_of, ApiCall};
    use tokio::time::timeout;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn start() -> (QueryClient, mpsc::Receiver<ApiCall>) {
        let (api, calls) = create_mock_api(16);
        let (service, client) = QueryService::new(16, Arc::new(api), DEBOUNCE, 10);
        tokio::spawn(service.run());
        (client, calls)
    }

    async fn settle(client: &QueryClient, done: impl FnMut(&ListState) -> bool) -> ListState {
        client.subscribe().wait_for(done).await.unwrap().clone()
    }

    async fn assert_no_call(calls: &mut mpsc::Receiver<ApiCall>) {
        let next = timeout(Duration::from_secs(5), calls.recv()).await;
        assert!(next.is_err(), "unexpected call: {:?}", next);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_edits_collapse_into_one_fetch() {
        let (client, mut calls) = start();

        client.set_search("a".into()).await.unwrap();
        client.set_search("ab".into()).await.unwrap();
        client.set_category("x".into()).await.unwrap();

        let (query, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        assert_eq!(query.search.as_deref(), Some("ab"));
        assert_eq!(query.category.as_deref(), Some("x"));
        assert_eq!(query.page, 0);
        responder.send(Ok(page_of(&["Abacus"], 0, 10, 1))).unwrap();

        assert_no_call(&mut calls).await;
        let state = settle(&client, |s| s.accepted == 1).await;
        assert_eq!(state.products()[0].name, "Abacus");
    }

    #[tokio::test(start_paused = true)]
    async fn criteria_edit_returns_to_the_first_page() {
        let (client, mut calls) = start();

        client.go_to_page(3).await.unwrap();
        let (query, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        assert_eq!(query.page, 3);
        responder.send(Ok(page_of(&["Desk Lamp"], 3, 10, 31))).unwrap();
        settle(&client, |s| s.accepted == 1).await;

        client.set_category("home".into()).await.unwrap();
        assert_eq!(client.state().page_number, 0);

        let (query, _responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        assert_eq!(query.page, 0);
        assert_eq!(query.category.as_deref(), Some("home"));
    }

    #[tokio::test(start_paused = true)]
    async fn each_edit_restarts_the_window() {
        let (client, mut calls) = start();

        client.set_search("l".into()).await.unwrap();
        tokio::time::advance(Duration::from_millis(250)).await;
        client.set_search("la".into()).await.unwrap();
        tokio::time::advance(Duration::from_millis(250)).await;
        tokio::task::yield_now().await;
        assert!(calls.try_recv().is_err(), "fetch issued before the window elapsed");

        let (query, _responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        assert_eq!(query.search.as_deref(), Some("la"));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_back_to_displayed_criteria_is_suppressed() {
        let (client, mut calls) = start();

        client.set_search("lamp".into()).await.unwrap();
        let (_, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        responder.send(Ok(page_of(&["Lamp"], 0, 10, 1))).unwrap();
        settle(&client, |s| s.accepted == 1).await;

        client.set_search("lam".into()).await.unwrap();
        client.set_search("lamp".into()).await.unwrap();
        assert_no_call(&mut calls).await;
        assert_eq!(client.snapshot().await.unwrap().issued, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn issue_order_wins_over_arrival_order() {
        let (client, mut calls) = start();

        client.go_to_page(1).await.unwrap();
        let (first, first_responder) = expect_list(&mut calls).await.expect("Expected first fetch");
        client.go_to_page(2).await.unwrap();
        let (second, second_responder) =
            expect_list(&mut calls).await.expect("Expected second fetch");
        assert_eq!((first.page, second.page), (1, 2));

        second_responder.send(Ok(page_of(&["Second"], 2, 10, 25))).unwrap();
        settle(&client, |s| s.accepted == 2).await;

        first_responder.send(Ok(page_of(&["First"], 1, 10, 25))).unwrap();
        let state = settle(&client, |s| s.discarded == 1).await;

        assert_eq!(state.accepted, 2);
        assert_eq!(state.page_number, 2);
        assert_eq!(state.products()[0].name, "Second");
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failure_does_not_touch_state() {
        let (client, mut calls) = start();

        client.refresh().await.unwrap();
        let (_, stale) = expect_list(&mut calls).await.expect("Expected first fetch");
        client.refresh().await.unwrap();
        let (_, latest) = expect_list(&mut calls).await.expect("Expected second fetch");

        stale.send(Err(ApiError::Timeout)).unwrap();
        settle(&client, |s| s.discarded == 1).await;
        latest.send(Ok(page_of(&["Fresh"], 0, 10, 1))).unwrap();

        let state = settle(&client, |s| s.accepted == 2).await;
        assert_eq!(state.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn page_size_change_fetches_first_page() {
        let (client, mut calls) = start();

        client.go_to_page(3).await.unwrap();
        let (_, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        responder.send(Ok(page_of(&["Deep"], 3, 10, 40))).unwrap();
        settle(&client, |s| s.accepted == 1).await;

        client.set_page_size(25).await.unwrap();
        let (query, _) = expect_list(&mut calls).await.expect("Expected ListProducts");
        assert_eq!((query.page, query.size), (0, 25));
        assert_eq!(client.state().page_number, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_page_size_is_rejected() {
        let (client, mut calls) = start();
        assert_eq!(client.set_page_size(0).await, Err(QueryError::InvalidPageSize(0)));
        assert_no_call(&mut calls).await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_page() {
        let (client, mut calls) = start();

        client.refresh().await.unwrap();
        let (_, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        responder.send(Ok(page_of(&["Kept"], 0, 10, 1))).unwrap();
        settle(&client, |s| s.accepted == 1).await;

        client.refresh().await.unwrap();
        let (_, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        responder.send(Err(ApiError::rejected(500, "Internal server error"))).unwrap();

        let state = settle(&client, |s| s.error.is_some()).await;
        assert_eq!(state.error.as_deref(), Some("Internal server error"));
        assert_eq!(state.products()[0].name, "Kept");
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn first_load_failure_shows_error_without_page() {
        let (client, mut calls) = start();

        client.refresh().await.unwrap();
        let (_, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        responder.send(Err(ApiError::Timeout)).unwrap();

        let state = settle(&client, |s| s.error.is_some()).await;
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED));
        assert!(state.page.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn emptied_page_steps_back() {
        let (client, mut calls) = start();

        client.go_to_page(1).await.unwrap();
        let (_, responder) = expect_list(&mut calls).await.expect("Expected ListProducts");
        responder.send(Ok(page_of(&["Last one"], 1, 10, 11))).unwrap();
        settle(&client, |s| s.accepted == 1).await;

        // the only item on page 1 was deleted elsewhere
        client.refresh().await.unwrap();
        let (query, responder) = expect_list(&mut calls).await.expect("Expected refresh");
        assert_eq!(query.page, 1);
        responder.send(Ok(page_of(&[], 1, 10, 10))).unwrap();

        let (query, responder) = expect_list(&mut calls).await.expect("Expected step back");
        assert_eq!(query.page, 0);
        responder.send(Ok(page_of(&["a", "b"], 0, 10, 10))).unwrap();

        let state = settle(&client, |s| s.accepted == 3).await;
        assert_eq!(state.page_number, 0);
        assert_eq!(state.page_indices(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn reported_errors_are_visible() {
        let (client, _calls) = start();
        client.report_error("Failed to delete product".into()).await.unwrap();
        assert_eq!(client.state().error.as_deref(), Some("Failed to delete product"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_the_mailbox() {
        let (client, _calls) = start();
        client.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        assert!(client.refresh().await.is_err());
    }
}
