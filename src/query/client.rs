use tokio::sync::{mpsc, watch};
use tracing::{debug, instrument};

use super::state::ListState;
use crate::error::QueryError;
use crate::messages::QueryRequest;

/// Handle to the [`QueryService`](super::QueryService) actor.
///
/// Commands return as soon as the coordinator has recorded them; the fetches
/// they cause complete later and show up in [`QueryClient::state`].
#[derive(Clone)]
pub struct QueryClient {
    sender: mpsc::Sender<QueryRequest>,
    state: watch::Receiver<ListState>,
}

impl QueryClient {
    pub(super) fn new(
        sender: mpsc::Sender<QueryRequest>,
        state: watch::Receiver<ListState>,
    ) -> Self {
        Self { sender, state }
    }

    /// Latest published list state.
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Receiver that replays the current state and then every change.
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.clone()
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), QueryError> {
        debug!("Sending request");
        self.sender
            .send(QueryRequest::Shutdown)
            .await
            .map_err(|_| QueryError::ActorCommunicationError("Actor closed".to_string()))
    }
}

client_method!(QueryClient => fn set_search(text: String) -> () as QueryRequest::SetSearch, Error = QueryError, Closed = QueryError::ActorCommunicationError);
client_method!(QueryClient => fn set_category(text: String) -> () as QueryRequest::SetCategory, Error = QueryError, Closed = QueryError::ActorCommunicationError);
client_method!(QueryClient => fn set_page_size(size: u32) -> () as QueryRequest::SetPageSize, Error = QueryError, Closed = QueryError::ActorCommunicationError);
client_method!(QueryClient => fn go_to_page(page: u32) -> () as QueryRequest::GoToPage, Error = QueryError, Closed = QueryError::ActorCommunicationError);
client_method!(QueryClient => fn refresh() -> () as QueryRequest::Refresh, Error = QueryError, Closed = QueryError::ActorCommunicationError);
client_method!(QueryClient => fn report_error(message: String) -> () as QueryRequest::ReportError, Error = QueryError, Closed = QueryError::ActorCommunicationError);
client_method!(QueryClient => fn snapshot() -> ListState as QueryRequest::Snapshot, Error = QueryError, Closed = QueryError::ActorCommunicationError);
