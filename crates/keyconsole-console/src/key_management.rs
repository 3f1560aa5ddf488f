//! Key-management view-model
//!
//! Holds everything the key table shows: the current page of keys, paging
//! and filter state, the row selection and the create form. Actions report
//! their outcome through the [`Notifier`] and never return errors.
//!
//! List loads are numbered. A load that completes after a newer one was
//! started is dropped, so a slow response for old parameters can never
//! overwrite the rows of the current ones.

use crate::clipboard::Clipboard;
use crate::key_table::KeyRow;
use crate::notifications::{Notification, Notifier};
use crate::pagination::PageState;
use crate::selection::{HeaderCheckbox, Selection};
use keyconsole_client::queries::scope;
use keyconsole_client::{BatchOutcome, BatchStatus, ClientError, ClientResult, KeyConsoleClient};
use keyconsole_core::types::MAX_KEYS_PER_REQUEST;
use keyconsole_core::{
    ApiKey, ConsoleConfig, CreateKeysRequest, Item, KeyId, ListKeysParams, PaginatedResult, User,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Notification texts
pub mod messages {
    /// Key list could not be loaded
    pub const LOAD_FAILED: &str = "Failed to load API keys";
    /// Current user, users or items could not be loaded
    pub const CONTEXT_FAILED: &str = "Failed to load account data";
    /// Create failed
    pub const CREATE_FAILED: &str = "Create failed";
    /// Single delete succeeded
    pub const DELETED: &str = "Deleted";
    /// Delete failed
    pub const DELETE_FAILED: &str = "Delete failed";
    /// Single toggle succeeded
    pub const STATUS_UPDATED: &str = "Status updated";
    /// Single toggle failed
    pub const STATUS_UPDATE_FAILED: &str = "Status update failed";
    /// Every constituent of a batch toggle failed
    pub const OPERATION_FAILED: &str = "Operation failed";
    /// Copy succeeded
    pub const COPIED: &str = "Copied";
    /// Copy failed
    pub const COPY_FAILED: &str = "Copy failed, please copy manually";
    /// Key id not on the current page
    pub const KEY_NOT_ON_PAGE: &str = "Key is not on the current page";
    /// A toggled key did not end up in the requested state
    pub const STATE_NOT_REACHED: &str = "Key did not reach the requested state";
}

/// How a multi-key delete is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteStrategy {
    /// One request to the batch endpoint
    #[default]
    BatchEndpoint,
    /// One request per key, all in flight at once
    Parallel,
}

/// A started list load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    params: ListKeysParams,
}

impl LoadTicket {
    /// Parameters the load was started with
    pub const fn params(&self) -> &ListKeysParams {
        &self.params
    }

    /// Load number
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// State and actions of the key-management screen
#[derive(Debug)]
pub struct KeyManagementView {
    client: KeyConsoleClient,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn Clipboard>,
    notification_duration: Duration,

    pages: PageState,
    user_filter: Option<Uuid>,
    selection: Selection,
    create_count: u32,
    create_item: Option<Uuid>,

    keys: Vec<ApiKey>,
    users: Vec<User>,
    items: Vec<Item>,
    current_user: Option<User>,

    generation: u64,
    loaded_generation: Option<u64>,
}

impl KeyManagementView {
    /// Create the view; nothing is loaded until [`Self::load_context`] or [`Self::refresh`]
    pub fn new(
        client: KeyConsoleClient,
        notifier: Arc<dyn Notifier>,
        clipboard: Arc<dyn Clipboard>,
        config: &ConsoleConfig,
    ) -> Self {
        Self {
            client,
            notifier,
            clipboard,
            notification_duration: Duration::from_millis(config.notification_duration_ms),
            pages: PageState::from_config(config),
            user_filter: None,
            selection: Selection::new(),
            create_count: 1,
            create_item: None,
            keys: Vec::new(),
            users: Vec::new(),
            items: Vec::new(),
            current_user: None,
            generation: 0,
            loaded_generation: None,
        }
    }

    fn notify(&self, notification: Notification) {
        self.notifier
            .notify(notification.with_duration(self.notification_duration));
    }

    fn notify_error(&self, title: &str, err: &ClientError) {
        self.notify(Notification::error(title).with_description(err.to_string()));
    }

    /// Keys of the current page, in server order
    pub fn keys(&self) -> &[ApiKey] {
        &self.keys
    }

    /// Formatted rows of the current page
    pub fn rows(&self) -> Vec<KeyRow> {
        self.keys
            .iter()
            .map(|key| KeyRow::new(key, self.selection.contains(&key.id)))
            .collect()
    }

    /// Paging state
    pub const fn pages(&self) -> &PageState {
        &self.pages
    }

    /// Row selection
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Logged-in user, once loaded
    pub const fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Whether the admin-only controls are shown
    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|user| user.is_superuser)
    }

    /// Users offered by the user filter; empty unless admin
    pub fn users(&self) -> &[User] {
        if self.is_admin() { &self.users } else { &[] }
    }

    /// Items offered by the create form
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Active user filter
    pub fn user_filter(&self) -> Option<Uuid> {
        self.user_filter.filter(|_| self.is_admin())
    }

    /// Count entered in the create form
    pub const fn create_count(&self) -> u32 {
        self.create_count
    }

    /// Item chosen in the create form
    pub const fn create_item(&self) -> Option<Uuid> {
        self.create_item
    }

    /// Ids of the rows on the current page
    pub fn page_ids(&self) -> Vec<KeyId> {
        self.keys.iter().map(|key| key.id).collect()
    }

    /// State of the header checkbox
    pub fn header_checkbox(&self) -> HeaderCheckbox {
        self.selection.header_state(&self.page_ids())
    }

    /// Whether the batch buttons are shown
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Parameters the next list load will use
    pub fn list_params(&self) -> ListKeysParams {
        ListKeysParams {
            page: self.pages.page(),
            page_size: self.pages.page_size(),
            user_id: self.user_filter(),
        }
    }

    /// Set the create count, clamped to what the server accepts
    pub fn set_create_count(&mut self, count: u32) {
        self.create_count = count.clamp(1, MAX_KEYS_PER_REQUEST);
    }

    /// Bind new keys to `item`, or to nothing
    pub const fn set_create_item(&mut self, item: Option<Uuid>) {
        self.create_item = item;
    }

    /// Filter by owner and return to page 1; ignored for non-admins
    pub fn set_user_filter(&mut self, user: Option<Uuid>) -> bool {
        if !self.is_admin() {
            debug!("user filter ignored for non-admin");
            return false;
        }
        self.user_filter = user;
        self.pages.reset();
        true
    }

    /// Change rows per page and return to page 1
    pub fn set_page_size(&mut self, page_size: u32) {
        self.pages.set_page_size(page_size);
    }

    /// Jump to `page`
    pub fn go_to_page(&mut self, page: u32) {
        self.pages.go_to(page);
    }

    /// Advance one page when the "next" control is enabled
    pub fn next_page(&mut self) -> bool {
        self.pages.next()
    }

    /// Go back one page when the "previous" control is enabled
    pub fn prev_page(&mut self) -> bool {
        self.pages.prev()
    }

    /// Row checkbox
    pub fn toggle_row(&mut self, id: KeyId) {
        self.selection.toggle(id);
    }

    /// Header checkbox
    pub fn select_all(&mut self, checked: bool) {
        let ids = self.page_ids();
        self.selection.select_all(checked, &ids);
    }

    /// Start a list load with the current parameters
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
            params: self.list_params(),
        }
    }

    /// Apply the result of a load; returns `false` when a newer load superseded it
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: ClientResult<PaginatedResult<ApiKey>>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                latest = self.generation,
                "discarding superseded key list"
            );
            return false;
        }

        match result {
            Ok(page) => {
                self.pages.apply(page.pagination);
                self.keys = page.data;
                self.loaded_generation = Some(ticket.generation);
            }
            Err(err) => self.notify_error(messages::LOAD_FAILED, &err),
        }
        true
    }

    /// Whether the rows reflect the latest started load
    pub fn is_current(&self) -> bool {
        self.loaded_generation == Some(self.generation)
    }

    /// Load the current page
    pub async fn refresh(&mut self) {
        let ticket = self.begin_load();
        let result = self.client.keys().list(ticket.params()).await;
        self.finish_load(ticket, result);
    }

    /// Names of invalidated cache scopes, for front-ends that reload on change
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.client.cache().subscribe()
    }

    /// Reload when `scope` covers the key list; returns whether a reload ran
    pub async fn on_invalidated(&mut self, invalidated: &str) -> bool {
        if invalidated != scope::API_KEYS {
            return false;
        }
        self.refresh().await;
        true
    }

    /// Load the current user, then the user list (admins only) and the items
    pub async fn load_context(&mut self) {
        match self.client.users().me().await {
            Ok(user) => self.current_user = Some(user),
            Err(err) => {
                self.notify_error(messages::CONTEXT_FAILED, &err);
                return;
            }
        }

        if self.is_admin() {
            match self.client.users().list().await {
                Ok(users) => self.users = users,
                Err(err) => self.notify_error(messages::CONTEXT_FAILED, &err),
            }
        }

        match self.client.items().list().await {
            Ok(items) => self.items = items,
            Err(err) => self.notify_error(messages::CONTEXT_FAILED, &err),
        }
    }

    /// Create keys from the form; the list refreshes on success
    pub async fn create(&mut self) {
        let request = CreateKeysRequest::new(self.create_count).with_item(self.create_item);
        match self.client.keys().create(&request).await {
            Ok(created) => {
                info!(count = created.data.len(), "keys created from console");
                self.notify(Notification::success(format!(
                    "Created {} keys",
                    request.count
                )));
                self.refresh().await;
            }
            Err(err) => self.notify_error(messages::CREATE_FAILED, &err),
        }
    }

    /// Delete one key
    pub async fn delete(&mut self, id: KeyId) {
        match self.client.keys().delete(id).await {
            Ok(()) => {
                self.selection.remove_all(&[id]);
                self.notify(Notification::success(messages::DELETED));
                self.refresh().await;
            }
            Err(err) => self.notify_error(messages::DELETE_FAILED, &err),
        }
    }

    /// Flip one key's active flag
    pub async fn toggle(&mut self, id: KeyId) {
        match self.client.keys().toggle(id).await {
            Ok(_) => {
                self.notify(Notification::success(messages::STATUS_UPDATED));
                self.refresh().await;
            }
            Err(err) => self.notify_error(messages::STATUS_UPDATE_FAILED, &err),
        }
    }

    /// Delete every selected key
    pub async fn delete_selected(&mut self, strategy: DeleteStrategy) {
        let ids = self.selection.ids();
        if ids.is_empty() {
            return;
        }

        match strategy {
            DeleteStrategy::BatchEndpoint => {
                match self.client.keys().delete_batch(&ids).await {
                    Ok(_) => {
                        self.selection.clear();
                        self.notify(Notification::success(format!("Deleted {} keys", ids.len())));
                    }
                    Err(err) => {
                        self.notify_error(messages::DELETE_FAILED, &err);
                        return;
                    }
                }
            }
            DeleteStrategy::Parallel => {
                let outcome = self.client.keys().delete_each(&ids).await;
                self.report_batch(&outcome, "Deleted", messages::DELETE_FAILED);
                if !outcome.any_succeeded() {
                    return;
                }
            }
        }
        self.refresh().await;
    }

    /// Enable or disable every selected key
    ///
    /// Keys on the current page that are already in the requested state are
    /// skipped. Selected keys from other pages are toggled, and toggled a
    /// second time when the server reports them in the opposite state.
    pub async fn set_selected_active(&mut self, active: bool) {
        let selected = self.selection.ids();
        if selected.is_empty() {
            return;
        }

        let targets: Vec<KeyId> = selected
            .into_iter()
            .filter(|id| {
                self.keys
                    .iter()
                    .find(|key| key.id == *id)
                    .is_none_or(|key| key.is_active != active)
            })
            .collect();

        let verb = if active { "Enabled" } else { "Disabled" };
        if targets.is_empty() {
            self.selection.clear();
            self.notify(Notification::success(format!("{verb} 0 keys")));
            return;
        }

        let toggled = self.client.keys().toggle_each(&targets).await;
        let outcome = self.settle(toggled, active).await;
        self.report_batch(&outcome, verb, messages::OPERATION_FAILED);
        if outcome.any_succeeded() {
            self.refresh().await;
        }
    }

    /// Toggle back keys the server reports in the wrong state
    ///
    /// Only keys whose returned record matches `active` count as succeeded.
    async fn settle(&self, outcome: BatchOutcome<ApiKey>, active: bool) -> BatchOutcome<ApiKey> {
        let (mut succeeded, flipped): (Vec<_>, Vec<_>) = outcome
            .succeeded
            .into_iter()
            .partition(|(_, key)| key.is_active == active);
        let mut failed = outcome.failed;
        if flipped.is_empty() {
            return BatchOutcome { succeeded, failed };
        }

        let ids: Vec<KeyId> = flipped.iter().map(|(id, _)| *id).collect();
        debug!(count = ids.len(), active, "keys flipped away from the target, toggling again");
        let retried = self.client.keys().toggle_each(&ids).await;
        for (id, key) in retried.succeeded {
            if key.is_active == active {
                succeeded.push((id, key));
            } else {
                failed.push((id, ClientError::unexpected(messages::STATE_NOT_REACHED)));
            }
        }
        failed.extend(retried.failed);
        BatchOutcome { succeeded, failed }
    }

    fn report_batch<T>(&mut self, outcome: &BatchOutcome<T>, verb: &str, failed_title: &str) {
        let description = outcome.first_error().map(ToString::to_string);
        match outcome.status() {
            BatchStatus::Empty => {}
            BatchStatus::Succeeded => {
                self.selection.clear();
                self.notify(Notification::success(format!(
                    "{verb} {} keys",
                    outcome.succeeded.len()
                )));
            }
            BatchStatus::Partial => {
                self.selection.replace(outcome.failed_ids());
                let mut note = Notification::warning(format!(
                    "{verb} {} of {} keys",
                    outcome.succeeded.len(),
                    outcome.len()
                ));
                if let Some(description) = description {
                    note = note.with_description(description);
                }
                self.notify(note);
            }
            BatchStatus::Failed => {
                self.selection.replace(outcome.failed_ids());
                let mut note = Notification::error(failed_title);
                if let Some(description) = description {
                    note = note.with_description(description);
                }
                self.notify(note);
            }
        }
    }

    /// Copy arbitrary text to the clipboard
    pub fn copy_text(&self, text: &str) -> bool {
        let copied = self.clipboard.copy_text(text);
        if copied {
            self.notify(Notification::success(messages::COPIED));
        } else {
            self.notify(Notification::error(messages::COPY_FAILED));
        }
        copied
    }

    /// Copy the secret of a key on the current page
    pub fn copy_key(&self, id: KeyId) -> bool {
        match self.keys.iter().find(|key| key.id == id) {
            Some(key) => self.copy_text(&key.key),
            None => {
                self.notify(Notification::error(messages::KEY_NOT_ON_PAGE));
                false
            }
        }
    }
}
