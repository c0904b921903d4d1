//! The task list pipeline: one source collection, one derived view.
//!
//! [`TaskView`] owns the loaded tasks for the signed-in owner and
//! projects them through the active criteria (category, priority,
//! status, free text, tags) and sort mode into the view collection.
//! Mutations write through to the store synchronously and then schedule
//! a rebuild.
//!
//! Rebuilds are guarded: a rebuild requested while one is running is
//! recorded as pending and runs exactly once afterwards, so bursts of
//! criteria changes (rapid typing, subscriber reactions to the rebuild
//! itself) settle in a bounded number of recomputations with the last
//! requested state winning.
//!
//! Write-through failures surface to the caller but the in-memory
//! collections are deliberately not rolled back; the displayed state
//! already reflects the optimistic change, and a reload restores strict
//! consistency.

use crate::categories::DEFAULT_CATEGORIES;
use crate::error::Result;
use crate::events::{Callback, SubscriptionId, Subscribers, ViewEvent, ViewRequest};
use crate::suggest;
use crate::tasks::models::{parse_tag_list, Priority, Task, DEFAULT_CATEGORY};
use crate::tasks::store::TaskStore;
use chrono::NaiveDate;

/// Sort orders for the view collection, in picker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SortMode {
    /// The persisted drag order, ascending.
    Manual = 0,
    /// Newest creation first (default).
    #[default]
    Recent = 1,
    /// Highest priority first, newest within a priority.
    Priority = 2,
    /// Category name ascending, newest within a category.
    Category = 3,
    /// Due date ascending with undated tasks last, newest within a day.
    DueDate = 4,
}

impl SortMode {
    /// Create a sort mode from its picker index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is greater than 4.
    pub const fn from_index(value: usize) -> std::result::Result<Self, InvalidSortMode> {
        match value {
            0 => Ok(Self::Manual),
            1 => Ok(Self::Recent),
            2 => Ok(Self::Priority),
            3 => Ok(Self::Category),
            4 => Ok(Self::DueDate),
            _ => Err(InvalidSortMode(value)),
        }
    }

    /// The picker index of this mode.
    #[must_use]
    pub const fn as_index(self) -> usize {
        self as usize
    }
}

/// Error when an invalid sort-mode index is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSortMode(pub usize);

impl std::fmt::Display for InvalidSortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid sort mode: {} (must be 0-4)", self.0)
    }
}

impl std::error::Error for InvalidSortMode {}

/// Done-state filter for the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Unfinished tasks only.
    Active,
    /// Finished tasks only.
    Done,
}

/// Fields that can be changed from the task editor.
#[derive(Debug, Default, Clone)]
pub struct TaskEdit {
    /// New title (if Some; blank titles are ignored).
    pub title: Option<String>,
    /// New done state (if Some).
    pub is_done: Option<bool>,
    /// New category (if Some).
    pub category: Option<String>,
    /// New priority (if Some).
    pub priority: Option<Priority>,
    /// New due date; `Some(None)` clears it.
    pub due_date: Option<Option<NaiveDate>>,
    /// New raw tag text (if Some).
    pub tags_raw: Option<String>,
    /// New checklist document (if Some).
    pub subtasks_json: Option<String>,
}

impl TaskEdit {
    /// Check if any fields are set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.is_done.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.tags_raw.is_none()
            && self.subtasks_json.is_none()
    }

    /// Copy the set fields onto `task`.
    fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            let trimmed = title.trim();
            if !trimmed.is_empty() {
                task.title = trimmed.to_string();
            }
        }
        if let Some(is_done) = self.is_done {
            task.is_done = is_done;
        }
        if let Some(category) = &self.category {
            task.category.clone_from(category);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags_raw) = &self.tags_raw {
            task.tags_raw.clone_from(tags_raw);
        }
        if let Some(subtasks_json) = &self.subtasks_json {
            task.subtasks_json.clone_from(subtasks_json);
        }
    }
}

/// The in-progress new-task form.
///
/// Suggestions recompute on every title change but never replace a
/// field the user has set by hand; the touched flags record those
/// manual choices.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    /// Title text as typed.
    pub title: String,
    /// Raw tag text as typed.
    pub tags: String,
    /// Chosen category; the first option is used when unset.
    pub category: Option<String>,
    /// Chosen priority.
    pub priority: Priority,
    /// Chosen due date.
    pub due_date: Option<NaiveDate>,
    /// Latest suggestion summary for the form's hint line.
    pub suggestion: Option<String>,
    category_touched: bool,
    priority_touched: bool,
}

/// Stateful pipeline from the loaded task set to the displayed list.
pub struct TaskView<S: TaskStore> {
    store: S,
    owner_id: Option<i64>,
    source: Vec<Task>,
    view: Vec<usize>,
    category_options: Vec<String>,
    draft: TaskDraft,

    search_text: String,
    tag_filter_text: String,
    category_filter: Option<String>,
    priority_filter: Option<Priority>,
    status_filter: StatusFilter,
    sort: SortMode,

    rebuilding: bool,
    rebuild_pending: bool,
    subscribers: Subscribers,
}

impl<S: TaskStore> TaskView<S> {
    /// Create a pipeline over the given store, with nothing loaded.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            owner_id: None,
            source: Vec::new(),
            view: Vec::new(),
            category_options: DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
            draft: TaskDraft::default(),
            search_text: String::new(),
            tag_filter_text: String::new(),
            category_filter: None,
            priority_filter: None,
            status_filter: StatusFilter::All,
            sort: SortMode::default(),
            rebuilding: false,
            rebuild_pending: false,
            subscribers: Subscribers::new(),
        }
    }

    /// Register an event callback.
    pub fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    /// Remove an event callback.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Load every task for `owner_id`, replacing the source collection.
    ///
    /// Tasks written before manual ordering existed carry an order
    /// index of 0; when any are present, the whole set gets fresh
    /// contiguous indices by ascending creation time, persisted once,
    /// before the list is presented.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or the one-time order migration
    /// fails.
    pub fn load(&mut self, owner_id: i64) -> Result<()> {
        self.owner_id = Some(owner_id);
        self.source.clear();
        self.view.clear();

        let mut loaded = self.store.list_tasks(owner_id)?;
        if loaded.iter().any(|task| task.order_index == 0) {
            loaded.sort_by_key(|task| task.created_at);
            #[allow(clippy::cast_possible_wrap)]
            for (position, task) in loaded.iter_mut().enumerate() {
                task.order_index = position as i64 + 1;
            }
            self.store.persist_order(&loaded)?;
        }

        self.source = loaded;
        self.notify(&ViewEvent::Loaded);
        self.request_rebuild();
        Ok(())
    }

    /// The owner whose tasks are loaded, if any.
    #[must_use]
    pub const fn owner_id(&self) -> Option<i64> {
        self.owner_id
    }

    /// Every loaded task, regardless of filters.
    #[must_use]
    pub fn source(&self) -> &[Task] {
        &self.source
    }

    /// Tasks currently visible, in view order.
    #[must_use]
    pub fn visible(&self) -> Vec<&Task> {
        self.view.iter().map(|&index| &self.source[index]).collect()
    }

    /// Number of visible tasks.
    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.view.len()
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    // --- criteria ---

    /// Replace the free-text search filter (matches title or category).
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.search_text == text {
            return;
        }
        self.search_text = text;
        self.request_rebuild();
    }

    /// Current search text.
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Replace the tag filter text; every listed tag must be present.
    pub fn set_tag_filter_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.tag_filter_text == text {
            return;
        }
        self.tag_filter_text = text;
        self.request_rebuild();
    }

    /// Current tag filter text.
    #[must_use]
    pub fn tag_filter_text(&self) -> &str {
        &self.tag_filter_text
    }

    /// Replace the category filter; `None` selects all categories.
    pub fn set_category_filter(&mut self, category: Option<String>) {
        if self.category_filter == category {
            return;
        }
        self.category_filter = category;
        self.request_rebuild();
    }

    /// Current category filter.
    #[must_use]
    pub fn category_filter(&self) -> Option<&str> {
        self.category_filter.as_deref()
    }

    /// Replace the priority filter; `None` selects all priorities.
    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        if self.priority_filter == priority {
            return;
        }
        self.priority_filter = priority;
        self.request_rebuild();
    }

    /// Current priority filter.
    #[must_use]
    pub const fn priority_filter(&self) -> Option<Priority> {
        self.priority_filter
    }

    /// Replace the status filter.
    pub fn set_status_filter(&mut self, status: StatusFilter) {
        if self.status_filter == status {
            return;
        }
        self.status_filter = status;
        self.request_rebuild();
    }

    /// Current status filter.
    #[must_use]
    pub const fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    /// Replace the sort mode.
    pub fn set_sort_mode(&mut self, sort: SortMode) {
        if self.sort == sort {
            return;
        }
        self.sort = sort;
        self.request_rebuild();
    }

    /// Current sort mode.
    #[must_use]
    pub const fn sort_mode(&self) -> SortMode {
        self.sort
    }

    /// Replace the category options offered to the draft and filters.
    pub fn set_category_options(&mut self, options: Vec<String>) {
        self.category_options = options;
    }

    /// Current category options.
    #[must_use]
    pub fn category_options(&self) -> &[String] {
        &self.category_options
    }

    // --- draft ---

    /// The in-progress new-task form.
    #[must_use]
    pub const fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    /// Update the draft title and recompute suggestions.
    pub fn set_draft_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
        self.apply_draft_suggestions();
    }

    /// Update the draft tag text.
    pub fn set_draft_tags(&mut self, tags: impl Into<String>) {
        self.draft.tags = tags.into();
    }

    /// Record a manual category choice; suggestions stop touching it.
    pub fn set_draft_category(&mut self, category: impl Into<String>) {
        self.draft.category = Some(category.into());
        self.draft.category_touched = true;
    }

    /// Record a manual priority choice; suggestions stop touching it.
    pub fn set_draft_priority(&mut self, priority: Priority) {
        self.draft.priority = priority;
        self.draft.priority_touched = true;
    }

    /// Set or clear the draft due date.
    pub fn set_draft_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.draft.due_date = due_date;
    }

    /// Add a task from the current draft and reset the form.
    ///
    /// Returns the stored task's id, or `None` when no owner is loaded
    /// or the draft title is blank after trimming.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails; the draft and source are
    /// left untouched in that case.
    pub fn add_task_from_draft(&mut self) -> Result<Option<i64>> {
        let Some(owner_id) = self.owner_id else {
            return Ok(None);
        };
        let title = self.draft.title.trim().to_string();
        if title.is_empty() {
            return Ok(None);
        }

        let mut task = Task::new(owner_id, title);
        task.category = self.draft.category.clone().unwrap_or_else(|| {
            self.category_options
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
        });
        task.priority = self.draft.priority;
        task.due_date = self.draft.due_date;
        task.tags_raw.clone_from(&self.draft.tags);

        self.store.add_task(&mut task)?;
        let id = task.id;
        self.source.insert(0, task);
        self.draft = TaskDraft::default();

        self.notify(&ViewEvent::TaskChanged(id));
        self.request_rebuild();
        Ok(Some(id))
    }

    // --- mutations ---

    /// Apply edited fields to a task and write it through.
    ///
    /// Returns `false` when no loaded task has the given id. On a write
    /// failure the in-memory change is kept and the error surfaced; the
    /// optimistic state is not rolled back.
    ///
    /// # Errors
    ///
    /// Returns an error if the write-through fails.
    pub fn apply_edit(&mut self, id: i64, edit: &TaskEdit) -> Result<bool> {
        let Some(task) = self.source.iter_mut().find(|task| task.id == id) else {
            return Ok(false);
        };
        edit.apply_to(task);
        let write = self.store.update_task(task);

        self.notify(&ViewEvent::TaskChanged(id));
        self.request_rebuild();
        write?;
        Ok(true)
    }

    /// Mark a task done or not done and write it through.
    ///
    /// # Errors
    ///
    /// Returns an error if the write-through fails.
    pub fn set_done(&mut self, id: i64, done: bool) -> Result<bool> {
        self.apply_edit(id, &TaskEdit { is_done: Some(done), ..TaskEdit::default() })
    }

    /// Remove a task from the source and from storage.
    ///
    /// Returns `false` when no loaded task has the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails; the task is already gone
    /// from the in-memory collections at that point.
    pub fn delete_task(&mut self, id: i64) -> Result<bool> {
        let Some(position) = self.source.iter().position(|task| task.id == id) else {
            return Ok(false);
        };
        let task = self.source.remove(position);
        let write = self.store.delete_task(&task);

        self.request_rebuild();
        write?;
        Ok(true)
    }

    /// Remove every finished task, in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage batch fails; rows deleted before
    /// the failure stay deleted.
    pub fn clear_completed(&mut self) -> Result<()> {
        self.source.retain(|task| !task.is_done);
        let write = match self.owner_id {
            Some(owner_id) => self.store.clear_completed(owner_id),
            None => Ok(()),
        };

        self.request_rebuild();
        write
    }

    // --- manual order ---

    /// Whether drag reordering is currently allowed.
    ///
    /// Manual sort only, with every filter off and both text boxes
    /// blank; anything else would silently corrupt the persisted order
    /// through a partial view.
    #[must_use]
    pub fn can_reorder(&self) -> bool {
        self.sort == SortMode::Manual
            && self.category_filter.is_none()
            && self.priority_filter.is_none()
            && self.status_filter == StatusFilter::All
            && self.search_text.trim().is_empty()
            && self.tag_filter_text.trim().is_empty()
    }

    /// Move the visible item at `old_index` to `new_index` and persist
    /// the resulting manual order.
    ///
    /// A no-op returning `false` when reordering is not allowed or an
    /// index is out of bounds; nothing is written in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new order fails; the
    /// in-memory order keeps the move.
    pub fn reorder(&mut self, old_index: usize, new_index: usize) -> Result<bool> {
        if !self.can_reorder() || old_index == new_index {
            return Ok(false);
        }
        if old_index >= self.view.len() || new_index >= self.view.len() {
            return Ok(false);
        }

        let moved = self.view.remove(old_index);
        self.view.insert(new_index, moved);

        self.persist_view_order()?;
        Ok(true)
    }

    /// Reassign contiguous order indices from the current view sequence
    /// and persist them, without moving anything.
    ///
    /// Exposed for drag-end handling; subject to the same eligibility
    /// rule as [`Self::reorder`].
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the order fails.
    pub fn persist_current_order(&mut self) -> Result<bool> {
        if !self.can_reorder() || self.view.is_empty() {
            return Ok(false);
        }
        self.persist_view_order()?;
        Ok(true)
    }

    /// Rewrite the source to mirror the view sequence, assign
    /// `order_index = position + 1` throughout, and write it back.
    ///
    /// Only called in reorder-eligible states, where the view covers
    /// every source item.
    #[allow(clippy::cast_possible_wrap)]
    fn persist_view_order(&mut self) -> Result<()> {
        let mut reordered: Vec<Task> = Vec::with_capacity(self.source.len());
        for &index in &self.view {
            reordered.push(self.source[index].clone());
        }
        for (position, task) in reordered.iter_mut().enumerate() {
            task.order_index = position as i64 + 1;
        }
        self.source = reordered;
        self.view = (0..self.source.len()).collect();

        let write = self.store.persist_order(&self.source);
        self.notify(&ViewEvent::OrderPersisted);
        self.request_rebuild();
        write
    }

    // --- rebuild ---

    /// Schedule a view recomputation.
    ///
    /// If a rebuild is already running the request is recorded as
    /// pending, never run immediately and never dropped; one fresh
    /// rebuild runs once the current one finishes.
    pub fn request_rebuild(&mut self) {
        if self.rebuilding {
            self.rebuild_pending = true;
            return;
        }

        self.rebuilding = true;
        self.rebuild();
        self.rebuilding = false;

        while self.rebuild_pending {
            self.rebuild_pending = false;
            self.rebuilding = true;
            self.rebuild();
            self.rebuilding = false;
        }
    }

    /// Recompute the view collection from the source and criteria.
    fn rebuild(&mut self) {
        let wanted_tags: Vec<String> =
            parse_tag_list(&self.tag_filter_text).iter().map(|tag| tag.to_lowercase()).collect();

        let mut indices: Vec<usize> = (0..self.source.len())
            .filter(|&index| self.matches(&self.source[index], &wanted_tags))
            .collect();
        self.sort_indices(&mut indices);
        self.view = indices;

        self.notify(&ViewEvent::Rebuilt);
    }

    /// Whether a task passes every active filter.
    fn matches(&self, task: &Task, wanted_tags: &[String]) -> bool {
        if let Some(category) = &self.category_filter {
            if task.category != *category {
                return false;
            }
        }
        if let Some(priority) = self.priority_filter {
            if task.priority != priority {
                return false;
            }
        }
        match self.status_filter {
            StatusFilter::Active if task.is_done => return false,
            StatusFilter::Done if !task.is_done => return false,
            StatusFilter::All | StatusFilter::Active | StatusFilter::Done => {}
        }

        let term = self.search_text.trim();
        if !term.is_empty() {
            let term = term.to_lowercase();
            if !task.title.to_lowercase().contains(&term)
                && !task.category.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        if !wanted_tags.is_empty() {
            let have: Vec<String> = task.tags().iter().map(|tag| tag.to_lowercase()).collect();
            if !wanted_tags.iter().all(|tag| have.contains(tag)) {
                return false;
            }
        }

        true
    }

    /// Order view indices according to the active sort mode.
    fn sort_indices(&self, indices: &mut [usize]) {
        let source = &self.source;
        match self.sort {
            SortMode::Manual => indices.sort_by_key(|&index| source[index].order_index),
            SortMode::Recent => indices
                .sort_by(|&a, &b| source[b].created_at.cmp(&source[a].created_at)),
            SortMode::Priority => indices.sort_by(|&a, &b| {
                source[b]
                    .priority
                    .cmp(&source[a].priority)
                    .then_with(|| source[b].created_at.cmp(&source[a].created_at))
            }),
            SortMode::Category => indices.sort_by(|&a, &b| {
                source[a]
                    .category
                    .cmp(&source[b].category)
                    .then_with(|| source[b].created_at.cmp(&source[a].created_at))
            }),
            SortMode::DueDate => indices.sort_by(|&a, &b| {
                let due_a = source[a].due_date.unwrap_or(NaiveDate::MAX);
                let due_b = source[b].due_date.unwrap_or(NaiveDate::MAX);
                due_a
                    .cmp(&due_b)
                    .then_with(|| source[b].created_at.cmp(&source[a].created_at))
            }),
        }
    }

    // --- events ---

    /// Fan an event out and apply whatever the subscribers request.
    ///
    /// Criteria changes requested while a rebuild is running land on
    /// the pending flag instead of recursing.
    fn notify(&mut self, event: &ViewEvent) {
        let requests = self.subscribers.emit(event);
        for request in requests {
            self.apply_request(request);
        }
    }

    /// Apply one subscriber request.
    fn apply_request(&mut self, request: ViewRequest) {
        match request {
            ViewRequest::Rebuild => self.request_rebuild(),
            ViewRequest::SetSearchText(text) => self.set_search_text(text),
            ViewRequest::SetTagFilter(text) => self.set_tag_filter_text(text),
            ViewRequest::SetCategoryFilter(category) => self.set_category_filter(category),
            ViewRequest::SetPriorityFilter(priority) => self.set_priority_filter(priority),
            ViewRequest::SetStatusFilter(status) => self.set_status_filter(status),
            ViewRequest::SetSortMode(sort) => self.set_sort_mode(sort),
        }
    }

    /// Recompute suggestions for the draft title, skipping any field
    /// the user has already chosen.
    fn apply_draft_suggestions(&mut self) {
        if self.draft.title.trim().is_empty() {
            self.draft.suggestion = None;
            return;
        }

        let suggestion = suggest::suggest_for_title(&self.draft.title);
        let mut messages = Vec::new();

        if let Some(category) = &suggestion.category {
            let known = self
                .category_options
                .iter()
                .any(|option| option.to_lowercase() == category.to_lowercase());
            if known && !self.draft.category_touched {
                self.draft.category = Some(category.clone());
                messages.push(format!("Suggested category: {category}"));
            }
        }

        if let Some(priority) = suggestion.priority {
            if !self.draft.priority_touched {
                self.draft.priority = priority;
                messages.push(format!("Suggested priority: {}", priority.label()));
            }
        }

        if !suggestion.tags.is_empty() {
            let merged = suggest::merge_tags(&self.draft.tags, &suggestion.tags);
            if merged != self.draft.tags {
                self.draft.tags = merged;
                messages.push("Suggested tags added".to_string());
            }
        }

        self.draft.suggestion =
            if messages.is_empty() { None } else { Some(messages.join(" • ")) };
    }
}
