use frames::{Envelope, PixelRecord, SubmitResponse};
use tracing::{debug, info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::{Bounds, Point, ViewSettings, Viewport};
use crate::config::BoardConfig;
use crate::history::HistoryCursor;
use crate::input::{Button, InputState, Key, KeyCommand, Modifiers, UiState, WheelDelta};
use crate::leaderboard::{self, Leaderboard};
use crate::log::{Origin, PlacementLog};
use crate::palette::Palette;
use crate::placement::{self, Author, Cell, Color, Placement, UsernameError};
use crate::queue::{Dispatch, Resolution, RetryOutcome, SubmissionId, SubmissionQueue, SubmitError};
use crate::render;
use crate::snapshot::{Snapshot, SnapshotCache};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from engine methods for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Draw one cell. `None` clears it to unpainted.
    PaintCell { cell: Cell, color: Option<Color> },
    /// The whole view changed; redraw from [`EngineCore::snapshot`].
    RepaintAll,
    /// The timeline moved or its ceiling grew.
    CursorMoved { position: usize, ceiling: usize, live: bool },
    /// Re-read [`EngineCore::leaderboard`].
    LeaderboardChanged,
    /// Send this submission over the submission channel.
    Dispatch(Dispatch),
    /// Show a message to the user.
    Notice(Notice),
    /// Pan or zoom changed; apply the new transform.
    ViewportChanged(Viewport),
    /// Persist the viewport.
    SaveView(ViewSettings),
    /// An admin message addressed to the local user.
    Broadcast { info: String },
    UserCountChanged(u32),
    PaletteChanged { index: usize, color: Color },
}

/// User-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Rate limited; placing resumes after `secs`.
    Wait { secs: u64 },
    /// A submission failed.
    Error(String),
    /// The board could not be loaded and will not become interactive.
    LoadFailed(String),
}

/// Initial load progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Bulk pages are arriving; realtime events are deferred.
    #[default]
    Loading,
    Ready,
    Failed,
}

/// Core engine state: all logic that does not depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub config: BoardConfig,
    log: PlacementLog,
    cursor: HistoryCursor,
    filter: Option<Author>,
    pub viewport: Viewport,
    pub container_width: f64,
    pub container_height: f64,
    queue: SubmissionQueue,
    pub palette: Palette,
    pub ui: UiState,
    pub input: InputState,
    snapshot: Snapshot,
    cache: SnapshotCache,
    load: LoadState,
    deferred: Vec<Placement>,
    user_count: u32,
    author: Author,
}

impl EngineCore {
    #[must_use]
    pub fn new(config: BoardConfig) -> Self {
        Self {
            snapshot: Snapshot::empty(&config),
            cache: SnapshotCache::new(config.checkpoint_interval),
            config,
            log: PlacementLog::new(),
            cursor: HistoryCursor::new(),
            filter: None,
            viewport: Viewport::default(),
            container_width: 0.0,
            container_height: 0.0,
            queue: SubmissionQueue::new(),
            palette: Palette::new(),
            ui: UiState::default(),
            input: InputState::default(),
            load: LoadState::default(),
            deferred: Vec::new(),
            user_count: 0,
            author: Author::anonymous(),
        }
    }

    // --- Identity ---

    /// Set the name local placements are made under. Empty means anonymous.
    ///
    /// # Errors
    ///
    /// Returns [`UsernameError`] for names that are too long or reserved.
    pub fn set_author(&mut self, name: &str) -> Result<(), UsernameError> {
        Author::validate_username(name)?;
        self.author = Author::new(Some(name));
        Ok(())
    }

    #[must_use]
    pub fn author(&self) -> &Author {
        &self.author
    }

    // --- Load phase ---

    /// Append one page of bulk records in delivery order.
    ///
    /// Invalid records are dropped. Returns the number appended.
    pub fn load_page(&mut self, records: &[PixelRecord]) -> usize {
        if self.load != LoadState::Loading {
            debug!(state = ?self.load, "bulk page ignored outside load phase");
            return 0;
        }
        let config = &self.config;
        let range = self
            .log
            .extend(records.iter().filter_map(|r| placement::from_record(config, r)), Origin::Bulk);
        let dropped = records.len() - range.len();
        if dropped > 0 {
            debug!(dropped, "invalid bulk records dropped");
        }
        range.len()
    }

    /// End the load phase: append deferred realtime events and paint.
    pub fn finish_load(&mut self) -> Vec<Action> {
        if self.load != LoadState::Loading {
            return Vec::new();
        }
        let deferred = std::mem::take(&mut self.deferred);
        let deferred_count = deferred.len();
        self.log.extend(deferred, Origin::Realtime);
        self.load = LoadState::Ready;
        info!(entries = self.log.len(), deferred = deferred_count, "board loaded");
        self.refresh_view()
    }

    /// Load a whole board in one call.
    pub fn load_snapshot(&mut self, records: &[PixelRecord]) -> Vec<Action> {
        self.load_page(records);
        self.finish_load()
    }

    /// Give up on loading. The board never becomes interactive.
    pub fn fail_load(&mut self, message: &str) -> Vec<Action> {
        warn!(%message, "board load failed");
        self.load = LoadState::Failed;
        self.deferred.clear();
        vec![Action::Notice(Notice::LoadFailed(message.to_owned()))]
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.load
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.load == LoadState::Ready
    }

    // --- Realtime ---

    /// Apply one realtime message.
    pub fn on_envelope(&mut self, envelope: Envelope) -> Vec<Action> {
        match envelope {
            Envelope::Placement(record) => match placement::from_record(&self.config, &record) {
                Some(p) => self.on_placement(p),
                None => {
                    debug!(x = record.x, y = record.y, "realtime placement out of bounds");
                    Vec::new()
                }
            },
            Envelope::Broadcast { username, info } => {
                if self.author.matches_username(&username) {
                    vec![Action::Broadcast { info }]
                } else {
                    Vec::new()
                }
            }
            Envelope::Chat { .. } => Vec::new(),
            Envelope::UserCount(count) => {
                self.user_count = count;
                vec![Action::UserCountChanged(count)]
            }
        }
    }

    /// Append a validated realtime placement.
    ///
    /// In Live mode only the changed cell is painted. While scrubbing the view
    /// stays put and only the timeline ceiling grows.
    pub fn on_placement(&mut self, p: Placement) -> Vec<Action> {
        match self.load {
            LoadState::Loading => {
                self.deferred.push(p);
                return Vec::new();
            }
            LoadState::Failed => {
                debug!("realtime placement dropped after failed load");
                return Vec::new();
            }
            LoadState::Ready => {}
        }

        let mut actions = Vec::new();
        let index = self.log.append(p.clone(), Origin::Realtime);
        match self.queue.reconcile(&mut self.log, index) {
            Some(retracted) if retracted == index => {
                debug!(index, "echo of a local placement");
                self.cache.invalidate_from(index);
                return vec![self.cursor_action()];
            }
            Some(retracted) => {
                debug!(retracted, index, "local placement overtaken before its echo");
                actions.extend(self.after_retraction(retracted));
            }
            None => {}
        }
        if self.cursor.is_live() {
            actions.extend(self.apply_live(&p));
            actions.push(Action::LeaderboardChanged);
        }
        actions.push(self.cursor_action());
        actions
    }

    #[must_use]
    pub fn user_count(&self) -> u32 {
        self.user_count
    }

    // --- Submissions ---

    /// Optimistically place `color` at `cell` as `author`.
    ///
    /// Leaves history mode first if the view is scrubbed or filtered.
    ///
    /// # Errors
    ///
    /// [`SubmitError::NotInteractive`] before the board has loaded, and the
    /// queue's no-op errors for unchanged or duplicate submissions.
    pub fn submit(&mut self, cell: Cell, color: Color, author: Author, now_ms: i64) -> Result<Vec<Action>, SubmitError> {
        if !self.is_interactive() {
            return Err(SubmitError::NotInteractive);
        }
        let dispatch = self.queue.submit(&mut self.log, Placement::new(cell, color, author, Some(now_ms)))?;

        let mut actions = if self.cursor.is_live() && self.filter.is_none() {
            self.apply_live(&dispatch.placement)
        } else {
            self.cursor.reset_to_live();
            self.filter = None;
            self.refresh_view()
        };
        actions.push(Action::LeaderboardChanged);
        actions.push(self.cursor_action());
        actions.push(Action::Dispatch(dispatch));
        Ok(actions)
    }

    /// Apply the server's answer for a dispatched submission.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::UnknownSubmission`] if `id` is not in flight.
    pub fn on_submit_result(&mut self, id: SubmissionId, response: &SubmitResponse, now_ms: i64) -> Result<Vec<Action>, SubmitError> {
        let resolution = self.queue.resolve(&mut self.log, id, response, now_ms)?;
        let mut actions = Vec::new();
        match resolution {
            Resolution::Acked => {}
            Resolution::RateLimited {
                retracted,
                wait_secs,
                retry_at_ms,
            } => {
                if let Some(index) = retracted {
                    actions.extend(self.after_retraction(index));
                }
                actions.extend(self.clear_hover());
                self.ui.wait_until_ms =
                    Some(retry_at_ms.unwrap_or_else(|| now_ms.saturating_add_unsigned(wait_secs.saturating_mul(1000))));
                actions.push(Action::Notice(Notice::Wait { secs: wait_secs }));
            }
            Resolution::Failed { retracted, message, .. } => {
                if let Some(index) = retracted {
                    actions.extend(self.after_retraction(index));
                }
                actions.extend(self.clear_hover());
                actions.push(Action::Notice(Notice::Error(message)));
            }
        }
        Ok(actions)
    }

    /// Fire due retries. Hosts call this from a timer.
    pub fn poll_retries(&mut self, now_ms: i64) -> Vec<Action> {
        if self.ui.wait_until_ms.is_some_and(|at| at <= now_ms) {
            self.ui.wait_until_ms = None;
        }
        let mut actions = Vec::new();
        for outcome in self.queue.poll(&mut self.log, now_ms) {
            match outcome {
                RetryOutcome::Dispatched(dispatch) => {
                    if self.cursor.is_live() {
                        actions.extend(self.apply_live(&dispatch.placement));
                        actions.push(Action::LeaderboardChanged);
                    }
                    actions.push(self.cursor_action());
                    actions.push(Action::Dispatch(dispatch));
                }
                RetryOutcome::Dropped { id, reason } => {
                    debug!(%id, %reason, "retry dropped");
                }
            }
        }
        actions
    }

    /// Earliest pending retry, for arming a host timer.
    #[must_use]
    pub fn next_retry_at(&self) -> Option<i64> {
        self.queue.next_retry_at()
    }

    #[must_use]
    pub fn queue(&self) -> &SubmissionQueue {
        &self.queue
    }

    // --- History / filter ---

    /// Move the timeline to `value`. Reaching the end of the log is Live.
    pub fn scrub_to(&mut self, value: usize) -> Vec<Action> {
        self.cursor.scrub_to(value, self.log.len());
        let mut actions = self.refresh_view();
        actions.push(Action::LeaderboardChanged);
        actions.push(self.cursor_action());
        actions
    }

    /// The timeline handle was grabbed: freeze the view where it is.
    pub fn begin_scrub(&mut self) -> Vec<Action> {
        self.cursor.pin(self.log.len());
        vec![self.cursor_action()]
    }

    /// Leave scrubbing and show the live board.
    pub fn reset_to_live(&mut self) -> Vec<Action> {
        if !self.cursor.reset_to_live() {
            return Vec::new();
        }
        let mut actions = self.refresh_view();
        actions.push(Action::LeaderboardChanged);
        actions.push(self.cursor_action());
        actions
    }

    /// Clear the author filter and return to Live.
    pub fn reset_view(&mut self) -> Vec<Action> {
        let was_scrubbing = self.cursor.reset_to_live();
        let was_filtered = self.filter.take().is_some();
        if !was_scrubbing && !was_filtered {
            return Vec::new();
        }
        let mut actions = self.refresh_view();
        actions.push(Action::LeaderboardChanged);
        actions.push(self.cursor_action());
        actions
    }

    /// Restrict the view to one author, or lift the restriction.
    pub fn set_author_filter(&mut self, filter: Option<Author>) -> Vec<Action> {
        if self.filter == filter {
            return Vec::new();
        }
        self.filter = filter;
        let mut actions = self.refresh_view();
        actions.push(Action::LeaderboardChanged);
        actions
    }

    /// Filter to the author at leaderboard `rank`, or clear the filter if it
    /// already shows them.
    pub fn toggle_filter_rank(&mut self, rank: usize) -> Vec<Action> {
        let ranking = leaderboard::aggregate(&self.log, self.position(), None);
        let Some(author) = ranking.author_at(rank) else {
            return Vec::new();
        };
        if self.filter.as_ref() == Some(author) {
            self.set_author_filter(None)
        } else {
            let author = author.clone();
            self.set_author_filter(Some(author))
        }
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Author> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn cursor(&self) -> HistoryCursor {
        self.cursor
    }

    /// Rendered prefix length.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.position(self.log.len())
    }

    /// Highest position the timeline can reach.
    #[must_use]
    pub fn ceiling(&self) -> usize {
        self.log.len()
    }

    /// The placement the timeline handle points at.
    #[must_use]
    pub fn timeline_label(&self) -> Option<&Placement> {
        self.cursor.label_entry(&self.log).map(|entry| &entry.placement)
    }

    // --- Queries ---

    #[must_use]
    pub fn log(&self) -> &PlacementLog {
        &self.log
    }

    /// True board colors for the current view, without the hover preview.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Leaderboard for the current prefix and filter.
    #[must_use]
    pub fn leaderboard(&self) -> Leaderboard {
        leaderboard::aggregate(&self.log, self.position(), self.filter.as_ref())
    }

    /// Color shown on screen at `cell`, including the hover preview.
    #[must_use]
    pub fn displayed(&self, cell: Cell) -> Option<Color> {
        if self.ui.hover == Some(cell) {
            return Some(self.palette.selected_color());
        }
        self.snapshot.get(cell)
    }

    /// The placement behind the visible color at `cell`: the latest one in
    /// the rendered prefix that passes the author filter.
    #[must_use]
    pub fn inspect(&self, cell: Cell) -> Option<&Placement> {
        self.log
            .latest_at(cell, self.position(), self.filter.as_ref())
            .map(|(_, p)| p)
    }

    /// Eyedropper: the visible color at a board coordinate.
    ///
    /// Unpainted cells report the board's default color; out-of-bounds
    /// coordinates report nothing.
    #[must_use]
    pub fn pick_color_at(&self, x: i64, y: i64) -> Option<Color> {
        let cell = self.config.cell_at(x, y)?;
        Some(self.snapshot.get(cell).unwrap_or(self.config.default_color))
    }

    // --- Palette / hover ---

    /// Select a palette slot.
    pub fn select_color(&mut self, index: usize) -> Vec<Action> {
        if !self.palette.select(index) {
            return Vec::new();
        }
        self.palette_changed()
    }

    fn step_color(&mut self, delta: isize) -> Vec<Action> {
        if !self.palette.step(delta) {
            return Vec::new();
        }
        self.palette_changed()
    }

    fn pick_color(&mut self, x: i64, y: i64) -> Vec<Action> {
        let Some(color) = self.pick_color_at(x, y) else {
            return Vec::new();
        };
        self.palette.pick(color);
        self.palette_changed()
    }

    fn palette_changed(&self) -> Vec<Action> {
        let mut actions = vec![Action::PaletteChanged {
            index: self.palette.selected_index(),
            color: self.palette.selected_color(),
        }];
        if let Some(cell) = self.ui.hover {
            actions.push(self.paint(cell));
        }
        actions
    }

    /// Move the hover preview to `cell`, restoring the previous one.
    pub fn set_hover(&mut self, cell: Option<Cell>) -> Vec<Action> {
        if self.ui.hover == cell || !self.is_interactive() {
            return Vec::new();
        }
        let mut actions = self.clear_hover();
        self.ui.hover = cell;
        if let Some(cell) = cell {
            actions.push(self.paint(cell));
        }
        actions
    }

    /// Remove the hover preview.
    pub fn clear_hover(&mut self) -> Vec<Action> {
        match self.ui.hover.take() {
            Some(cell) => vec![self.paint(cell)],
            None => Vec::new(),
        }
    }

    // --- Viewport ---

    /// Limits for the current container size.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::for_board(&self.config, self.container_width, self.container_height)
    }

    /// Record the container size in CSS pixels.
    pub fn set_container(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.container_width = width;
        self.container_height = height;
        let before = self.viewport;
        self.viewport.clamp_pan(&self.bounds());
        if self.viewport == before {
            return Vec::new();
        }
        vec![Action::ViewportChanged(self.viewport)]
    }

    /// Apply stored viewport settings.
    pub fn restore_view(&mut self, settings: ViewSettings) -> Vec<Action> {
        let bounds = self.bounds();
        self.viewport.restore(settings, &bounds);
        vec![Action::ViewportChanged(self.viewport)]
    }

    /// Cell under a screen point, if it lies on the board.
    #[must_use]
    pub fn cell_at_screen(&self, screen: Point) -> Option<Cell> {
        let (x, y) = self.viewport.screen_to_board(screen);
        self.config.cell_at(x, y)
    }

    fn view_changed(&self) -> Vec<Action> {
        vec![
            Action::ViewportChanged(self.viewport),
            Action::SaveView(self.viewport.settings()),
        ]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button.pans() {
            self.input = InputState::Panning {
                last_screen: screen_pt,
                moved: false,
            };
        }
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        if let InputState::Panning { last_screen, moved } = &mut self.input {
            let (dx, dy) = (screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
            *last_screen = screen_pt;
            if dx != 0.0 || dy != 0.0 {
                *moved = true;
                let bounds = Bounds::for_board(&self.config, self.container_width, self.container_height);
                self.viewport.pan_by(dx, dy, &bounds);
                actions.push(Action::ViewportChanged(self.viewport));
            }
        }
        let cell = self.cell_at_screen(screen_pt);
        actions.extend(self.set_hover(cell));
        actions
    }

    /// Primary release places a pixel; a panning button released without
    /// moving picks the color under the pointer.
    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers, now_ms: i64) -> Vec<Action> {
        let gesture = std::mem::take(&mut self.input);
        if button.pans() {
            return match gesture {
                InputState::Panning { moved: true, .. } => vec![Action::SaveView(self.viewport.settings())],
                _ => {
                    let (x, y) = self.viewport.screen_to_board(screen_pt);
                    self.pick_color(x, y)
                }
            };
        }
        self.place_at(screen_pt, now_ms)
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.input = InputState::Idle;
        self.clear_hover()
    }

    /// Wheel zooms at the pointer; with a modifier it steps the palette.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if delta.dy == 0.0 {
            return Vec::new();
        }
        if modifiers.any() {
            return self.step_color(if delta.dy > 0.0 { 1 } else { -1 });
        }
        let bounds = self.bounds();
        self.viewport.zoom_with_wheel(screen_pt, delta.dy, &bounds);
        self.view_changed()
    }

    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        let Some(command) = key.command() else {
            return Vec::new();
        };
        let bounds = self.bounds();
        match command {
            KeyCommand::ResetView => self.reset_view(),
            KeyCommand::PreviousColor => self.step_color(-1),
            KeyCommand::NextColor => self.step_color(1),
            KeyCommand::CustomColor => {
                if self.palette.reset() {
                    self.palette_changed()
                } else {
                    Vec::new()
                }
            }
            KeyCommand::Nudge { dx, dy } => {
                self.viewport.nudge(dx, dy, &bounds);
                self.view_changed()
            }
            KeyCommand::ZoomIn => {
                self.viewport.zoom_in(&bounds);
                self.view_changed()
            }
            KeyCommand::ZoomOut => {
                self.viewport.zoom_out(&bounds);
                self.view_changed()
            }
            KeyCommand::FilterRank(rank) => self.toggle_filter_rank(rank),
        }
    }

    fn place_at(&mut self, screen_pt: Point, now_ms: i64) -> Vec<Action> {
        if !self.is_interactive() {
            return Vec::new();
        }
        // The first click in history mode only leaves it.
        if !self.cursor.is_live() || self.filter.is_some() {
            return self.reset_view();
        }
        let (x, y) = self.viewport.screen_to_board(screen_pt);
        let Some(cell) = self.config.cell_at(x, y) else {
            debug!(x, y, "placement outside the board");
            return Vec::new();
        };
        let color = self.palette.selected_color();
        let author = self.author.clone();
        match self.submit(cell, color, author, now_ms) {
            Ok(actions) => actions,
            Err(err) if err.is_silent() => {
                debug!(%err, "submission skipped");
                Vec::new()
            }
            Err(err) => vec![Action::Notice(Notice::Error(err.to_string()))],
        }
    }

    // --- Internals ---

    fn cursor_action(&self) -> Action {
        Action::CursorMoved {
            position: self.position(),
            ceiling: self.log.len(),
            live: self.cursor.is_live(),
        }
    }

    fn paint(&self, cell: Cell) -> Action {
        Action::PaintCell {
            cell,
            color: self.displayed(cell),
        }
    }

    /// Patch the rendered snapshot with one placement at the live edge.
    fn apply_live(&mut self, p: &Placement) -> Vec<Action> {
        if !self.filter.as_ref().is_none_or(|f| *f == p.author) {
            return Vec::new();
        }
        self.snapshot.apply(p);
        vec![self.paint(p.cell)]
    }

    /// Rebuild the rendered snapshot for the current prefix and filter.
    fn refresh_view(&mut self) -> Vec<Action> {
        let prefix = self.position();
        self.snapshot = self.cache.build(&self.config, &self.log, prefix, self.filter.as_ref());
        vec![Action::RepaintAll]
    }

    /// Repaint the cell of a tombstoned entry from its last visible placement.
    ///
    /// A pinned view is left as it is and rebuilt on return to Live.
    fn after_retraction(&mut self, index: usize) -> Vec<Action> {
        self.cache.invalidate_from(index);
        if !self.cursor.is_live() {
            return Vec::new();
        }
        let prefix = self.position();
        if index >= prefix {
            return Vec::new();
        }
        let Some(cell) = self.log.get(index).map(|entry| entry.placement.cell) else {
            return Vec::new();
        };
        let color = self
            .log
            .latest_at(cell, prefix, self.filter.as_ref())
            .map(|(_, p)| p.color);
        self.snapshot.set(cell, color);
        vec![self.paint(cell), Action::LeaderboardChanged]
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
///
/// The canvas backing store holds one pixel per board cell; the host scales
/// it with a CSS transform built from [`Action::ViewportChanged`].
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the element has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, config: BoardConfig) -> Result<Self, JsValue> {
        canvas.set_width(config.width);
        canvas.set_height(config.height);
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("context is not CanvasRenderingContext2d"))?;
        ctx.set_image_smoothing_enabled(false);
        Ok(Self {
            canvas,
            ctx,
            core: EngineCore::new(config),
        })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Paint cell actions and hand back the rest.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a `Canvas2D` call fails.
    pub fn apply(&self, actions: Vec<Action>) -> Result<Vec<Action>, JsValue> {
        let mut rest = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::PaintCell { cell, color } => render::draw_cell(&self.ctx, cell, color),
                Action::RepaintAll => self.render()?,
                other => rest.push(other),
            }
        }
        Ok(rest)
    }

    /// Draw the full board plus the hover preview.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        render::draw_snapshot(&self.ctx, self.core.snapshot())?;
        if let Some(cell) = self.core.ui.hover {
            render::draw_cell(&self.ctx, cell, self.core.displayed(cell));
        }
        Ok(())
    }

    // --- Delegated inputs ---

    pub fn load_page(&mut self, records: &[PixelRecord]) -> usize {
        self.core.load_page(records)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn finish_load(&mut self) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.finish_load();
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_envelope(&mut self, envelope: Envelope) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_envelope(envelope);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_submit_result(&mut self, id: SubmissionId, response: &SubmitResponse) -> Result<Vec<Action>, JsValue> {
        let actions = self
            .core
            .on_submit_result(id, response, now_ms())
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn poll_retries(&mut self) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.poll_retries(now_ms());
        self.apply(actions)
    }

    pub fn begin_scrub(&mut self) -> Vec<Action> {
        self.core.begin_scrub()
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn scrub_to(&mut self, value: usize) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.scrub_to(value);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_pointer_down(screen_pt, button, modifiers);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_pointer_move(screen_pt, modifiers);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_pointer_up(screen_pt, button, modifiers, now_ms());
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_pointer_leave(&mut self) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_pointer_leave();
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_wheel(screen_pt, delta, modifiers);
        self.apply(actions)
    }

    /// # Errors
    ///
    /// Returns `Err` if painting fails.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Result<Vec<Action>, JsValue> {
        let actions = self.core.on_key_down(key, modifiers);
        self.apply(actions)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}
