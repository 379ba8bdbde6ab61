//! In-memory host used by tests, benches and the scenario CLI.
//!
//! `SimulatedView` models just enough of an editor's display layer to make
//! reflow observable:
//!
//! - soft wrap at `floor(width / char_width)` display columns
//! - char width and line height derived from the font size
//! - a wrap column that only changes when the (possibly gated) reflow runs
//!
//! Font-size changes apply to line height immediately, like a real renderer
//! re-measuring, while the wrap column waits for the reflow. Edits update the
//! row map with the wrap column currently in effect.

use super::wrap_index::WrapIndex;
use super::{EditorView, HostEvent, ReflowDecision, ReflowHook, Topic, Workspace};
use crate::model::{BufferPosition, BufferRow, PaneId, ScreenRow, SubscriptionId, ViewId};
use std::collections::{BTreeMap, VecDeque};
use std::ops::Range;
use std::rc::Rc;
use tracing::trace;
use unicode_width::UnicodeWidthStr;

/// Character cell width as a fraction of the font size.
pub const CHAR_WIDTH_RATIO: f64 = 0.6;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f64 = 1.5;

/// Size, font and wrap setting requested for a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewGeometry {
    /// Text area width in pixels.
    pub width: f64,
    /// Visible height in pixels.
    pub height: f64,
    /// Font size in pixels.
    pub font_size: f64,
    /// Whether long lines soft-wrap.
    pub soft_wrap: bool,
}

impl Default for ViewGeometry {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            font_size: 10.0,
            soft_wrap: true,
        }
    }
}

impl ViewGeometry {
    /// Character cell width in pixels.
    pub fn char_width(&self) -> f64 {
        self.font_size * CHAR_WIDTH_RATIO
    }

    /// Line height in pixels.
    pub fn line_height(&self) -> f64 {
        self.font_size * LINE_HEIGHT_RATIO
    }

    /// Wrap column this geometry asks for, `None` when not wrapping.
    pub fn wrap_column(&self) -> Option<usize> {
        if !self.soft_wrap {
            return None;
        }
        let columns = (self.width / self.char_width()).floor();
        if columns.is_finite() && columns >= 1.0 {
            Some(columns as usize)
        } else {
            Some(1)
        }
    }
}

/// Screen rows a line occupies at a given wrap column.
pub fn rows_for_line(line: &str, wrap_column: Option<usize>) -> usize {
    match wrap_column {
        None => 1,
        Some(column) => line.width().div_ceil(column.max(1)).max(1),
    }
}

/// In-memory render component of one view.
pub struct SimulatedView {
    lines: Vec<String>,
    geometry: ViewGeometry,
    /// Wrap column in effect; only `run_reflow` changes it.
    wrap_column: Option<usize>,
    index: WrapIndex,
    scroll_offset: f64,
    cursor: Option<BufferPosition>,
    hook: Option<Rc<dyn ReflowHook>>,
    reflow_requested: bool,
    geometry_available: bool,
    reflow_count: usize,
}

impl SimulatedView {
    /// Creates a view laid out for `geometry`, scrolled to the top, cursor at
    /// the start of the buffer.
    pub fn new(lines: Vec<String>, geometry: ViewGeometry) -> Self {
        let wrap_column = geometry.wrap_column();
        let index = build_index(&lines, wrap_column);
        let cursor = (!lines.is_empty()).then(BufferPosition::default);
        Self {
            lines,
            geometry,
            wrap_column,
            index,
            scroll_offset: 0.0,
            cursor,
            hook: None,
            reflow_requested: false,
            geometry_available: true,
            reflow_count: 0,
        }
    }

    /// Creates a view from text split on newlines.
    pub fn from_text(text: &str, geometry: ViewGeometry) -> Self {
        Self::new(text.lines().map(str::to_string).collect(), geometry)
    }

    /// Creates a copy sharing text, geometry, cursor and scroll, with no hook
    /// installed.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::new(self.lines.clone(), self.geometry);
        copy.cursor = self.cursor;
        copy.scroll_offset = self.scroll_offset;
        copy
    }

    /// Requested geometry.
    pub fn geometry(&self) -> ViewGeometry {
        self.geometry
    }

    /// Wrap column currently in effect.
    pub fn wrap_column(&self) -> Option<usize> {
        self.wrap_column
    }

    /// How many times the recomputation routine actually ran.
    pub fn reflow_count(&self) -> usize {
        self.reflow_count
    }

    /// Returns true while a recomputation has been requested but not run.
    pub fn reflow_pending(&self) -> bool {
        self.reflow_requested
    }

    /// Returns true while a reflow hook is installed.
    pub fn has_reflow_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Number of buffer rows.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Screen rows occupied by a buffer row under the wrap column in effect.
    pub fn rows_for_buffer_row(&self, row: BufferRow) -> Option<usize> {
        (row.get() < self.index.len()).then(|| self.index.height(row.get()))
    }

    /// Simulate a transient layout state in which row/pixel queries answer
    /// "unavailable".
    pub fn set_geometry_available(&mut self, available: bool) {
        self.geometry_available = available;
    }

    /// Change the text area width; asks for a reflow.
    pub fn set_width(&mut self, width: f64) {
        if self.geometry.width != width {
            self.geometry.width = width;
            self.request_reflow();
        }
    }

    /// Change the visible height. Does not affect wrapping.
    pub fn set_height(&mut self, height: f64) {
        self.geometry.height = height;
    }

    /// Change the font size. Line height follows at once; the wrap column
    /// waits for a reflow.
    pub fn set_font_size(&mut self, font_size: f64) {
        if self.geometry.font_size != font_size {
            self.geometry.font_size = font_size;
            self.request_reflow();
        }
    }

    /// Toggle soft wrap; asks for a reflow.
    pub fn set_soft_wrap(&mut self, soft_wrap: bool) {
        if self.geometry.soft_wrap != soft_wrap {
            self.geometry.soft_wrap = soft_wrap;
            self.request_reflow();
        }
    }

    /// Move the primary cursor. Returns `(old, new)` when it moved.
    pub fn set_cursor(&mut self, position: BufferPosition) -> Option<(BufferPosition, BufferPosition)> {
        if self.lines.is_empty() {
            return None;
        }
        let row = position.row.get().min(self.lines.len() - 1);
        let new = BufferPosition::new(row, position.column);
        let old = self.cursor.replace(new).unwrap_or_default();
        (old != new).then_some((old, new))
    }

    /// Scroll by a pixel delta, clamped.
    pub fn scroll_by(&mut self, delta: f64) {
        let target = self.scroll_offset + delta;
        self.set_scroll_offset(target);
    }

    /// Replace a range of buffer rows with new lines. An edit that keeps the
    /// row count only updates the heights of the rows it touched.
    pub fn splice_lines(&mut self, range: Range<usize>, replacement: Vec<String>) {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        let in_place = replacement.len() == end - start;
        self.lines.splice(start..end, replacement);
        if in_place {
            for row in start..end {
                let height = rows_for_line(&self.lines[row], self.wrap_column);
                self.index.set(row, height);
            }
        } else {
            self.index = build_index(&self.lines, self.wrap_column);
        }
        if let Some(cursor) = self.cursor {
            self.cursor = if self.lines.is_empty() {
                None
            } else {
                Some(BufferPosition::new(
                    cursor.row.get().min(self.lines.len() - 1),
                    cursor.column,
                ))
            };
        }
        self.clamp_scroll();
    }

    /// Buffer row whose first screen line contains the pixel at `fraction` of
    /// the viewport height.
    pub fn buffer_row_at(&self, fraction: f64) -> Option<BufferRow> {
        let pixel = self.scroll_offset + fraction * self.geometry.height;
        let row = self.screen_row_for_pixel(pixel)?;
        (row.get() < self.index.total()).then(|| self.buffer_row_for_screen_row(row))
    }

    /// Pixel position of a buffer row's first screen line relative to the
    /// viewport top.
    pub fn row_top_in_viewport(&self, row: BufferRow) -> Option<f64> {
        let screen = self.screen_row_for_buffer_row(row)?;
        Some(self.pixel_for_screen_row(screen)? - self.scroll_offset)
    }

    fn line_height(&self) -> f64 {
        self.geometry.line_height()
    }

    fn max_scroll(&self) -> f64 {
        let rows = self.index.total().saturating_sub(1);
        (rows as f64 * self.line_height()).max(0.0)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_scroll());
    }

    fn request_reflow(&mut self) {
        self.reflow_requested = true;
        let decision = match &self.hook {
            Some(hook) => hook.on_reflow_requested(),
            None => ReflowDecision::Run,
        };
        match decision {
            ReflowDecision::Run => self.run_reflow(),
            ReflowDecision::Defer => trace!("reflow deferred by hook"),
        }
    }
}

fn build_index(lines: &[String], wrap_column: Option<usize>) -> WrapIndex {
    let heights: Vec<usize> = lines
        .iter()
        .map(|line| rows_for_line(line, wrap_column))
        .collect();
    WrapIndex::from_heights(&heights)
}

impl EditorView for SimulatedView {
    fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        if offset.is_finite() {
            self.scroll_offset = offset;
            self.clamp_scroll();
        }
    }

    fn force_layout(&mut self) {
        if self.reflow_requested {
            self.request_reflow();
        }
        self.clamp_scroll();
    }

    fn viewport_height(&self) -> f64 {
        self.geometry.height
    }

    fn screen_row_count(&self) -> usize {
        self.index.total()
    }

    fn screen_row_for_pixel(&self, pixel: f64) -> Option<ScreenRow> {
        if !self.geometry_available || !pixel.is_finite() || pixel < 0.0 {
            return None;
        }
        Some(ScreenRow::new((pixel / self.line_height()).floor() as usize))
    }

    fn pixel_for_screen_row(&self, row: ScreenRow) -> Option<f64> {
        (self.geometry_available && row.get() < self.index.total())
            .then(|| row.get() as f64 * self.line_height())
    }

    fn buffer_row_for_screen_row(&self, row: ScreenRow) -> BufferRow {
        let buffer_row = self
            .index
            .lower_bound(row.get())
            .unwrap_or_else(|| self.index.len().saturating_sub(1));
        BufferRow::new(buffer_row)
    }

    fn screen_row_for_buffer_row(&self, row: BufferRow) -> Option<ScreenRow> {
        (self.geometry_available && row.get() < self.index.len())
            .then(|| ScreenRow::new(self.index.start_of(row.get())))
    }

    fn cursor_position(&self) -> Option<BufferPosition> {
        self.cursor
    }

    fn scroll_to_cursor(&mut self) {
        let Some(cursor) = self.cursor else {
            return;
        };
        let Some(first) = self.screen_row_for_buffer_row(cursor.row) else {
            return;
        };
        let within = match self.wrap_column {
            Some(column) => (cursor.column / column.max(1))
                .min(self.index.height(cursor.row.get()).saturating_sub(1)),
            None => 0,
        };
        let pixel = (first.get() + within) as f64 * self.line_height();
        let centered = pixel - (self.geometry.height - self.line_height()) / 2.0;
        self.set_scroll_offset(centered);
    }

    fn run_reflow(&mut self) {
        self.wrap_column = self.geometry.wrap_column();
        self.index = build_index(&self.lines, self.wrap_column);
        self.reflow_requested = false;
        self.reflow_count += 1;
        self.clamp_scroll();
    }

    fn install_reflow_hook(&mut self, hook: Rc<dyn ReflowHook>) {
        // The index is built at construction, so the initial layout is done
        hook.on_installed_after_layout();
        self.hook = Some(hook);
    }

    fn remove_reflow_hook(&mut self) {
        self.hook = None;
    }
}

/// In-memory workspace: panes, views and an event bus that only queues
/// events somebody subscribed to.
#[derive(Default)]
pub struct SimulatedWorkspace {
    views: BTreeMap<ViewId, SimulatedView>,
    panes: BTreeMap<PaneId, PaneState>,
    subscriptions: BTreeMap<SubscriptionId, Topic>,
    events: VecDeque<HostEvent>,
    next_id: u64,
}

#[derive(Debug, Clone, Default)]
struct PaneState {
    width: f64,
    height: f64,
    views: Vec<ViewId>,
}

impl SimulatedWorkspace {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn emit(&mut self, event: HostEvent) {
        let topic = event.topic();
        if self.subscriptions.values().any(|t| *t == topic) {
            self.events.push_back(event);
        }
    }

    /// Drain the queued events in publication order.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        self.events.drain(..).collect()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Live views in id order.
    pub fn view_ids(&self) -> Vec<ViewId> {
        self.views.keys().copied().collect()
    }

    /// Borrow a simulated view.
    pub fn view(&self, view: ViewId) -> Option<&SimulatedView> {
        self.views.get(&view)
    }

    /// Mutably borrow a simulated view without going through `EditorView`.
    pub fn sim_view_mut(&mut self, view: ViewId) -> Option<&mut SimulatedView> {
        self.views.get_mut(&view)
    }

    /// Open a pane of the given size.
    pub fn add_pane(&mut self, width: f64, height: f64) -> PaneId {
        let pane = PaneId::new(self.next_id());
        self.panes.insert(
            pane,
            PaneState {
                width,
                height,
                views: Vec::new(),
            },
        );
        self.emit(HostEvent::PaneOpened(pane));
        pane
    }

    /// Place a view in a pane, sized to the pane.
    pub fn open_view(&mut self, pane: PaneId, view: SimulatedView) -> Option<ViewId> {
        self.insert_view(pane, view, None)
    }

    /// Open a copy of `source` in `pane`, as a split does.
    pub fn split_view(&mut self, source: ViewId, pane: PaneId) -> Option<ViewId> {
        let copy = self.views.get(&source)?.duplicate();
        self.insert_view(pane, copy, Some(source))
    }

    fn insert_view(
        &mut self,
        pane: PaneId,
        mut view: SimulatedView,
        copied_from: Option<ViewId>,
    ) -> Option<ViewId> {
        let (width, height) = {
            let state = self.panes.get(&pane)?;
            (state.width, state.height)
        };
        view.set_width(width);
        view.set_height(height);

        let id = ViewId::new(self.next_id());
        self.views.insert(id, view);
        if let Some(state) = self.panes.get_mut(&pane) {
            state.views.push(id);
        }
        self.emit(HostEvent::ViewOpened {
            view: id,
            pane,
            copied_from,
        });
        Some(id)
    }

    /// Destroy a view.
    pub fn close_view(&mut self, view: ViewId) {
        if !self.views.contains_key(&view) {
            return;
        }
        self.emit(HostEvent::ViewDestroyed(view));
        self.views.remove(&view);
        for state in self.panes.values_mut() {
            state.views.retain(|v| *v != view);
        }
    }

    /// Destroy a pane and every view in it.
    pub fn close_pane(&mut self, pane: PaneId) {
        let views = self.views_in_pane(pane);
        for view in views {
            self.close_view(view);
        }
        self.emit(HostEvent::PaneDestroyed(pane));
        self.panes.remove(&pane);
    }

    /// Resize a pane and every view in it.
    pub fn resize_pane(&mut self, pane: PaneId, width: f64, height: f64) {
        let Some(state) = self.panes.get_mut(&pane) else {
            return;
        };
        state.width = width;
        state.height = height;
        let views = state.views.clone();
        for view in views {
            if let Some(v) = self.views.get_mut(&view) {
                v.set_width(width);
                v.set_height(height);
            }
        }
        self.emit(HostEvent::PaneResized {
            pane,
            width,
            height,
        });
    }

    /// Resize a single view's element.
    pub fn resize_view(&mut self, view: ViewId, width: f64, height: f64) {
        let Some(v) = self.views.get_mut(&view) else {
            return;
        };
        v.set_width(width);
        v.set_height(height);
        self.emit(HostEvent::ViewResized(view));
    }

    /// Change the font size of every view.
    pub fn set_font_size(&mut self, font_size: f64) {
        for view in self.views.values_mut() {
            view.set_font_size(font_size);
        }
        self.emit(HostEvent::FontSizeChanged);
    }

    /// Set soft wrap on one view.
    pub fn set_soft_wrap(&mut self, view: ViewId, soft_wrap: bool) {
        let Some(v) = self.views.get_mut(&view) else {
            return;
        };
        v.set_soft_wrap(soft_wrap);
        self.emit(HostEvent::LayoutSettingToggled(view));
    }

    /// Move a view's primary cursor.
    pub fn move_cursor(&mut self, view: ViewId, position: BufferPosition) {
        let Some(v) = self.views.get_mut(&view) else {
            return;
        };
        if let Some((old, new)) = v.set_cursor(position) {
            self.emit(HostEvent::CursorMoved { view, old, new });
        }
    }

    /// Mouse wheel: scroll then notify.
    pub fn wheel(&mut self, view: ViewId, delta: f64) {
        let Some(v) = self.views.get_mut(&view) else {
            return;
        };
        v.scroll_by(delta);
        self.emit(HostEvent::Wheel(view));
    }

    /// Jump straight to the end of a smooth-scroll animation.
    pub fn finish_scroll_animation(&mut self, view: ViewId, offset: f64) {
        let Some(v) = self.views.get_mut(&view) else {
            return;
        };
        v.set_scroll_offset(offset);
        self.emit(HostEvent::ScrollAnimationEnded(view));
    }

    /// Replace buffer rows of a view and ask for a resync, as a collaborator
    /// inserting rendered output would.
    pub fn splice_and_resync(&mut self, view: ViewId, range: Range<usize>, lines: Vec<String>) {
        let Some(v) = self.views.get_mut(&view) else {
            return;
        };
        v.splice_lines(range, lines);
        self.emit(HostEvent::ResyncRequested(view));
    }

    /// Ask for a resync without changing anything.
    pub fn request_resync(&mut self, view: ViewId) {
        self.emit(HostEvent::ResyncRequested(view));
    }
}

impl Workspace for SimulatedWorkspace {
    fn view_mut(&mut self, view: ViewId) -> Option<&mut dyn EditorView> {
        self.views
            .get_mut(&view)
            .map(|v| v as &mut dyn EditorView)
    }

    fn views_in_pane(&self, pane: PaneId) -> Vec<ViewId> {
        self.panes
            .get(&pane)
            .map(|state| state.views.clone())
            .unwrap_or_default()
    }

    fn subscribe(&mut self, topic: Topic) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id());
        self.subscriptions.insert(id, topic);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }
}
