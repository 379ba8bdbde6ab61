//! Host collaborator interfaces.
//!
//! The host editor owns the text buffer, the render component and the event
//! bus. This crate only talks to it through the traits below:
//!
//! - [`EditorView`]: geometry queries and scroll control for one view
//! - [`Workspace`]: view lookup, pane membership and event subscriptions
//! - [`ReflowHook`]: installed by a session to gate the host's wrap recomputation
//!
//! Geometry queries return `Option` where the host may be mid-layout; `None`
//! is the "unavailable" sentinel and is never treated as fatal.
//!
//! [`simulated`] provides an in-memory host used by the tests and the CLI.

pub mod simulated;
pub mod wrap_index;

use crate::model::{BufferPosition, BufferRow, PaneId, ScreenRow, SubscriptionId, ViewId};
use std::rc::Rc;

/// Answer of a reflow hook to a recomputation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflowDecision {
    /// Run the recomputation now.
    Run,
    /// Skip it; the hook owes a flush later.
    Defer,
}

/// Interceptor consulted whenever the host's layout machinery wants to
/// recompute soft-wrap columns.
///
/// The hook only decides. The host runs its own routine on `Run`, so the
/// hook never needs a borrow of the host.
pub trait ReflowHook {
    /// Called in place of the host's recomputation routine.
    fn on_reflow_requested(&self) -> ReflowDecision;

    /// Called by the host when the hook goes in after the view's initial
    /// layout has already run.
    fn on_installed_after_layout(&self) {}
}

/// Render/layout component of one open view.
pub trait EditorView {
    /// Current vertical scroll offset in pixels.
    fn scroll_offset(&self) -> f64;

    /// Set the vertical scroll offset. The host may clamp it.
    fn set_scroll_offset(&mut self, offset: f64);

    /// Blocking layout pass; later geometry queries reflect the latest state.
    fn force_layout(&mut self);

    /// Height of the visible area in pixels. May be non-finite before the
    /// view has been measured.
    fn viewport_height(&self) -> f64;

    /// Number of rendered screen rows.
    fn screen_row_count(&self) -> usize;

    /// Screen row containing the given content pixel.
    fn screen_row_for_pixel(&self, pixel: f64) -> Option<ScreenRow>;

    /// Pixel position of the top of a screen row.
    fn pixel_for_screen_row(&self, row: ScreenRow) -> Option<f64>;

    /// Buffer row rendered on a screen row.
    fn buffer_row_for_screen_row(&self, row: ScreenRow) -> BufferRow;

    /// First screen row of a buffer row.
    fn screen_row_for_buffer_row(&self, row: BufferRow) -> Option<ScreenRow>;

    /// Position of the primary cursor.
    fn cursor_position(&self) -> Option<BufferPosition>;

    /// Scroll so the primary cursor is visible.
    fn scroll_to_cursor(&mut self);

    /// The host's own soft-wrap recomputation, bypassing any hook.
    fn run_reflow(&mut self);

    /// Route future recomputation requests through `hook`.
    fn install_reflow_hook(&mut self, hook: Rc<dyn ReflowHook>);

    /// Restore the host's ungated recomputation.
    fn remove_reflow_hook(&mut self);
}

/// Per-view event streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewTopic {
    /// View destroyed.
    Destroyed,
    /// Primary cursor moved.
    CursorMoved,
    /// A layout-affecting setting (soft wrap, wrap guide...) was toggled.
    LayoutToggled,
    /// A collaborator changed content height and asks for a resync.
    ResyncRequested,
    /// Mouse wheel over the view.
    Wheel,
    /// A smooth-scroll animation finished.
    ScrollAnimationEnded,
    /// The view's own element was resized.
    Resized,
}

impl ViewTopic {
    /// Every per-view topic a session listens to.
    pub const ALL: [ViewTopic; 7] = [
        ViewTopic::Destroyed,
        ViewTopic::CursorMoved,
        ViewTopic::LayoutToggled,
        ViewTopic::ResyncRequested,
        ViewTopic::Wheel,
        ViewTopic::ScrollAnimationEnded,
        ViewTopic::Resized,
    ];
}

/// Per-pane event streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaneTopic {
    /// Pane element resized.
    Resized,
    /// Pane destroyed.
    Destroyed,
}

/// Subscription key on the host event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// Views opened anywhere in the workspace.
    ViewOpened,
    /// Panes opened anywhere in the workspace.
    PaneOpened,
    /// Editor font size changed.
    FontSizeChanged,
    /// Stream scoped to one view.
    View(ViewId, ViewTopic),
    /// Stream scoped to one pane.
    Pane(PaneId, PaneTopic),
}

/// Event delivered by the host event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A view is open and its render component is ready.
    ViewOpened {
        /// The new view.
        view: ViewId,
        /// Pane hosting it.
        pane: PaneId,
        /// View this one was split/copied from, if any.
        copied_from: Option<ViewId>,
    },
    /// A view was destroyed.
    ViewDestroyed(ViewId),
    /// Primary cursor moved.
    CursorMoved {
        /// View whose cursor moved.
        view: ViewId,
        /// Position before the move.
        old: BufferPosition,
        /// Position after the move.
        new: BufferPosition,
    },
    /// A layout-affecting setting was toggled on a view.
    LayoutSettingToggled(ViewId),
    /// External request to resync a view's framing.
    ResyncRequested(ViewId),
    /// Mouse wheel over a view.
    Wheel(ViewId),
    /// A smooth-scroll animation finished.
    ScrollAnimationEnded(ViewId),
    /// A view's element was resized.
    ViewResized(ViewId),
    /// A pane was opened.
    PaneOpened(PaneId),
    /// A pane's element was resized.
    PaneResized {
        /// Resized pane.
        pane: PaneId,
        /// New width in pixels.
        width: f64,
        /// New height in pixels.
        height: f64,
    },
    /// A pane was destroyed.
    PaneDestroyed(PaneId),
    /// Editor font size changed.
    FontSizeChanged,
}

impl HostEvent {
    /// Topic this event is published on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::ViewOpened { .. } => Topic::ViewOpened,
            Self::ViewDestroyed(view) => Topic::View(*view, ViewTopic::Destroyed),
            Self::CursorMoved { view, .. } => Topic::View(*view, ViewTopic::CursorMoved),
            Self::LayoutSettingToggled(view) => Topic::View(*view, ViewTopic::LayoutToggled),
            Self::ResyncRequested(view) => Topic::View(*view, ViewTopic::ResyncRequested),
            Self::Wheel(view) => Topic::View(*view, ViewTopic::Wheel),
            Self::ScrollAnimationEnded(view) => {
                Topic::View(*view, ViewTopic::ScrollAnimationEnded)
            }
            Self::ViewResized(view) => Topic::View(*view, ViewTopic::Resized),
            Self::PaneOpened(_) => Topic::PaneOpened,
            Self::PaneResized { pane, .. } => Topic::Pane(*pane, PaneTopic::Resized),
            Self::PaneDestroyed(pane) => Topic::Pane(*pane, PaneTopic::Destroyed),
            Self::FontSizeChanged => Topic::FontSizeChanged,
        }
    }

    /// View a per-view event is about. `None` for global and pane events,
    /// and for `ViewOpened`, which is handled before a session exists.
    pub fn view(&self) -> Option<ViewId> {
        match self {
            Self::ViewDestroyed(view)
            | Self::CursorMoved { view, .. }
            | Self::LayoutSettingToggled(view)
            | Self::ResyncRequested(view)
            | Self::Wheel(view)
            | Self::ScrollAnimationEnded(view)
            | Self::ViewResized(view) => Some(*view),
            Self::ViewOpened { .. }
            | Self::PaneOpened(_)
            | Self::PaneResized { .. }
            | Self::PaneDestroyed(_)
            | Self::FontSizeChanged => None,
        }
    }
}

/// The host workspace: views, panes and the event bus.
pub trait Workspace {
    /// Render component of a live view.
    fn view_mut(&mut self, view: ViewId) -> Option<&mut dyn EditorView>;

    /// Views currently hosted by a pane, in tab order.
    fn views_in_pane(&self, pane: PaneId) -> Vec<ViewId>;

    /// Start listening on a topic.
    fn subscribe(&mut self, topic: Topic) -> SubscriptionId;

    /// Stop listening. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_events_map_to_view_topics() {
        let view = ViewId::new(1);
        assert_eq!(
            HostEvent::Wheel(view).topic(),
            Topic::View(view, ViewTopic::Wheel)
        );
        assert_eq!(
            HostEvent::ViewDestroyed(view).topic(),
            Topic::View(view, ViewTopic::Destroyed)
        );
    }

    #[test]
    fn pane_events_map_to_pane_topics() {
        let pane = PaneId::new(2);
        let event = HostEvent::PaneResized {
            pane,
            width: 10.0,
            height: 10.0,
        };
        assert_eq!(event.topic(), Topic::Pane(pane, PaneTopic::Resized));
    }

    #[test]
    fn opened_events_are_global() {
        let event = HostEvent::ViewOpened {
            view: ViewId::new(1),
            pane: PaneId::new(1),
            copied_from: None,
        };
        assert_eq!(event.topic(), Topic::ViewOpened);
        assert_eq!(HostEvent::FontSizeChanged.topic(), Topic::FontSizeChanged);
        assert_eq!(event.view(), None);
    }

    #[test]
    fn per_view_events_name_their_view() {
        let view = ViewId::new(3);
        let event = HostEvent::CursorMoved {
            view,
            old: BufferPosition::new(1, 0),
            new: BufferPosition::new(2, 0),
        };
        assert_eq!(event.view(), Some(view));
        assert_eq!(HostEvent::PaneDestroyed(PaneId::new(1)).view(), None);
    }
}
