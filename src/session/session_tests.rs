//! Tests for the view session

use super::*;
use crate::host::simulated::{SimulatedView, SimulatedWorkspace, ViewGeometry};
use crate::model::BufferRow;
use std::time::Duration;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// One 600x150 pane with a 200-line view (15px rows, 10 visible).
fn workspace() -> (SimulatedWorkspace, ViewId, PaneId) {
    let mut ws = SimulatedWorkspace::new();
    let pane = ws.add_pane(600.0, 150.0);
    let lines = (0..200).map(|i| format!("line {i}")).collect();
    let view = ws
        .open_view(pane, SimulatedView::new(lines, ViewGeometry::default()))
        .expect("pane exists");
    (ws, view, pane)
}

fn active_session() -> (SimulatedWorkspace, ViewSession) {
    let (mut ws, view, pane) = workspace();
    let mut session = ViewSession::new(view, pane, &Settings::default(), None);
    session.activate(&mut ws);
    (ws, session)
}

fn pump(ws: &mut SimulatedWorkspace, session: &mut ViewSession, now: Instant) {
    for event in ws.take_events() {
        session.handle_event(ws, &event, now);
    }
}

#[test]
fn activate_wires_subscriptions_and_hook() {
    let (mut ws, view, pane) = workspace();
    let mut session = ViewSession::new(view, pane, &Settings::default(), None);
    assert_eq!(session.state(), SessionState::Uninitialized);

    let outcome = session.activate(&mut ws);

    assert!(matches!(outcome, Some(RestoreOutcome::FirstOpen { anchor: Some(_) })));
    assert!(session.is_active());
    assert_eq!(ws.subscription_count(), ViewTopic::ALL.len());
    assert_eq!(session.registration_count(), ViewTopic::ALL.len() + 1);
    assert!(ws.view(view).expect("view open").has_reflow_hook());
    assert_eq!(session.anchor().map(|a| a.buffer_row), Some(BufferRow::new(0)));
}

#[test]
fn first_layout_change_after_activation_is_deferred() {
    let (mut ws, session) = active_session();
    let view = session.view();
    let reflows = ws.view(view).expect("view open").reflow_count();

    ws.set_soft_wrap(view, false);

    let sim = ws.view(view).expect("view open");
    assert_eq!(sim.reflow_count(), reflows);
    assert!(sim.reflow_pending());
    assert_eq!(session.gate_stats().deferred, 1);
    assert_eq!(session.gate_stats().passed, 0);
}

#[test]
fn pending_session_still_hears_destroy() {
    let mut ws = SimulatedWorkspace::new();
    let view = ViewId::new(7);
    let mut session = ViewSession::new(view, PaneId::new(1), &Settings::default(), None);

    session.watch_destroyed(&mut ws);
    session.watch_destroyed(&mut ws);
    assert_eq!(ws.subscription_count(), 1);
    assert_eq!(session.state(), SessionState::Uninitialized);

    session.handle_event(&mut ws, &HostEvent::ViewDestroyed(view), Instant::now());

    assert_eq!(session.state(), SessionState::Destroyed);
    assert_eq!(ws.subscription_count(), 0);
}

#[test]
fn activate_waits_for_render_component() {
    let mut ws = SimulatedWorkspace::new();
    let mut session = ViewSession::new(ViewId::new(7), PaneId::new(1), &Settings::default(), None);

    assert_eq!(session.activate(&mut ws), None);
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert_eq!(ws.subscription_count(), 0);
}

#[test]
fn activate_twice_is_a_noop() {
    let (mut ws, mut session) = active_session();
    assert_eq!(session.activate(&mut ws), None);
    assert_eq!(ws.subscription_count(), ViewTopic::ALL.len());
}

#[test]
fn wheel_burst_samples_once_per_window() {
    let (mut ws, mut session) = active_session();
    let view = session.view();
    let t0 = Instant::now();

    ws.wheel(view, 300.0);
    pump(&mut ws, &mut session, t0);
    // center line at 375px → row 25
    assert_eq!(session.anchor().map(|a| a.buffer_row), Some(BufferRow::new(25)));

    ws.wheel(view, 150.0);
    pump(&mut ws, &mut session, t0 + ms(50));
    assert_eq!(
        session.anchor().map(|a| a.buffer_row),
        Some(BufferRow::new(25)),
        "Second wheel event inside the window must be dropped"
    );

    ws.wheel(view, 15.0);
    pump(&mut ws, &mut session, t0 + ms(100));
    // scroll 465, center 540 → row 36
    assert_eq!(session.anchor().map(|a| a.buffer_row), Some(BufferRow::new(36)));
}

#[test]
fn cursor_move_samples_cursor_row() {
    let (mut ws, mut session) = active_session();
    let view = session.view();

    ws.move_cursor(view, BufferPosition::new(40, 0));
    pump(&mut ws, &mut session, Instant::now());

    assert_eq!(session.anchor().map(|a| a.buffer_row), Some(BufferRow::new(40)));
}

#[test]
fn unchanged_cursor_position_is_ignored() {
    let (mut ws, mut session) = active_session();
    let t0 = Instant::now();
    let same = BufferPosition::new(0, 0);

    session.on_cursor_moved(&mut ws, same, same, t0);

    // The window was not consumed: a real move right after still samples
    ws.sim_view_mut(session.view())
        .expect("view open")
        .set_cursor(BufferPosition::new(12, 0));
    session.on_cursor_moved(&mut ws, same, BufferPosition::new(12, 0), t0 + ms(1));
    assert_eq!(session.anchor().map(|a| a.buffer_row), Some(BufferRow::new(12)));
}

#[test]
fn scroll_animation_end_is_not_throttled() {
    let (mut ws, mut session) = active_session();
    let view = session.view();
    let t0 = Instant::now();

    ws.finish_scroll_animation(view, 300.0);
    pump(&mut ws, &mut session, t0);
    ws.finish_scroll_animation(view, 600.0);
    pump(&mut ws, &mut session, t0);

    // scroll 600, center 675 → row 45
    assert_eq!(session.anchor().map(|a| a.buffer_row), Some(BufferRow::new(45)));
}

#[test]
fn layout_toggles_debounce_into_one_restore() {
    let (mut ws, mut session) = active_session();
    let view = session.view();
    let t0 = Instant::now();
    let restores = session.restore_count();

    ws.set_soft_wrap(view, false);
    pump(&mut ws, &mut session, t0);
    ws.set_soft_wrap(view, true);
    pump(&mut ws, &mut session, t0 + ms(50));

    assert_eq!(session.next_deadline(), Some(t0 + ms(150)));
    assert_eq!(session.fire_due(&mut ws, t0 + ms(149)), None);
    assert!(matches!(
        session.fire_due(&mut ws, t0 + ms(150)),
        Some(RestoreOutcome::Applied { .. })
    ));
    assert_eq!(session.fire_due(&mut ws, t0 + ms(500)), None);
    assert_eq!(session.restore_count(), restores + 1);
}

#[test]
fn triggers_due_together_share_one_restore() {
    let (mut ws, mut session) = active_session();
    let t0 = Instant::now();
    let restores = session.restore_count();

    session.schedule_restore(RestoreTrigger::Resync, t0);
    session.schedule_restore(RestoreTrigger::ViewResize, t0);
    session.fire_due(&mut ws, t0 + ms(100));

    assert_eq!(session.restore_count(), restores + 1);
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn destroy_releases_everything_and_is_idempotent() {
    let (mut ws, mut session) = active_session();
    let view = session.view();
    let t0 = Instant::now();
    session.schedule_restore(RestoreTrigger::LayoutToggle, t0);
    let restores = session.restore_count();

    session.destroy(&mut ws);
    session.destroy(&mut ws);

    assert_eq!(session.state(), SessionState::Destroyed);
    assert_eq!(ws.subscription_count(), 0);
    assert!(!ws.view(view).expect("view still open").has_reflow_hook());
    assert_eq!(session.next_deadline(), None);
    assert_eq!(session.fire_due(&mut ws, t0 + ms(1000)), None);
    assert_eq!(session.restore_count(), restores);
}

#[test]
fn destroyed_session_ignores_events() {
    let (mut ws, mut session) = active_session();
    let view = session.view();
    let before = session.anchor();
    session.destroy(&mut ws);

    ws.sim_view_mut(view).expect("view open").scroll_by(900.0);
    session.handle_event(&mut ws, &HostEvent::Wheel(view), Instant::now());
    session.schedule_restore(RestoreTrigger::Resync, Instant::now());

    assert_eq!(session.anchor(), before);
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn view_destroy_signal_tears_down_after_host_is_gone() {
    let (mut ws, mut session) = active_session();
    let view = session.view();

    ws.close_view(view);
    pump(&mut ws, &mut session, Instant::now());

    assert_eq!(session.state(), SessionState::Destroyed);
    assert_eq!(ws.subscription_count(), 0);
    assert_eq!(session.registration_count(), 0);
}

#[test]
fn events_for_other_views_are_ignored() {
    let (mut ws, mut session) = active_session();
    let before = session.anchor();

    session.handle_event(&mut ws, &HostEvent::Wheel(ViewId::new(999)), Instant::now());
    session.handle_event(&mut ws, &HostEvent::ViewDestroyed(ViewId::new(999)), Instant::now());

    assert!(session.is_active());
    assert_eq!(session.anchor(), before);
}
