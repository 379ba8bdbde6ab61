//! Tests for the restorer

use super::*;
use crate::host::simulated::{SimulatedView, ViewGeometry};
use crate::model::{BufferPosition, BufferRow};
use std::rc::Rc;

/// 200 rows. Every tenth row (5, 15, ...) is 150 columns wide, row 120 is 250.
fn lines() -> Vec<String> {
    (0..200)
        .map(|i| match i {
            120 => "y".repeat(250),
            i if i % 10 == 5 => "x".repeat(150),
            i => format!("line {i}"),
        })
        .collect()
}

/// Unwrapped 1200x600 view (40 rows of 15px visible) with a gate installed.
fn setup() -> (SimulatedView, Rc<ReflowGate>, AnchorTracker) {
    let mut view = SimulatedView::new(
        lines(),
        ViewGeometry {
            width: 1200.0,
            height: 600.0,
            font_size: 10.0,
            soft_wrap: false,
        },
    );
    let gate = Rc::new(ReflowGate::new());
    view.install_reflow_hook(gate.clone());
    (view, gate, AnchorTracker::new(ReferencePolicy::Center))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1.0,
        "expected {expected} ± 1px, got {actual}"
    );
}

#[test]
fn first_restore_centers_cursor_and_samples_it() {
    let (mut view, gate, mut tracker) = setup();
    view.set_cursor(BufferPosition::new(100, 0));
    let mut restorer = Restorer::new();

    let outcome = restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("first restore never fails");

    // Row 100 at 1500px, centered: 1500 - (600 - 15) / 2
    assert_eq!(view.scroll_offset(), 1207.5);
    let anchor = Anchor::new(BufferRow::new(100), -7.5);
    assert_eq!(outcome, RestoreOutcome::FirstOpen { anchor: Some(anchor) });
    assert_eq!(tracker.anchor(), Some(anchor));
    assert!(!restorer.first_pending());
    assert!(gate.is_frozen());
}

#[test]
fn first_restore_without_geometry_then_skips() {
    let (mut view, gate, mut tracker) = setup();
    view.set_geometry_available(false);
    let mut restorer = Restorer::new();

    let first = restorer.restore(&mut view, &mut tracker, &gate);
    assert_eq!(first, Ok(RestoreOutcome::FirstOpen { anchor: None }));

    let second = restorer.restore(&mut view, &mut tracker, &gate);
    assert_eq!(second, Ok(RestoreOutcome::Skipped));
}

#[test]
fn restore_after_rewrap_keeps_row_at_reference() {
    let (mut view, gate, mut tracker) = setup();
    let mut restorer = Restorer::new();
    restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("first restore");

    // Rows 100..140 visible, row 120 on the center line
    view.set_scroll_offset(1500.0);
    let anchor = tracker
        .sample(&view, SampleMode::ViewportReference)
        .expect("geometry available");
    assert_eq!(anchor, Anchor::new(BufferRow::new(120), 0.0));

    view.set_soft_wrap(true);
    view.set_width(600.0);
    assert_eq!(view.wrap_column(), None, "Reflow must wait for the restore");

    let outcome = restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("anchor still valid");

    assert_eq!(view.wrap_column(), Some(100));
    assert_eq!(view.rows_for_buffer_row(BufferRow::new(120)), Some(3));
    // Twelve rows above 120 now take two screen rows: 132 * 15 - 300
    assert_eq!(outcome, RestoreOutcome::Applied { offset: 1680.0 });
    let top = view
        .row_top_in_viewport(BufferRow::new(120))
        .expect("row still rendered");
    assert_close(top, 300.0);
}

#[test]
fn restore_is_idempotent() {
    let (mut view, gate, mut tracker) = setup();
    let mut restorer = Restorer::new();
    restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("first restore");
    view.set_scroll_offset(900.0);
    tracker
        .sample(&view, SampleMode::ViewportReference)
        .expect("geometry available");
    view.set_width(700.0);

    let first = restorer.restore(&mut view, &mut tracker, &gate);
    let second = restorer.restore(&mut view, &mut tracker, &gate);

    assert!(first.is_ok());
    assert_eq!(first, second);
}

#[test]
fn deferred_reflows_flush_exactly_once() {
    let (mut view, gate, mut tracker) = setup();
    let mut restorer = Restorer::new();
    restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("first restore");
    let before = view.reflow_count();

    for width in [1100.0, 1000.0, 900.0, 800.0, 700.0] {
        view.set_width(width);
    }
    assert_eq!(view.reflow_count(), before);
    assert_eq!(gate.stats().deferred, 5);
    assert_eq!(gate.stats().passed, 0);

    restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("anchor valid");

    assert_eq!(view.reflow_count(), before + 1);
    assert_eq!(gate.stats().flushed, 1);
    assert!(gate.is_frozen());
}

#[test]
fn stale_anchor_leaves_viewport_alone() {
    let (mut view, gate, mut tracker) = setup();
    let mut restorer = Restorer::new();
    restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("first restore");
    tracker.adopt(Anchor::new(BufferRow::new(190), 0.0));
    view.set_scroll_offset(600.0);
    view.splice_lines(100..200, Vec::new());

    let err = restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect_err("row 190 is gone");

    assert_eq!(
        err,
        RestoreError::StaleAnchor {
            row: BufferRow::new(190)
        }
    );
    assert_eq!(view.scroll_offset(), 600.0);
    assert!(gate.is_frozen(), "Gate must be re-frozen on the error path");
}

#[test]
fn unmeasured_viewport_aborts_restore() {
    let (mut view, gate, mut tracker) = setup();
    let mut restorer = Restorer::new();
    restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("first restore");
    tracker.adopt(Anchor::new(BufferRow::new(10), 0.0));
    view.set_scroll_offset(45.0);
    view.set_height(f64::NAN);

    let err = restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect_err("height unknown");

    assert!(matches!(err, RestoreError::GeometryUnavailable { .. }));
    assert_eq!(view.scroll_offset(), 45.0);
    assert!(gate.is_frozen());
}

#[test]
fn inherited_anchor_is_applied_and_adopted() {
    let (mut view, gate, mut tracker) = setup();
    let inherited = Anchor::new(BufferRow::new(50), -30.0);
    let mut restorer = Restorer::with_inherited(Some(inherited));

    let outcome = restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("inherited anchor valid");

    // Row 50 at 750px, 30px above the 300px center line
    assert_eq!(outcome, RestoreOutcome::Applied { offset: 480.0 });
    assert_eq!(tracker.anchor(), Some(inherited));
}

#[test]
fn stale_inherited_anchor_falls_back_to_cursor() {
    let (mut view, gate, mut tracker) = setup();
    view.set_cursor(BufferPosition::new(100, 0));
    let mut restorer = Restorer::with_inherited(Some(Anchor::new(BufferRow::new(500), 0.0)));

    let outcome = restorer
        .restore(&mut view, &mut tracker, &gate)
        .expect("first restore never fails");

    match outcome {
        RestoreOutcome::FirstOpen { anchor: Some(anchor) } => {
            assert_eq!(anchor.buffer_row, BufferRow::new(100));
        }
        other => panic!("expected cursor fallback, got {other:?}"),
    }
}
