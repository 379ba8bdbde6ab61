//! Scenario replay against the simulated host.
//!
//! A scenario is a TOML file declaring panes, views and a list of steps.
//! Replaying it reports, after setup and after every step, where each view is
//! scrolled and which buffer row sits on the reference line.
//!
//! ```toml
//! [[panes]]
//! name = "main"
//! width = 1200
//! height = 600
//!
//! [[views]]
//! name = "doc"
//! pane = "main"
//! lines = 200
//! soft_wrap = false
//! long_lines = [{ row = 120, width = 250 }]
//!
//! [[steps]]
//! kind = "scroll"
//! view = "doc"
//! offset = 1500
//!
//! [[steps]]
//! kind = "resize_pane"
//! pane = "main"
//! width = 600
//! height = 600
//!
//! [[steps]]
//! kind = "advance"
//! ms = 150
//! ```

mod driver;

pub use driver::Driver;

use crate::config::Settings;
use crate::host::simulated::{SimulatedView, ViewGeometry};
use crate::host::EditorView;
use crate::model::{BufferPosition, PaneId, ViewId};
use crate::reflow::GateStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors loading or replaying a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Scenario file could not be read.
    #[error("Failed to read scenario at {path:?}: {source}")]
    Read {
        /// Scenario path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Scenario file is not valid scenario TOML.
    #[error("Invalid scenario in {path:?}: {reason}")]
    Parse {
        /// Scenario path.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// Two panes or two views share a name.
    #[error("Duplicate name {0:?}")]
    DuplicateName(String),

    /// A view or step names a pane that was never declared.
    #[error("Unknown pane {0:?}")]
    UnknownPane(String),

    /// A step names a view that was never declared or was closed.
    #[error("Unknown view {0:?}")]
    UnknownView(String),
}

/// A declared pane.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PaneSpec {
    /// Name used by views and steps.
    pub name: String,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

/// A generated line wider than the default filler.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LongLine {
    /// Buffer row.
    pub row: usize,
    /// Display width in columns.
    pub width: usize,
}

/// A declared view.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ViewSpec {
    /// Name used by steps and the report.
    pub name: String,
    /// Pane the view opens in.
    pub pane: String,
    /// Literal text. Overrides the generated lines when present.
    #[serde(default)]
    pub text: Option<String>,
    /// Number of generated lines.
    #[serde(default = "default_line_count")]
    pub lines: usize,
    /// Generated lines of a given width.
    #[serde(default)]
    pub long_lines: Vec<LongLine>,
    /// Font size in pixels.
    #[serde(default)]
    pub font_size: Option<f64>,
    /// Soft wrap, on by default.
    #[serde(default)]
    pub soft_wrap: Option<bool>,
    /// Initial cursor `[row, column]`.
    #[serde(default)]
    pub cursor: Option<[usize; 2]>,
}

fn default_line_count() -> usize {
    200
}

/// One scripted action.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Smooth scroll that ends at `offset`.
    Scroll {
        /// Target view.
        view: String,
        /// Final scroll offset in pixels.
        offset: f64,
    },
    /// Mouse wheel by `delta` pixels.
    Wheel {
        /// Target view.
        view: String,
        /// Scroll delta in pixels.
        delta: f64,
    },
    /// Move the primary cursor.
    Cursor {
        /// Target view.
        view: String,
        /// Buffer row.
        row: usize,
        /// Column.
        #[serde(default)]
        column: usize,
    },
    /// Resize a pane.
    ResizePane {
        /// Target pane.
        pane: String,
        /// New width.
        width: f64,
        /// New height.
        height: f64,
    },
    /// Change the font size of every view.
    FontSize {
        /// New font size.
        size: f64,
    },
    /// Toggle soft wrap on a view.
    ToggleWrap {
        /// Target view.
        view: String,
    },
    /// Ask a view to resync.
    Resync {
        /// Target view.
        view: String,
    },
    /// Let virtual time pass.
    Advance {
        /// Milliseconds.
        ms: u64,
    },
    /// Destroy a view.
    Close {
        /// Target view.
        view: String,
    },
    /// Open a copy of a view.
    Split {
        /// Source view.
        view: String,
        /// Pane for the copy.
        pane: String,
        /// Name of the copy.
        name: String,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scroll { view, offset } => write!(f, "scroll {view} to {offset}"),
            Self::Wheel { view, delta } => write!(f, "wheel {view} by {delta}"),
            Self::Cursor { view, row, column } => write!(f, "cursor {view} to {row}:{column}"),
            Self::ResizePane {
                pane,
                width,
                height,
            } => write!(f, "resize {pane} to {width}x{height}"),
            Self::FontSize { size } => write!(f, "font size {size}"),
            Self::ToggleWrap { view } => write!(f, "toggle wrap on {view}"),
            Self::Resync { view } => write!(f, "resync {view}"),
            Self::Advance { ms } => write!(f, "advance {ms}ms"),
            Self::Close { view } => write!(f, "close {view}"),
            Self::Split { view, pane, name } => write!(f, "split {view} into {pane} as {name}"),
        }
    }
}

/// A complete scenario file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Panes, opened first.
    #[serde(default)]
    pub panes: Vec<PaneSpec>,
    /// Views, opened in order.
    #[serde(default)]
    pub views: Vec<ViewSpec>,
    /// Steps, run in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse scenario TOML.
    pub fn parse(source: &str, path: &Path) -> Result<Self, ScenarioError> {
        toml::from_str(source).map_err(|e| ScenarioError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, path)
    }
}

/// State of one view after a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewReport {
    /// View name.
    pub view: String,
    /// Scroll offset in pixels.
    pub scroll_offset: f64,
    /// Buffer row under the reference line.
    pub reference_row: Option<usize>,
    /// Row of the stored anchor.
    pub anchor_row: Option<usize>,
    /// Stored anchor's offset from the reference line.
    pub anchor_offset: Option<f64>,
    /// Wrap column in effect.
    pub wrap_column: Option<usize>,
    /// Gate counters.
    pub gate: GateStats,
}

/// Snapshot taken after setup or after a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// 0 for setup, then 1-based step number.
    pub index: usize,
    /// What ran.
    pub step: String,
    /// Virtual milliseconds since setup.
    pub elapsed_ms: u64,
    /// Restores run by timers during this step.
    pub restores: usize,
    /// Every open view, in declaration order.
    pub views: Vec<ViewReport>,
}

/// Result of a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// One entry for setup and one per step.
    pub steps: Vec<StepReport>,
}

impl Report {
    /// Latest state of a view, if it was still open after the last step.
    pub fn final_view(&self, name: &str) -> Option<&ViewReport> {
        self.steps.last()?.views.iter().find(|v| v.view == name)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(
                f,
                "#{:<3} +{:>5}ms  {} ({} restores)",
                step.index, step.elapsed_ms, step.step, step.restores
            )?;
            for view in &step.views {
                let row = view
                    .reference_row
                    .map_or_else(|| "-".to_string(), |r| r.to_string());
                let anchor = match (view.anchor_row, view.anchor_offset) {
                    (Some(r), Some(o)) => format!("{r}{o:+.1}px"),
                    _ => "-".to_string(),
                };
                writeln!(
                    f,
                    "      {:<12} scroll {:>9.1}  row {:>5}  anchor {:>12}",
                    view.view, view.scroll_offset, row, anchor
                )?;
            }
        }
        Ok(())
    }
}

/// Text of one generated line.
/// Whole milliseconds, saturating at `u64::MAX`.
fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn generated_line(row: usize, width: Option<usize>) -> String {
    match width {
        Some(width) => "lorem ipsum dolor sit amet "
            .chars()
            .cycle()
            .take(width)
            .collect(),
        None => format!("line {row}"),
    }
}

fn build_view(spec: &ViewSpec, pane: &PaneSpec) -> SimulatedView {
    let geometry = ViewGeometry {
        width: pane.width,
        height: pane.height,
        font_size: spec.font_size.unwrap_or(ViewGeometry::default().font_size),
        soft_wrap: spec.soft_wrap.unwrap_or(true),
    };
    let mut view = match &spec.text {
        Some(text) => SimulatedView::from_text(text, geometry),
        None => {
            let widths: BTreeMap<usize, usize> =
                spec.long_lines.iter().map(|l| (l.row, l.width)).collect();
            let lines = (0..spec.lines)
                .map(|row| generated_line(row, widths.get(&row).copied()))
                .collect();
            SimulatedView::new(lines, geometry)
        }
    };
    if let Some([row, column]) = spec.cursor {
        view.set_cursor(BufferPosition::new(row, column));
    }
    view
}

/// Replays a scenario.
struct Replay<'a> {
    driver: Driver,
    settings: Settings,
    panes: BTreeMap<&'a str, PaneId>,
    views: Vec<(String, ViewId)>,
}

impl<'a> Replay<'a> {
    fn pane(&self, name: &str) -> Result<PaneId, ScenarioError> {
        self.panes
            .get(name)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownPane(name.to_string()))
    }

    fn view(&self, name: &str) -> Result<ViewId, ScenarioError> {
        self.views
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| ScenarioError::UnknownView(name.to_string()))
    }

    fn add_view_name(&mut self, name: &str, id: ViewId) -> Result<(), ScenarioError> {
        if self.views.iter().any(|(n, _)| n == name) {
            return Err(ScenarioError::DuplicateName(name.to_string()));
        }
        self.views.push((name.to_string(), id));
        Ok(())
    }

    fn run_step(&mut self, step: &Step) -> Result<usize, ScenarioError> {
        let restores = match step {
            Step::Scroll { view, offset } => {
                let id = self.view(view)?;
                self.driver
                    .with(|ws| ws.finish_scroll_animation(id, *offset));
                0
            }
            Step::Wheel { view, delta } => {
                let id = self.view(view)?;
                self.driver.with(|ws| ws.wheel(id, *delta));
                0
            }
            Step::Cursor { view, row, column } => {
                let id = self.view(view)?;
                let position = BufferPosition::new(*row, *column);
                self.driver.with(|ws| ws.move_cursor(id, position));
                0
            }
            Step::ResizePane {
                pane,
                width,
                height,
            } => {
                let id = self.pane(pane)?;
                self.driver.with(|ws| ws.resize_pane(id, *width, *height));
                0
            }
            Step::FontSize { size } => {
                self.driver.with(|ws| ws.set_font_size(*size));
                0
            }
            Step::ToggleWrap { view } => {
                let id = self.view(view)?;
                self.driver.with(|ws| {
                    let wrapped = ws.view(id).map(|v| v.geometry().soft_wrap);
                    if let Some(wrapped) = wrapped {
                        ws.set_soft_wrap(id, !wrapped);
                    }
                });
                0
            }
            Step::Resync { view } => {
                let id = self.view(view)?;
                self.driver.with(|ws| ws.request_resync(id));
                0
            }
            Step::Advance { ms } => self.driver.advance(Duration::from_millis(*ms)),
            Step::Close { view } => {
                let id = self.view(view)?;
                self.driver.with(|ws| ws.close_view(id));
                self.views.retain(|(_, v)| *v != id);
                0
            }
            Step::Split { view, pane, name } => {
                let source = self.view(view)?;
                let pane_id = self.pane(pane)?;
                let copy = self
                    .driver
                    .with(|ws| ws.split_view(source, pane_id))
                    .ok_or_else(|| ScenarioError::UnknownView(view.clone()))?;
                self.add_view_name(name, copy)?;
                0
            }
        };
        Ok(restores)
    }

    fn snapshot(&self, index: usize, step: String, elapsed: Duration, restores: usize) -> StepReport {
        let fraction = self.settings.reference.fraction();
        let views = self
            .views
            .iter()
            .filter_map(|(name, id)| {
                let view = self.driver.workspace().view(*id)?;
                let anchor = self
                    .driver
                    .registry()
                    .session(*id)
                    .and_then(|s| s.anchor());
                let gate = self
                    .driver
                    .registry()
                    .session(*id)
                    .map(|s| s.gate_stats())
                    .unwrap_or_default();
                Some(ViewReport {
                    view: name.clone(),
                    scroll_offset: view.scroll_offset(),
                    reference_row: view.buffer_row_at(fraction).map(|r| r.get()),
                    anchor_row: anchor.map(|a| a.buffer_row.get()),
                    anchor_offset: anchor.map(|a| a.offset_from_reference),
                    wrap_column: view.wrap_column(),
                    gate,
                })
            })
            .collect();
        StepReport {
            index,
            step,
            elapsed_ms: saturating_millis(elapsed),
            restores,
            views,
        }
    }
}

/// Replay `scenario` with `settings` and report after setup and every step.
///
/// # Errors
///
/// Fails on duplicate names or references to unknown panes and views.
pub fn run(scenario: &Scenario, settings: Settings) -> Result<Report, ScenarioError> {
    let mut replay = Replay {
        driver: Driver::new(settings.clone()),
        settings,
        panes: BTreeMap::new(),
        views: Vec::new(),
    };
    let start = replay.driver.now();

    for pane in &scenario.panes {
        if replay.panes.contains_key(pane.name.as_str()) {
            return Err(ScenarioError::DuplicateName(pane.name.clone()));
        }
        let id = replay.driver.with(|ws| ws.add_pane(pane.width, pane.height));
        replay.panes.insert(pane.name.as_str(), id);
    }

    for spec in &scenario.views {
        let pane_spec = scenario
            .panes
            .iter()
            .find(|p| p.name == spec.pane)
            .ok_or_else(|| ScenarioError::UnknownPane(spec.pane.clone()))?;
        let pane = replay.pane(&spec.pane)?;
        let view = build_view(spec, pane_spec);
        let id = replay
            .driver
            .with(|ws| ws.open_view(pane, view))
            .ok_or_else(|| ScenarioError::UnknownPane(spec.pane.clone()))?;
        replay.add_view_name(&spec.name, id)?;
        debug!(view = %id, name = %spec.name, "scenario view opened");
    }

    let mut report = Report::default();
    report
        .steps
        .push(replay.snapshot(0, "setup".to_string(), Duration::ZERO, 0));

    for (i, step) in scenario.steps.iter().enumerate() {
        let restores = replay.run_step(step)?;
        let elapsed = replay.driver.now().saturating_duration_since(start);
        report
            .steps
            .push(replay.snapshot(i + 1, step.to_string(), elapsed, restores));
    }

    info!(steps = scenario.steps.len(), "scenario replayed");
    Ok(report)
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;
