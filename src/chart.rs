//! SVG rendering of the cumulative payback curve.
//!
//! [`ChartGeometry`] holds the computed layout (paths, gridlines, break-even
//! marker) so it can be tested without parsing SVG; [`SvgPaybackChart`]
//! serializes it as a standalone document.

use std::fmt;
use std::io::{self, Write};

use crate::report::{PlanPresenter, PresentedPlan};
use crate::sizing::types::{InstallationPlan, PaybackPoint};

const WIDTH: f64 = 270.0;
const HEIGHT: f64 = 140.0;
const PAD_TOP: f64 = 10.0;
const PAD_RIGHT: f64 = 10.0;
const PAD_BOTTOM: f64 = 24.0;
const PAD_LEFT: f64 = 46.0;

/// Headroom above the investment line and room below zero, as cost fractions.
const TOP_MARGIN: f64 = 1.1;
const BOTTOM_MARGIN: f64 = 0.12;

const Y_TICKS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
const X_TICK_STEP: u32 = 5;

const SAVINGS_COLOR: &str = "#2DDBA4";
const INVESTMENT_COLOR: &str = "#f87171";
const BREAK_EVEN_COLOR: &str = "#F5C842";
const LABEL_COLOR: &str = "#7a8fa6";

/// A horizontal gridline with its value label.
#[derive(Debug, Clone, PartialEq)]
pub struct YTick {
    pub y: f64,
    pub label: String,
}

/// Computed chart layout in SVG user units.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub savings_path: String,
    pub investment_path: String,
    /// Savings curve closed down to the zero line.
    pub area_path: String,
    pub zero_y: f64,
    pub y_ticks: Vec<YTick>,
    /// `(x, year)` of the horizontal axis labels.
    pub x_ticks: Vec<(f64, u32)>,
    /// x position of the break-even year, if any.
    pub break_even_x: Option<f64>,
}

impl ChartGeometry {
    /// Lays out `timeline` for an installation costing `investment_eur`.
    ///
    /// A zero-cost installation still gets a unit value range so the scales
    /// stay finite.
    pub fn layout(timeline: &[PaybackPoint], investment_eur: i64, break_even: Option<u32>) -> Self {
        let horizon = timeline.last().map_or(1, |p| p.year.max(1));
        let cost = if investment_eur > 0 {
            investment_eur as f64
        } else {
            1.0
        };
        let max_val = cost * TOP_MARGIN;
        let min_val = -cost * BOTTOM_MARGIN;
        let range = max_val - min_val;
        let inner_w = WIDTH - PAD_LEFT - PAD_RIGHT;
        let inner_h = HEIGHT - PAD_TOP - PAD_BOTTOM;

        let xs = |year: u32| PAD_LEFT + f64::from(year) / f64::from(horizon) * inner_w;
        let ys = |v: f64| PAD_TOP + inner_h - (v - min_val) / range * inner_h;
        let zero_y = ys(0.0);

        let savings_path = timeline
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let cmd = if i == 0 { 'M' } else { 'L' };
                format!(
                    "{cmd}{:.1},{:.1}",
                    xs(p.year),
                    ys(p.cumulative_savings_eur as f64)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        let investment_y = ys(investment_eur as f64);
        let investment_path = format!(
            "M{:.1},{investment_y:.1} L{:.1},{investment_y:.1}",
            xs(0),
            xs(horizon)
        );
        let area_path = format!(
            "{savings_path} L{:.1},{zero_y:.1} L{:.1},{zero_y:.1} Z",
            xs(horizon),
            xs(0)
        );

        let y_ticks = Y_TICKS
            .iter()
            .map(|t| YTick {
                y: PAD_TOP + t * inner_h,
                label: money_label(max_val - t * range),
            })
            .collect();
        let x_ticks = (0..=horizon)
            .step_by(X_TICK_STEP as usize)
            .map(|year| (xs(year), year))
            .collect();

        Self {
            savings_path,
            investment_path,
            area_path,
            zero_y,
            y_ticks,
            x_ticks,
            break_even_x: break_even.map(xs),
        }
    }

    /// Lays out a plan's own timeline and break-even year.
    pub fn for_plan(plan: &InstallationPlan) -> Self {
        Self::layout(
            &plan.payback_timeline,
            i64::from(plan.installation_cost_eur),
            plan.break_even_year(),
        )
    }

    /// Serializes the layout as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChartGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let right = WIDTH - PAD_RIGHT;
        let bottom = HEIGHT - PAD_BOTTOM;
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" width="{WIDTH}" height="{HEIGHT}">"#
        )?;
        writeln!(
            f,
            r#"  <defs><linearGradient id="savings-fill" x1="0" y1="0" x2="0" y2="1"><stop offset="0%" stop-color="{SAVINGS_COLOR}" stop-opacity="0.3"/><stop offset="100%" stop-color="{SAVINGS_COLOR}" stop-opacity="0"/></linearGradient></defs>"#
        )?;
        for tick in &self.y_ticks {
            writeln!(
                f,
                r#"  <line x1="{PAD_LEFT}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="rgba(26,46,74,0.06)" stroke-width="1"/>"#,
                y = tick.y
            )?;
            writeln!(
                f,
                r#"  <text x="{:.0}" y="{:.1}" font-size="7.5" fill="{LABEL_COLOR}" text-anchor="end">{}€</text>"#,
                PAD_LEFT - 3.0,
                tick.y + 3.0,
                tick.label
            )?;
        }
        for (x, year) in &self.x_ticks {
            writeln!(
                f,
                r#"  <text x="{x:.1}" y="{:.1}" font-size="7.5" fill="{LABEL_COLOR}" text-anchor="middle">{year}y</text>"#,
                HEIGHT - 5.0
            )?;
        }
        writeln!(
            f,
            r#"  <line x1="{PAD_LEFT}" y1="{z:.1}" x2="{right}" y2="{z:.1}" stroke="rgba(26,46,74,0.18)" stroke-width="1" stroke-dasharray="3,2"/>"#,
            z = self.zero_y
        )?;
        writeln!(
            f,
            r#"  <path d="{}" fill="url(#savings-fill)"/>"#,
            self.area_path
        )?;
        writeln!(
            f,
            r#"  <path d="{}" fill="none" stroke="{INVESTMENT_COLOR}" stroke-width="1.5" stroke-dasharray="5,3"/>"#,
            self.investment_path
        )?;
        writeln!(
            f,
            r#"  <path d="{}" fill="none" stroke="{SAVINGS_COLOR}" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"/>"#,
            self.savings_path
        )?;
        if let Some(x) = self.break_even_x {
            writeln!(
                f,
                r#"  <line x1="{x:.1}" y1="{PAD_TOP}" x2="{x:.1}" y2="{bottom:.1}" stroke="{BREAK_EVEN_COLOR}" stroke-width="1.5" stroke-dasharray="3,2"/>"#
            )?;
            writeln!(
                f,
                r#"  <circle cx="{x:.1}" cy="{z:.1}" r="4" fill="{BREAK_EVEN_COLOR}" stroke="white" stroke-width="1.5"/>"#,
                z = self.zero_y
            )?;
            writeln!(
                f,
                r#"  <text x="{:.1}" y="{:.1}" font-size="8" fill="{BREAK_EVEN_COLOR}" font-weight="700">Break-even</text>"#,
                x + 5.0,
                self.zero_y - 5.0
            )?;
        }
        writeln!(f, "</svg>")
    }
}

/// Axis label: thousands as `"5.5k"`, smaller values as whole euros.
fn money_label(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{:.1}k", value / 1000.0)
    } else {
        format!("{}", value.round() as i64)
    }
}

/// Presenter writing the payback chart of the presented plan as SVG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgPaybackChart;

impl PlanPresenter for SvgPaybackChart {
    fn present(&self, view: &PresentedPlan<'_>, out: &mut dyn Write) -> io::Result<()> {
        write!(out, "{}", ChartGeometry::for_plan(view.plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::payback::{break_even_year, build_timeline};
    use crate::sizing::{Region, RoofProfile, RoofType, compute_plan};

    fn reference_plan() -> InstallationPlan {
        compute_plan(&RoofProfile::new(
            40.0,
            300.0,
            RoofType::SouthFacingPitched,
            Region::Lisbon,
        ))
        .expect("valid profile")
    }

    #[test]
    fn savings_path_has_one_point_per_year() {
        let g = ChartGeometry::for_plan(&reference_plan());
        assert!(g.savings_path.starts_with("M46.0,"));
        assert_eq!(g.savings_path.matches('L').count(), 15);
        assert!(g.area_path.ends_with(" Z"));
    }

    #[test]
    fn zero_line_sits_above_bottom_margin() {
        let g = ChartGeometry::for_plan(&reference_plan());
        // inner height 106, zero at 1.1 / 1.22 of the range from the top
        let expected = PAD_TOP + 106.0 * (1.1 / 1.22);
        assert!((g.zero_y - expected).abs() < 1e-9);
    }

    #[test]
    fn axis_ticks_and_labels() {
        let g = ChartGeometry::for_plan(&reference_plan());
        let years: Vec<u32> = g.x_ticks.iter().map(|&(_, y)| y).collect();
        assert_eq!(years, vec![0, 5, 10, 15]);
        assert_eq!(g.y_ticks.len(), 5);
        // 5040 * 1.1 = 5544
        assert_eq!(g.y_ticks[0].label, "5.5k");
        // 5040 * -0.12 = -604.8
        assert_eq!(g.y_ticks[4].label, "-605");
    }

    #[test]
    fn break_even_marker_present_only_when_reached() {
        let plan = reference_plan();
        let g = ChartGeometry::for_plan(&plan);
        // year 8 of 15 across an inner width of 214
        let expected = PAD_LEFT + 8.0 / 15.0 * 214.0;
        assert!((g.break_even_x.unwrap_or_default() - expected).abs() < 1e-9);
        assert!(g.to_svg().contains("Break-even"));

        let never = build_timeline(10_000, 100, 15);
        let g = ChartGeometry::layout(&never, 10_000, break_even_year(&never));
        assert_eq!(g.break_even_x, None);
        assert!(!g.to_svg().contains("Break-even"));
    }

    #[test]
    fn zero_cost_plan_renders_finite_geometry() {
        let plan = compute_plan(&RoofProfile::new(
            1.0,
            300.0,
            RoofType::Flat,
            Region::North,
        ))
        .expect("valid profile");
        let g = ChartGeometry::for_plan(&plan);
        assert!(g.zero_y.is_finite());
        assert!(!g.savings_path.contains("NaN"));
        assert_eq!(g.break_even_x, None);
    }

    /// Sink that accepts `limit` bytes and then reports a full device.
    struct FullAfter {
        limit: usize,
        written: usize,
    }

    impl Write for FullAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "device full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn presenter_reports_write_failure() {
        let plan = reference_plan();
        let mut sink = FullAfter {
            limit: 64,
            written: 0,
        };
        let err = SvgPaybackChart
            .present(&PresentedPlan::new(&plan), &mut sink)
            .err();
        assert!(err.is_some());
        assert!(sink.written <= 64);
    }

    #[test]
    fn display_matches_presenter_output() {
        let plan = reference_plan();
        let mut buf = Vec::new();
        SvgPaybackChart
            .present(&PresentedPlan::new(&plan), &mut buf)
            .expect("write to vec");
        assert_eq!(
            String::from_utf8(buf).expect("utf-8"),
            ChartGeometry::for_plan(&plan).to_svg()
        );
    }

    #[test]
    fn presenter_writes_svg_document() {
        let plan = reference_plan();
        let mut buf = Vec::new();
        SvgPaybackChart
            .present(&PresentedPlan::new(&plan), &mut buf)
            .expect("write to vec");
        let svg = String::from_utf8(buf).expect("utf-8");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
