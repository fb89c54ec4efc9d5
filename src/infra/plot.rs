// ============================================================
// Layer 6 - SVG Line Charts
// ============================================================
// Minimal line-chart renderer producing standalone SVG documents.
// Used for the loss/accuracy-vs-epoch chart (two y axes) and the
// ROC comparison chart (fixed [0, 1] axes plus a dashed diagonal).
//
// Layout (pixels):
//   ┌──────────────────── title ───────────────────┐
//   │ y ticks │        plot area        │ y2 ticks │
//   │         │                         │          │
//   └─────────┴──── x ticks / x label ──┴──────────┘
//
// Non-finite points are skipped, and a flat or empty range is
// widened so every coordinate written to the SVG is finite.

use std::fmt::Write as _;

const WIDTH:  f64 = 640.0;
const HEIGHT: f64 = 480.0;
const LEFT:   f64 = 70.0;
const RIGHT:  f64 = 70.0;
const TOP:    f64 = 40.0;
const BOTTOM: f64 = 55.0;
const TICKS:  usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Series {
    pub label:  String,
    pub color:  &'static str,
    pub points: Vec<(f64, f64)>,
    pub dashed: bool,
    pub axis:   Axis,
}

impl Series {
    pub fn new(label: impl Into<String>, color: &'static str, points: Vec<(f64, f64)>) -> Self {
        Self { label: label.into(), color, points, dashed: false, axis: Axis::Left }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    pub fn on_right_axis(mut self) -> Self {
        self.axis = Axis::Right;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineChart {
    title:    String,
    x_label:  String,
    y_label:  String,
    y2_label: Option<String>,
    x_range:  Option<(f64, f64)>,
    y_range:  Option<(f64, f64)>,
    series:   Vec<Series>,
}

impl LineChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_secondary_axis(mut self, label: impl Into<String>) -> Self {
        self.y2_label = Some(label.into());
        self
    }

    /// Pin both primary ranges instead of fitting them to the data.
    pub fn with_fixed_range(mut self, x: (f64, f64), y: (f64, f64)) -> Self {
        self.x_range = Some(x);
        self.y_range = Some(y);
        self
    }

    pub fn add_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn render_svg(&self) -> String {
        let plot_w = WIDTH - LEFT - RIGHT;
        let plot_h = HEIGHT - TOP - BOTTOM;

        let x_range  = self.x_range.unwrap_or_else(|| self.fit(|_| true, |p| p.0));
        let y_range  = self.y_range.unwrap_or_else(|| self.fit(|s| s.axis == Axis::Left, |p| p.1));
        let y2_range = self.fit(|s| s.axis == Axis::Right, |p| p.1);

        let sx = |x: f64| LEFT + (x - x_range.0) / (x_range.1 - x_range.0) * plot_w;
        let sy = |y: f64, r: (f64, f64)| TOP + plot_h - (y - r.0) / (r.1 - r.0) * plot_h;

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
        );
        let _ = write!(svg, r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/>"#);
        let _ = write!(
            svg,
            r#"<text x="{}" y="24" text-anchor="middle" font-size="15">{}</text>"#,
            WIDTH / 2.0,
            escape(&self.title)
        );
        let _ = write!(
            svg,
            r#"<rect x="{LEFT}" y="{TOP}" width="{plot_w}" height="{plot_h}" fill="none" stroke="black"/>"#
        );

        // ── Ticks ─────────────────────────────────────────────────────────────
        for i in 0..=TICKS {
            let f  = i as f64 / TICKS as f64;
            let xv = x_range.0 + f * (x_range.1 - x_range.0);
            let yv = y_range.0 + f * (y_range.1 - y_range.0);
            let (px, py) = (sx(xv), sy(yv, y_range));
            let _ = write!(
                svg,
                r#"<text x="{px:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                TOP + plot_h + 18.0,
                tick(xv)
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{py:.1}" text-anchor="end">{}</text>"#,
                LEFT - 6.0,
                tick(yv)
            );
            if self.y2_label.is_some() {
                let y2 = y2_range.0 + f * (y2_range.1 - y2_range.0);
                let _ = write!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}" text-anchor="start">{}</text>"#,
                    LEFT + plot_w + 6.0,
                    sy(y2, y2_range),
                    tick(y2)
                );
            }
        }

        // ── Axis labels ───────────────────────────────────────────────────────
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            LEFT + plot_w / 2.0,
            HEIGHT - 12.0,
            escape(&self.x_label)
        );
        let _ = write!(
            svg,
            r#"<text transform="translate(18 {:.1}) rotate(-90)" text-anchor="middle">{}</text>"#,
            TOP + plot_h / 2.0,
            escape(&self.y_label)
        );
        if let Some(label) = &self.y2_label {
            let _ = write!(
                svg,
                r#"<text transform="translate({:.1} {:.1}) rotate(90)" text-anchor="middle">{}</text>"#,
                WIDTH - 14.0,
                TOP + plot_h / 2.0,
                escape(label)
            );
        }

        // ── Series ────────────────────────────────────────────────────────────
        for s in &self.series {
            let range = if s.axis == Axis::Right { y2_range } else { y_range };
            let pts: Vec<String> = s
                .points
                .iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(|&(x, y)| format!("{:.2},{:.2}", sx(x), sy(y, range)))
                .collect();
            if pts.is_empty() {
                continue;
            }
            let dash = if s.dashed { r#" stroke-dasharray="6 4""# } else { "" };
            let _ = write!(
                svg,
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5"{dash}/>"#,
                pts.join(" "),
                s.color
            );
        }

        // ── Legend ────────────────────────────────────────────────────────────
        let labelled: Vec<&Series> = self.series.iter().filter(|s| !s.label.is_empty()).collect();
        for (i, s) in labelled.iter().enumerate() {
            let y = TOP + plot_h - 14.0 - 18.0 * (labelled.len() - 1 - i) as f64;
            let x = LEFT + plot_w - 230.0;
            let _ = write!(
                svg,
                r#"<line x1="{x:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}" stroke-width="2"/>"#,
                x + 20.0,
                s.color
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
                x + 26.0,
                y + 4.0,
                escape(&s.label)
            );
        }

        svg.push_str("</svg>");
        svg
    }

    /// Min/max of the selected coordinate over matching series.
    fn fit(&self, keep: impl Fn(&Series) -> bool, coord: impl Fn(&(f64, f64)) -> f64) -> (f64, f64) {
        let (lo, hi) = self
            .series
            .iter()
            .filter(|s| keep(s))
            .flat_map(|s| s.points.iter().map(&coord))
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if !lo.is_finite() {
            return (0.0, 1.0);
        }
        if hi - lo < 1e-12 {
            return (lo - 0.5, hi + 0.5);
        }
        (lo, hi)
    }
}

fn tick(v: f64) -> String {
    if v.abs() >= 1000.0 { format!("{v:.0}") } else { format!("{v:.2}") }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
