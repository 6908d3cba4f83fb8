//! Character-grid surface and status lines for the terminal host.

use chrono::{DateTime, Local};
use cyclewave_engine::render::{Point, Stroke, Surface};
use cyclewave_engine::{Playback, WidgetState};

const INK: char = '*';
const BLANK: char = ' ';

/// A `cols × rows` grid; one cell is one "device pixel".
pub struct TextSurface {
    cols: usize,
    rows: usize,
    cells: Vec<char>,
}

impl TextSurface {
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(2);
        let rows = rows.max(2);
        Self { cols, rows, cells: vec![BLANK; cols * rows] }
    }

    /// Grid size for the layout density the container asked for.
    pub fn for_layout(compact: bool) -> Self {
        if compact { Self::new(48, 7) } else { Self::new(72, 13) }
    }

    fn cell(&self, x: f32, y: f32) -> (usize, usize) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let c = (x.max(0.0) as usize).min(self.cols - 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let r = (y.max(0.0) as usize).min(self.rows - 1);
        (c, r)
    }

    fn plot(&mut self, c: usize, r: usize) {
        self.cells[r * self.cols + c] = INK;
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.chunks(self.cols).map(|row| row.iter().collect())
    }
}

impl Surface for TextSurface {
    #[allow(clippy::cast_precision_loss)]
    fn size(&self) -> (f32, f32) {
        (self.cols as f32, self.rows as f32)
    }

    fn clear(&mut self) {
        self.cells.fill(BLANK);
    }

    // Width and colour do not map onto a character grid.
    fn stroke_polyline(&mut self, points: &[Point], _stroke: Stroke) {
        let Some(first) = points.first() else { return };
        let (mut pc, mut pr) = self.cell(first.x, first.y);
        self.plot(pc, pr);
        for p in &points[1..] {
            let (c, r) = self.cell(p.x, p.y);
            // vertical run in the new column so steep segments stay connected
            let (lo, hi) = if r < pr { (r, pr) } else { (pr, r) };
            for row in lo..=hi {
                self.plot(c, row);
            }
            for col in pc.min(c)..=pc.max(c) {
                self.plot(col, r);
            }
            (pc, pr) = (c, r);
        }
    }
}

/// Local wall-clock time of a Unix timestamp, `HH:MM:SS`.
pub fn local_time(unix_seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let secs = unix_seconds.floor() as i64;
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_owned())
}

pub fn status_lines(state: &WidgetState) -> Vec<String> {
    let cycle = &state.current_cycle;
    let params = &state.current_params;
    let play = match state.playback {
        Playback::Playing => "playing",
        Playback::Stopped => "stopped",
    };
    let vol = if state.muted { "muted".to_owned() } else { format!("vol {:>3.0}%", state.volume * 100.0) };

    let mut out = if state.compact {
        vec![format!(
            "{} {:>3}% | {:.1} Hz | {play} | {vol}",
            cycle.phase_name,
            cycle.intensity_percent(),
            params.root_frequency_hz
        )]
    } else {
        vec![
            format!(
                "Cycle: {:<8} intensity {:>3}%   t+{:>3}s of 300",
                cycle.phase_name,
                cycle.intensity_percent(),
                cycle.seconds_into_cycle
            ),
            format!(
                "Root {:.1} Hz   vibrato {:.3} Hz   filter {:.0} Hz   reverb {:.2}",
                params.root_frequency_hz, params.modulation_rate_hz, params.filter_cutoff_hz, params.reverb_mix
            ),
            format!("{play}   {vol}   Updated {}", local_time(state.updated_at)),
        ]
    };
    if let Some(e) = &state.last_error {
        out.push(e.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclewave_engine::render::VisualizationRenderer;
    use cyclewave_engine::FLAT_FRAME;

    #[test]
    fn flat_frame_is_one_full_row() {
        let mut s = TextSurface::new(16, 5);
        VisualizationRenderer.render(&FLAT_FRAME, &mut s);
        let lines: Vec<String> = s.lines().collect();
        let inked: Vec<usize> = lines.iter().enumerate().filter(|(_, l)| l.contains(INK)).map(|(i, _)| i).collect();
        assert_eq!(inked, vec![2]);
        assert!(lines[2].chars().all(|c| c == INK));
    }

    #[test]
    fn steep_segments_stay_connected() {
        let mut s = TextSurface::new(2, 6);
        s.stroke_polyline(&[Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 5.0 }], Stroke {
            width: 1.0,
            color: cyclewave_engine::render::TRACE_COLOR,
        });
        let lines: Vec<String> = s.lines().collect();
        assert!(lines.iter().all(|l| l.ends_with(INK)));
    }

    #[test]
    fn clear_blanks_everything() {
        let mut s = TextSurface::new(4, 4);
        s.plot(1, 1);
        s.clear();
        assert!(s.lines().all(|l| l.trim().is_empty()));
    }
}
