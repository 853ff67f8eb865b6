//! Viewer state and event loop.
//!
//! Every core starts visible. The legend works like the interactive SVG:
//! toggle one core, isolate one core or show all again. The x range can be
//! narrowed and widened between the full range and one eighth of it.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::TableState;

use rtdataset_core::PlotModel;
use rtdataset_core::plot::{XRED_CHOICES, clip_stairs, x_range};

/// 1 (full range) followed by the reductions `-r` accepts.
fn xred_steps() -> Vec<u32> {
    std::iter::once(1).chain(XRED_CHOICES).collect()
}

pub struct App {
    model: PlotModel,
    visible: Vec<bool>,
    cursor: usize,
    full_x_end: f64,
    xred: u32,
    running: bool,
    table_state: TableState,
}

impl App {
    pub fn new(model: PlotModel) -> Self {
        let full_x_end = x_range(&model.edges, 1).end;
        let xred = xred_steps()
            .into_iter()
            .find(|&r| (full_x_end / f64::from(r) - model.x_range.end).abs() < 1e-9)
            .unwrap_or(1);
        let visible = vec![true; model.series.len()];
        let mut table_state = TableState::default();
        if !model.series.is_empty() {
            table_state.select(Some(0));
        }
        Self {
            model,
            visible,
            cursor: 0,
            full_x_end,
            xred,
            running: true,
            table_state,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before a panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(250))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        let count = self.model.series.len();
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Up | KeyCode::Char('k') => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.table_state.select(Some(self.cursor));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor < count.saturating_sub(1) {
                    self.cursor += 1;
                    self.table_state.select(Some(self.cursor));
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle(self.cursor),
            KeyCode::Char(c @ '0'..='9') => {
                if let Some(n) = c.to_digit(10) {
                    self.toggle(n as usize);
                }
            }
            KeyCode::Char('i') => self.isolate(self.cursor),
            KeyCode::Char('a') => self.show_all(),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char(']') => {
                let steps = xred_steps();
                if let Some(&next) = steps.iter().find(|&&r| r > self.xred) {
                    self.xred = next;
                }
            }
            KeyCode::Char('-') | KeyCode::Char('[') => {
                let steps = xred_steps();
                if let Some(&prev) = steps.iter().rev().find(|&&r| r < self.xred) {
                    self.xred = prev;
                }
            }
            _ => {}
        }
    }

    fn toggle(&mut self, n: usize) {
        if let Some(v) = self.visible.get_mut(n) {
            *v = !*v;
        }
    }

    fn isolate(&mut self, n: usize) {
        for (i, v) in self.visible.iter_mut().enumerate() {
            *v = i == n;
        }
    }

    fn show_all(&mut self) {
        self.visible.fill(true);
    }

    pub fn model(&self) -> &PlotModel {
        &self.model
    }

    pub fn is_visible(&self, n: usize) -> bool {
        self.visible.get(n).copied().unwrap_or(false)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn xred(&self) -> u32 {
        self.xred
    }

    pub fn x_max(&self) -> f64 {
        self.full_x_end / f64::from(self.xred)
    }

    /// Log10 bounds of the y axis.
    pub fn y_bounds(&self) -> [f64; 2] {
        [
            self.model.y_range.start.log10(),
            self.model.y_range.end.log10(),
        ]
    }

    pub fn table_state_mut(&mut self) -> &mut TableState {
        &mut self.table_state
    }

    /// Stair points of every visible series, cut at the current x range,
    /// with log10 counts.
    pub fn chart_data(&self) -> Vec<(usize, Vec<(f64, f64)>)> {
        (0..self.model.series.len())
            .filter(|&n| self.is_visible(n))
            .map(|n| {
                let points = clip_stairs(&self.model.stair_points(n), self.x_max())
                    .into_iter()
                    .map(|(x, y)| (x, y.log10()))
                    .collect();
                (n, points)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtdataset_core::{PlotOptions, RtDataset};
    use serde_json::json;

    fn model(xred: u32) -> PlotModel {
        let doc = RtDataset::from_value(json!({
            "system": {"hostname": "box.example.org"},
            "processor": {"family": "x86_64", "vendor": "AMD", "type": "Ryzen"},
            "kernel": {"version": "6.6.0-rt1"},
            "condition": {"load": "idle", "cycles": 100, "cyclictest": "cyclictest -q"},
            "latency": {
                "granularity": "microseconds",
                "cores": [[0, 1, 2, 3, 4, 5, 6], [1, 9, 3, 0, 0, 0, 0], [0, 4, 4, 1, 0, 0, 0], [2, 0, 0, 0, 0, 0, 0]]
            }
        }))
        .unwrap();
        PlotModel::from_dataset(
            &doc,
            &PlotOptions {
                xred,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn toggle_isolate_show_all() {
        let mut app = App::new(model(1));
        assert!((0..3).all(|n| app.is_visible(n)));

        app.handle_key(KeyCode::Char(' '));
        assert!(!app.is_visible(0));
        app.handle_key(KeyCode::Char('0'));
        assert!(app.is_visible(0));

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Char('i'));
        assert_eq!(app.cursor(), 1);
        assert!(!app.is_visible(0) && app.is_visible(1) && !app.is_visible(2));

        app.handle_key(KeyCode::Char('a'));
        assert!((0..3).all(|n| app.is_visible(n)));
    }

    #[test]
    fn digit_past_last_core_is_ignored() {
        let mut app = App::new(model(1));
        app.handle_key(KeyCode::Char('7'));
        assert!((0..3).all(|n| app.is_visible(n)));
    }

    #[test]
    fn cursor_stays_in_range() {
        let mut app = App::new(model(1));
        app.handle_key(KeyCode::Up);
        assert_eq!(app.cursor(), 0);
        for _ in 0..10 {
            app.handle_key(KeyCode::Char('j'));
        }
        assert_eq!(app.cursor(), 2);
    }

    #[test]
    fn zoom_steps_through_reductions() {
        let mut app = App::new(model(1));
        assert_eq!(app.xred(), 1);
        assert_eq!(app.x_max(), 8.0);
        app.handle_key(KeyCode::Char('+'));
        assert_eq!(app.xred(), 2);
        assert_eq!(app.x_max(), 4.0);
        for _ in 0..5 {
            app.handle_key(KeyCode::Char('+'));
        }
        assert_eq!(app.xred(), 8);
        app.handle_key(KeyCode::Char('-'));
        assert_eq!(app.xred(), 4);
    }

    #[test]
    fn starts_at_requested_reduction() {
        let app = App::new(model(4));
        assert_eq!(app.xred(), 4);
        assert_eq!(app.x_max(), 2.0);
    }

    #[test]
    fn chart_data_hides_series_and_clips() {
        let mut app = App::new(model(2));
        app.handle_key(KeyCode::Char('1'));
        let data = app.chart_data();
        let shown: Vec<usize> = data.iter().map(|(n, _)| *n).collect();
        assert_eq!(shown, vec![0, 2]);
        for (_, points) in &data {
            assert!(points.iter().all(|&(x, _)| x <= app.x_max()));
        }
        // 9 samples in bucket 1 of core 0, drawn as log10.
        assert!(data[0].1.contains(&(1.0, 9f64.log10())));
        let [lo, hi] = app.y_bounds();
        assert!(lo < 0.0 && (hi - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quit_keys() {
        let mut app = App::new(model(1));
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.running);
        let mut app = App::new(model(1));
        app.handle_key(KeyCode::Esc);
        assert!(!app.running);
    }
}
