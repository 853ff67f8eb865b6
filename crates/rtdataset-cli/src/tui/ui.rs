//! Viewer rendering.
//!
//! ┌──────────────────────────────────────────────────────────┐
//! │  Latency histogram of rack4slot1 with Intel ...          │
//! ├───────────────────────────────────────────┬──────────────┤
//! │  ╭ samples (log10)                        │  Cores       │
//! │  │ ⣀⣀⡀                                    │ ▸● Core #0   │
//! │  │    ⠈⠉⠉⣀⣀                               │  ● Core #1   │
//! │  ╰────────────── latency (µs)             │  ○ Core #2   │
//! ├───────────────────────────────────────────┴──────────────┤
//! │  ↑↓ navigate   space: toggle   i: isolate   a: all  ...  │
//! └──────────────────────────────────────────────────────────┘

use super::app::App;
use ratatui::{prelude::*, widgets::*};
use rtdataset_core::Series;

pub fn draw(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(10),   // main
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(rows[1]);

    draw_chart(f, cols[0], app);
    draw_legend(f, cols[1], app);
    draw_keys(f, rows[2]);
}

fn series_colour(s: &Series) -> Color {
    Color::Rgb(s.colour.0, s.colour.1, s.colour.2)
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let model = app.model();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(format!(" {} ", model.title), Style::default().bold().fg(Color::Cyan)),
            Span::styled(format!(" {} ", model.note), Style::default().fg(Color::DarkGray)),
        ]));
    f.render_widget(block, area);
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
    let model = app.model();
    let data = app.chart_data();

    if data.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" no core selected ");
        let p = Paragraph::new("Press a to show all cores")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let datasets: Vec<Dataset> = data
        .iter()
        .map(|(n, points)| {
            let series = &model.series[*n];
            Dataset::default()
                .name(series.label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_colour(series)))
                .data(points)
        })
        .collect();

    let x_max = app.x_max();
    let [y_lo, y_hi] = app.y_bounds();
    let y_labels = [y_lo, (y_lo + y_hi) / 2.0, y_hi]
        .iter()
        .map(|e| Line::from(format!("{:.0e}", 10f64.powf(*e))))
        .collect::<Vec<_>>();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {}  1/{} of range ", model.y_label, app.xred())),
        )
        .legend_position(None)
        .x_axis(
            Axis::default()
                .title(model.x_label.as_str())
                .bounds([0.0, x_max])
                .labels(vec![
                    Line::from("0"),
                    Line::from(format!("{:.0}", x_max / 2.0)),
                    Line::from(format!("{x_max:.0}")),
                ]),
        )
        .y_axis(Axis::default().bounds([y_lo, y_hi]).labels(y_labels));

    f.render_widget(chart, area);
}

fn draw_legend(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .model()
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let pointer = if i == app.cursor() { "▸" } else { " " };
            let marker = if app.is_visible(i) { "●" } else { "○" };
            let label_style = match (s.highlighted, app.is_visible(i)) {
                (true, true) => Style::default().fg(Color::Red).bold(),
                (true, false) => Style::default().fg(Color::Red).dim(),
                (false, true) => Style::default(),
                (false, false) => Style::default().dim(),
            };
            Row::new(vec![
                Cell::from(pointer),
                Cell::from(marker).style(Style::default().fg(series_colour(s))),
                Cell::from(s.label.clone()).style(label_style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2), // pointer
            Constraint::Length(2), // visibility
            Constraint::Min(10),   // label
        ],
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .block(Block::default().borders(Borders::ALL).title(" Cores "));

    f.render_stateful_widget(table, area, app.table_state_mut());
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " ↑↓ navigate   space/0-9: toggle   i: isolate   a: all   +/-: x range   q: quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
