//! Batch view: record file entry, progress and per-row outcomes.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::application::{BatchReport, RowOutcome};
use crate::tui::styles::ClinicalTheme;

/// Batch screen state
#[derive(Debug, Default)]
pub struct BatchState {
    /// Path of the JSON record file being typed
    pub path: String,
    pub running: bool,
    pub done: usize,
    pub total: usize,
    pub report: Option<BatchReport>,
    pub error: Option<String>,
    /// Selected row in the outcome list
    pub selected: usize,
}

impl BatchState {
    pub fn input_char(&mut self, c: char) {
        if !self.running && !c.is_control() {
            self.path.push(c);
            self.error = None;
        }
    }

    pub fn delete_char(&mut self) {
        if !self.running {
            self.path.pop();
        }
    }

    /// Reset progress for a new run on the current path.
    pub fn start(&mut self) {
        self.running = true;
        self.done = 0;
        self.total = 0;
        self.report = None;
        self.error = None;
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        if let Some(report) = &self.report {
            if self.selected + 1 < report.len() {
                self.selected += 1;
            }
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

fn outcome_line(row: &RowOutcome) -> Line<'_> {
    let reference = row.patient_ref.as_deref().unwrap_or("-");
    let mut spans = vec![
        Span::styled(format!("{:>4} ", row.row), ClinicalTheme::text_muted()),
        Span::styled(format!("{reference:<14} "), ClinicalTheme::text_secondary()),
    ];
    match &row.outcome {
        Ok(result) => {
            spans.push(Span::styled(format!("{:>7.2} ", result.rate), ClinicalTheme::text()));
            spans.push(Span::styled(result.stage.to_string(), ClinicalTheme::stage(result.stage)));
        }
        Err(e) => spans.push(Span::styled(e.to_string(), ClinicalTheme::danger())),
    }
    Line::from(spans)
}

/// Render the batch screen
pub fn render_batch(f: &mut Frame, area: Rect, state: &BatchState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Path input
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Outcomes
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("Batch Calculation", ClinicalTheme::title()),
        Span::styled(" │ JSON record file", ClinicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    let path_block = Block::default()
        .title(Span::styled(" Record File ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(if state.running {
            ClinicalTheme::border()
        } else {
            ClinicalTheme::border_focused()
        });
    let path_line = if state.path.is_empty() {
        Line::from(Span::styled(" path/to/records.json", ClinicalTheme::text_muted()))
    } else {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(state.path.as_str(), ClinicalTheme::text()),
            Span::styled("▌", ClinicalTheme::subtitle()),
        ])
    };
    f.render_widget(Paragraph::new(path_line).block(path_block), chunks[1]);

    let label = if state.total == 0 && state.running {
        "Loading...".to_string()
    } else {
        format!("{}/{} rows", state.done, state.total)
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(ClinicalTheme::border()))
        .gauge_style(ClinicalTheme::info())
        .ratio(state.ratio())
        .label(label);
    f.render_widget(gauge, chunks[2]);

    let outcomes_block = Block::default()
        .title(Span::styled(" Outcomes ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border());

    if let Some(error) = &state.error {
        let p = Paragraph::new(Line::from(Span::styled(error.as_str(), ClinicalTheme::danger())))
            .block(outcomes_block);
        f.render_widget(p, chunks[3]);
    } else if let Some(report) = &state.report {
        let title = format!(
            " Outcomes: {} ok, {} failed ",
            report.success_count(),
            report.failure_count()
        );
        let items: Vec<ListItem> = report.rows.iter().map(|r| ListItem::new(outcome_line(r))).collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(title, ClinicalTheme::subtitle()))
                    .borders(Borders::ALL)
                    .border_style(ClinicalTheme::border()),
            )
            .highlight_style(ClinicalTheme::selected());
        let mut list_state = ListState::default();
        list_state.select(Some(state.selected));
        f.render_stateful_widget(list, chunks[3], &mut list_state);
    } else {
        let p = Paragraph::new(Line::from(Span::styled(
            "Enter a record file path and press [Enter].",
            ClinicalTheme::text_muted(),
        )))
        .block(outcomes_block);
        f.render_widget(p, chunks[3]);
    }

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("[Enter] ", ClinicalTheme::key_hint()),
        Span::styled("Run ", ClinicalTheme::key_desc()),
        Span::styled("[↑↓] ", ClinicalTheme::key_hint()),
        Span::styled("Scroll ", ClinicalTheme::key_desc()),
        Span::styled("[Esc] ", ClinicalTheme::key_hint()),
        Span::styled("Back", ClinicalTheme::key_desc()),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(footer, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_locked_while_running() {
        let mut state = BatchState::default();
        for c in "a.json".chars() {
            state.input_char(c);
        }
        state.start();
        state.input_char('x');
        state.delete_char();
        assert_eq!(state.path, "a.json");
        assert!(state.running);
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut state = BatchState::default();
        state.select_next();
        assert_eq!(state.selected, 0);
        state.select_prev();
        assert_eq!(state.selected, 0);
    }
}
