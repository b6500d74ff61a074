//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::application::StageSummary;
use crate::domain::{CkdStage, UserMode};
use crate::tui::styles::{ClinicalTheme, LOGO_SMALL};

/// Widest stage bar, in cells
const BAR_WIDTH: usize = 24;

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub mode: UserMode,
    pub calculation_count: usize,
    /// Name of the active MDRD constant set
    pub convention: &'static str,
    /// One-line feedback from the last action
    pub status: Option<String>,
    /// Stage distribution of the most recent calculations
    pub recent: StageSummary,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0], state.mode);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    render_status_panels(f, columns[0], state);
    render_stage_distribution(f, columns[1], state.recent);
}

fn render_header(f: &mut Frame, area: Rect, mode: UserMode) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled(LOGO_SMALL, ClinicalTheme::title()),
        Span::styled(" │ ", ClinicalTheme::text_muted()),
        Span::styled("Kidney Function (eGFR) Staging", ClinicalTheme::text_secondary()),
        Span::styled(" │ ", ClinicalTheme::text_muted()),
        Span::styled(format!("{mode} mode"), ClinicalTheme::header()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_status_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Status
            Constraint::Min(0),    // Actions
        ])
        .margin(1)
        .split(area);

    let mut status = vec![
        Line::from(vec![
            Span::styled("  Calculations: ", ClinicalTheme::text_secondary()),
            Span::styled(state.calculation_count.to_string(), ClinicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("  MDRD constants: ", ClinicalTheme::text_secondary()),
            Span::styled(state.convention, ClinicalTheme::text()),
        ]),
    ];
    if let Some(message) = &state.status {
        status.push(Line::from(Span::styled(
            format!("  {message}"),
            ClinicalTheme::warning(),
        )));
    }

    let status_block = Block::default()
        .title(Span::styled(" Status ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border());
    f.render_widget(Paragraph::new(status).block(status_block), chunks[0]);

    let batch_desc = if state.mode == UserMode::Clinician {
        ClinicalTheme::key_desc()
    } else {
        ClinicalTheme::text_muted()
    };
    let actions = vec![
        Line::from(vec![
            Span::styled("[N] ", ClinicalTheme::key_hint()),
            Span::styled("New Calculation", ClinicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[B] ", ClinicalTheme::key_hint()),
            Span::styled("Batch Import (clinician)", batch_desc),
        ]),
        Line::from(vec![
            Span::styled("[M] ", ClinicalTheme::key_hint()),
            Span::styled("Switch Patient/Clinician", ClinicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[X] ", ClinicalTheme::key_hint()),
            Span::styled("Clear History", ClinicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ]),
    ];

    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border());
    f.render_widget(Paragraph::new(actions).block(actions_block), chunks[1]);
}

fn stage_bar(summary: &StageSummary, stage: CkdStage) -> Line<'static> {
    let count = summary.count(stage);
    let cells = (summary.fraction(stage) * BAR_WIDTH as f64).round() as usize;

    Line::from(vec![
        Span::styled(format!("  G{} ", stage.number()), ClinicalTheme::text_secondary()),
        Span::styled("█".repeat(cells), ClinicalTheme::stage(stage)),
        Span::styled(
            "·".repeat(BAR_WIDTH - cells.min(BAR_WIDTH)),
            ClinicalTheme::text_muted(),
        ),
        Span::styled(format!(" {count}"), ClinicalTheme::text()),
    ])
}

fn render_stage_distribution(f: &mut Frame, area: Rect, recent: StageSummary) {
    let block = Block::default()
        .title(Span::styled(" Recent Stages ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border());

    if recent.total == 0 {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No calculations yet. Press [N] to start.",
            ClinicalTheme::text_muted(),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Last ", ClinicalTheme::text_secondary()),
            Span::styled(recent.total.to_string(), ClinicalTheme::text()),
            Span::styled(" calculations", ClinicalTheme::text_secondary()),
        ]),
        Line::from(""),
    ];
    lines.extend(CkdStage::ALL.iter().map(|&stage| stage_bar(&recent, stage)));

    f.render_widget(Paragraph::new(lines).block(block), area);
}
