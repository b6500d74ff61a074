//! Result view: rate, stage and recommendation for the last calculation.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Calculation, Population};
use crate::tui::styles::ClinicalTheme;

/// Upper end of the rate gauge, mL/min/1.73m²
const GAUGE_MAX_RATE: f64 = 120.0;

/// Render a finished calculation.
pub fn render_result(f: &mut Frame, area: Rect, calculation: &Calculation) {
    let result = &calculation.result;
    let stage_style = ClinicalTheme::stage(result.stage);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Gauge
            Constraint::Length(7), // Figures
            Constraint::Min(0),    // Recommendation
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("Result", ClinicalTheme::title()),
        Span::styled(" │ ", ClinicalTheme::text_muted()),
        Span::styled(
            format!("{} mode", calculation.mode),
            ClinicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    let ratio = (result.rate / GAUGE_MAX_RATE).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(ClinicalTheme::border()))
        .gauge_style(stage_style)
        .ratio(ratio)
        .label(format!("{:.2} mL/min/1.73m²", result.rate));
    f.render_widget(gauge, chunks[1]);

    let population = calculation.subject.population();
    let mut figures = vec![
        Line::from(vec![
            Span::styled("  eGFR:       ", ClinicalTheme::text_secondary()),
            Span::styled(format!("{:.2}", result.rate), ClinicalTheme::title()),
            Span::styled(" mL/min/1.73m²", ClinicalTheme::text_muted()),
        ]),
        Line::from(vec![
            Span::styled("  Stage:      ", ClinicalTheme::text_secondary()),
            Span::styled(result.stage.to_string(), stage_style),
            Span::styled(format!(" ({})", result.stage.description()), ClinicalTheme::text_muted()),
        ]),
        Line::from(vec![
            Span::styled("  Equation:   ", ClinicalTheme::text_secondary()),
            Span::styled(result.equation.to_string(), ClinicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("  Creatinine: ", ClinicalTheme::text_secondary()),
            Span::styled(calculation.creatinine.to_string(), ClinicalTheme::text()),
        ]),
    ];
    if let Some(reference) = &calculation.patient_ref {
        figures.push(Line::from(vec![
            Span::styled("  Reference:  ", ClinicalTheme::text_secondary()),
            Span::styled(reference.as_str(), ClinicalTheme::text()),
        ]));
    }
    let figures_block = Block::default()
        .title(Span::styled(" Kidney Function ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border());
    f.render_widget(Paragraph::new(figures).block(figures_block), chunks[2]);

    let advice_title = match population {
        Population::Adult => " Recommendation ",
        Population::Pediatric => " Recommendation (pediatric) ",
    };
    let advice = Paragraph::new(Line::from(Span::styled(
        result.recommendation.as_str(),
        ClinicalTheme::text(),
    )))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(advice_title, ClinicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(stage_style),
    );
    f.render_widget(advice, chunks[3]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("[N] ", ClinicalTheme::key_hint()),
        Span::styled("New Calculation ", ClinicalTheme::key_desc()),
        Span::styled("[Enter/Esc] ", ClinicalTheme::key_hint()),
        Span::styled("Dashboard", ClinicalTheme::key_desc()),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(footer, chunks[4]);
}
