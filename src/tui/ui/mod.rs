//! UI module: View components for the TUI.

pub mod batch;
pub mod calculator;
pub mod dashboard;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::ClinicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "DISCLAIMER: eGFR is an estimate from a single creatinine value and does not replace clinical evaluation.",
            ClinicalTheme::text_muted(),
        )),
        Line::from(Span::styled(
            "MDRD is validated for adults, bedside Schwartz for children; both are less reliable at extremes of body size.",
            ClinicalTheme::text_muted(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(ClinicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
