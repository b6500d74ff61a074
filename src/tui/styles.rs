//! Color palette and preset styles for the clinical theme.
//!
//! Stage colors run green (G1) to red (G5) so a result can be read at a
//! glance.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::CkdStage;

/// Clinical theme color palette.
pub struct ClinicalTheme;

impl ClinicalTheme {
    /// Deep teal
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136); // #0D9488
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF
    pub const PRIMARY_DARK: Color = Color::Rgb(15, 118, 110); // #0F766E

    /// Light slate for borders
    pub const BORDER: Color = Color::Rgb(148, 163, 184); // #94A3B8

    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // #0F172A

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    /// One color per stage, G1 first.
    pub const STAGE_COLORS: [Color; 5] = [
        Color::Rgb(16, 185, 129),  // G1 emerald
        Color::Rgb(132, 204, 22),  // G2 lime
        Color::Rgb(251, 191, 36),  // G3 amber
        Color::Rgb(249, 115, 22),  // G4 orange
        Color::Rgb(244, 63, 94),   // G5 rose
    ];

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Selected list row or focused form field
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    #[must_use]
    pub fn header() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY_DARK)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn stage_color(stage: CkdStage) -> Color {
        Self::STAGE_COLORS[usize::from(stage.number()) - 1]
    }

    /// Bold text in the stage's color
    #[must_use]
    pub fn stage(stage: CkdStage) -> Style {
        Style::default()
            .fg(Self::stage_color(stage))
            .add_modifier(Modifier::BOLD)
    }
}

/// Inline logo for the header
pub const LOGO_SMALL: &str = "Nephrolens";
