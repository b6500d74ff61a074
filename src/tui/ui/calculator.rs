//! Calculator form: one patient, one creatinine result.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{PatientRecord, UserMode};
use crate::tui::styles::ClinicalTheme;

const GENDERS: &[&str] = &["male", "female"];
const ETHNICITIES: &[&str] = &["non-black", "black"];
const UNITS: &[&str] = &["mg/dL", "µmol/L"];

/// What a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    /// Free text (patient reference)
    Text,
    /// Cycled with ←/→ instead of typed
    Choice(&'static [&'static str]),
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl FormField {
    fn numeric(label: &'static str, hint: &'static str) -> Self {
        Self {
            label,
            hint,
            value: String::new(),
            kind: FieldKind::Numeric,
        }
    }

    fn choice(label: &'static str, hint: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            label,
            hint,
            value: options[0].to_string(),
            kind: FieldKind::Choice(options),
        }
    }
}

/// Field order; indices into `CalculatorFormState::fields`.
const AGE: usize = 0;
const GENDER: usize = 1;
const ETHNICITY: usize = 2;
const CREATININE: usize = 3;
const UNIT: usize = 4;
const HEIGHT: usize = 5;
const REFERENCE: usize = 6;

/// Calculator form state
pub struct CalculatorFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
    pub mode: UserMode,
}

impl Default for CalculatorFormState {
    fn default() -> Self {
        Self::for_mode(UserMode::default())
    }
}

impl CalculatorFormState {
    /// Empty form. Clinicians also get a patient reference field.
    #[must_use]
    pub fn for_mode(mode: UserMode) -> Self {
        let mut fields = vec![
            FormField::numeric("Age", "years (0-120)"),
            FormField::choice("Gender", "←/→ to change", GENDERS),
            FormField::choice("Ethnicity", "adults only, ←/→ to change", ETHNICITIES),
            FormField::numeric("Serum Creatinine", "value in the unit below"),
            FormField::choice("Unit", "←/→ to change", UNITS),
            FormField::numeric("Height", "cm, required under 18"),
        ];
        if mode == UserMode::Clinician {
            fields.push(FormField {
                label: "Patient Reference",
                hint: "optional chart number",
                value: String::new(),
                kind: FieldKind::Text,
            });
        }

        Self {
            fields,
            selected_field: 0,
            error_message: None,
            mode,
        }
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        let accepted = match field.kind {
            FieldKind::Numeric => c.is_ascii_digit() || c == '.',
            FieldKind::Text => c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'),
            FieldKind::Choice(_) => false,
        };
        if accepted {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Step a choice field forward or backward. No-op on other fields.
    pub fn cycle_choice(&mut self, forward: bool) {
        let field = &mut self.fields[self.selected_field];
        if let FieldKind::Choice(options) = field.kind {
            let current = options.iter().position(|o| *o == field.value).unwrap_or(0);
            let next = if forward {
                (current + 1) % options.len()
            } else {
                (current + options.len() - 1) % options.len()
            };
            field.value = options[next].to_string();
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !matches!(field.kind, FieldKind::Choice(_)) {
            field.value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !matches!(field.kind, FieldKind::Choice(_)) {
            field.value.clear();
        }
    }

    /// Wipe typed values from memory and reset choices.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            field.value.zeroize();
            if let FieldKind::Choice(options) = field.kind {
                field.value = options[0].to_string();
            }
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Raw record for the engine. Blank optional fields become `None`.
    #[must_use]
    pub fn to_record(&self) -> PatientRecord {
        let optional = |idx: usize| {
            self.fields
                .get(idx)
                .map(|f| f.value.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        PatientRecord {
            patient_ref: optional(REFERENCE),
            age: self.fields[AGE].value.clone(),
            gender: self.fields[GENDER].value.clone(),
            ethnicity: optional(ETHNICITY),
            creatinine: self.fields[CREATININE].value.clone(),
            unit: self.fields[UNIT].value.clone(),
            height: optional(HEIGHT),
        }
    }

    /// Load sample data (55 year old adult, mildly raised creatinine)
    pub fn load_sample_data(&mut self) {
        self.fields[AGE].value = "55".to_string();
        self.fields[GENDER].value = "female".to_string();
        self.fields[ETHNICITY].value = "non-black".to_string();
        self.fields[CREATININE].value = "1.2".to_string();
        self.fields[UNIT].value = "mg/dL".to_string();
        self.fields[HEIGHT].value.clear();
        self.error_message = None;
    }
}

/// Render the calculator form
pub fn render_calculator_form(f: &mut Frame, area: Rect, state: &CalculatorFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0], state.mode);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect, mode: UserMode) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("eGFR Calculator", ClinicalTheme::title()),
        Span::styled(" │ ", ClinicalTheme::text_muted()),
        Span::styled(format!("{mode} mode"), ClinicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &CalculatorFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = state.fields.len().div_ceil(2);
    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(f, columns[1], &state.fields[mid..], mid, state.selected_field);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (ClinicalTheme::border_focused(), ClinicalTheme::subtitle())
        } else {
            (ClinicalTheme::border(), ClinicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match field.kind {
            FieldKind::Choice(_) => {
                spans.push(Span::styled(format!("‹ {} ›", field.value), ClinicalTheme::text()));
                spans.push(Span::styled(format!("  {}", field.hint), ClinicalTheme::text_muted()));
            }
            _ if field.value.is_empty() => {
                spans.push(Span::styled(field.hint, ClinicalTheme::text_muted()));
            }
            _ => spans.push(Span::styled(field.value.as_str(), ClinicalTheme::text())),
        }
        if is_selected && !matches!(field.kind, FieldKind::Choice(_)) {
            spans.push(Span::styled("▌", ClinicalTheme::subtitle()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &CalculatorFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", ClinicalTheme::danger()),
            Span::styled(err.clone(), ClinicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", ClinicalTheme::key_hint()),
            Span::styled("Navigate ", ClinicalTheme::key_desc()),
            Span::styled("[←→] ", ClinicalTheme::key_hint()),
            Span::styled("Change ", ClinicalTheme::key_desc()),
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Calculate ", ClinicalTheme::key_desc()),
            Span::styled("[F5] ", ClinicalTheme::key_hint()),
            Span::styled("Sample Data ", ClinicalTheme::key_desc()),
            Span::styled("[F2] ", ClinicalTheme::key_hint()),
            Span::styled("Switch Mode ", ClinicalTheme::key_desc()),
            Span::styled("[Esc] ", ClinicalTheme::key_hint()),
            Span::styled("Back", ClinicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}
