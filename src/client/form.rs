//! Terminal form for project tasks.
//!
//! Shows one input per field with a live preview of the composed message.
//! Tab/Shift-Tab move between fields, Left/Right change the information
//! source, Enter submits and Esc cancels.

use crate::compose::{compose_message, InfoSource, ProjectFields};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Result of the form interaction.
pub enum FormResult {
    /// User submitted fields that passed validation.
    Submit(ProjectFields),
    /// User cancelled (Escape).
    Cancelled,
}

const LABEL_WIDTH: u16 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    TechnologyName,
    BenchmarkName,
    TechnologyPath,
    BenchmarkPath,
    InfoSource,
    CustomSource,
    AdditionalInfo,
}

impl Field {
    const ORDER: [Field; 7] = [
        Field::TechnologyName,
        Field::BenchmarkName,
        Field::TechnologyPath,
        Field::BenchmarkPath,
        Field::InfoSource,
        Field::CustomSource,
        Field::AdditionalInfo,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::TechnologyName => "Technology name",
            Field::BenchmarkName => "Benchmark name",
            Field::TechnologyPath => "Technology path",
            Field::BenchmarkPath => "Benchmark path",
            Field::InfoSource => "Information source",
            Field::CustomSource => "Custom source",
            Field::AdditionalInfo => "Additional information",
        }
    }
}

/// What a key press asks the form to do.
#[derive(Debug, PartialEq, Eq)]
enum FormAction {
    Submit,
    Cancel,
}

/// Editable state behind the form.
struct FormState {
    technology_name: Input,
    benchmark_name: Input,
    technology_path: Input,
    benchmark_path: Input,
    custom_source: Input,
    additional_info: Input,
    info_source: InfoSource,
    focus: Field,
    error: Option<String>,
}

impl FormState {
    fn new(initial: ProjectFields) -> Self {
        Self {
            technology_name: Input::default().with_value(initial.technology_name),
            benchmark_name: Input::default().with_value(initial.benchmark_name),
            technology_path: Input::default().with_value(initial.technology_path),
            benchmark_path: Input::default().with_value(initial.benchmark_path),
            custom_source: Input::default().with_value(initial.custom_source),
            additional_info: Input::default().with_value(initial.additional_info),
            info_source: initial.info_source,
            focus: Field::TechnologyName,
            error: None,
        }
    }

    fn fields(&self) -> ProjectFields {
        ProjectFields {
            technology_name: self.technology_name.value().to_string(),
            benchmark_name: self.benchmark_name.value().to_string(),
            technology_path: self.technology_path.value().to_string(),
            benchmark_path: self.benchmark_path.value().to_string(),
            info_source: self.info_source,
            custom_source: self.custom_source.value().to_string(),
            additional_info: self.additional_info.value().to_string(),
        }
    }

    /// Fields currently shown; the custom source only with `Custom` selected.
    fn visible(&self) -> Vec<Field> {
        Field::ORDER
            .iter()
            .copied()
            .filter(|f| *f != Field::CustomSource || self.info_source == InfoSource::Custom)
            .collect()
    }

    fn input(&self, field: Field) -> Option<&Input> {
        match field {
            Field::TechnologyName => Some(&self.technology_name),
            Field::BenchmarkName => Some(&self.benchmark_name),
            Field::TechnologyPath => Some(&self.technology_path),
            Field::BenchmarkPath => Some(&self.benchmark_path),
            Field::CustomSource => Some(&self.custom_source),
            Field::AdditionalInfo => Some(&self.additional_info),
            Field::InfoSource => None,
        }
    }

    fn input_mut(&mut self, field: Field) -> Option<&mut Input> {
        match field {
            Field::TechnologyName => Some(&mut self.technology_name),
            Field::BenchmarkName => Some(&mut self.benchmark_name),
            Field::TechnologyPath => Some(&mut self.technology_path),
            Field::BenchmarkPath => Some(&mut self.benchmark_path),
            Field::CustomSource => Some(&mut self.custom_source),
            Field::AdditionalInfo => Some(&mut self.additional_info),
            Field::InfoSource => None,
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let visible = self.visible();
        let idx = visible.iter().position(|f| *f == self.focus).unwrap_or(0);
        let len = visible.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.focus = visible[next];
    }

    fn set_source(&mut self, source: InfoSource) {
        self.info_source = source;
        // Hidden field cannot keep focus.
        if !self.visible().contains(&self.focus) {
            self.focus = Field::InfoSource;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<FormAction> {
        match key.code {
            KeyCode::Esc => return Some(FormAction::Cancel),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(FormAction::Cancel)
            }
            KeyCode::Enter => {
                return match self.fields().validate() {
                    Ok(()) => Some(FormAction::Submit),
                    Err(e) => {
                        self.error = Some(e.to_string());
                        None
                    }
                };
            }
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Right if self.focus == Field::InfoSource => {
                self.set_source(self.info_source.next())
            }
            KeyCode::Left if self.focus == Field::InfoSource => {
                self.set_source(self.info_source.prev())
            }
            _ => {
                let focus = self.focus;
                if let Some(input) = self.input_mut(focus) {
                    input.handle_event(&Event::Key(key));
                }
            }
        }
        self.error = None;
        None
    }
}

/// Raw mode and the alternate screen, undone on drop.
///
/// Dropping restores the terminal even when setup fails partway or the
/// form loop returns an error.
struct TerminalSession {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
}

impl TerminalSession {
    fn start() -> Result<Self> {
        enable_raw_mode()?;
        let mut session = Self { terminal: None };
        execute!(io::stdout(), EnterAlternateScreen)?;
        session.terminal = Some(Terminal::new(CrosstermBackend::new(io::stdout()))?);
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        if let Some(terminal) = self.terminal.as_mut() {
            let _ = terminal.show_cursor();
        }
    }
}

/// Run the form and return the submitted fields.
pub fn run_form(initial: ProjectFields) -> Result<FormResult> {
    let mut session = TerminalSession::start()?;
    match session.terminal.as_mut() {
        Some(terminal) => run_form_loop(terminal, FormState::new(initial)),
        None => Ok(FormResult::Cancelled),
    }
}

fn run_form_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut state: FormState,
) -> Result<FormResult> {
    loop {
        terminal.draw(|frame| draw_form(frame, &state))?;

        if let Event::Key(key) = event::read()? {
            // Only handle key press events (not release)
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match state.handle_key(key) {
                Some(FormAction::Submit) => return Ok(FormResult::Submit(state.fields())),
                Some(FormAction::Cancel) => return Ok(FormResult::Cancelled),
                None => {}
            }
        }
    }
}

fn draw_form(frame: &mut Frame, state: &FormState) {
    let size = frame.area();
    let width = size.width.saturating_sub(4).min(100);
    let height = size.height.saturating_sub(2).min(24);
    let area = centered_rect(width, height, size);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Project task ")
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = state.visible();
    let mut constraints: Vec<Constraint> = visible.iter().map(|_| Constraint::Length(1)).collect();
    constraints.push(Constraint::Min(4));
    constraints.push(Constraint::Length(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (row, field) in rows.iter().zip(visible.iter()) {
        draw_field(frame, state, *field, *row);
    }

    let preview = Paragraph::new(compose_message(&state.fields()))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Message preview ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(preview, rows[visible.len()]);

    let status = match &state.error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            "Tab/Shift-Tab move  ←/→ change source  Enter send  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(status), rows[visible.len() + 1]);
}

fn draw_field(frame: &mut Frame, state: &FormState, field: Field, row: Rect) {
    let focused = state.focus == field;
    let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let label = format!("{:<width$}", format!("{}:", field.label()), width = LABEL_WIDTH as usize);
    let value_width = row.width.saturating_sub(LABEL_WIDTH) as usize;

    let (value, cursor) = match state.input(field) {
        Some(input) => {
            let cursor_pos = input.visual_cursor();
            // Scroll the input if cursor is beyond visible area
            let scroll = if value_width > 0 && cursor_pos >= value_width {
                cursor_pos - value_width + 1
            } else {
                0
            };
            let visible: String = input.value().chars().skip(scroll).take(value_width).collect();
            (visible, Some(cursor_pos - scroll))
        }
        None => (format!("< {} >", state.info_source.template()), None),
    };

    let line = Line::from(vec![
        Span::styled(label, label_style),
        Span::styled(value, Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(line), row);

    if focused {
        if let Some(cursor) = cursor {
            frame.set_cursor_position((row.x + LABEL_WIDTH + cursor as u16, row.y));
        }
    }
}

/// A `width` x `height` rectangle centered in `area`, clipped to it.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
