use anyhow::Result;
use bmi_tracker::{
    calculate, view_history, AppConfig, HistorySeries, HistoryView, MeasurementStore,
    EMPTY_HISTORY_MESSAGE,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

/// Controls on the main form, in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Weight,
    Height,
    Calculate,
    ViewHistory,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Weight => Focus::Height,
            Focus::Height => Focus::Calculate,
            Focus::Calculate => Focus::ViewHistory,
            Focus::ViewHistory => Focus::Weight,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Weight => Focus::ViewHistory,
            Focus::Height => Focus::Weight,
            Focus::Calculate => Focus::Height,
            Focus::ViewHistory => Focus::Calculate,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Focus::Weight | Focus::Height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Error,
    Info,
}

/// Modal message box. Blocks every other key until dismissed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

/// What sits under any dialog
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Idle,
    /// Chart window layered over the form; owns the series it displays
    HistoryOpen(HistorySeries),
}

pub struct App<S: MeasurementStore> {
    store: S,
    config: AppConfig,
    pub weight_input: String,
    pub height_input: String,
    pub focus: Focus,
    pub screen: Screen,
    pub dialog: Option<Dialog>,
    pub record_count: i64,
    pub should_quit: bool,
}

impl<S: MeasurementStore> App<S> {
    pub fn new(store: S, config: AppConfig) -> Self {
        let mut app = Self {
            store,
            config,
            weight_input: String::new(),
            height_input: String::new(),
            focus: Focus::Weight,
            screen: Screen::Idle,
            dialog: None,
            record_count: 0,
            should_quit: false,
        };
        app.refresh_count();
        app
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn show_error(&mut self, message: String) {
        self.dialog = Some(Dialog {
            kind: DialogKind::Error,
            title: "Error".to_string(),
            message,
        });
    }

    pub fn show_info(&mut self, title: &str, message: String) {
        self.dialog = Some(Dialog {
            kind: DialogKind::Info,
            title: title.to_string(),
            message,
        });
    }

    fn refresh_count(&mut self) {
        match self.store.count() {
            Ok(count) => self.record_count = count,
            Err(err) => tracing::warn!(%err, "could not count measurements"),
        }
    }

    /// "Calculate BMI" button
    pub fn calculate_bmi(&mut self) {
        match calculate(&self.store, &self.weight_input, &self.height_input) {
            Ok(report) => {
                self.refresh_count();
                self.show_info("BMI Result", report.message());
            }
            Err(err) => self.show_error(err.to_string()),
        }
    }

    /// "View History" button
    pub fn view_history(&mut self) {
        match view_history(&self.store) {
            Ok(HistoryView::Empty) => self.show_info("History", EMPTY_HISTORY_MESSAGE.to_string()),
            Ok(HistoryView::Chart(series)) => self.screen = Screen::HistoryOpen(series),
            Err(err) => {
                tracing::error!(%err, "could not load history");
                self.show_error(format!("Could not load history: {}", err));
            }
        }
    }

    /// "Close" button of the chart window
    pub fn close_history(&mut self) {
        self.screen = Screen::Idle;
    }

    pub fn dismiss_dialog(&mut self) {
        self.dialog = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.dialog.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.dismiss_dialog();
            }
            return;
        }

        if let Screen::HistoryOpen(_) = self.screen {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('C')
            ) {
                self.close_history();
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.previous(),
            KeyCode::Enter => match self.focus {
                Focus::Weight => self.focus = Focus::Height,
                Focus::Height | Focus::Calculate => self.calculate_bmi(),
                Focus::ViewHistory => self.view_history(),
            },
            KeyCode::Char(' ') if !self.focus.is_input() => match self.focus {
                Focus::ViewHistory => self.view_history(),
                _ => self.calculate_bmi(),
            },
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(input) = self.focused_input_mut() {
                    input.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.focused_input_mut() {
                    input.pop();
                }
            }
            _ => {}
        }
    }

    fn focused_input_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Weight => Some(&mut self.weight_input),
            Focus::Height => Some(&mut self.height_input),
            _ => None,
        }
    }
}

pub fn run_ui<S: MeasurementStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: MeasurementStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            // Windows also reports key releases
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.handle_key(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui<S: MeasurementStore>(f: &mut Frame, app: &App<S>) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Status bar
        ])
        .split(size);

    render_header(f, chunks[0], app);
    render_form(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);

    if let Screen::HistoryOpen(series) = &app.screen {
        render_history(f, centered_rect(90, 85, size), series, &app.config.chart_title);
    }

    if let Some(dialog) = &app.dialog {
        render_dialog(f, size, dialog);
    }
}

fn render_header<S: MeasurementStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let header = Paragraph::new(Line::from(Span::styled(
        app.config.window_title.as_str(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_form<S: MeasurementStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3), // Weight
            Constraint::Length(3), // Height
            Constraint::Length(1),
            Constraint::Length(3), // Calculate BMI
            Constraint::Length(3), // View History
            Constraint::Min(0),
        ])
        .split(area);

    let idle = app.dialog.is_none() && app.screen == Screen::Idle;

    render_input(f, rows[1], "Weight (kg):", &app.weight_input, app.focus == Focus::Weight, idle);
    render_input(f, rows[2], "Height (m):", &app.height_input, app.focus == Focus::Height, idle);
    render_button(f, rows[4], "Calculate BMI", app.focus == Focus::Calculate);
    render_button(f, rows[5], "View History", app.focus == Focus::ViewHistory);
}

fn render_input(f: &mut Frame, area: Rect, label: &str, value: &str, focused: bool, show_cursor: bool) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(14), // Label
            Constraint::Length(26), // Entry
            Constraint::Min(0),
        ])
        .split(area);

    let label_widget = Paragraph::new(format!("{} ", label))
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::NONE));
    // Vertically align the label with the entry's text row
    if let Some(label_area) = text_row(columns[1]) {
        f.render_widget(label_widget, label_area);
    }

    let border_color = if focused { Color::Yellow } else { Color::White };
    let entry = Paragraph::new(value).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    f.render_widget(entry, columns[2]);

    if focused && show_cursor && columns[2].width > 2 && columns[2].height > 2 {
        let max_x = columns[2].x + columns[2].width.saturating_sub(2);
        let x = (columns[2].x + 1 + value.chars().count() as u16).min(max_x);
        f.set_cursor(x, columns[2].y + 1);
    }
}

fn render_button(f: &mut Frame, area: Rect, text: &str, focused: bool) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(20),
            Constraint::Min(0),
        ])
        .split(area);

    let style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let button = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(button, columns[1]);
}

fn render_status_bar<S: MeasurementStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let status_spans = vec![
        Span::styled(
            format!(" Records: {} ", app.record_count),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Next | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Select | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_history(f: &mut Frame, area: Rect, series: &HistorySeries, title: &str) {
    f.render_widget(Clear, area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" History ");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Chart
            Constraint::Length(3), // Footer with Close
        ])
        .split(inner);

    let points = series.points();
    let datasets = vec![
        Dataset::default()
            .name("BMI")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&points),
        // Point markers on top of the line
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::LightBlue))
            .data(&points),
    ];

    let x_labels: Vec<Span> = series.x_labels().into_iter().map(Span::from).collect();
    let y_labels: Vec<Span> = series.y_labels().into_iter().map(Span::from).collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    format!(" {} ", title),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )),
        )
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds(series.x_bounds())
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("BMI")
                .style(Style::default().fg(Color::Gray))
                .bounds(series.y_bounds())
                .labels(y_labels),
        );

    if !series.is_empty() && chunks[0].height >= 3 && chunks[0].width >= 10 {
        f.render_widget(chart, chunks[0]);
    }

    let footer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(11)])
        .split(chunks[1]);

    let latest = match series.latest() {
        Some((date, bmi)) => format!(" {} readings | latest {:.2} on {}", series.len(), bmi, date),
        None => String::new(),
    };
    let summary = Paragraph::new(latest)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::NONE));
    if let Some(summary_area) = text_row(footer[0]) {
        f.render_widget(summary, summary_area);
    }

    let close = Paragraph::new("Close")
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(close, footer[1]);
}

fn render_dialog(f: &mut Frame, area: Rect, dialog: &Dialog) {
    let popup = dialog_rect(area, &dialog.message);
    f.render_widget(Clear, popup);

    let color = match dialog.kind {
        DialogKind::Error => Color::Red,
        DialogKind::Info => Color::Green,
    };

    let content = vec![
        Line::from(""),
        Line::from(dialog.message.as_str()),
        Line::from(""),
        Line::from(Span::styled(
            "[ OK ]",
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
        )),
    ];

    let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(format!(" {} ", dialog.title)),
        );

    f.render_widget(paragraph, popup);
}

/// Second row of `area`, the text line inside a bordered 3-row control.
/// `None` when the area has been squeezed below two rows.
fn text_row(area: Rect) -> Option<Rect> {
    if area.height < 2 || area.width == 0 {
        return None;
    }

    Some(Rect {
        y: area.y + 1,
        height: 1,
        ..area
    })
}

/// Fixed-height box sized to the message, centred in `area`
fn dialog_rect(area: Rect, message: &str) -> Rect {
    let width = (message.chars().count() as u16 + 6).max(30).min(area.width);
    let height = 7u16.min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmi_tracker::{open_store, MemoryStore, SqliteStore};
    use ratatui::backend::TestBackend;

    fn new_app() -> App<MemoryStore> {
        App::new(MemoryStore::new(), AppConfig::default())
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn press_any<S: MeasurementStore>(app: &mut App<S>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn fill_form(app: &mut App<MemoryStore>, weight: &str, height: &str) {
        app.focus = Focus::Weight;
        type_text(app, weight);
        press(app, KeyCode::Tab);
        type_text(app, height);
    }

    fn render(app: &App<MemoryStore>) -> String {
        render_sized(app, 100, 30)
    }

    fn render_sized<S: MeasurementStore>(app: &App<S>, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_focus_cycles_both_ways() {
        assert_eq!(Focus::Weight.next(), Focus::Height);
        assert_eq!(Focus::ViewHistory.next(), Focus::Weight);
        assert_eq!(Focus::Weight.previous(), Focus::ViewHistory);
        assert_eq!(Focus::Calculate.previous(), Focus::Height);
    }

    #[test]
    fn test_calculate_shows_result_dialog() {
        let mut app = new_app();
        fill_form(&mut app, "70", "1.75");

        press(&mut app, KeyCode::Enter);

        let dialog = app.dialog.clone().unwrap();
        assert_eq!(dialog.kind, DialogKind::Info);
        assert_eq!(dialog.title, "BMI Result");
        assert_eq!(dialog.message, "Your BMI is: 22.86");
        assert_eq!(app.record_count, 1);
        assert_eq!(app.screen, Screen::Idle);

        // Inputs survive the calculation
        assert_eq!(app.weight_input, "70");
        assert_eq!(app.height_input, "1.75");

        println!("✅ Calculate flow test PASSED");
    }

    #[test]
    fn test_invalid_input_shows_error_without_write() {
        let mut app = new_app();
        fill_form(&mut app, "abc", "1.8");

        press(&mut app, KeyCode::Enter);

        let dialog = app.dialog.clone().unwrap();
        assert_eq!(dialog.kind, DialogKind::Error);
        assert_eq!(dialog.title, "Error");
        assert_eq!(
            dialog.message,
            "Please enter valid numerical values for weight and height."
        );
        assert_eq!(app.store().count().unwrap(), 0);
    }

    #[test]
    fn test_non_positive_input_shows_error_without_write() {
        let mut app = new_app();
        fill_form(&mut app, "-5", "1.8");

        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.dialog.as_ref().map(|d| d.message.as_str()),
            Some("Weight and height must be greater than 0.")
        );
        assert_eq!(app.store().count().unwrap(), 0);
    }

    #[test]
    fn test_storage_failure_shows_error_dialog() {
        let mut app = new_app();
        app.store().set_read_only(true);
        fill_form(&mut app, "70", "1.75");

        press(&mut app, KeyCode::Enter);

        let dialog = app.dialog.clone().unwrap();
        assert_eq!(dialog.kind, DialogKind::Error);
        assert!(dialog.message.starts_with("Could not save measurement"));
        assert!(!app.should_quit);
    }

    #[test]
    fn test_dialog_blocks_input_until_dismissed() {
        let mut app = new_app();
        app.show_error("boom".to_string());

        type_text(&mut app, "12");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.weight_input, "");
        assert_eq!(app.focus, Focus::Weight);

        // Esc closes the dialog, it does not quit
        press(&mut app, KeyCode::Esc);
        assert!(app.dialog.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_view_history_empty_store_shows_notice() {
        let mut app = new_app();
        app.focus = Focus::ViewHistory;

        press(&mut app, KeyCode::Enter);

        let dialog = app.dialog.clone().unwrap();
        assert_eq!(dialog.title, "History");
        assert_eq!(dialog.message, "No BMI data available.");
        assert_eq!(app.screen, Screen::Idle);
    }

    #[test]
    fn test_history_opens_and_closes() {
        let mut app = new_app();
        fill_form(&mut app, "70", "1.75");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter); // dismiss result

        app.focus = Focus::ViewHistory;
        press(&mut app, KeyCode::Enter);

        match &app.screen {
            Screen::HistoryOpen(series) => {
                assert_eq!(series.len(), 1);
                assert!((series.bmis[0] - 70.0 / (1.75 * 1.75)).abs() < 1e-9);
            }
            Screen::Idle => panic!("history window should be open"),
        }

        // Typing does not reach the form while the chart is open
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.weight_input, "70");

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.screen, Screen::Idle);
        assert_eq!(app.store().count().unwrap(), 1);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_backspace_edits_focused_field() {
        let mut app = new_app();
        type_text(&mut app, "705");

        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.weight_input, "70");
        assert_eq!(app.height_input, "");
    }

    #[test]
    fn test_enter_on_weight_moves_to_height() {
        let mut app = new_app();
        type_text(&mut app, "70");

        press(&mut app, KeyCode::Enter);

        assert_eq!(app.focus, Focus::Height);
        assert!(app.dialog.is_none());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = new_app();
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);

        let mut app = new_app();
        app.show_error("still quits".to_string());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_render_main_form() {
        let app = new_app();

        let screen = render(&app);

        assert!(screen.contains("BMI Calculator"));
        assert!(screen.contains("Weight (kg):"));
        assert!(screen.contains("Height (m):"));
        assert!(screen.contains("Calculate BMI"));
        assert!(screen.contains("View History"));
        assert!(screen.contains("Records: 0"));
    }

    #[test]
    fn test_render_result_dialog() {
        let mut app = new_app();
        fill_form(&mut app, "70", "1.75");
        press(&mut app, KeyCode::Enter);

        let screen = render(&app);

        assert!(screen.contains("BMI Result"));
        assert!(screen.contains("Your BMI is: 22.86"));
        assert!(screen.contains("[ OK ]"));
    }

    #[test]
    fn test_render_history_window() {
        let mut app = new_app();
        for (w, h) in [("70", "1.75"), ("72", "1.75"), ("71", "1.75")] {
            app.weight_input.clear();
            app.height_input.clear();
            fill_form(&mut app, w, h);
            press(&mut app, KeyCode::Enter);
            press(&mut app, KeyCode::Enter);
        }
        app.view_history();

        let screen = render(&app);

        assert!(screen.contains("BMI Trend Over Time"));
        assert!(screen.contains("Close"));
        assert!(screen.contains("3 readings"));
    }

    #[test]
    fn test_render_survives_small_terminals() {
        let sizes = [(80, 24), (40, 12), (30, 8), (20, 6), (20, 5), (15, 4), (10, 3)];

        let mut form_app = new_app();
        form_app.focus = Focus::Height;
        type_text(&mut form_app, "1.75");

        let mut dialog_app = new_app();
        dialog_app.show_error("Please enter valid numerical values for weight and height.".to_string());

        let mut history_app = new_app();
        history_app.store().insert(70.0, 1.75, 22.86, "2024-01-01 08:00:00").unwrap();
        history_app.store().insert(72.0, 1.75, 23.51, "2024-01-08 08:00:00").unwrap();
        history_app.view_history();
        assert!(matches!(history_app.screen, Screen::HistoryOpen(_)));

        for (width, height) in sizes {
            render_sized(&form_app, width, height);
            render_sized(&dialog_app, width, height);
            render_sized(&history_app, width, height);
        }

        println!("✅ Small terminal rendering test PASSED");
    }

    #[test]
    fn test_text_row_requires_two_rows() {
        assert_eq!(text_row(Rect::new(2, 5, 10, 1)), None);
        assert_eq!(text_row(Rect::new(2, 5, 10, 0)), None);
        assert_eq!(text_row(Rect::new(2, 5, 10, 3)), Some(Rect::new(2, 6, 10, 1)));
    }

    #[test]
    fn test_history_read_failure_shows_error_dialog() {
        // No table: every read fails
        let store = SqliteStore::open_in_memory().unwrap();
        let mut app = App::new(store, AppConfig::default());

        app.view_history();

        let dialog = app.dialog.clone().unwrap();
        assert_eq!(dialog.kind, DialogKind::Error);
        assert!(dialog.message.starts_with("Could not load history:"));
        assert_eq!(app.screen, Screen::Idle);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_unopenable_database_still_runs_ui() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("bmi_data.db");

        let (store, startup_error) = open_store(&path);
        let mut app = App::new(store, AppConfig::default());
        if let Some(err) = startup_error {
            app.show_error(err.to_string());
        }

        let dialog = app.dialog.clone().unwrap();
        assert_eq!(dialog.kind, DialogKind::Error);
        assert!(dialog.message.starts_with("failed to open database"));

        // Dismiss, then every action reports the store problem instead of exiting
        press_any(&mut app, KeyCode::Enter);
        app.weight_input = "70".to_string();
        app.height_input = "1.75".to_string();
        app.calculate_bmi();
        assert!(app
            .dialog
            .as_ref()
            .unwrap()
            .message
            .starts_with("Could not save measurement: database unavailable"));

        press_any(&mut app, KeyCode::Enter);
        app.view_history();
        assert!(app.dialog.as_ref().unwrap().message.starts_with("Could not load history:"));
        assert_eq!(app.screen, Screen::Idle);
        assert!(!app.should_quit);

        render_sized(&app, 80, 24);
    }

    #[test]
    fn test_dialog_rect_fits_small_terminals() {
        let area = Rect::new(0, 0, 20, 5);

        let rect = dialog_rect(area, "Please enter valid numerical values for weight and height.");

        assert!(rect.width <= area.width);
        assert!(rect.height <= area.height);
    }
}
