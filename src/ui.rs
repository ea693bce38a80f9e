use anyhow::Result;
use cldr_viewer::{
    Category, CategorySchema, Comparator, ComparisonRow, CoverageBand, CoverageCalculator,
    CoverageReport, FieldStatus, LocaleId, LocaleLoader, LocaleRecord,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Compare,
    Coverage,
}

impl Page {
    pub fn toggle(&self) -> Self {
        match self {
            Page::Compare => Page::Coverage,
            Page::Coverage => Page::Compare,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Compare => "Compare",
            Page::Coverage => "Coverage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
}

pub struct App {
    loader: LocaleLoader,
    pub locale: LocaleId,
    pub reference: LocaleId,
    pub record: Option<Arc<LocaleRecord>>,
    pub reference_record: Option<Arc<LocaleRecord>>,
    /// Load failures, one line per locale
    pub errors: Vec<String>,
    pub category: Category,
    pub rows: Vec<ComparisonRow>,
    pub filtered_rows: Vec<ComparisonRow>,
    pub filter: String,
    pub only_missing: bool,
    pub input_mode: InputMode,
    pub state: TableState,
    pub coverage: Option<CoverageReport>,
    pub coverage_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    low_coverage_threshold: f64,
}

impl App {
    pub fn new(loader: LocaleLoader, locale: &str, reference: &str) -> Result<Self> {
        let locale = LocaleId::parse(locale)?;
        let reference = LocaleId::parse(reference)?;

        let mut app = Self {
            loader,
            locale,
            reference,
            record: None,
            reference_record: None,
            errors: Vec::new(),
            category: Category::ALL[0],
            rows: Vec::new(),
            filtered_rows: Vec::new(),
            filter: String::new(),
            only_missing: false,
            input_mode: InputMode::Normal,
            state: TableState::default(),
            coverage: None,
            coverage_state: TableState::default(),
            current_page: Page::Compare,
            show_detail: false,
            low_coverage_threshold: CoverageCalculator::new().low_coverage_threshold,
        };

        app.reload(false);
        if let Some(category) = app.first_populated_category() {
            app.select_category(category);
        }
        Ok(app)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.low_coverage_threshold = threshold;
        self.recompute();
        self
    }

    /// Load both locales again; `refresh` skips the cache
    pub fn reload(&mut self, refresh: bool) {
        self.errors.clear();

        let (a, b) = if refresh {
            (
                self.loader.refresh(self.locale.as_str()),
                self.loader.refresh(self.reference.as_str()),
            )
        } else {
            self.loader.load_pair(self.locale.as_str(), self.reference.as_str())
        };

        self.record = match a {
            Ok(record) => Some(record),
            Err(e) => {
                self.errors.push(format!("{}: {}", self.locale, e));
                None
            }
        };
        self.reference_record = match b {
            Ok(record) => Some(record),
            Err(e) => {
                self.errors.push(format!("{}: {}", self.reference, e));
                None
            }
        };

        self.recompute();
    }

    fn recompute(&mut self) {
        let a = self.side(&self.record, &self.locale);
        let b = self.side(&self.reference_record, &self.reference);

        self.coverage = self.reference_record.as_ref().map(|reference| {
            let schema = CategorySchema::from_reference(reference);
            CoverageCalculator::with_threshold(self.low_coverage_threshold).calculate(&a, &schema)
        });
        if self.coverage_state.selected().is_none() {
            self.coverage_state.select(Some(0));
        }

        self.rows = Comparator::compare_union(&a, &b, self.category.key()).rows;
        self.apply_filter();
    }

    fn side(&self, record: &Option<Arc<LocaleRecord>>, locale: &LocaleId) -> Arc<LocaleRecord> {
        record
            .clone()
            .unwrap_or_else(|| Arc::new(LocaleRecord::new(locale.clone())))
    }

    fn first_populated_category(&self) -> Option<Category> {
        let has = |record: &Option<Arc<LocaleRecord>>, category: Category| {
            record.as_ref().is_some_and(|r| r.has_category(category.key()))
        };
        Category::ALL
            .iter()
            .copied()
            .find(|c| has(&self.record, *c) || has(&self.reference_record, *c))
    }

    pub fn apply_filter(&mut self) {
        self.filtered_rows = self
            .rows
            .iter()
            .filter(|row| row.matches(&self.filter))
            .filter(|row| !self.only_missing || row.is_missing_against_reference())
            .cloned()
            .collect();

        // Reset selection to first item
        if !self.filtered_rows.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.only_missing = false;
        self.apply_filter();
    }

    pub fn toggle_only_missing(&mut self) {
        self.only_missing = !self.only_missing;
        self.apply_filter();
    }

    pub fn select_category(&mut self, category: Category) {
        self.category = category;
        self.recompute();
    }

    pub fn next_category(&mut self) {
        self.select_category(self.category.next());
    }

    pub fn previous_category(&mut self) {
        self.select_category(self.category.previous());
    }

    pub fn swap_locales(&mut self) {
        std::mem::swap(&mut self.locale, &mut self.reference);
        std::mem::swap(&mut self.record, &mut self.reference_record);
        self.errors.reverse();
        self.recompute();
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_row(&self) -> Option<&ComparisonRow> {
        self.state.selected().and_then(|i| self.filtered_rows.get(i))
    }

    /// Coverage of the category shown in the compare table
    pub fn category_percent(&self) -> Option<f64> {
        self.coverage
            .as_ref()
            .and_then(|c| c.get(self.category.key()))
            .map(|r| r.percent)
    }

    /// Jump from the coverage table to the compare view of the selected row
    pub fn open_selected_category(&mut self) {
        let selected = self
            .coverage
            .as_ref()
            .zip(self.coverage_state.selected())
            .and_then(|(report, i)| report.categories.get(i))
            .and_then(|result| result.category.parse::<Category>().ok());

        if let Some(category) = selected {
            self.select_category(category);
            self.current_page = Page::Compare;
        }
    }

    fn active_len(&self) -> usize {
        match self.current_page {
            Page::Compare => self.filtered_rows.len(),
            Page::Coverage => self.coverage.as_ref().map(|c| c.categories.len()).unwrap_or(0),
        }
    }

    fn active_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Compare => &mut self.state,
            Page::Coverage => &mut self.coverage_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        state.select(Some(i));
    }

    /// Returns false when the browser should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.input_mode == InputMode::Filter {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Backspace => {
                    self.filter.pop();
                    self.apply_filter();
                }
                KeyCode::Char(c) => {
                    self.filter.push(c);
                    self.apply_filter();
                }
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Enter if self.current_page == Page::Coverage => self.open_selected_category(),
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::Tab => self.next_category(),
            KeyCode::BackTab => self.previous_category(),
            KeyCode::Char('v') => self.current_page = self.current_page.toggle(),
            KeyCode::Char('/') => {
                self.current_page = Page::Compare;
                self.input_mode = InputMode::Filter;
            }
            KeyCode::Char('m') => self.toggle_only_missing(),
            KeyCode::Char('c') => self.clear_filter(),
            KeyCode::Char('s') => self.swap_locales(),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => self.reload(true),
            KeyCode::Char('r') => self.reload(false),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if self.active_len() > 0 {
                    self.active_state().select(Some(0));
                }
            }
            KeyCode::End => {
                let len = self.active_len();
                if len > 0 {
                    self.active_state().select(Some(len - 1));
                }
            }
            _ => {}
        }
        true
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

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

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let error_height = if app.errors.is_empty() { 0 } else { app.errors.len() as u16 + 2 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Locales, category tabs, coverage
            Constraint::Length(error_height), // Load failures
            Constraint::Min(0),               // Content area
            Constraint::Length(3),            // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    if !app.errors.is_empty() {
        render_errors(f, chunks[1], app);
    }

    match app.current_page {
        Page::Compare if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[2]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Compare => render_table(f, chunks[2], app),
        Page::Coverage => render_coverage(f, chunks[2], app),
    }

    render_status_bar(f, chunks[3], app);
}

fn band_color(band: CoverageBand) -> Color {
    match band {
        CoverageBand::Complete => Color::Green,
        CoverageBand::Good => Color::LightGreen,
        CoverageBand::Partial => Color::Yellow,
        CoverageBand::Poor => Color::Red,
        CoverageBand::Empty => Color::DarkGray,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            app.locale.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" vs "),
        Span::styled(app.reference.to_string(), Style::default().fg(Color::White)),
        Span::raw("  |  "),
    ];

    for (i, category) in Category::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *category == app.category {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(category.label(), style));
    }

    if let Some(percent) = app.category_percent() {
        let band = CoverageBand::from_percent(percent);
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("{:.1}% {}", percent, band.name()),
            Style::default().fg(band_color(band)).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" CLDR Viewer - {} ", app.current_page.title())),
    );
    f.render_widget(header, area);
}

fn render_errors(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app
        .errors
        .iter()
        .map(|e| Line::from(Span::styled(format!("❌ {}", e), Style::default().fg(Color::Red))))
        .collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Load errors "),
    );
    f.render_widget(panel, area);
}

fn status_marker(row: &ComparisonRow) -> (&'static str, Color) {
    match row.status {
        FieldStatus::MissingInA => ("❌", Color::Red),
        FieldStatus::MissingInB => ("➕", Color::Cyan),
        FieldStatus::MissingInBoth => ("··", Color::DarkGray),
        FieldStatus::PresentInBoth if row.same_value => ("⚠️", Color::Yellow),
        FieldStatus::PresentInBoth => ("✅", Color::Green),
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Key", app.locale.as_str(), app.reference.as_str()]
        .into_iter()
        .map(|h| {
            Cell::from(h.to_string()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_rows.iter().map(|row| {
        let (marker, color) = status_marker(row);
        let cells = vec![
            Cell::from(marker).style(Style::default().fg(color)),
            Cell::from(truncate(&row.key, 48)),
            Cell::from(truncate(&row.value_a, 32)).style(Style::default().fg(color)),
            Cell::from(truncate(&row.value_b, 32)),
        ];
        Row::new(cells).height(1)
    });

    let title = format!(
        " {} ({}/{}) ",
        app.category.label(),
        app.filtered_rows.len(),
        app.rows.len()
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_coverage(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(report) = &app.coverage else {
        let empty = Paragraph::new(format!(
            "No coverage: reference locale {} could not be loaded",
            app.reference
        ))
        .block(Block::default().borders(Borders::ALL).title(" Coverage "));
        f.render_widget(empty, area);
        return;
    };

    let header_cells = ["Category", "Coverage", "Populated", "Expected", "Band"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = report.categories.iter().map(|result| {
        let band = result.band();
        let label = result
            .category
            .parse::<Category>()
            .map(|c| c.label().to_string())
            .unwrap_or_else(|_| result.category.clone());
        let mut band_label = band.name().to_string();
        if result.percent > 0.0 && result.percent < app.low_coverage_threshold {
            band_label.push_str("  ⚠️ low");
        }
        let cells = vec![
            Cell::from(label),
            Cell::from(format!("{:>6.1}%", result.percent)).style(Style::default().fg(band_color(band))),
            Cell::from(result.populated.to_string()),
            Cell::from(result.expected.to_string()),
            Cell::from(band_label).style(Style::default().fg(band_color(band))),
        ];
        Row::new(cells).height(1)
    });

    let overall = CoverageBand::from_percent(report.overall_percent);
    let title = format!(
        " Coverage of {} against {}: {:.1}% ",
        app.locale, app.reference, report.overall_percent
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(band_color(overall)))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.coverage_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered_rows.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.input_mode == InputMode::Filter {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}_", app.filter),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" done)"));
    } else {
        if !app.filter.is_empty() || app.only_missing {
            let mut active = Vec::new();
            if !app.filter.is_empty() {
                active.push(format!("\"{}\"", app.filter));
            }
            if app.only_missing {
                active.push("missing only".to_string());
            }
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(
                format!("Filter: {}", active.join(", ")),
                Style::default().fg(Color::Green),
            ));
            status_spans.push(Span::raw(" ("));
            status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" clear)"));
        }

        for (key, label, color) in [
            ("/", " Filter | ", Color::Yellow),
            ("m", " Missing | ", Color::Yellow),
            ("Tab", " Category | ", Color::Yellow),
            ("v", " Coverage | ", Color::Yellow),
            ("s", " Swap | ", Color::Yellow),
            ("Enter", " Details | ", Color::Yellow),
            ("q", " Quit", Color::Red),
        ] {
            if key == "/" {
                status_spans.push(Span::raw(" | "));
            }
            status_spans.push(Span::styled(key, Style::default().fg(color)));
            status_spans.push(Span::raw(label));
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let row = match app.selected_row() {
        Some(r) => r,
        None => {
            let no_selection = Paragraph::new("No field selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Field Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let (marker, color) = status_marker(row);
    let shown = |v: &str| if v.trim().is_empty() { "(missing)".to_string() } else { wrap_text(v, 35) };

    let mut content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Category: ", label), Span::raw(row.category.clone())]),
        Line::from(""),
        Line::from(vec![Span::styled("  Key: ", label)]),
        Line::from(vec![Span::raw("  "), Span::raw(wrap_text(&row.key, 35))]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Status: ", label),
            Span::styled(format!("{} {}", marker, row.status.name()), Style::default().fg(color)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(format!("  {}: ", app.locale), label)]),
        Line::from(vec![Span::raw("  "), Span::styled(shown(&row.value_a), Style::default().fg(color))]),
        Line::from(""),
        Line::from(vec![Span::styled(format!("  {}: ", app.reference), label)]),
        Line::from(vec![Span::raw("  "), Span::raw(shown(&row.value_b))]),
        Line::from(""),
    ];

    if row.same_value {
        content.push(Line::from(Span::styled(
            "  ⚠️  Same as reference, possibly untranslated",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
        content.push(Line::from(""));
    }

    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Field Details "),
    );

    f.render_widget(detail_panel, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.chars().count() + word.chars().count() + 1 > width {
            lines.push(std::mem::take(&mut current_line));
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines.join("\n  ")
}
