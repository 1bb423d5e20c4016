use crate::backend::Backend;
use crate::leaderboard::{self, Leaderboard, UniversityFilter, View};
use crate::local::{LocalStore, Theme, TIMER_KEY};
use crate::models::{Profile, Task, UserId};
use crate::recorder::record_focus_or_warn;
use crate::stats::{calculate_stats, StudyStats};
use crate::tasks;
use crate::timer::{Phase, Timer, TimerEvent, TimerSettings, TimerSnapshot};
use crate::utils::{format_clock, format_minutes, plural_days};
use anyhow::Result;
use chrono::{DateTime, Duration, Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

const SAVE_EVERY_SECS: i64 = 30;

pub struct Dashboard<B: Backend> {
    pub backend: B,
    pub local: LocalStore,
    pub user_id: UserId,
    pub profile: Profile,
    pub timer: Timer,
    pub active_task: Option<Task>,
    pub tasks: Vec<Task>,
    pub selected: usize,
    pub stats: StudyStats,
    pub board: Leaderboard,
    pub filter: UniversityFilter,
    pub view: View,
    pub universities: Vec<String>,
    pub limit: usize,
    pub last_save: DateTime<Utc>,
    pub message: Option<String>,
}

impl<B: Backend> Dashboard<B> {
    pub fn new(
        backend: B,
        local: LocalStore,
        profile: Profile,
        defaults: TimerSettings,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let settings = local.timer_settings(defaults);
        let timer = match local.get::<TimerSnapshot>(TIMER_KEY) {
            Some(snapshot) => Timer::restore(&snapshot, now),
            None => Timer::new(settings),
        };
        let active_task = tasks::active_task(&local);

        let mut dashboard = Self {
            backend,
            local,
            user_id: profile.id.clone(),
            filter: UniversityFilter::from(profile.university.as_str()),
            profile,
            timer,
            active_task,
            tasks: Vec::new(),
            selected: 0,
            stats: StudyStats::default(),
            board: Leaderboard::default(),
            view: View::Weekly,
            universities: Vec::new(),
            limit,
            last_save: now,
            message: None,
        };
        dashboard.refresh_tasks();
        dashboard.refresh_stats(now);
        dashboard.refresh_leaderboard(now);
        dashboard
    }

    pub fn refresh_tasks(&mut self) {
        match self.backend.open_tasks(&self.user_id) {
            Ok(tasks) => {
                self.tasks = tasks;
                self.selected = self.selected.min(self.tasks.len().saturating_sub(1));
            }
            Err(e) => warn!("Failed to load tasks: {e:#}"),
        }
    }

    pub fn refresh_stats(&mut self, now: DateTime<Utc>) {
        match self.backend.user_sessions(&self.user_id, None) {
            Ok(sessions) => self.stats = calculate_stats(&sessions, now.with_timezone(&Local)),
            Err(e) => warn!("Failed to load sessions: {e:#}"),
        }
    }

    pub fn refresh_leaderboard(&mut self, now: DateTime<Utc>) {
        match leaderboard::fetch(
            &self.backend,
            &self.filter,
            self.view,
            Some(self.user_id.as_str()),
            self.limit,
            now,
        ) {
            Ok(board) => self.board = board,
            Err(e) => warn!("Failed to load leaderboard: {e:#}"),
        }
        if let Ok(known) = self.known_universities() {
            self.universities = known;
        }
    }

    /// Universities of everyone who has studied, own first.
    fn known_universities(&self) -> Result<Vec<String>> {
        let sessions = self.backend.sessions_since(None)?;
        let mut ids: Vec<UserId> = sessions.into_iter().map(|s| s.user_id).collect();
        ids.sort();
        ids.dedup();

        let mut known = vec![self.profile.university.clone()];
        for profile in self.backend.profiles(&ids)? {
            if !profile.university.is_empty() && !known.contains(&profile.university) {
                known.push(profile.university);
            }
        }
        known.retain(|u| !u.is_empty());
        Ok(known)
    }

    /// All → each known university → All.
    pub fn cycle_filter(&mut self, now: DateTime<Utc>) {
        let position = match &self.filter {
            UniversityFilter::All => None,
            UniversityFilter::Named(name) => self.universities.iter().position(|u| u == name),
        };
        let next = match position {
            None => self.universities.first(),
            Some(i) => self.universities.get(i + 1),
        };
        self.filter = match next {
            Some(name) => UniversityFilter::Named(name.clone()),
            None => UniversityFilter::All,
        };
        self.refresh_leaderboard(now);
    }

    pub fn persist_timer(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.local.set(TIMER_KEY, &self.timer.snapshot(now)) {
            warn!("Failed to save timer state: {e:#}");
        }
        self.last_save = now;
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        let event = self.timer.tick(now);
        match event {
            Some(TimerEvent::FocusCompleted { minutes }) => {
                self.on_focus_completed(minutes, now);
                self.persist_timer(now);
            }
            Some(TimerEvent::BreakCompleted) => {
                self.message = Some("Break over. Ready to focus?".to_string());
                self.persist_timer(now);
            }
            None => {
                if self.timer.is_running() && now - self.last_save > Duration::seconds(SAVE_EVERY_SECS) {
                    self.persist_timer(now);
                }
            }
        }
        event
    }

    fn on_focus_completed(&mut self, minutes: u32, now: DateTime<Utc>) {
        let Some(recorded) = record_focus_or_warn(
            &mut self.backend,
            &self.user_id,
            minutes,
            self.active_task.as_ref(),
            now,
        ) else {
            self.message = Some("Session could not be saved.".to_string());
            return;
        };

        if recorded.task_cleared {
            self.active_task = None;
            if let Err(e) = tasks::clear_active(&mut self.local) {
                warn!("Failed to clear active task: {e:#}");
            }
            self.refresh_tasks();
        }
        self.message = Some(format!("Logged {} of focus. Take a break.", format_minutes(minutes)));
        self.refresh_stats(now);
        self.refresh_leaderboard(now);
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode, now: DateTime<Utc>) -> Result<bool> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.persist_timer(now);
                return Ok(true);
            }
            KeyCode::Char(' ') => {
                self.timer.toggle(now);
                self.message = None;
                self.persist_timer(now);
            }
            KeyCode::Char('r') => {
                self.timer.reset();
                self.persist_timer(now);
            }
            KeyCode::Char('v') => {
                self.view = self.view.toggled();
                self.refresh_leaderboard(now);
            }
            KeyCode::Char('u') => self.cycle_filter(now),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.tasks.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(task) = self.tasks.get(self.selected).cloned() {
                    self.active_task = tasks::toggle_active(&mut self.local, &task)?;
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.tasks.get(self.selected).cloned() {
                    tasks::complete_task(&mut self.backend, &mut self.local, &self.user_id, task.id)?;
                    if self.active_task.as_ref().is_some_and(|t| t.id == task.id) {
                        self.active_task = None;
                    }
                    self.refresh_tasks();
                }
            }
            _ => {}
        }
        Ok(false)
    }
}

pub fn run_tui<B: Backend>(dashboard: &mut Dashboard<B>, theme: Theme, accent: Color) -> Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let palette = Palette::new(theme, accent);
    let res = run_loop(&mut terminal, dashboard, &palette);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_loop<B: Backend>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &mut Dashboard<B>,
    palette: &Palette,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, dashboard, palette))?;

        if event::poll(StdDuration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && dashboard.handle_key(key.code, Utc::now())? {
                    debug!("Dashboard closed");
                    return Ok(());
                }
            }
        }

        dashboard.tick(Utc::now());
    }
}

struct Palette {
    text: Color,
    muted: Color,
    accent: Color,
}

impl Palette {
    fn new(theme: Theme, accent: Color) -> Self {
        match theme {
            Theme::Dark => Self {
                text: Color::White,
                muted: Color::DarkGray,
                accent,
            },
            Theme::Light => Self {
                text: Color::Black,
                muted: Color::Gray,
                accent,
            },
        }
    }
}

fn draw<B: Backend>(frame: &mut Frame, dashboard: &Dashboard<B>, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Min(12),    // Timer, tasks, stats, leaderboard
            Constraint::Length(10), // Chart
            Constraint::Length(3),  // Footer
        ])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(columns[1]);

    draw_header(frame, rows[0], dashboard, palette);
    draw_timer(frame, left[0], dashboard, palette);
    draw_tasks(frame, left[1], dashboard, palette);
    draw_stats(frame, right[0], dashboard, palette);
    draw_leaderboard(frame, right[1], dashboard, palette);
    draw_chart(frame, rows[2], &dashboard.stats, palette);
    draw_footer(frame, rows[3], dashboard, palette);
}

fn draw_header<B: Backend>(frame: &mut Frame, area: Rect, dashboard: &Dashboard<B>, palette: &Palette) {
    let profile = &dashboard.profile;
    let mut who = format!("{} · {}", profile.display_name, profile.university);
    let majors = profile.majors_label();
    if !majors.is_empty() {
        who.push_str(" · ");
        who.push_str(&majors);
    }

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " StudyGrind ",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(who, Style::default().fg(palette.text)),
        Span::raw(" | "),
        Span::styled(
            Local::now().format("%Y-%m-%d %H:%M").to_string(),
            Style::default().fg(palette.muted),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_timer<B: Backend>(frame: &mut Frame, area: Rect, dashboard: &Dashboard<B>, palette: &Palette) {
    let now = Utc::now();
    let timer = &dashboard.timer;
    let (label, color) = match (timer.phase(), timer.is_running()) {
        (Phase::Focus, true) => ("FOCUS", Color::Green),
        (Phase::Focus, false) => ("FOCUS (paused)", palette.muted),
        (Phase::Break, true) => ("BREAK", Color::Yellow),
        (Phase::Break, false) => ("BREAK (paused)", palette.muted),
    };

    let settings = timer.settings();
    let full_minutes = match timer.phase() {
        Phase::Focus => settings.work_minutes,
        Phase::Break => settings.break_minutes,
    };
    let full_secs = f64::from(full_minutes) * 60.0;
    let left = timer.remaining_secs(now);
    let ratio = (1.0 - left as f64 / full_secs).clamp(0.0, 1.0);

    let mut title = format!(" {} ", label);
    if let Some(task) = &dashboard.active_task {
        title = match &task.unit {
            Some(unit) => format!(" {} · {} · {} ", label, unit, task.title),
            None => format!(" {} · {} ", label, task.title),
        };
    }

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
                .borders(Borders::ALL),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(Span::styled(
            format_clock(left),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(gauge, area);
}

fn draw_tasks<B: Backend>(frame: &mut Frame, area: Rect, dashboard: &Dashboard<B>, palette: &Palette) {
    let mut lines = Vec::new();
    if dashboard.tasks.is_empty() {
        lines.push(Line::styled("  No tasks yet.", Style::default().fg(palette.muted)));
    }
    for (i, task) in dashboard.tasks.iter().enumerate() {
        let is_active = dashboard.active_task.as_ref().is_some_and(|t| t.id == task.id);
        let cursor = if i == dashboard.selected { ">" } else { " " };
        let style = if is_active {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text)
        };
        let mut spans = vec![Span::raw(format!("{} ", cursor)), Span::styled(task.title.clone(), style)];
        if let Some(unit) = &task.unit {
            spans.push(Span::styled(format!("  {}", unit), Style::default().fg(palette.muted)));
        }
        if is_active {
            spans.push(Span::styled("  ACTIVE", Style::default().fg(palette.muted)));
        }
        lines.push(Line::from(spans));
    }

    let block = Block::default()
        .title(Span::styled(" TASKS ", Style::default().add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_stats<B: Backend>(frame: &mut Frame, area: Rect, dashboard: &Dashboard<B>, palette: &Palette) {
    let stats = &dashboard.stats;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("  This Week: ", Style::default().fg(palette.muted)),
            Span::styled(
                format_minutes(stats.weekly_minutes),
                Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Streak:    ", Style::default().fg(palette.muted)),
            Span::styled(
                format!("{} {}", stats.streak, plural_days(stats.streak)),
                Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    for unit in stats.units.iter().take(area.height.saturating_sub(4) as usize) {
        lines.push(Line::raw(format!(
            "    {:<14} {}",
            unit.unit,
            format_minutes(unit.minutes)
        )));
    }

    let block = Block::default()
        .title(Span::styled(" STATS ", Style::default().add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_leaderboard<B: Backend>(
    frame: &mut Frame,
    area: Rect,
    dashboard: &Dashboard<B>,
    palette: &Palette,
) {
    let board = &dashboard.board;
    let mut lines = Vec::new();
    if board.entries.is_empty() {
        lines.push(Line::styled(
            "  No results for this university yet.",
            Style::default().fg(palette.muted),
        ));
    }
    for (i, entry) in board.entries.iter().enumerate() {
        let is_me = entry.user_id == dashboard.user_id;
        let name = if is_me { "You" } else { entry.display_name.as_str() };
        let style = if is_me {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  #{:<3}", i + 1), Style::default().fg(palette.muted)),
            Span::styled(format!("{:<20}", name), style),
            Span::styled(format_minutes(entry.minutes), style),
        ]));
    }
    if let (Some(rank), Some(minutes)) = (board.my_rank, board.my_minutes) {
        if rank > board.entries.len() {
            lines.push(Line::styled(
                format!("  #{:<3}{:<20}{}", rank, "You", format_minutes(minutes)),
                Style::default().fg(palette.accent),
            ));
        }
    }

    let title = format!(" LEADERBOARD · {} · {} ", dashboard.view, dashboard.filter.label());
    let block = Block::default()
        .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_chart(frame: &mut Frame, area: Rect, stats: &StudyStats, palette: &Palette) {
    let chart_block = Block::default()
        .title(" Minutes - Last 7 Days ")
        .borders(Borders::ALL);
    let inner_area = chart_block.inner(area);
    frame.render_widget(chart_block, area);

    if inner_area.height < 2 || inner_area.width < 14 {
        return;
    }

    let max_minutes = stats.daily_minutes.values().copied().max().unwrap_or(0).max(1);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 7); 7])
        .split(inner_area);

    for (i, (date, minutes)) in stats.daily_minutes.iter().enumerate().take(7) {
        let col_area = columns[i];

        let bar_label_split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(col_area);

        let bar_area = bar_label_split[0];
        let label_area = bar_label_split[1];

        // Center the bar horizontally within the column
        let bar_width = 5.min(bar_area.width);
        let bar_x_offset = (bar_area.width - bar_width) / 2;
        let centered_bar_area = Rect::new(
            bar_area.x + bar_x_offset,
            bar_area.y,
            bar_width,
            bar_area.height,
        );

        let label = if *date == stats.today {
            "Today".to_string()
        } else {
            date.format("%a").to_string()
        };
        frame.render_widget(
            Paragraph::new(label).alignment(Alignment::Center),
            label_area,
        );

        if centered_bar_area.height > 0 && *minutes > 0 {
            let total_height = u32::from(centered_bar_area.height);
            let bar_height = (minutes * total_height / max_minutes).max(1) as u16;
            let remaining_height = centered_bar_area.height.saturating_sub(bar_height);

            let bar_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(remaining_height),
                    Constraint::Length(bar_height),
                ])
                .split(centered_bar_area);

            frame.render_widget(Block::default().bg(palette.accent), bar_chunks[1]);
        }
    }
}

fn draw_footer<B: Backend>(frame: &mut Frame, area: Rect, dashboard: &Dashboard<B>, palette: &Palette) {
    let text = match &dashboard.message {
        Some(message) => message.clone(),
        None => "space start/pause | r reset | j/k select | enter active | d done | v view | u university | q quit"
            .to_string(),
    };
    let help = Paragraph::new(text)
        .style(Style::default().fg(palette.muted))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(help, area);
}
