// UI layer: prompts, spinners and the three interactive screens (level
// picker, language picker, leaderboard). Screens are plain state machines;
// `run_screen` owns the terminal and feeds them key events until they
// finish.

use crate::api::{Metric, SubmissionData};
use crate::error::CliError;
use crate::levels::Level;
use crate::solution::SolutionType;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use std::io::{stdout, Write};
use std::time::Duration;

pub const MIN_TERMINAL_WIDTH: u16 = 70;

const LEVEL_TABLE_WIDTH: usize = 68;
const LANG_BOX_WIDTH: usize = 16;
const LEADERBOARD_WIDTH: usize = 59;
const LEADERBOARD_TOP: usize = 10;
const USER_COLUMN: usize = 20;

pub fn check_width(width: u16) -> Result<(), CliError> {
    if width < MIN_TERMINAL_WIDTH {
        return Err(CliError::TerminalTooNarrow { width, min: MIN_TERMINAL_WIDTH });
    }
    Ok(())
}

/// Current terminal width, failing fast when it is too narrow to draw the
/// tables.
pub fn terminal_width() -> Result<u16> {
    let (width, _) = terminal::size()?;
    check_width(width)?;
    Ok(width)
}

/// Spinner shown while waiting on a compiler, the test runner or the server.
pub fn spinner(msg: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

pub fn input(prompt: &str) -> Result<String> {
    let value: String = Input::new().with_prompt(prompt).interact_text()?;
    Ok(value.trim().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerStatus {
    Browsing,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Up,
    Down,
    Expand,
    Collapse,
    Confirm,
    Cancel,
    Ignore,
}

pub fn key_action(key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Cancel;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => KeyAction::Up,
        KeyCode::Down | KeyCode::Char('j') => KeyAction::Down,
        KeyCode::Right | KeyCode::Char('l') => KeyAction::Expand,
        KeyCode::Left | KeyCode::Char('h') => KeyAction::Collapse,
        KeyCode::Enter => KeyAction::Confirm,
        KeyCode::Esc | KeyCode::Char('q') => KeyAction::Cancel,
        _ => KeyAction::Ignore,
    }
}

/// Cursor over a fixed number of options. Movement wraps around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    pub cursor: usize,
    len: usize,
    pub status: PickerStatus,
}

impl Picker {
    pub fn new(len: usize) -> Self {
        Picker { cursor: 0, len, status: PickerStatus::Browsing }
    }

    pub fn apply(&mut self, action: KeyAction) {
        if self.status != PickerStatus::Browsing {
            return;
        }
        match action {
            KeyAction::Up if self.len > 0 => {
                self.cursor = if self.cursor == 0 { self.len - 1 } else { self.cursor - 1 };
            }
            KeyAction::Down if self.len > 0 => {
                self.cursor = (self.cursor + 1) % self.len;
            }
            KeyAction::Confirm if self.len > 0 => self.status = PickerStatus::Confirmed,
            KeyAction::Cancel => self.status = PickerStatus::Cancelled,
            _ => {}
        }
    }

    pub fn confirmed(&self) -> Option<usize> {
        (self.status == PickerStatus::Confirmed).then_some(self.cursor)
    }
}

/// Something `run_screen` can draw and drive with key events.
pub trait Screen {
    fn render(&self) -> String;
    fn on_key(&mut self, key: KeyEvent);
    fn finished(&self) -> bool;
}

// Raw mode and the alternate screen are restored on drop, so an error
// inside the loop still leaves a usable terminal.
struct TerminalGuard {
    restore: fn(),
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        Self::enter_with(
            terminal::enable_raw_mode,
            || execute!(stdout(), EnterAlternateScreen, cursor::Hide),
            restore_terminal,
        )
    }

    // The guard exists as soon as raw mode is on, so a failing `setup`
    // still runs `restore`.
    fn enter_with(
        enable: impl FnOnce() -> std::io::Result<()>,
        setup: impl FnOnce() -> std::io::Result<()>,
        restore: fn(),
    ) -> Result<Self> {
        enable()?;
        let guard = TerminalGuard { restore };
        setup()?;
        Ok(guard)
    }
}

fn restore_terminal() {
    let _ = execute!(stdout(), cursor::Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn draw(text: &str) -> Result<()> {
    let mut out = stdout();
    queue!(out, cursor::MoveTo(0, 0), terminal::Clear(ClearType::All))?;
    for line in text.lines() {
        // raw mode: no implicit carriage return
        queue!(out, Print(line), Print("\r\n"))?;
    }
    out.flush()?;
    Ok(())
}

pub fn run_screen(screen: &mut dyn Screen) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    draw(&screen.render())?;
    while !screen.finished() {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            screen.on_key(key);
            if !screen.finished() {
                draw(&screen.render())?;
            }
        }
    }
    Ok(())
}

/// Truncate to `width` characters, marking the cut with `..`.
fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let keep = width.saturating_sub(2);
    s.chars().take(keep).chain("..".chars()).collect()
}

fn pad(s: &str, width: usize) -> String {
    let s = fit(s, width);
    let fill = width.saturating_sub(s.chars().count());
    format!("{}{}", s, " ".repeat(fill))
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = line.chars().count() + word.chars().count() + usize::from(!line.is_empty());
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

fn boxed_top(width: usize) -> String {
    format!("┌{}┐", "─".repeat(width))
}

fn boxed_rule(width: usize, fill: &str) -> String {
    format!("│{}│", fill.repeat(width))
}

fn boxed_bottom(width: usize) -> String {
    format!("└{}┘", "─".repeat(width))
}

fn boxed(content: &str, width: usize) -> String {
    format!("│{}│", pad(content, width))
}

fn level_row(marker: &str, id: &str, name: &str, solves: &str, solved: &str, kind: &str) -> String {
    format!(
        "{}{}{}{}{}{}",
        marker,
        pad(id, 4),
        pad(name, 20),
        pad(solves, 10),
        pad(solved, 8),
        pad(kind, LEVEL_TABLE_WIDTH - 44),
    )
}

/// Level list with solve counts, solved markers and an expandable
/// description for the highlighted level.
pub struct LevelPicker<'a> {
    levels: Vec<&'a Level>,
    /// Solve counts keyed by contract name.
    solves: HashMap<String, String>,
    /// Level ids the user has already solved.
    solved: HashSet<String>,
    pub picker: Picker,
    pub description_shown: bool,
}

impl<'a> LevelPicker<'a> {
    pub fn new(
        levels: Vec<&'a Level>,
        solves: HashMap<String, String>,
        solved: HashSet<String>,
    ) -> Self {
        let picker = Picker::new(levels.len());
        LevelPicker { levels, solves, solved, picker, description_shown: false }
    }

    pub fn selected(&self) -> Option<&'a Level> {
        self.picker.confirmed().and_then(|i| self.levels.get(i).copied())
    }
}

impl Screen for LevelPicker<'_> {
    fn render(&self) -> String {
        let mut lines = vec![
            boxed_top(LEVEL_TABLE_WIDTH),
            boxed(&level_row("  ", "#", "NAME", "SOLVES", "SOLVED", "TYPE"), LEVEL_TABLE_WIDTH),
            boxed_rule(LEVEL_TABLE_WIDTH, "─"),
        ];

        for (i, level) in self.levels.iter().enumerate() {
            let selected = i == self.picker.cursor;
            let solves = self.solves.get(&level.contract).map(String::as_str).unwrap_or("");
            let solved = if self.solved.contains(&level.id) { "x" } else { "" };
            let row = level_row(
                if selected { "> " } else { "  " },
                &level.id,
                &level.contract.to_lowercase(),
                solves,
                solved,
                &level.kind,
            );
            lines.push(boxed(&row, LEVEL_TABLE_WIDTH));

            if selected && self.description_shown {
                lines.push(boxed_rule(LEVEL_TABLE_WIDTH, "-"));
                for text in wrap(&level.description, LEVEL_TABLE_WIDTH - 2) {
                    lines.push(boxed(&format!(" {}", text), LEVEL_TABLE_WIDTH));
                }
                if i + 1 != self.levels.len() {
                    lines.push(boxed_rule(LEVEL_TABLE_WIDTH, "-"));
                }
            }
        }

        lines.push(boxed_bottom(LEVEL_TABLE_WIDTH));
        lines.push(String::new());
        lines.push(
            "↑/↓ - Navigate | ←/→ - Toggle Description | q to exit | ↩ to select"
                .dark_grey()
                .to_string(),
        );
        lines.join("\n")
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key_action(key) {
            KeyAction::Expand => self.description_shown = true,
            KeyAction::Collapse => self.description_shown = false,
            action => self.picker.apply(action),
        }
    }

    fn finished(&self) -> bool {
        self.picker.status != PickerStatus::Browsing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageChoice {
    Template(SolutionType),
    NoTemplate,
}

const LANGUAGE_OPTIONS: [(&str, LanguageChoice); 4] = [
    ("solidity", LanguageChoice::Template(SolutionType::Sol)),
    ("huff", LanguageChoice::Template(SolutionType::Huff)),
    ("vyper", LanguageChoice::Template(SolutionType::Vyper)),
    ("no template", LanguageChoice::NoTemplate),
];

pub struct LanguagePicker {
    pub picker: Picker,
}

impl LanguagePicker {
    pub fn new() -> Self {
        LanguagePicker { picker: Picker::new(LANGUAGE_OPTIONS.len()) }
    }

    pub fn selected(&self) -> Option<LanguageChoice> {
        self.picker.confirmed().map(|i| LANGUAGE_OPTIONS[i].1)
    }
}

impl Default for LanguagePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for LanguagePicker {
    fn render(&self) -> String {
        let mut lines = vec![
            "Which template do you want to use?".to_string(),
            String::new(),
            boxed_top(LANG_BOX_WIDTH),
        ];
        for (i, (name, _)) in LANGUAGE_OPTIONS.iter().enumerate() {
            let marker = if i == self.picker.cursor { "> " } else { "  " };
            lines.push(boxed(&format!("{}{}", marker, name), LANG_BOX_WIDTH));
        }
        lines.push(boxed_bottom(LANG_BOX_WIDTH));
        lines.push(String::new());
        lines.push("↑/↓ - Navigate | q to exit | ↩ to select".dark_grey().to_string());
        lines.join("\n")
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.picker.apply(key_action(key));
    }

    fn finished(&self) -> bool {
        self.picker.status != PickerStatus::Browsing
    }
}

/// `2023-06-01T10:00:00.000Z` -> `Jun 01 2023`. Unparseable dates are shown
/// as their first ten characters.
pub fn display_date(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(date) => date.format("%b %d %Y").to_string(),
        Err(_) => raw.chars().take(10).collect(),
    }
}

fn leaderboard_row(rank: &str, user: &str, score: &str, date: &str, kind: &str) -> String {
    format!(
        " {}{}{}{}{}",
        pad(rank, 4),
        pad(user, USER_COLUMN + 2),
        pad(score, 10),
        pad(date, 13),
        pad(kind, LEADERBOARD_WIDTH - 50),
    )
}

/// One boxed leaderboard (top 10) as lines of equal width.
pub fn leaderboard_table(entries: &[SubmissionData], metric: Metric) -> Vec<String> {
    let title = format!("{} LEADERBOARD", metric.as_str().to_uppercase());
    let total = LEADERBOARD_WIDTH + 2;

    if entries.is_empty() {
        return vec![pad(
            &format!("No submissions available for the {} leaderboard!", metric.as_str()),
            total,
        )];
    }

    let indent = (total.saturating_sub(title.len())) / 2;
    let mut lines = vec![
        pad(&format!("{}{}", " ".repeat(indent), title), total),
        " ".repeat(total),
        boxed_top(LEADERBOARD_WIDTH),
        boxed(
            &leaderboard_row("#", "USER", &metric.as_str().to_uppercase(), "DATE", "TYPE"),
            LEADERBOARD_WIDTH,
        ),
        boxed_rule(LEADERBOARD_WIDTH, "─"),
    ];

    for (i, entry) in entries.iter().take(LEADERBOARD_TOP).enumerate() {
        let score = match metric {
            Metric::Gas => &entry.gas,
            Metric::Size => &entry.size,
        };
        let row = leaderboard_row(
            &(i + 1).to_string(),
            &fit(&entry.user_name, USER_COLUMN),
            score,
            &display_date(&entry.submitted_at),
            &entry.kind,
        );
        lines.push(boxed(&row, LEADERBOARD_WIDTH));
    }

    lines.push(boxed_bottom(LEADERBOARD_WIDTH));
    lines
}

/// Put two blocks of lines next to each other.
pub fn side_by_side(left: &[String], right: &[String], gap: usize) -> Vec<String> {
    let left_width = left.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let rows = left.len().max(right.len());
    (0..rows)
        .map(|i| {
            let l = left.get(i).map(String::as_str).unwrap_or("");
            let r = right.get(i).map(String::as_str).unwrap_or("");
            format!("{}{}{}", pad(l, left_width), " ".repeat(gap), r)
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Width at which the gas and size tables fit next to each other.
pub const SIDE_BY_SIDE_WIDTH: u16 = ((LEADERBOARD_WIDTH + 2) * 2 + 2) as u16;

pub fn render_leaderboards(gas: &[SubmissionData], size: &[SubmissionData], width: u16) -> String {
    let gas_lines = leaderboard_table(gas, Metric::Gas);
    let size_lines = leaderboard_table(size, Metric::Size);

    let lines = if width >= SIDE_BY_SIDE_WIDTH {
        side_by_side(&gas_lines, &size_lines, 2)
    } else {
        let mut stacked = gas_lines;
        stacked.push(String::new());
        stacked.extend(size_lines);
        stacked
    };
    lines.iter().map(|l| l.trim_end()).collect::<Vec<_>>().join("\n")
}

/// Static leaderboard screen: any key closes it.
pub struct LeaderboardView {
    text: String,
    done: bool,
}

impl LeaderboardView {
    pub fn new(gas: &[SubmissionData], size: &[SubmissionData], width: u16) -> Self {
        LeaderboardView { text: render_leaderboards(gas, size, width), done: false }
    }
}

impl Screen for LeaderboardView {
    fn render(&self) -> String {
        format!("\n{}\n\n{}", self.text, "Press any key to exit.".dark_grey())
    }

    fn on_key(&mut self, _key: KeyEvent) {
        self.done = true;
    }

    fn finished(&self) -> bool {
        self.done
    }
}
