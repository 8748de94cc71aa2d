use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use richpad_config::Config;
use richpad_engine::{
    BlockKey, BlockKind, BlockLimit, Command, EditorState, FileStore, Mark, MediaReader,
    Selection, Snapshot, Transition, count_significant_blocks, media,
};
use std::{env, io::stdout, path::PathBuf, process, time::Duration};

/// Receiver capacity for completed image reads.
const MEDIA_CHANNEL_CAPACITY: usize = 16;

/// Limits offered by the gate cycling key, ending on unbounded.
const LIMIT_CYCLE: &[BlockLimit] = &[
    BlockLimit::AtMost(1),
    BlockLimit::AtMost(2),
    BlockLimit::AtMost(3),
    BlockLimit::AtMost(5),
    BlockLimit::AtMost(10),
    BlockLimit::AtMost(50),
    BlockLimit::AtMost(100),
    BlockLimit::Unbounded,
];

enum Mode {
    Edit,
    UrlPrompt(String),
    FilePrompt(String),
}

struct App {
    store: FileStore,
    state: EditorState,
    reader: MediaReader,
    inserts: tokio::sync::mpsc::Receiver<richpad_engine::ImageInsert>,
    mode: Mode,
    status: Option<String>,
}

impl App {
    fn new(storage_path: PathBuf, block_limit: BlockLimit) -> Result<Self> {
        let store = FileStore::new(storage_path);
        let state = EditorState::load(&store)?;
        let state = match state.apply(Command::SetBlockLimit(block_limit), &store)? {
            Transition::Applied(state) => state,
            Transition::Declined => state,
        };
        let (reader, inserts) = MediaReader::new(MEDIA_CHANNEL_CAPACITY);
        Ok(Self {
            store,
            state,
            reader,
            inserts,
            mode: Mode::Edit,
            status: None,
        })
    }

    /// Returns true only when the command actually applied; declines and
    /// store errors (reported via the status line) return false.
    fn apply(&mut self, command: Command) -> bool {
        match self.state.apply(command, &self.store) {
            Ok(Transition::Applied(next)) => {
                self.state = next;
                true
            }
            Ok(Transition::Declined) => {
                log::debug!("command declined");
                false
            }
            Err(e) => {
                self.status = Some(format!("store error: {e}"));
                false
            }
        }
    }

    /// Apply completed image reads delivered since the last tick.
    fn drain_inserts(&mut self) {
        while let Ok(insert) = self.inserts.try_recv() {
            self.apply(Command::InsertImage {
                src: insert.src,
                target: insert.target,
            });
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let snapshot = self.state.snapshot();
        let order: Vec<_> = snapshot
            .traverse()
            .into_iter()
            .map(|(_, block)| block.key)
            .collect();
        let anchor = snapshot.selection().anchor();
        let Some(index) = order.iter().position(|&k| k == anchor) else {
            return;
        };
        let next = index.saturating_add_signed(delta).min(order.len() - 1);
        if next != index {
            self.apply(Command::Select(Selection::single(order[next])));
        }
    }

    fn submit_url_prompt(&mut self, input: &str) {
        let target = Some(self.state.snapshot().selection().anchor());
        if let Some(insert) = media::from_url_prompt(input, target) {
            self.apply(Command::InsertImage {
                src: insert.src,
                target: insert.target,
            });
        }
    }

    fn submit_file_prompt(&mut self, input: &str) {
        let path = input.trim();
        if path.is_empty() {
            return;
        }
        let target = Some(self.state.snapshot().selection().anchor());
        // A newer batch supersedes reads still in flight.
        self.reader.supersede();
        self.reader
            .read_files(vec![media::FileInput::from_path(path)], target);
        self.status = Some(format!("reading {path}"));
    }

    /// Pasted text inserts an image when it is an image URL; anything else
    /// falls back to plain text insertion.
    fn paste(&mut self, payload: &str) {
        let target = Some(self.state.snapshot().selection().anchor());
        match media::from_text(payload, target) {
            Some(insert) => self.apply(Command::InsertImage {
                src: insert.src,
                target: insert.target,
            }),
            None => self.apply(Command::InsertText(payload.to_string())),
        };
    }

    fn cycle_block_limit(&mut self) {
        let current = self.state.block_limit();
        let index = LIMIT_CYCLE.iter().position(|&l| l == current);
        let next = match index {
            Some(i) => LIMIT_CYCLE[(i + 1) % LIMIT_CYCLE.len()],
            None => LIMIT_CYCLE[0],
        };
        self.apply(Command::SetBlockLimit(next));
    }

    fn save(&mut self) {
        if !self.state.save_enabled() {
            self.status = Some("save disabled: too many blocks".to_string());
            return;
        }
        if self.apply(Command::Save) {
            self.status = Some("saved".to_string());
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    // Determine storage path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let storage_path;
    let mut block_limit = BlockLimit::Unbounded;

    if args.len() == 2 {
        storage_path = PathBuf::from(&args[1]);
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => {
                storage_path = config.storage_path;
                if let Some(limit) = config.block_limit {
                    block_limit = BlockLimit::AtMost(limit);
                }
            }
            Ok(None) => {
                eprintln!("Error: No storage path provided and no config file found");
                eprintln!("Usage: {} <storage-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <storage-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [storage-folder-path]", args[0]);
        process::exit(1);
    };

    // File reads run on the runtime's workers while the UI thread blocks on
    // terminal events.
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(storage_path, block_limit)?;

    let res = run_app(&mut terminal, &mut app);

    app.reader.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        app.drain_inserts();
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let key = match event::read()? {
            Event::Paste(payload) => {
                match &mut app.mode {
                    Mode::Edit => app.paste(&payload),
                    Mode::UrlPrompt(input) | Mode::FilePrompt(input) => input.push_str(&payload),
                }
                continue;
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        match &mut app.mode {
            Mode::Edit => {
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Esc => return Ok(()),
                    KeyCode::Char('q') if ctrl => return Ok(()),
                    KeyCode::Char('b') if ctrl => {
                        app.apply(Command::ToggleMark(Mark::Bold));
                    }
                    KeyCode::Char('i') if ctrl => {
                        app.apply(Command::ToggleMark(Mark::Italic));
                    }
                    KeyCode::Char('l') if ctrl => {
                        app.apply(Command::ToggleBlock(BlockKind::BulletedList));
                    }
                    KeyCode::Char('n') if ctrl => {
                        app.apply(Command::ToggleBlock(BlockKind::NumberedList));
                    }
                    KeyCode::Char('u') if ctrl => app.mode = Mode::UrlPrompt(String::new()),
                    KeyCode::Char('f') if ctrl => app.mode = Mode::FilePrompt(String::new()),
                    KeyCode::Char('g') if ctrl => app.cycle_block_limit(),
                    KeyCode::Char('s') if ctrl => app.save(),
                    KeyCode::Char('r') if ctrl => {
                        app.apply(Command::Cancel);
                    }
                    KeyCode::Tab => {
                        app.apply(Command::Indent);
                    }
                    KeyCode::BackTab => {
                        app.apply(Command::Outdent);
                    }
                    KeyCode::Up => app.move_selection(-1),
                    KeyCode::Down => app.move_selection(1),
                    KeyCode::Char(c) if !ctrl => {
                        app.apply(Command::InsertText(c.to_string()));
                    }
                    _ => {}
                }
            }
            Mode::UrlPrompt(input) | Mode::FilePrompt(input) => match key.code {
                KeyCode::Esc => app.mode = Mode::Edit,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                KeyCode::Enter => {
                    let input = std::mem::take(input);
                    let is_url = matches!(app.mode, Mode::UrlPrompt(_));
                    app.mode = Mode::Edit;
                    if is_url {
                        app.submit_url_prompt(&input);
                    } else {
                        app.submit_file_prompt(&input);
                    }
                }
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let snapshot = app.state.snapshot();
    let selection = snapshot.selection();
    let mut lines = Vec::new();
    for (depth, block) in snapshot.traverse() {
        let indent = "  ".repeat(depth);
        let mut spans = vec![Span::raw(indent)];
        match &block.kind {
            BlockKind::Paragraph => {}
            BlockKind::ListItem => {
                spans.push(Span::raw(list_marker(snapshot, block.key)));
            }
            BlockKind::BulletedList | BlockKind::NumberedList => continue,
            BlockKind::Image { src } => {
                let shown: String = src.chars().take(60).collect();
                spans.push(Span::styled(
                    format!("[image: {shown}]"),
                    Style::default().fg(Color::Cyan),
                ));
            }
        }
        for leaf in &block.leaves {
            let mut style = Style::default();
            if leaf.marks.contains(&Mark::Bold) {
                style = style.add_modifier(Modifier::BOLD);
            }
            if leaf.marks.contains(&Mark::Italic) {
                style = style.add_modifier(Modifier::ITALIC);
            }
            spans.push(Span::styled(leaf.text.clone(), style));
        }
        let mut line = Line::from(spans);
        if selection.contains(block.key) {
            line = line.style(Style::default().bg(Color::DarkGray));
        }
        lines.push(line);
    }

    let document = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Document"))
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(document, chunks[0]);

    let gate = if app.state.save_enabled() {
        Span::styled("save: on", Style::default().fg(Color::Green))
    } else {
        Span::styled("save: off", Style::default().fg(Color::Red))
    };
    let counts = format!(
        " | blocks: {}/{}",
        count_significant_blocks(app.state.snapshot()),
        app.state.block_limit()
    );
    let mut status_spans = vec![gate, Span::raw(counts)];
    match &app.mode {
        Mode::Edit => {
            if let Some(status) = &app.status {
                status_spans.push(Span::raw(format!(" | {status}")));
            }
        }
        Mode::UrlPrompt(input) => {
            status_spans.push(Span::raw(format!(" | image URL: {input}_")));
        }
        Mode::FilePrompt(input) => {
            status_spans.push(Span::raw(format!(" | image file: {input}_")));
        }
    }
    let help = Line::from(
        "Tab/S-Tab indent | ^L/^N lists | ^B/^I marks | ^U url ^F file | ^G limit | ^S save ^R revert | Esc quit",
    );

    let status = Paragraph::new(vec![Line::from(status_spans), help])
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(status, chunks[1]);
}

/// Items in a numbered list carry their 1-based position; everything else
/// gets a bullet.
fn list_marker(snapshot: &Snapshot, key: BlockKey) -> String {
    let parent = snapshot.parent(key).and_then(|p| snapshot.block(p));
    match parent.map(|p| &p.kind) {
        Some(BlockKind::NumberedList) => {
            let position = parent
                .and_then(|p| p.children.iter().position(|k| *k == key))
                .unwrap_or(0);
            format!("{}. ", position + 1)
        }
        _ => "• ".to_string(),
    }
}
