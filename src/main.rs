mod display;

use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use tracing_subscriber::EnvFilter;

use agent_drills::compute::hits::PlayerInput;
use agent_drills::config::DrillConfig;
use agent_drills::engine::DrillEngine;
use agent_drills::entities::{GameState, Mode, Phase, Position};

use display::Layout;

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

/// How long the autoplay bot waits before hitting a fresh entity.
const BOT_REACTION_MS: u64 = 250;

/// Upper bound on headless ticks so a mis-tuned drill cannot spin forever.
const MAX_SIMULATED_TICKS: u64 = 1_000_000;

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "agent-drills", about = "Timed training drills for the agent academy")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play drills interactively in the terminal.
    Play {
        #[command(flatten)]
        drill: DrillArgs,
        /// Write engine logs to this file (the terminal is in raw mode).
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Run one drill headless and print its performance record as JSON.
    Simulate {
        #[command(flatten)]
        drill: DrillArgs,
        /// Let a simple bot play instead of leaving the drill idle.
        #[arg(long)]
        autoplay: bool,
        /// Simulation tick in milliseconds.
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
    },
}

#[derive(Args, Debug, Clone)]
struct DrillArgs {
    /// Drill to run (the interactive menu asks when omitted).
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[arg(long)]
    difficulty: Option<f64>,
    #[arg(long)]
    grid_size: Option<u32>,
    /// Time limit in seconds.
    #[arg(long)]
    time_limit: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// JSON drill config; flags given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Pattern,
    Grid,
    Precision,
    Stamina,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Pattern => Mode::SequenceRecall,
            ModeArg::Grid => Mode::GridReaction,
            ModeArg::Precision => Mode::FreeRoamTarget,
            ModeArg::Stamina => Mode::SurvivalWave,
        }
    }
}

impl DrillArgs {
    /// Resolve the config file plus flag overrides for `mode`.
    fn resolve(&self, mode: Mode) -> anyhow::Result<DrillConfig> {
        let mut config = match &self.config {
            Some(path) => DrillConfig::load_from_file(path)?,
            None => DrillConfig::new(mode, 1.0),
        };
        if self.config.is_none() || self.mode.is_some() {
            config.mode = mode;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(size) = self.grid_size {
            config.grid_size = Some(size);
        }
        if let Some(secs) = self.time_limit {
            config.time_limit_secs = Some(secs);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }

    fn file_mode(&self) -> anyhow::Result<Option<Mode>> {
        match &self.config {
            Some(path) => Ok(Some(DrillConfig::load_from_file(path)?.mode)),
            None => Ok(None),
        }
    }
}

// ── Headless simulation ──────────────────────────────────────────────────────

/// Pick the input a quick, accurate player would make this tick.
fn bot_input(state: &GameState) -> Option<PlayerInput> {
    let now = state.clock_ms;
    match state.phase {
        Phase::Recall => {
            let cell = *state.pattern.get(state.pattern_cursor)?;
            let since = state.last_action_ms.unwrap_or(0).max(state.recall_started_ms);
            (now.saturating_sub(since) >= BOT_REACTION_MS).then(|| PlayerInput::cell(cell, now))
        }
        Phase::Playing => {
            let target = state
                .live_entities()
                .filter(|e| now.saturating_sub(e.created_at_ms) >= BOT_REACTION_MS)
                .min_by_key(|e| e.id)?;
            Some(match target.position {
                Position::Cell(cell) => PlayerInput::cell(cell, now),
                Position::Point(p) => PlayerInput::point(p.x, p.y, now),
            })
        }
        _ => None,
    }
}

fn simulate(config: &DrillConfig, autoplay: bool, tick_ms: u64) -> anyhow::Result<()> {
    let mut engine = DrillEngine::new(config)?;
    let dt = Duration::from_millis(tick_ms.max(1));
    engine.start();

    let mut ticks = 0;
    while !engine.is_complete() && ticks < MAX_SIMULATED_TICKS {
        let inputs: Vec<PlayerInput> = if autoplay {
            bot_input(engine.state()).into_iter().collect()
        } else {
            Vec::new()
        };
        let _ = engine.step(dt, &inputs);
        ticks += 1;
    }
    if !engine.is_complete() {
        tracing::warn!(ticks, "simulation hit the tick limit, aborting");
        engine.abort();
    }

    let record = engine
        .performance()
        .context("completed drill produced no performance record")?;
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

// ── Menu ──────────────────────────────────────────────────────────────────────

fn show_menu<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> std::io::Result<Option<Mode>> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  AGENT ACADEMY · TRAINING DRILLS  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(16), cy.saturating_sub(3)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Select drill:"))?;

    let options: &[(&str, Color, &str)] = &[
        ("1", Color::Yellow, "Watch a pattern, then repeat it"),
        ("2", Color::Green, "Hit lit cells before they fade"),
        ("3", Color::Cyan, "Click targets, smaller = more points"),
        ("4", Color::Magenta, "Survive the waves, avoid ✖"),
    ];

    for (i, ((key, color, desc), mode)) in options.iter().zip(Mode::ALL).enumerate() {
        let row = cy.saturating_sub(1) + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(16), row))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{}] ", key)))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(format!("{:<18}", mode.label())))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("  {}", desc)))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(16), cy + 5))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("Mouse : Hit   1-9 : Cells (3×3)   Q : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        let Ok(ev) = rx.recv() else {
            return Ok(None); // input thread gone
        };
        if let Event::Key(KeyEvent { code, .. }) = ev {
            match code {
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    return Ok(Mode::ALL.get(index).copied());
                }
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(None),
                _ => {}
            }
        }
    }
}

// ── Drill loop ────────────────────────────────────────────────────────────────

/// Returns `true` → quit program,  `false` → back to menu.
///
/// Inputs are stamped with the engine clock at the moment they are drained,
/// and the engine is ticked by the wall time actually elapsed since the
/// drill started, so the match countdown never drifts from the entity
/// timers.
fn drill_loop<W: Write>(
    out: &mut W,
    engine: &mut DrillEngine,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<bool> {
    engine.start();
    let started = Instant::now();
    let mut ticked_ms: u64 = 0;

    loop {
        let frame_start = Instant::now();
        let (width, height) = terminal::size()?;
        let layout = Layout { width, height };

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, modifiers, .. }) => {
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            engine.abort();
                            return Ok(true);
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            engine.abort();
                            return Ok(true);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') if engine.is_complete() => {
                            return Ok(false);
                        }
                        KeyCode::Char(c @ '1'..='9')
                            if engine.mode().is_grid() && engine.state().grid_size <= 3 =>
                        {
                            let cell = c as usize - '1' as usize;
                            if cell < engine.state().cell_count() {
                                let _ = engine.handle_input(PlayerInput::cell(cell, engine.clock_ms()));
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => {
                    let now = engine.clock_ms();
                    if let Some(input) = display::input_at(engine.state(), layout, column, row, now) {
                        let _ = engine.handle_input(input);
                    }
                }
                _ => {}
            }
        }

        let target_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        engine.tick(Duration::from_millis(target_ms.saturating_sub(ticked_ms)));
        ticked_ms = target_ms;

        display::render(out, engine.state(), layout)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

fn play<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>, drill: &DrillArgs) -> anyhow::Result<()> {
    let preset = match drill.mode {
        Some(mode) => Some(Mode::from(mode)),
        None => drill.file_mode()?,
    };

    loop {
        let mode = match preset {
            Some(mode) => mode,
            None => match show_menu(out, rx)? {
                Some(mode) => mode,
                None => break,
            },
        };
        let config = drill.resolve(mode)?;
        let mut engine = DrillEngine::new(&config)?.on_complete(|score, record| {
            tracing::info!(score, accuracy = record.accuracy, level = record.level, "drill finished");
        });
        let quit = drill_loop(out, &mut engine, rx)?;
        if quit || preset.is_some() {
            break;
        }
    }
    Ok(())
}

fn run_terminal(drill: &DrillArgs) -> anyhow::Result<()> {
    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(EnableMouseCapture)?;
    out.execute(cursor::Hide)?;

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the drill loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = play(&mut out, &rx, drill);

    // Always restore the terminal
    let _ = out.execute(cursor::Show);
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

// ── Logging ──────────────────────────────────────────────────────────────────

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agent_drills=info"))
}

fn init_logging(log_file: Option<&PathBuf>, to_stderr: bool) -> anyhow::Result<()> {
    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Play { drill, log_file } => {
            init_logging(log_file.as_ref(), false)?;
            run_terminal(&drill)
        }
        Command::Simulate { drill, autoplay, tick_ms } => {
            init_logging(None, true)?;
            let mode = match drill.mode {
                Some(mode) => Mode::from(mode),
                None => drill.file_mode()?.unwrap_or(Mode::GridReaction),
            };
            let config = drill.resolve(mode)?;
            simulate(&config, autoplay, tick_ms)
        }
    }
}
