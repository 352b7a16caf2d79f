//! Terminal rendering for drills. All crossterm output is queued here and flushed once per frame.
//!
//! Each function receives a mutable writer and an immutable view of the
//! match state.  No drill logic is performed; this module only translates
//! state into terminal commands, and terminal positions back into inputs.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};

use agent_drills::compute::hits::PlayerInput;
use agent_drills::compute::phase::highlighted_cell;
use agent_drills::compute::scoring::{accuracy, mean_reaction_time_ms};
use agent_drills::entities::{Entity, EntityKind, GameState, Mode, Phase, Point, RoundOutcome};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_TIME: Color = Color::Cyan;
const C_CELL_IDLE: Color = Color::DarkGrey;
const C_CELL_LIT: Color = Color::Green;
const C_CELL_SHOWN: Color = Color::Yellow;
const C_TARGET: Color = Color::White;
const C_FAST: Color = Color::Cyan;
const C_BONUS: Color = Color::Magenta;
const C_DANGER: Color = Color::Red;
const C_HINT: Color = Color::DarkGrey;

/// Widest a grid cell is drawn, in columns.
const MAX_CELL_W: u16 = 10;
const MAX_CELL_H: u16 = 5;

// ── Screen geometry ──────────────────────────────────────────────────────────

/// Play area inside the border: columns `1..width-1`, rows `2..height-2`.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    pub width: u16,
    pub height: u16,
}

impl Layout {
    fn play_cols(&self) -> u16 {
        self.width.saturating_sub(2).max(1)
    }

    fn play_rows(&self) -> u16 {
        self.height.saturating_sub(4).max(1)
    }

    fn grid(&self, n: u32) -> GridGeometry {
        let n = n.max(1) as u16;
        let cell_w = (self.play_cols() / n).clamp(1, MAX_CELL_W);
        let cell_h = (self.play_rows() / n).clamp(1, MAX_CELL_H);
        GridGeometry {
            x0: 1 + self.play_cols().saturating_sub(cell_w * n) / 2,
            y0: 2 + self.play_rows().saturating_sub(cell_h * n) / 2,
            cell_w,
            cell_h,
            n,
        }
    }

    fn to_screen(&self, state: &GameState, p: Point) -> (u16, u16) {
        let fx = (p.x / state.field.width).clamp(0.0, 1.0);
        let fy = (p.y / state.field.height).clamp(0.0, 1.0);
        let col = 1 + (fx * (self.play_cols() - 1) as f64).round() as u16;
        let row = 2 + (fy * (self.play_rows() - 1) as f64).round() as u16;
        (col, row)
    }

    fn to_field(&self, state: &GameState, col: u16, row: u16) -> Option<Point> {
        if col < 1 || row < 2 || col > self.play_cols() || row >= 2 + self.play_rows() {
            return None;
        }
        let fx = (col - 1) as f64 / (self.play_cols() - 1).max(1) as f64;
        let fy = (row - 2) as f64 / (self.play_rows() - 1).max(1) as f64;
        Some(Point::new(fx * state.field.width, fy * state.field.height))
    }
}

#[derive(Clone, Copy, Debug)]
struct GridGeometry {
    x0: u16,
    y0: u16,
    cell_w: u16,
    cell_h: u16,
    n: u16,
}

impl GridGeometry {
    fn cell_at(&self, col: u16, row: u16) -> Option<usize> {
        let dx = col.checked_sub(self.x0)?;
        let dy = row.checked_sub(self.y0)?;
        let (cx, cy) = (dx / self.cell_w, dy / self.cell_h);
        if cx >= self.n || cy >= self.n {
            return None;
        }
        // Leave a one-column gutter between cells.
        if dx % self.cell_w == self.cell_w - 1 && self.cell_w > 1 {
            return None;
        }
        Some((cy * self.n + cx) as usize)
    }

    fn origin(&self, index: usize) -> (u16, u16) {
        let (cx, cy) = (index as u16 % self.n, index as u16 / self.n);
        (self.x0 + cx * self.cell_w, self.y0 + cy * self.cell_h)
    }
}

/// Translate a mouse click into a player input stamped with `now_ms`.
pub fn input_at(state: &GameState, layout: Layout, col: u16, row: u16, now_ms: u64) -> Option<PlayerInput> {
    if state.mode.is_grid() {
        let cell = layout.grid(state.grid_size).cell_at(col, row)?;
        return Some(PlayerInput::cell(cell, now_ms));
    }
    let p = layout.to_field(state, col, row)?;
    Some(PlayerInput::point(p.x, p.y, now_ms))
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, state: &GameState, layout: Layout) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, layout)?;
    draw_hud(out, state, layout)?;

    if state.mode.is_grid() {
        draw_grid(out, state, layout)?;
    } else {
        for entity in state.live_entities() {
            draw_entity(out, state, entity, layout)?;
        }
    }

    draw_controls_hint(out, state, layout)?;

    if matches!(state.phase, Phase::Results | Phase::Complete) {
        draw_results(out, state, layout)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, layout.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, layout: Layout) -> std::io::Result<()> {
    let w = layout.width as usize;
    let h = layout.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(layout.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &GameState, layout: Layout) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score: {:>7.0}  Combo: {:>3}", state.score, state.combo)))?;

    let title = format!("[ {} · L{} ]", state.mode.label(), state.level);
    let tx = (layout.width / 2).saturating_sub(title.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(tx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_TIME))?;
    out.queue(Print(format!("{}  {}s", title, state.seconds_remaining())))?;

    let vitality = match state.mode {
        Mode::SurvivalWave => format!("Stamina: {:>3}", state.health),
        _ => format!("Lives: {}", "♥".repeat(state.lives as usize)),
    };
    let rx = layout
        .width
        .saturating_sub(vitality.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&vitality))?;

    Ok(())
}

// ── Grid modes ────────────────────────────────────────────────────────────────

fn draw_grid<W: Write>(out: &mut W, state: &GameState, layout: Layout) -> std::io::Result<()> {
    let geometry = layout.grid(state.grid_size);
    let shown = highlighted_cell(state);
    let lit: Vec<usize> = match state.phase {
        // Pattern steps are live entities during recall but stay hidden.
        Phase::Recall => Vec::new(),
        _ => state.live_entities().filter_map(Entity::cell).collect(),
    };
    let fill_w = geometry.cell_w.saturating_sub(1).max(1) as usize;
    let fill_h = geometry.cell_h.saturating_sub(1).max(1);

    for index in 0..state.cell_count() {
        let (x, y) = geometry.origin(index);
        let (glyph, color) = if shown == Some(index) {
            ("▓", C_CELL_SHOWN)
        } else if lit.contains(&index) {
            ("█", C_CELL_LIT)
        } else {
            ("░", C_CELL_IDLE)
        };
        out.queue(style::SetForegroundColor(color))?;
        for dy in 0..fill_h {
            out.queue(cursor::MoveTo(x, y + dy))?;
            out.queue(Print(glyph.repeat(fill_w)))?;
        }
        if state.grid_size <= 3 {
            out.queue(cursor::MoveTo(x, y))?;
            out.queue(style::SetForegroundColor(Color::White))?;
            out.queue(Print(index + 1))?;
        }
    }

    if state.phase == Phase::Recall {
        let progress = format!("Step {}/{}", state.pattern_cursor + 1, state.pattern.len());
        out.queue(cursor::MoveTo(geometry.x0, geometry.y0.saturating_sub(1)))?;
        out.queue(style::SetForegroundColor(C_HUD_TIME))?;
        out.queue(Print(progress))?;
    }

    Ok(())
}

// ── Free-roaming modes ────────────────────────────────────────────────────────

fn draw_entity<W: Write>(
    out: &mut W,
    state: &GameState,
    entity: &Entity,
    layout: Layout,
) -> std::io::Result<()> {
    let Some(p) = entity.point() else {
        return Ok(());
    };
    let (col, row) = layout.to_screen(state, p);
    let (glyph, color) = match entity.kind {
        EntityKind::Fast => ("»", C_FAST),
        EntityKind::Bonus if entity.health > 1 => ("◆", C_BONUS),
        EntityKind::Bonus => ("◇", C_BONUS),
        EntityKind::Danger => ("✖", C_DANGER),
        EntityKind::Normal => ("o", C_TARGET),
        _ => ("◎", C_TARGET),
    };
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(glyph))?;
    Ok(())
}

// ── Controls hint (bottom row) ───────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, state: &GameState, layout: Layout) -> std::io::Result<()> {
    let hint = match state.phase {
        Phase::Memorize => "Watch the pattern…",
        Phase::Recall => "Click the cells in order   Q : Quit",
        Phase::Playing if state.mode.is_grid() && state.grid_size <= 3 => {
            "Click or press 1-9   Q : Quit"
        }
        Phase::Playing => "Click targets   Q : Quit",
        Phase::Complete => "R : Menu   Q : Quit",
        _ => "Q : Quit",
    };
    out.queue(cursor::MoveTo(1, layout.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(hint))?;
    Ok(())
}

// ── Results overlay ──────────────────────────────────────────────────────────

fn draw_results<W: Write>(out: &mut W, state: &GameState, layout: Layout) -> std::io::Result<()> {
    let cx = layout.width / 2;
    let cy = layout.height / 2;

    let (headline, color) = match (state.phase, state.round_outcome) {
        (Phase::Complete, _) => ("  DRILL COMPLETE  ", Color::Yellow),
        (_, Some(RoundOutcome::Success)) => ("  PATTERN RECALLED  ", Color::Green),
        (_, Some(RoundOutcome::Failed)) => ("  PATTERN FAILED  ", Color::Red),
        _ => ("  TIME!  ", Color::Yellow),
    };

    let reaction = mean_reaction_time_ms(&state.stats)
        .map(|ms| format!("{ms:.0} ms"))
        .unwrap_or_else(|| "n/a".to_string());
    let lines = [
        format!("Score:     {:.0}", state.score),
        format!("Accuracy:  {:.1}%", accuracy(&state.stats)),
        format!("Level:     {}", state.level),
        format!("Max combo: {}", state.max_combo),
        format!("Reaction:  {reaction}"),
    ];

    out.queue(cursor::MoveTo(
        cx.saturating_sub(headline.chars().count() as u16 / 2),
        cy.saturating_sub(4),
    ))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(headline))?;

    out.queue(style::SetForegroundColor(Color::White))?;
    for (i, line) in lines.iter().enumerate() {
        out.queue(cursor::MoveTo(cx.saturating_sub(9), cy.saturating_sub(2) + i as u16))?;
        out.queue(Print(line))?;
    }

    Ok(())
}
