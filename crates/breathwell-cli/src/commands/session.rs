use std::error::Error;
use std::time::Duration;

use breathwell_core::{
    parse_pattern, Clock, Config, CoreError, Event, LogCue, ManualClock, PhaseCycleEngine,
    SystemClock,
};
use clap::{Args, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use super::describe_phases;
use super::technique::load_catalog;
use crate::cue::TerminalCue;

const DEFAULT_TECHNIQUE: &str = "box-breathing";

const CONTROLS_HINT: &str = "Type restart, +N (more minutes), reset or quit.";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a guided session in real time
    ///
    /// Reads line commands on stdin: pause, resume, restart, +N, preset N,
    /// reset, status, quit. Ctrl-C pauses and exits.
    Run(SessionArgs),
    /// Run a session against a simulated clock and print every event
    Simulate {
        #[command(flatten)]
        args: SessionArgs,
        /// Simulated frame interval in milliseconds
        #[arg(long, default_value = "100")]
        step_ms: u64,
    },
}

#[derive(Args)]
pub struct SessionArgs {
    /// Technique slug from the catalog (default: box-breathing)
    #[arg(long, conflicts_with = "pattern")]
    technique: Option<String>,
    /// Inline pattern, e.g. "4-7-8" or "Inhale 4s, hold 7s, exhale 8s"
    #[arg(long)]
    pattern: Option<String>,
    /// Session length in minutes (default: session.default_minutes)
    #[arg(long)]
    minutes: Option<f64>,
    /// Session length picked from session.preset_minutes
    #[arg(long, conflicts_with = "minutes")]
    preset: Option<u32>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
    /// Disable the terminal bell
    #[arg(long)]
    mute: bool,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default();

    match action {
        SessionAction::Run(args) => {
            let mut engine = build_engine(&args, &config)?;
            if !args.mute && config.sound.enabled {
                engine.set_cue(Box::new(TerminalCue::new(config.sound.volume)));
            }
            let mut printer = EventPrinter::new(args.json);
            let frame = Duration::from_millis(config.driver.frame_interval_ms);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(drive_realtime(
                engine,
                frame,
                &config.session.preset_minutes,
                &mut printer,
            ));
            // A pending stdin read cannot be cancelled; do not wait for it.
            runtime.shutdown_background();
            result
        }
        SessionAction::Simulate { args, step_ms } => {
            if step_ms == 0 {
                return Err("--step-ms must be at least 1".into());
            }
            let engine = build_engine(&args, &config)?.with_cue(Box::new(LogCue));
            let mut printer = EventPrinter::new(args.json);
            simulate(engine, step_ms as i64, &mut printer)
        }
    }
}

fn build_engine(args: &SessionArgs, config: &Config) -> Result<PhaseCycleEngine, Box<dyn Error>> {
    let phases = match args.pattern.as_deref() {
        Some(text) => parse_pattern(text)?,
        None => {
            let slug = args.technique.as_deref().unwrap_or(DEFAULT_TECHNIQUE);
            let technique = load_catalog(config)
                .find_by_slug(slug)
                .ok_or_else(|| CoreError::UnknownTechnique(slug.to_string()))?;
            technique.phases()?
        }
    };
    tracing::debug!(phases = %describe_phases(&phases), "building session");

    let mut engine = PhaseCycleEngine::new(phases, config.session.default_minutes)?
        .with_bounds(config.bounds()?)?;
    let minutes = match (args.preset, args.minutes) {
        (Some(preset), _) => Some(preset_minutes(&config.session.preset_minutes, preset)?),
        (None, minutes) => minutes,
    };
    if let Some(minutes) = minutes {
        engine.set_duration(minutes)?;
    }
    Ok(engine)
}

fn preset_minutes(presets: &[u32], preset: u32) -> Result<f64, String> {
    if presets.contains(&preset) {
        Ok(f64::from(preset))
    } else {
        Err(format!("no {preset}-minute preset; choose one of {presets:?}"))
    }
}

/// A line command read from stdin while `session run` is active.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Pause,
    Resume,
    Restart,
    Extend(f64),
    Preset(u32),
    Reset,
    Status,
    Quit,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim().to_ascii_lowercase();
        if let Some(minutes) = line.strip_prefix('+') {
            return minutes.trim().parse().ok().map(Control::Extend);
        }
        let mut words = line.split_whitespace();
        let control = match words.next()? {
            "p" | "pause" => Control::Pause,
            "r" | "resume" | "start" => Control::Resume,
            "restart" | "again" => Control::Restart,
            "extend" => Control::Extend(words.next()?.parse().ok()?),
            "preset" => Control::Preset(words.next()?.parse().ok()?),
            "reset" => Control::Reset,
            "s" | "status" => Control::Status,
            "q" | "quit" | "exit" => Control::Quit,
            _ => return None,
        };
        match words.next() {
            Some(_) => None,
            None => Some(control),
        }
    }

    /// Run the command against `engine`. `Quit` is handled by the caller.
    fn apply(
        self,
        engine: &mut PhaseCycleEngine,
        presets: &[u32],
        now_ms: i64,
    ) -> Result<Vec<Event>, String> {
        let events: Vec<Event> = match self {
            Control::Pause => engine.pause(now_ms).into_iter().collect(),
            Control::Resume => engine.start(now_ms).into_iter().collect(),
            Control::Restart => vec![engine.restart(now_ms)],
            Control::Extend(minutes) => engine
                .extend(minutes, now_ms)
                .map_err(|e| e.to_string())?,
            Control::Preset(preset) => {
                engine
                    .set_duration(preset_minutes(presets, preset)?)
                    .map_err(|e| e.to_string())?;
                vec![engine.snapshot(now_ms)]
            }
            Control::Reset => vec![engine.reset(now_ms)],
            Control::Status | Control::Quit => vec![engine.snapshot(now_ms)],
        };
        Ok(events)
    }
}

/// Wall-clock driver: ticks once per interval while running and applies
/// stdin commands between ticks.
///
/// Returns on `quit`, on Ctrl-C, or once stdin is closed and the engine is
/// no longer running.
async fn drive_realtime(
    mut engine: PhaseCycleEngine,
    frame: Duration,
    presets: &[u32],
    printer: &mut EventPrinter,
) -> Result<(), Box<dyn Error>> {
    let clock = SystemClock;
    if let Some(event) = engine.start(clock.now_ms()) {
        printer.event(&event)?;
    }

    let mut interval = tokio::time::interval(frame);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        if !stdin_open && !engine.is_running() {
            return Ok(());
        }
        tokio::select! {
            _ = interval.tick(), if engine.is_running() => {
                for event in engine.tick(clock.now_ms()) {
                    printer.event(&event)?;
                }
                printer.progress(&engine);
                if engine.is_done() && stdin_open {
                    printer.hint(CONTROLS_HINT);
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed");
                    stdin_open = false;
                    continue;
                };
                let Some(control) = Control::parse(&line) else {
                    if !line.trim().is_empty() {
                        tracing::warn!(command = %line.trim(), "unknown session command");
                    }
                    continue;
                };
                let now = clock.now_ms();
                if control == Control::Quit {
                    return pause_and_report(&mut engine, now, printer);
                }
                match control.apply(&mut engine, presets, now) {
                    Ok(events) => {
                        for event in &events {
                            printer.event(event)?;
                        }
                    }
                    Err(message) => tracing::warn!(?control, %message, "session command rejected"),
                }
            }
            res = &mut ctrl_c => {
                res?;
                return pause_and_report(&mut engine, clock.now_ms(), printer);
            }
        }
    }
}

fn pause_and_report(
    engine: &mut PhaseCycleEngine,
    now_ms: i64,
    printer: &mut EventPrinter,
) -> Result<(), Box<dyn Error>> {
    if let Some(event) = engine.pause(now_ms) {
        printer.event(&event)?;
    }
    printer.event(&engine.snapshot(now_ms))?;
    Ok(())
}

/// Same loop as the real driver, fed by a manual clock and without sleeping.
fn simulate(
    mut engine: PhaseCycleEngine,
    step_ms: i64,
    printer: &mut EventPrinter,
) -> Result<(), Box<dyn Error>> {
    let clock = ManualClock::new(SystemClock.now_ms());
    if let Some(event) = engine.start(clock.now_ms()) {
        printer.event(&event)?;
    }
    while engine.is_running() {
        let now = clock.advance(step_ms);
        for event in engine.tick(now) {
            printer.event(&event)?;
        }
    }
    Ok(())
}

/// Renders events as JSON lines or short human-readable lines.
struct EventPrinter {
    json: bool,
    last_shown: Option<(usize, u64)>,
}

impl EventPrinter {
    fn new(json: bool) -> Self {
        Self {
            json,
            last_shown: None,
        }
    }

    fn event(&mut self, event: &Event) -> Result<(), serde_json::Error> {
        tracing::trace!(kind = event.kind(), "event");
        if self.json {
            println!("{}", serde_json::to_string(event)?);
            return Ok(());
        }
        match event {
            Event::SessionStarted {
                label,
                cycle_secs,
                target_cycles,
                duration_min,
                ..
            } => {
                println!(
                    "Session started: {target_cycles} x {cycle_secs}s cycles ({duration_min} min)"
                );
                println!("→ {label}");
                self.last_shown = None;
            }
            Event::PhaseEntered { label, seconds, .. } => println!("→ {label} ({seconds}s)"),
            Event::CycleCompleted {
                completed_cycles,
                target_cycles,
                ..
            } => println!("Cycle {completed_cycles}/{target_cycles} complete"),
            Event::SessionCompleted {
                completed_cycles,
                duration_min,
                ..
            } => {
                let cycles = if *completed_cycles == 1 { "cycle" } else { "cycles" };
                let minutes = if *duration_min == 1.0 { "minute" } else { "minutes" };
                println!(
                    "Nice work. You completed {completed_cycles} {cycles} in {duration_min} {minutes}."
                );
            }
            Event::SessionPaused { remaining_ms, .. } => {
                println!("Paused with {:.1}s left in this phase", *remaining_ms as f64 / 1000.0)
            }
            Event::SessionResumed { .. } => {
                println!("Resumed");
                self.last_shown = None;
            }
            Event::SessionReset { .. } => println!("Session reset. Type resume to begin again."),
            Event::SessionExtended {
                added_min,
                duration_min,
                ..
            } => println!("Added {added_min} min, session is now {duration_min} min"),
            Event::StateSnapshot { .. } => println!("{}", serde_json::to_string_pretty(event)?),
        }
        Ok(())
    }

    fn hint(&self, text: &str) {
        if !self.json {
            println!("{text}");
        }
    }

    /// Prints a countdown line whenever the displayed second changes.
    fn progress(&mut self, engine: &PhaseCycleEngine) {
        if self.json || !engine.is_running() {
            return;
        }
        let shown = (engine.phase_index(), engine.remaining_secs());
        if self.last_shown == Some(shown) {
            return;
        }
        self.last_shown = Some(shown);
        if let Some(phase) = engine.current_phase() {
            let filled = usize::from(engine.progress_pct() / 10);
            println!(
                "  {:<6} {:>2}s [{}{}] scale {:.2}",
                phase.label,
                shown.1,
                "#".repeat(filled),
                ".".repeat(10 - filled),
                engine.value()
            );
        }
    }
}
