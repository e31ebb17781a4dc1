use std::io::Write;

use clap::Subcommand;
use tokio::sync::mpsc::UnboundedReceiver;
use torch_core::storage::{Config, HistoryDb};
use torch_core::timer::format_clock;
use torch_core::{Durations, Event, TimerDriver, TimerEngine};
use tracing::warn;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the countdown in the foreground (Ctrl-C pauses and exits)
    Run {
        /// Work phase length, e.g. "25m", "90s", "1h30m"
        #[arg(long, value_parser = parse_duration)]
        work: Option<u64>,
        /// Short break length
        #[arg(long, value_parser = parse_duration)]
        short_break: Option<u64>,
        /// Long break length
        #[arg(long, value_parser = parse_duration)]
        long_break: Option<u64>,
        /// Number of phases to run back to back
        #[arg(long, default_value = "1")]
        phases: u32,
    },
    /// Print the configured phase durations as JSON
    Durations,
    /// Change the configured phase durations
    SetDurations {
        #[arg(long, value_parser = parse_duration)]
        work: Option<u64>,
        #[arg(long, value_parser = parse_duration)]
        short_break: Option<u64>,
        #[arg(long, value_parser = parse_duration)]
        long_break: Option<u64>,
    },
}

/// Parse `1h30m`, `25m`, `90s` or a bare number of seconds.
fn parse_duration(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();
    if let Ok(secs) = s.parse::<u64>() {
        return if secs > 0 {
            Ok(secs)
        } else {
            Err("Duration must be > 0".into())
        };
    }

    let mut total: u64 = 0;
    let mut num = String::new();
    for c in s.chars() {
        let unit = match c {
            '0'..='9' => {
                num.push(c);
                continue;
            }
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(format!("Invalid duration '{s}'")),
        };
        let n: u64 = num
            .parse()
            .map_err(|_| format!("Invalid duration '{s}'"))?;
        total = total.saturating_add(n.saturating_mul(unit));
        num.clear();
    }
    if !num.is_empty() {
        return Err(format!("Missing unit in '{s}'"));
    }
    if total > 0 {
        Ok(total)
    } else {
        Err("Duration must be > 0".into())
    }
}

fn apply_overrides(
    base: Durations,
    work: Option<u64>,
    short_break: Option<u64>,
    long_break: Option<u64>,
) -> Durations {
    Durations::new(
        work.unwrap_or(base.work_secs),
        short_break.unwrap_or(base.short_break_secs),
        long_break.unwrap_or(base.long_break_secs),
    )
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        TimerAction::Run {
            work,
            short_break,
            long_break,
            phases,
        } => {
            let durations = apply_overrides(config.timer.durations(), work, short_break, long_break);
            let history = if config.history.enabled {
                Some(HistoryDb::open()?)
            } else {
                None
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_foreground(durations, phases, &config, history.as_ref()))?;
        }
        TimerAction::Durations => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config.timer.durations())?
            );
        }
        TimerAction::SetDurations {
            work,
            short_break,
            long_break,
        } => {
            let durations = apply_overrides(config.timer.durations(), work, short_break, long_break);
            config.timer.work_secs = durations.work_secs;
            config.timer.short_break_secs = durations.short_break_secs;
            config.timer.long_break_secs = durations.long_break_secs;
            config.validate()?;
            config.save()?;
            println!("{}", serde_json::to_string_pretty(&durations)?);
        }
    }
    Ok(())
}

async fn run_foreground(
    durations: Durations,
    phases: u32,
    config: &Config,
    history: Option<&HistoryDb>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (driver, mut events) = TimerDriver::new(TimerEngine::new(durations));
    let mut remaining_phases = phases.max(1);
    driver.start().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                driver.pause().await;
                drain(&mut events, config, history);
                if let Event::StateSnapshot { phase, clock, cycle_count, .. } = driver.snapshot().await {
                    eprintln!("\r{} paused at {clock}, cycle {cycle_count}", phase.label());
                }
                return Ok(());
            }
            event = events.recv() => {
                let Some(event) = event else { return Ok(()) };
                let completed = matches!(event, Event::PhaseCompleted { .. });
                handle_event(&event, config, history);
                if completed {
                    remaining_phases -= 1;
                    if remaining_phases == 0 {
                        return Ok(());
                    }
                    driver.start().await;
                }
            }
        }
    }
}

fn drain(events: &mut UnboundedReceiver<Event>, config: &Config, history: Option<&HistoryDb>) {
    while let Ok(event) = events.try_recv() {
        handle_event(&event, config, history);
    }
}

fn handle_event(event: &Event, config: &Config, history: Option<&HistoryDb>) {
    match event {
        Event::TimerStarted {
            phase,
            remaining_secs,
            ..
        } => render(config, phase.label(), *remaining_secs),
        Event::Ticked {
            phase,
            remaining_secs,
            ..
        } => render(config, phase.label(), *remaining_secs),
        Event::PhaseCompleted {
            completed,
            next,
            next_secs,
            cycle_count,
            ..
        } => {
            let bell = if config.display.bell_on_phase_end { "\x07" } else { "" };
            eprintln!(
                "\r{} done{bell}. Next: {} ({}), cycle {cycle_count}",
                completed.label(),
                next.label(),
                format_clock(*next_secs),
            );
        }
        _ => {}
    }

    if let (Some(db), Some(interval)) = (history, event.focus_interval()) {
        let completed = matches!(event, Event::PhaseCompleted { .. });
        if let Err(err) = db.record_interval(interval, completed) {
            warn!("failed to record focus interval: {err}");
        }
    }
}

fn render(config: &Config, label: &str, remaining_secs: u64) {
    let clock = format_clock(remaining_secs);
    if config.display.compact {
        eprint!("\r{clock}   ");
    } else {
        eprint!("\r{label} {clock}   ");
    }
    let _ = std::io::stderr().flush();
}
