use clap::Subcommand;
use torch_core::storage::HistoryDb;
use torch_core::timer::format_clock;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Most recent focus intervals
    Recent {
        /// Number of intervals to show
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = HistoryDb::open()?;

    match action {
        StatsAction::Today => {
            let stats = db.stats_today()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::All => {
            let stats = db.stats_all()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit, json } => {
            let records = db.recent(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in records {
                    println!(
                        "{}  {:<11}  {}{}",
                        record.ended_at.format("%Y-%m-%d %H:%M"),
                        record.phase.label(),
                        format_clock(record.duration_secs),
                        if record.completed { "" } else { "  (paused)" },
                    );
                }
            }
        }
    }
    Ok(())
}
