use breathwell_core::{cycle_seconds, parse_pattern, PhaseCycleEngine};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PatternAction {
    /// Parse a pattern and print its phases as JSON
    Parse {
        /// e.g. "4-7-8" or "Inhale 4s, hold 7s, exhale 8s"
        text: String,
        /// Session length used to compute the cycle target
        #[arg(long, default_value = "1")]
        minutes: f64,
    },
}

pub fn run(action: PatternAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PatternAction::Parse { text, minutes } => {
            let phases = parse_pattern(&text)?;
            // No phases means no cycle to count against.
            let target_cycles = if phases.is_empty() {
                0
            } else {
                PhaseCycleEngine::new(phases.clone(), minutes)?.target_cycles()
            };
            let out = serde_json::json!({
                "phases": phases,
                "cycle_secs": cycle_seconds(&phases),
                "minutes": minutes,
                "target_cycles": target_cycles,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
