pub mod config;
pub mod pattern;
pub mod session;
pub mod technique;

use breathwell_core::Phase;

/// "Inhale 4s · Hold 7s · Exhale 8s"
pub fn describe_phases(phases: &[Phase]) -> String {
    phases
        .iter()
        .map(|p| format!("{} {}s", p.label, p.seconds))
        .collect::<Vec<_>>()
        .join(" · ")
}
