//! Rendering of controller events.
//!
//! Two modes: a human-readable stream styled for a terminal, and `--json`
//! lines for scripting. The controller knows nothing about either; it hands
//! over one event per transition and this module does the rest.

use std::time::Duration;

use armgrab_core::LaunchPlan;
use armgrab_core::oci::Profile;
use armgrab_protocol::{LaunchEvent, LaunchedInstance};
use owo_colors::{OwoColorize, Stream};

pub struct Reporter {
    json: bool,
    interval: Duration,
}

impl Reporter {
    pub fn new(json: bool, interval: Duration) -> Self {
        Self { json, interval }
    }

    /// Startup summary of what the loop is about to hunt for. Human mode
    /// only; JSON consumers get events and nothing else.
    pub fn banner(&self, plan: &LaunchPlan, profile: &Profile) {
        if self.json {
            return;
        }
        let instance = &plan.instance;
        println!(
            "{}",
            "armgrab: hunting capacity until the launch lands (Ctrl-C to stop)"
                .if_supports_color(Stream::Stdout, |text| text.bold())
        );
        println!(
            "  instance:  {} ({}, {} OCPU, {} GB)",
            instance.display_name, instance.shape, instance.ocpus, instance.memory_in_gbs
        );
        println!(
            "  placement: {} ({})",
            instance.availability_domain, profile.region
        );
        println!("  interval:  {}s between attempts", self.interval.as_secs());
        println!();
    }

    pub fn report(&mut self, event: &LaunchEvent) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
            return;
        }
        self.render_human(event);
    }

    fn render_human(&self, event: &LaunchEvent) {
        match event {
            LaunchEvent::AttemptStarted { attempt } => {
                println!(
                    "[{}] {} launching instance...",
                    timestamp(),
                    format!("attempt #{attempt}")
                        .if_supports_color(Stream::Stdout, |text| text.cyan()),
                );
            }
            LaunchEvent::AttemptRetryable {
                attempt,
                elapsed,
                reason,
            } => {
                println!(
                    "[{}] {} [{}] {}; waiting {}s before the next attempt",
                    timestamp(),
                    format!("attempt #{attempt}")
                        .if_supports_color(Stream::Stdout, |text| text.yellow()),
                    format_elapsed(*elapsed),
                    reason,
                    self.interval.as_secs(),
                );
            }
            LaunchEvent::Succeeded {
                attempt,
                elapsed,
                instance,
            } => {
                println!();
                println!(
                    "{}",
                    format!(
                        "instance created after {attempt} attempt(s) in {}",
                        format_elapsed(*elapsed)
                    )
                    .if_supports_color(Stream::Stdout, |text| text.green()),
                );
                print_instance(instance);
            }
            LaunchEvent::Failed { attempt, reason } => {
                println!(
                    "{}",
                    format!("launch failed on attempt #{attempt}: {reason}")
                        .if_supports_color(Stream::Stdout, |text| text.red()),
                );
            }
            LaunchEvent::Interrupted { attempts, elapsed } => {
                println!();
                println!(
                    "{}",
                    format!(
                        "stopped by operator after {attempts} attempt(s) in {}",
                        format_elapsed(*elapsed)
                    )
                    .if_supports_color(Stream::Stdout, |text| text.yellow()),
                );
            }
        }
    }
}

fn print_instance(instance: &LaunchedInstance) {
    println!("  id:     {}", instance.id);
    println!("  name:   {}", instance.display_name);
    println!("  state:  {}", instance.lifecycle_state);
    println!("  shape:  {}", instance.shape);
    println!("  region: {}", instance.region);
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `HH:MM:SS`; hours are not capped at 24.
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn elapsed_formats_as_hours_minutes_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(61)), "00:01:01");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(format_elapsed(Duration::from_secs(90_061)), "25:01:01");
    }
}
