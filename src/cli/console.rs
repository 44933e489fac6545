use colored::*;

use crate::agent::AgentSettings;
use crate::core::AgentError;
use crate::flow::{CycleReport, PromotionReport};

const PREVIEW_CHARS: usize = 500;

/// Console prints cycle progress with colored formatting
pub struct Console {
    heading_color: Color,
    strategy_color: Color,
    code_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            heading_color: Color::Cyan,
            strategy_color: Color::Green,
            code_color: Color::Magenta,
        }
    }

    /// Create a new Console with custom colors
    pub fn with_colors(heading_color: Color, strategy_color: Color, code_color: Color) -> Self {
        Self {
            heading_color,
            strategy_color,
            code_color,
        }
    }

    /// Print a welcome banner
    pub fn print_banner(&self, settings: &AgentSettings, model: &str) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "  Affiliate Promoter Agent".bright_blue().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!("  agent:   {}", settings.agent_id);
        println!("  session: {}", settings.session_id);
        println!("  model:   {}", model);
        println!(
            "  goal:    {} maximizing {} within {}",
            settings.role, settings.metric_name, settings.time
        );
        match settings.max_cycles {
            Some(max) => println!("  cycles:  {} every {}s", max, settings.cycle_interval_secs),
            None => println!("  cycles:  until Ctrl-C, every {}s", settings.cycle_interval_secs),
        }
        println!();
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }

    /// Print the outcome of one cycle
    pub fn print_cycle(&self, cycle: u32, result: &Result<CycleReport, AgentError>) {
        self.print_separator();
        match result {
            Ok(report) => self.print_report(cycle, report),
            Err(e) => self.print_error(&format!("Cycle {} failed: {}", cycle, e)),
        }
    }

    fn print_report(&self, cycle: u32, report: &CycleReport) {
        println!(
            "{}",
            format!("Cycle {}", cycle).color(self.heading_color).bold()
        );
        println!(
            "{} {}",
            "Research:".color(self.heading_color).bold(),
            preview(&report.research_output.stdout).bright_black()
        );
        println!(
            "{} {}",
            "Strategy:".color(self.strategy_color).bold(),
            report.strategy.color(self.strategy_color)
        );
        println!(
            "{}\n{}",
            "Code:".color(self.code_color).bold(),
            preview(&report.promotion_code).color(self.code_color)
        );
        if report.regenerations > 0 {
            println!(
                "{} {}",
                "Regenerations:".yellow().bold(),
                report.regenerations
            );
        }

        let delta = report.metric_after - report.metric_before;
        let delta_text = format!("{:+}", delta);
        let delta_text = if delta > 0 {
            delta_text.green()
        } else if delta < 0 {
            delta_text.red()
        } else {
            delta_text.normal()
        };
        println!(
            "{} {} -> {} ({})",
            "Metric:".color(self.heading_color).bold(),
            report.metric_before,
            report.metric_after,
            delta_text
        );

        if let Some(ref promotion) = report.promotion {
            self.print_promotion(promotion);
        }
    }

    fn print_promotion(&self, promotion: &PromotionReport) {
        println!(
            "{} {} products, {} articles, {} videos",
            "Products:".color(self.heading_color).bold(),
            promotion.discovered.len(),
            promotion.content.len(),
            promotion.videos.len()
        );
        for result in &promotion.published {
            let status = if result.status == "success" {
                result.status.green()
            } else {
                result.status.yellow()
            };
            println!("  [{}] {} {}", status, result.platform, result.url.bright_black());
        }
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// First `PREVIEW_CHARS` characters of `text`
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...\n(output truncated)", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_untouched() {
        assert_eq!(preview("done"), "done");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let text = "é".repeat(PREVIEW_CHARS + 10);
        let shown = preview(&text);
        assert!(shown.ends_with("(output truncated)"));
        assert_eq!(shown.chars().filter(|c| *c == 'é').count(), PREVIEW_CHARS);
    }
}
