//! # Output Configuration
//!
//! Color and emoji selection for CLI output, plus the per-rule-set summary
//! printed by `packmap apply`.
//!
//! Colors follow the `--color=always|never|auto` flag. In `auto` mode they
//! are turned off by `NO_COLOR` (any value), `CLICOLOR=0`, `TERM=dumb` or a
//! non-terminal stdout, and forced on by `CLICOLOR_FORCE`.
//!
//! ```
//! use packmap::output::{emoji, OutputConfig};
//!
//! let config = OutputConfig::from_env_and_flag("never");
//! assert_eq!(emoji(&config, "✅", "[OK]"), "[OK]");
//! ```

use std::env;

use console::style;

use crate::rules::ApplyReport;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        console::set_colors_enabled(use_color);

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are enabled, otherwise the plain alternative
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One line describing what applying a rule set did.
///
/// Only non-zero counts are listed; a set without entries reports
/// `no rules`.
pub fn summary_line(config: &OutputConfig, report: &ApplyReport) -> String {
    let counts = [
        (report.written, "written"),
        (report.overwritten, "overwritten"),
        (report.merged, "merged"),
        (report.appended, "appended"),
        (report.skipped, "skipped"),
        (report.omitted, "omitted"),
    ];
    let parts: Vec<String> = counts
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{} {}", count, label))
        .collect();
    let details = if parts.is_empty() {
        "no rules".to_string()
    } else {
        parts.join(", ")
    };

    let path = if config.use_color {
        style(&report.path).bold().to_string()
    } else {
        report.path.clone()
    };
    format!("{} {}: {}", emoji(config, "✅", "[OK]"), path, details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ApplyReport {
        ApplyReport {
            path: "data/modular_mc/pigs/_map.yaml".to_string(),
            written: 3,
            merged: 1,
            skipped: 2,
            ..ApplyReport::default()
        }
    }

    #[test]
    fn test_color_always() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
    }

    #[test]
    fn test_color_never() {
        assert!(!OutputConfig::from_env_and_flag("NEVER").use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "✅", "[OK]"), "✅");
        assert_eq!(emoji(&OutputConfig::without_color(), "✅", "[OK]"), "[OK]");
    }

    #[test]
    fn test_summary_line_plain() {
        assert_eq!(
            summary_line(&OutputConfig::without_color(), &report()),
            "[OK] data/modular_mc/pigs/_map.yaml: 3 written, 1 merged, 2 skipped"
        );
    }

    #[test]
    fn test_summary_line_empty_set() {
        let empty = ApplyReport {
            path: "x/_map.yaml".to_string(),
            ..ApplyReport::default()
        };
        assert_eq!(summary_line(&OutputConfig::without_color(), &empty), "[OK] x/_map.yaml: no rules");
    }

    #[test]
    fn test_summary_line_colored_keeps_text() {
        let line = summary_line(&OutputConfig::with_color(), &report());
        assert!(line.starts_with("✅"));
        assert!(line.contains("3 written"));
    }
}
