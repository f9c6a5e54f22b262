//! Stage progress on stderr for the CLI: a spinner on a terminal, plain
//! `==>` lines otherwise. Results themselves always go to stdout.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    pretty: bool,
}

impl Ui {
    /// `quiet` forces plain output in auto mode (e.g. JSON on stdout).
    pub fn new(mode: UiMode, is_tty: bool, quiet: bool) -> Self {
        let pretty = is_tty
            && match mode {
                UiMode::Pretty => true,
                UiMode::Auto => !quiet,
                UiMode::Plain => false,
            };
        Self { pretty }
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if !self.pretty {
            eprintln!("==> {name}");
            return StageGuard::new(name.to_string(), None);
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_draw_target(ProgressDrawTarget::stderr());
        spinner.enable_steady_tick(Duration::from_millis(120));
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(format!("{name}…"));
        StageGuard::new(name.to_string(), Some(spinner))
    }
}

/// Reports the stage as finished, with its duration, when dropped.
pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let message = format!("✔ {} ({})", self.name, format_duration(self.start.elapsed()));
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_only_on_terminals() {
        assert!(!Ui::new(UiMode::Pretty, false, false).is_pretty());
        assert!(Ui::new(UiMode::Pretty, true, true).is_pretty());
        assert!(Ui::new(UiMode::Auto, true, false).is_pretty());
        assert!(!Ui::new(UiMode::Auto, true, true).is_pretty());
        assert!(!Ui::new(UiMode::Plain, true, false).is_pretty());
    }

    #[test]
    fn durations_switch_units_at_one_second() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
