//! Status lines for the terminal.
//!
//! Everything goes to stderr; stdout carries only the `--stdout` document.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use console::style;

/// Report a finished index run and where the document was written.
pub fn indexed(files: usize, elapsed: Duration, target: &Path) {
    eprintln!("{} {}", style("✓").green(), indexed_line(files, elapsed));
    eprintln!("  {} {}", style("→").dim(), target.display());
}

/// Report a freshly written config file.
pub fn initialized(global: bool, path: &Path) {
    let scope = if global { "global" } else { "project" };
    eprintln!(
        "{} Initialized {} configuration: {}",
        style("✓").green(),
        scope,
        path.display()
    );
}

pub fn failure(err: impl Display) {
    eprintln!("{} {}", style("error:").red().bold(), err);
}

fn indexed_line(files: usize, elapsed: Duration) -> String {
    let noun = if files == 1 { "file" } else { "files" };
    format!("Indexed {} {} in {:.1}s", files, noun, elapsed.as_secs_f64())
}
