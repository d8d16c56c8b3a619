use colored::Colorize;

pub mod error;
pub mod report;
pub mod run;

pub use error::{ArtifactWriteFailure, ReportError, RunError};
pub use report::{Artifact, ReportData, TimeFormat, WriteSummary};
pub use run::{RunOptions, RunOutcome, RunProgressCallback, execute_run};

const BANNER: &str = r#"
  _             _ _                       _
 | |_ _ __ __ _(_) | __ _ _ __ __ _ _ __ | |__
 | __| '__/ _` | | |/ _` | '__/ _` | '_ \| '_ \
 | |_| | | (_| | | | (_| | | | (_| | |_) | | | |
  \__|_|  \__,_|_|_|\__, |_|  \__,_| .__/|_| |_|
                    |___/          |_|
"#;

/// Print the banner to stderr so stdout stays reserved for the output path.
pub fn print_banner() {
    eprintln!("{}", BANNER.bright_cyan().bold());
    eprintln!(
        "  {} v{}\n",
        "browsing history navigation graphs".bright_white(),
        env!("CARGO_PKG_VERSION")
    );
}
