use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("trailgraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("trailgraph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .arg(
            arg!(-v --"verbose" "Log stage progress to stderr (overridden by RUST_LOG)")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("analyze")
                .about(
                    "Build a navigation graph from a browsing history CSV and write the \
                analysis artifacts.",
                )
                .arg(
                    arg!(<INPUT>)
                        .help("CSV file with url,title,visit_count,visit_time columns"),
                )
                .arg(
                    arg!([OUTPUT_DIR])
                        .required(false)
                        .help("Directory the artifacts are written to")
                        .default_value("outputs"),
                )
                .arg(
                    arg!(-w --"window" <N>)
                        .required(false)
                        .help("Number of consecutive pages in a frequent path")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"min-count" <N>)
                        .required(false)
                        .help("Drop frequent paths seen fewer times than this")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"top" <N>)
                        .required(false)
                        .help("Maximum frequent paths to keep, 0 for all of them")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(-g --"group-by" <KEY>)
                        .required(false)
                        .help("Node identity: one node per url, or per url host")
                        .value_parser(["url", "domain"])
                        .default_value("url"),
                )
                .arg(
                    arg!(--"from" <KEY>)
                        .required(false)
                        .help("DFS root and shortest-path source (default: first record)"),
                )
                .arg(
                    arg!(--"to" <KEY>)
                        .required(false)
                        .help("Shortest-path target (default: last record not on the source)"),
                )
                .arg(
                    arg!(--"time-format" <FORMAT>)
                        .required(false)
                        .help("How visit_time is shown in header.txt")
                        .value_parser(["raw", "webkit", "unix"])
                        .default_value("raw"),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Also write report.json")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}

