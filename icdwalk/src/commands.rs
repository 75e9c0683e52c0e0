use clap::{arg, command};
use icdwalk_browser::session::DEFAULT_BROWSE_URL;
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("icdwalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("icdwalk")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log every visited node and expansion")
                .required(false)
                .global(true)
                .conflicts_with("quiet"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("harvest")
                .about(
                    "Walk the ICD-11 classification tree and record every category and \
                disease. Resumes from the documents already in the output directory.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The classification browser to harvest")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(DEFAULT_BROWSE_URL),
                )
                .arg(output_arg())
                .arg(
                    arg!(--"expand-timeout" <MS>)
                        .required(false)
                        .help("How long to wait for children to render after expanding a node")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"root-timeout" <MS>)
                        .required(false)
                        .help("How long to wait for the classification root to appear")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"checkpoint-every" <N>)
                        .required(false)
                        .help("Save icd11.json each time the record count reaches a multiple of N")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    arg!(--"headful")
                        .required(false)
                        .help("Show the browser window")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-sandbox")
                        .required(false)
                        .help("Launch Chromium without its sandbox (containers, CI)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-snapshot")
                        .required(false)
                        .help("Skip writing page.html and page.png after the walk")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("status")
                .about("Summarize the documents in the output directory")
                .arg(output_arg()),
        )
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <DIR>)
        .required(false)
        .help("Directory holding categories.json and icd11.json")
        .default_value(".")
}
