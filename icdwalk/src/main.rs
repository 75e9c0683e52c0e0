use icdwalk::commands::command_argument_builder;
use icdwalk::handlers::{handle_harvest, handle_status, print_banner};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("harvest", primary_command)) => handle_harvest(primary_command, quiet, verbose).await,
        Some(("status", primary_command)) => handle_status(primary_command, quiet, verbose),
        None => {}
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
