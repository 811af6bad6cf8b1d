use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use virtcli::cmd_build;
use virtcli::cmd_device;
use virtcli::cmd_edit;
use virtcli::cmd_suboptions;
use virtcli::common::{IoArgs, OptionArgs};

#[derive(Parser, Debug)]
#[command(
    name = "virt-xml",
    version,
    about = "Edit libvirt XML with virt-install style suboptions"
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Change existing objects picked by SELECTOR (position, `all`, or an option string)
    Edit {
        #[arg(allow_negative_numbers = true)]
        selector: Option<String>,
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Append a device for every option string
    AddDevice {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Remove the devices the option string selects
    RemoveDevice {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Print the XML an option describes without reading a document
    BuildXml {
        #[arg(long)]
        coverage: bool,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// List the suboptions an option accepts
    Suboptions { option: Option<String> },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Edit {
            selector,
            io,
            options,
        } => cmd_edit::run(selector, &io, &options, json)?,
        Cmd::AddDevice { io, options } => cmd_device::run_add(&io, &options, json)?,
        Cmd::RemoveDevice { io, options } => cmd_device::run_remove(&io, &options, json)?,
        Cmd::BuildXml { coverage, options } => cmd_build::run(&options, coverage, json)?,
        Cmd::Suboptions { option } => cmd_suboptions::run(option, json)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn parse_edit_with_position_selector() {
        let cli = Cli::parse_from(["virt-xml", "edit", "-1", "--disk", "cache=none", "-f", "vm.xml"]);
        match cli.cmd {
            Cmd::Edit {
                selector,
                io,
                options,
            } => {
                assert_eq!(selector.as_deref(), Some("-1"));
                assert_eq!(io.file, PathBuf::from("vm.xml"));
                assert_eq!(options.disk, vec!["cache=none".to_string()]);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_add_device_defaults_to_stdin() {
        let cli = Cli::parse_from([
            "virt-xml",
            "add-device",
            "--network",
            "bridge=br0",
            "--network",
            "network=default",
            "--print-diff",
        ]);
        match cli.cmd {
            Cmd::AddDevice { io, options } => {
                assert_eq!(io.file, PathBuf::from("-"));
                assert!(io.print_diff);
                assert_eq!(options.network.len(), 2);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["virt-xml", "build-xml", "--pool", "images", "--json", "-vv"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.cmd {
            Cmd::BuildXml { options, coverage } => {
                assert!(!coverage);
                assert_eq!(options.pool, vec!["images".to_string()]);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn print_diff_and_print_xml_conflict() {
        let parsed = Cli::try_parse_from([
            "virt-xml",
            "edit",
            "--disk",
            "cache=none",
            "--print-diff",
            "--print-xml",
        ]);
        assert!(parsed.is_err());
    }
}
