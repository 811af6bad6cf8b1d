use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::{debug, info, warn};
use virt_xmlbuilder::{Coverage, ParseMode, XmlBuilder};

use crate::action::{self, Action, Outcome};
use crate::diff;
use crate::parser::{parser_for, ParserSpec};

/// Where the document comes from and how results are printed.
#[derive(Args, Debug, Clone, Default)]
pub struct IoArgs {
    /// XML file to edit, `-` for stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub file: PathBuf,
    /// Print a unified diff instead of the full document
    #[arg(long)]
    pub print_diff: bool,
    /// Print only the XML of the objects that were touched
    #[arg(long, conflicts_with = "print_diff")]
    pub print_xml: bool,
    /// Log unknown properties and bad values instead of failing
    #[arg(long)]
    pub lenient: bool,
    /// Report schema properties and suboptions this run never touched
    #[arg(long)]
    pub coverage: bool,
}

/// One list of option strings per supported option; exactly one may be used.
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    #[arg(long, value_name = "OPTS")]
    pub disk: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub network: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub controller: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub graphics: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub video: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub input: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub serial: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub console: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub channel: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub sound: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub watchdog: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub hostdev: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub rng: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub memballoon: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub filesystem: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub tpm: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub metadata: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub memory: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub vcpus: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub cpu: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub boot: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub features: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub clock: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub events: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub pm: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub seclabel: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub pool: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub network_def: Vec<String>,
    #[arg(long, value_name = "OPTS")]
    pub snapshot: Vec<String>,
}

impl OptionArgs {
    fn entries(&self) -> [(&'static str, &Vec<String>); 29] {
        [
            ("disk", &self.disk),
            ("network", &self.network),
            ("controller", &self.controller),
            ("graphics", &self.graphics),
            ("video", &self.video),
            ("input", &self.input),
            ("serial", &self.serial),
            ("console", &self.console),
            ("channel", &self.channel),
            ("sound", &self.sound),
            ("watchdog", &self.watchdog),
            ("hostdev", &self.hostdev),
            ("rng", &self.rng),
            ("memballoon", &self.memballoon),
            ("filesystem", &self.filesystem),
            ("tpm", &self.tpm),
            ("metadata", &self.metadata),
            ("memory", &self.memory),
            ("vcpus", &self.vcpus),
            ("cpu", &self.cpu),
            ("boot", &self.boot),
            ("features", &self.features),
            ("clock", &self.clock),
            ("events", &self.events),
            ("pm", &self.pm),
            ("seclabel", &self.seclabel),
            ("pool", &self.pool),
            ("network-def", &self.network_def),
            ("snapshot", &self.snapshot),
        ]
    }

    /// The one option given on the command line with its option strings.
    pub fn selected(&self) -> Result<(&'static ParserSpec, &[String])> {
        let given: Vec<_> = self
            .entries()
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .collect();
        match given.len() {
            0 => bail!("no option given, pass one of --disk, --network, --boot, ..."),
            1 => {
                let (option, values) = given[0];
                let parser = parser_for(option).with_context(|| format!("no parser for --{option}"))?;
                Ok((parser, values.as_slice()))
            }
            _ => {
                let names: Vec<String> = given.iter().map(|(option, _)| format!("--{option}")).collect();
                bail!("only one option may be used per run, got {}", names.join(" "))
            }
        }
    }
}

/// Read `path`, or stdin when it is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return io::read_to_string(io::stdin()).context("read XML from stdin");
    }
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct ActionResponse<'a> {
    option: &'a str,
    objects: &'a [String],
    changes: Vec<String>,
    xml: String,
}

/// Attach a fresh coverage tracker declaring every property and suboption.
pub fn track_coverage(doc: XmlBuilder, parser: &ParserSpec) -> (XmlBuilder, Arc<Coverage>) {
    let coverage = Arc::new(Coverage::new());
    virtinst::declare_all(&coverage);
    parser.declare(&coverage);
    (doc.with_coverage(Arc::clone(&coverage)), coverage)
}

pub fn report_coverage(coverage: &Coverage, json: bool) -> Result<()> {
    let report = coverage.report();
    if json {
        return print_json(&report);
    }
    eprintln!(
        "coverage: {} of {} properties untouched, {} of {} suboptions unseen",
        report.untouched_properties.len(),
        report.declared_properties,
        report.unseen_suboptions.len(),
        report.declared_suboptions,
    );
    for name in &report.untouched_properties {
        eprintln!("  untouched property {name}");
    }
    for name in &report.unseen_suboptions {
        eprintln!("  unseen suboption {name}");
    }
    Ok(())
}

/// Load the input document, run `action` and print the result.
pub fn run_on_document(action: Action, io: &IoArgs, options: &OptionArgs, json: bool) -> Result<()> {
    let (parser, values) = options.selected()?;
    let text = read_input(&io.file)?;
    let schema = (parser.document)();
    let mut doc = XmlBuilder::parse(schema, &text)
        .with_context(|| format!("parse {} document", schema.kind()))?;
    if io.lenient {
        doc = doc.with_mode(ParseMode::Lenient);
    }
    let coverage = if io.coverage {
        let (tracked, coverage) = track_coverage(doc, parser);
        doc = tracked;
        Some(coverage)
    } else {
        None
    };
    let original = doc.clone();
    info!(option = parser.option, ?action, "running action");

    let outcome = action::perform(&action, parser, &mut doc, values)
        .with_context(|| format!("--{}", parser.option))?;
    let objects = match outcome {
        Outcome::Introspection(listing) => {
            print!("{listing}");
            return Ok(());
        }
        Outcome::Applied(objects) => objects,
    };
    if objects.is_empty() {
        warn!(option = parser.option, "no objects were changed");
    }

    let before = original.get_xml()?;
    let after = doc.get_xml()?;
    debug!(changed = before != after, "document rendered");
    if json {
        let payload = ActionResponse {
            option: parser.option,
            objects: &objects,
            changes: original.diff(&doc).iter().map(ToString::to_string).collect(),
            xml: after,
        };
        print_json(&payload)?;
    } else if io.print_diff {
        print!("{}", diff::unified(&before, &after, "Original XML", "Altered XML"));
    } else if io.print_xml {
        for object in &objects {
            print!("{object}");
        }
    } else {
        print!("{after}");
    }

    if let Some(coverage) = coverage {
        report_coverage(&coverage, json)?;
    }
    Ok(())
}
