use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use virt_xmlbuilder::XmlBuilder;

use crate::action::{self, Action, Outcome};
use crate::common::{self, OptionArgs};

#[derive(Serialize)]
struct BuildResponse<'a> {
    option: &'a str,
    objects: Vec<String>,
}

/// Print the XML an option describes, built on an empty document.
pub fn run(options: &OptionArgs, coverage: bool, json: bool) -> Result<()> {
    let (parser, values) = options.selected()?;
    let mut doc = XmlBuilder::build((parser.document)());
    let tracker = if coverage {
        let (tracked, tracker) = common::track_coverage(doc, parser);
        doc = tracked;
        Some(tracker)
    } else {
        None
    };

    let outcome = action::perform(&Action::BuildXml, parser, &mut doc, values)
        .with_context(|| format!("--{}", parser.option))?;
    match outcome {
        Outcome::Introspection(listing) => print!("{listing}"),
        Outcome::Applied(objects) => {
            info!(option = parser.option, count = objects.len(), "built objects");
            if json {
                common::print_json(&BuildResponse {
                    option: parser.option,
                    objects,
                })?;
            } else {
                for object in &objects {
                    print!("{object}");
                }
            }
        }
    }

    if let Some(tracker) = tracker {
        common::report_coverage(&tracker, json)?;
    }
    Ok(())
}
