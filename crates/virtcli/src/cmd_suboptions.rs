use anyhow::{Context, Result};
use serde::Serialize;

use crate::common;
use crate::error::CliError;
use crate::parser::{self, ArgFlags, ParserTarget};

#[derive(Serialize)]
struct SuboptionEntry {
    name: &'static str,
    aliases: Vec<&'static str>,
    shared: bool,
    can_comma: bool,
    flag: bool,
}

#[derive(Serialize)]
struct OptionEntry {
    option: &'static str,
    document: &'static str,
    device: bool,
    suboptions: Vec<SuboptionEntry>,
}

/// List the suboptions of `option`, or every option when it is `None`.
pub fn run(option: Option<String>, json: bool) -> Result<()> {
    let Some(option) = option else {
        let options: Vec<&str> = parser::parsers().iter().map(|p| p.option).collect();
        if json {
            return common::print_json(&options);
        }
        for option in options {
            println!("--{option}");
        }
        return Ok(());
    };

    let parser = parser::parser_for(&option)
        .ok_or_else(|| CliError::UnknownOption(option.trim_start_matches('-').to_string()))
        .context("look up option")?;
    if !json {
        print!("{}", parser.introspect());
        return Ok(());
    }
    let entry = OptionEntry {
        option: parser.option,
        document: (parser.document)().kind(),
        device: matches!(parser.target, ParserTarget::Collection(_)),
        suboptions: parser
            .args()
            .map(|arg| SuboptionEntry {
                name: arg.cli_name,
                aliases: arg.aliases.to_vec(),
                shared: arg.flags.contains(ArgFlags::SHARED),
                can_comma: arg.flags.contains(ArgFlags::CAN_COMMA),
                flag: arg.flags.contains(ArgFlags::FLAG),
            })
            .collect(),
    };
    common::print_json(&entry)
}
