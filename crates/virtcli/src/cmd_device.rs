use anyhow::Result;

use crate::action::Action;
use crate::common::{self, IoArgs, OptionArgs};

/// Append one device per option string.
pub fn run_add(io: &IoArgs, options: &OptionArgs, json: bool) -> Result<()> {
    common::run_on_document(Action::AddDevice, io, options, json)
}

/// Remove the devices matched by the last option string.
pub fn run_remove(io: &IoArgs, options: &OptionArgs, json: bool) -> Result<()> {
    common::run_on_document(Action::RemoveDevice, io, options, json)
}
