use anyhow::{Context, Result};
use tracing::debug;

use crate::action::Action;
use crate::common::{self, IoArgs, OptionArgs};
use crate::selector::Selector;

pub fn run(selector: Option<String>, io: &IoArgs, options: &OptionArgs, json: bool) -> Result<()> {
    let selector = Selector::parse(selector.as_deref()).context("parse selector")?;
    debug!(%selector, "edit");
    common::run_on_document(Action::Edit(selector), io, options, json)
}
