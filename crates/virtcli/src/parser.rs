//! Static description of one `--<option>` and the suboptions it accepts.

use bitflags::bitflags;
use virt_xmlbuilder::{Coverage, Schema};

use crate::{domain_args, object_args};

/// Placeholder in a suboption name that captures an instance number.
pub const INDEX_PATTERN: &str = "[0-9]*";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArgFlags: u8 {
        /// Following terms that are not known keys belong to the value.
        const CAN_COMMA = 1 << 0;
        /// A bare token means `on`.
        const FLAG = 1 << 1;
        /// Declared once for every option that carries it.
        const SHARED = 1 << 2;
    }
}

/// What a suboption writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Property of the target object.
    Property(&'static str),
    /// Property of a nested collection item. Each `[0-9]*` in the name
    /// picks the item (0-based) of the matching `path` entry.
    Child {
        path: &'static [&'static str],
        property: &'static str,
    },
    /// One `{index}` slot of an indexed property.
    Indexed(&'static str),
    /// Device boot order, renumbering the other bootable devices.
    BootOrder,
    /// Disk source path, stored by disk type; unset drops `<source>`.
    DiskPath,
    /// Wipe the object before the other terms apply.
    ClearXml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub cli_name: &'static str,
    pub aliases: &'static [&'static str],
    pub target: Target,
    pub flags: ArgFlags,
}

impl ArgSpec {
    const fn new(cli_name: &'static str, target: Target) -> Self {
        Self {
            cli_name,
            aliases: &[],
            target,
            flags: ArgFlags::empty(),
        }
    }

    pub const fn prop(cli_name: &'static str, property: &'static str) -> Self {
        Self::new(cli_name, Target::Property(property))
    }

    pub const fn child(
        cli_name: &'static str,
        path: &'static [&'static str],
        property: &'static str,
    ) -> Self {
        Self::new(cli_name, Target::Child { path, property })
    }

    pub const fn indexed(cli_name: &'static str, property: &'static str) -> Self {
        Self::new(cli_name, Target::Indexed(property))
    }

    pub const fn boot_order(cli_name: &'static str) -> Self {
        Self::new(cli_name, Target::BootOrder)
    }

    pub const fn disk_path(cli_name: &'static str) -> Self {
        Self::new(cli_name, Target::DiskPath)
    }

    pub const fn aliases(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    pub const fn can_comma(self) -> Self {
        Self {
            flags: self.flags.union(ArgFlags::CAN_COMMA),
            ..self
        }
    }

    pub const fn flag(self) -> Self {
        Self {
            flags: self.flags.union(ArgFlags::FLAG),
            ..self
        }
    }

    pub const fn shared(self) -> Self {
        Self {
            flags: self.flags.union(ArgFlags::SHARED),
            ..self
        }
    }

    /// The declared name followed by its aliases.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.cli_name).chain(self.aliases.iter().copied())
    }

    /// Name of `name` (the declared name or an alias) in coverage reports.
    pub fn coverage_key(&self, option: &str, name: &str) -> String {
        if self.flags.contains(ArgFlags::SHARED) {
            format!("shared {name}")
        } else {
            format!("--{option} {name}")
        }
    }

    /// Instance numbers captured from `key`, if any of the names matches.
    pub fn match_key(&self, key: &str) -> Option<(&'static str, Vec<usize>)> {
        self.names()
            .find_map(|name| match_name(name, key).map(|indices| (name, indices)))
    }
}

/// Prepended to every option that supports clearing.
pub const CLEARXML: ArgSpec = ArgSpec::new("clearxml", Target::ClearXml).shared();

const CLEARXML_GROUP: &[ArgSpec] = &[CLEARXML];

/// Digits captured for each `[0-9]*` of `pattern`; `None` when `key` does
/// not match. A placeholder without digits captures 0.
pub fn match_name(pattern: &str, key: &str) -> Option<Vec<usize>> {
    let mut literals = pattern.split(INDEX_PATTERN);
    let mut rest = key.strip_prefix(literals.next().unwrap_or_default())?;
    let mut indices = Vec::new();
    for literal in literals {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let (number, tail) = rest.split_at(digits);
        indices.push(if number.is_empty() { 0 } else { number.parse().ok()? });
        rest = tail.strip_prefix(literal)?;
    }
    rest.is_empty().then_some(indices)
}

/// Where parsed objects live in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserTarget {
    /// One item of a guest device collection.
    Collection(&'static str),
    /// The document's root object.
    Root,
}

/// What `clearxml=yes` wipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    /// Not supported; `clearxml` is not declared.
    None,
    /// The target object's element, left as an empty stub.
    Object,
    /// One block below the root, removed unless more terms follow.
    Subtree(&'static str),
}

#[derive(Debug)]
pub struct ParserSpec {
    /// Command line name without the leading `--`.
    pub option: &'static str,
    /// Schema of the document the option edits.
    pub document: fn() -> &'static Schema,
    /// Schema of the objects the suboptions address.
    pub object: fn() -> &'static Schema,
    pub target: ParserTarget,
    /// Names given to leading bare tokens, e.g. `--disk /tmp/a.img`.
    pub remove_first: &'static [&'static str],
    pub clear: ClearScope,
    /// Treat the option string `none` as a no-op.
    pub stub_none: bool,
    pub args: &'static [&'static [ArgSpec]],
}

impl ParserSpec {
    /// Every suboption in declaration order, `clearxml` first when supported.
    pub fn args(&self) -> impl Iterator<Item = &'static ArgSpec> + '_ {
        let clear: &'static [ArgSpec] = match self.clear {
            ClearScope::None => &[],
            _ => CLEARXML_GROUP,
        };
        clear
            .iter()
            .chain(self.args.iter().copied().flat_map(|group| group.iter()))
    }

    /// First suboption matching `key`, with its declaration position.
    pub fn lookup(
        &self,
        key: &str,
        coverage: Option<&Coverage>,
    ) -> Option<(usize, &'static ArgSpec, Vec<usize>)> {
        self.args().enumerate().find_map(|(position, arg)| {
            let (name, indices) = arg.match_key(key)?;
            if let Some(coverage) = coverage {
                coverage.mark_suboption(arg.coverage_key(self.option, name));
            }
            Some((position, arg, indices))
        })
    }

    /// Declare every suboption name and alias with `coverage`.
    pub fn declare(&self, coverage: &Coverage) {
        for arg in self.args() {
            for name in arg.names() {
                coverage.declare_suboption(arg.coverage_key(self.option, name));
            }
        }
    }

    /// Sorted suboption names, `clearxml` first and `address.*` next.
    pub fn introspect(&self) -> String {
        let mut names: Vec<&str> = self.args().map(|arg| arg.cli_name).collect();
        names.sort_by_key(|name| {
            let prefix = if *name == "clearxml" {
                "0"
            } else if name.starts_with("address.") {
                "1"
            } else {
                ""
            };
            format!("{prefix}{name}")
        });
        names.dedup();
        let mut out = String::new();
        for name in names {
            out.push_str(name);
            out.push('\n');
        }
        out
    }

    /// Names with placeholders stripped, for "did you mean" lists.
    pub(crate) fn plain_names(&self) -> Vec<String> {
        self.args()
            .flat_map(|arg| arg.names())
            .map(|name| name.replace(INDEX_PATTERN, ""))
            .collect()
    }
}

/// Every option the command line understands.
pub fn parsers() -> &'static [&'static ParserSpec] {
    static PARSERS: &[&ParserSpec] = &[
        &domain_args::DISK,
        &domain_args::NETWORK,
        &domain_args::CONTROLLER,
        &domain_args::GRAPHICS,
        &domain_args::VIDEO,
        &domain_args::INPUT,
        &domain_args::SERIAL,
        &domain_args::CONSOLE,
        &domain_args::CHANNEL,
        &domain_args::SOUND,
        &domain_args::WATCHDOG,
        &domain_args::HOSTDEV,
        &domain_args::RNG,
        &domain_args::MEMBALLOON,
        &domain_args::FILESYSTEM,
        &domain_args::TPM,
        &domain_args::METADATA,
        &domain_args::MEMORY,
        &domain_args::VCPUS,
        &domain_args::CPU,
        &domain_args::BOOT,
        &domain_args::FEATURES,
        &domain_args::CLOCK,
        &domain_args::EVENTS,
        &domain_args::PM,
        &domain_args::SECLABEL,
        &object_args::POOL,
        &object_args::NETWORK_DEF,
        &object_args::SNAPSHOT,
    ];
    PARSERS
}

/// Look up an option by name, with or without the leading `--`.
pub fn parser_for(option: &str) -> Option<&'static ParserSpec> {
    let option = option.trim_start_matches('-');
    parsers().iter().copied().find(|parser| parser.option == option)
}
