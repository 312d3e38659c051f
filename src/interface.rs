//! Interface classification: deciding which interface contracts a
//! declaration implements.
//!
//! Bindings come from four independent sources: a fixed table of built-in
//! predicates, an explicit per-declaration or per-file option, configured
//! filename pattern rules, and a configured UUID-shaped interface. A
//! declaration may accumulate bindings from several sources; within each
//! source the first applicable entry wins.

use serde::Serialize;

use crate::descriptor::{Declaration, SchemaGraph};

/// Declaration-level option naming an explicitly implemented interface.
pub const IMPLEMENTS_OPTION: &str = "implements";
/// File-level blanket option applied to every declaration in the file that
/// carries no declaration-level option of its own.
pub const EVERY_IMPLEMENTS_OPTION: &str = "every_implements";

/// Field name that makes a single-field declaration UUID-shaped.
pub const UUID_FIELD: &str = "uuid";

/// Interface implemented by command payloads.
pub const COMMAND_INTERFACE: &str = "messaging.CommandMessage";
/// Interface implemented by event payloads.
pub const EVENT_INTERFACE: &str = "messaging.EventMessage";
/// Interface implemented by rejection payloads.
pub const REJECTION_INTERFACE: &str = "messaging.RejectionMessage";

const COMMANDS_FILE_SUFFIX: &str = "commands.proto";
const EVENTS_FILE_SUFFIX: &str = "events.proto";
const REJECTIONS_FILE_NAME: &str = "rejections.proto";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A logical interface a declaration will implement.
pub struct MessageInterface {
    /// Fully-qualified interface name.
    pub name: String,
    /// Resolved generic parameters; empty for parameterless interfaces.
    pub generics: Vec<String>,
}

impl MessageInterface {
    fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            generics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
/// One configured `(filename suffix, interface name)` pattern rule.
pub struct PatternRule {
    /// Substring looked up in the declaration's source file path.
    pub suffix: String,
    /// Interface bound on a match; an empty name disables the rule.
    pub interface: String,
}

#[derive(Debug, Clone, Default)]
/// Caller-supplied classification configuration, built once per run.
pub struct ResolveConfig {
    /// Pattern rules tried in configured order; first match wins.
    pub patterns: Vec<PatternRule>,
    /// Interface bound to UUID-shaped declarations, with the declaration's
    /// own generated type name as its single generic parameter.
    pub uuid_interface: Option<String>,
}

struct BuiltIn {
    interface: &'static str,
    applies: fn(&Declaration) -> bool,
}

/// Built-in predicates in fixed enumeration order.
const BUILT_INS: &[BuiltIn] = &[
    BuiltIn {
        interface: COMMAND_INTERFACE,
        applies: is_command,
    },
    BuiltIn {
        interface: EVENT_INTERFACE,
        applies: is_event,
    },
    BuiltIn {
        interface: REJECTION_INTERFACE,
        applies: is_rejection,
    },
];

fn file_name(decl: &Declaration) -> &str {
    decl.file_path
        .rsplit('/')
        .next()
        .unwrap_or(&decl.file_path)
}

fn is_command(decl: &Declaration) -> bool {
    decl.top_level && file_name(decl).ends_with(COMMANDS_FILE_SUFFIX)
}

fn is_event(decl: &Declaration) -> bool {
    decl.top_level && file_name(decl).ends_with(EVENTS_FILE_SUFFIX)
}

fn is_rejection(decl: &Declaration) -> bool {
    decl.top_level && file_name(decl) == REJECTIONS_FILE_NAME
}

fn is_uuid_shaped(decl: &Declaration) -> bool {
    decl.fields.len() == 1 && decl.fields[0].name == UUID_FIELD
}

fn nonblank(option: Option<&str>) -> Option<&str> {
    option.map(str::trim).filter(|v| !v.is_empty())
}

/// Classifies one declaration against built-ins, explicit options, pattern
/// rules, and the UUID-shaped interface.
///
/// Bindings are returned in source order (built-in, explicit or blanket,
/// pattern, uuid); the classifier is a pure function of its inputs.
pub fn classify(
    decl: &Declaration,
    graph: &SchemaGraph,
    config: &ResolveConfig,
) -> Vec<MessageInterface> {
    let mut found = Vec::new();

    if let Some(built_in) = BUILT_INS.iter().find(|b| (b.applies)(decl)) {
        found.push(MessageInterface::plain(built_in.interface));
    }

    if let Some(explicit) = nonblank(decl.option(IMPLEMENTS_OPTION)) {
        found.push(MessageInterface::plain(explicit));
    } else if let Some(blanket) =
        nonblank(graph.file_option(&decl.file_path, EVERY_IMPLEMENTS_OPTION))
    {
        found.push(MessageInterface::plain(blanket));
    }

    if decl.top_level {
        let matched = config
            .patterns
            .iter()
            .filter(|rule| !rule.interface.trim().is_empty())
            .find(|rule| decl.file_path.contains(&rule.suffix));
        if let Some(rule) = matched {
            found.push(MessageInterface::plain(rule.interface.trim()));
        }
    }

    if let Some(uuid_interface) = nonblank(config.uuid_interface.as_deref()) {
        if is_uuid_shaped(decl) {
            found.push(MessageInterface {
                name: uuid_interface.to_string(),
                generics: vec![decl.name.clone()],
            });
        }
    }

    found
}
