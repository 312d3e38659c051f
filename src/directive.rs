//! Insertion directives handed to the external code emitter.

use serde::Serialize;

use crate::descriptor::{Declaration, PACKAGE_SEPARATOR};
use crate::interface::MessageInterface;

/// Marker prefix; the full marker is keyed by the declaration's full name.
const IMPLEMENTS_MARKER: &str = "implements";

/// Trailing separator appended to directive content so multiple directives
/// for one declaration concatenate into a valid implements list.
const CONTENT_SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One instruction to splice text at a named point of a generated file.
pub struct InsertionDirective {
    /// Generated-source file identifier for the declaration.
    pub file: String,
    /// Insertion-point marker within that file.
    pub point: String,
    /// Text to splice at the marker.
    pub content: String,
}

/// Builds the directive splicing `interface` into the implements clause of
/// the generated type for `decl`.
pub fn implement_interface(decl: &Declaration, interface: &MessageInterface) -> InsertionDirective {
    InsertionDirective {
        file: target_file(decl),
        point: format!("{IMPLEMENTS_MARKER}:{}", decl.full_name),
        content: render_content(interface),
    }
}

fn render_content(interface: &MessageInterface) -> String {
    if interface.generics.is_empty() {
        format!("{}{CONTENT_SEPARATOR}", interface.name)
    } else {
        format!(
            "{}<{}>{CONTENT_SEPARATOR}",
            interface.name,
            interface.generics.join(", ")
        )
    }
}

/// Generated-source file identifier: the package as a path plus the
/// outermost type name. Nested declarations land in their outermost
/// enclosing type's file.
fn target_file(decl: &Declaration) -> String {
    let outer = decl.outermost_name();
    if decl.package.is_empty() {
        outer.to_string()
    } else {
        format!("{}/{outer}", decl.package.replace(PACKAGE_SEPARATOR, "/"))
    }
}
