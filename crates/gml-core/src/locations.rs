//! Location metadata normalization

use crate::ast::{Node, NodeLocation, Position, Program, SourceLocation};
use crate::options::LocationMode;

/// Set the serialized location of every node for `mode`. Runs after
/// remapping, so the emitted numbers are original-source offsets.
pub fn normalize(program: &mut Program, mode: LocationMode) {
    program.location = locate(program.start, program.end, mode);

    for node in program.roots_mut() {
        normalize_node(node, mode);
    }
}

fn normalize_node(node: &mut Node, mode: LocationMode) {
    node.location = locate(node.start, node.end, mode);

    for child in node.children_mut() {
        normalize_node(child, mode);
    }
}

fn locate(start: Position, end: Position, mode: LocationMode) -> Option<NodeLocation> {
    match mode {
        LocationMode::Full => Some(NodeLocation::Full {
            start,
            end,
            loc: SourceLocation {
                start: start.into(),
                end: end.into(),
            },
        }),
        LocationMode::Simplified => Some(NodeLocation::Simplified {
            start: start.index,
            end: end.index,
        }),
        LocationMode::None => None,
    }
}
