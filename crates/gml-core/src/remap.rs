//! Location remapping into original-source coordinates

use crate::ast::{Node, Position, Program};
use crate::line_index::LineIndex;
use crate::preprocess::IndexMapper;
use crate::recovery::{map_recovered_index_to_original, RecoveryInsertion};
use tracing::debug;

/// Composes every coordinate change between the parsed text and the original:
/// recovery insertions, then the comment-fix mapper, then a clamp to the
/// original length (appended braces only add trailing text).
pub struct Remapper<'a> {
    insertions: &'a [RecoveryInsertion],
    comment_fix: &'a IndexMapper,
    lines: LineIndex<'a>,
}

impl<'a> Remapper<'a> {
    pub fn new(original: &'a str, insertions: &'a [RecoveryInsertion], comment_fix: &'a IndexMapper) -> Self {
        Self {
            insertions,
            comment_fix,
            lines: LineIndex::new(original),
        }
    }

    pub fn map_index(&self, index: usize) -> usize {
        let preprocessed = map_recovered_index_to_original(index, self.insertions);
        let original = self.comment_fix.map(preprocessed);
        original.min(self.lines.text().len())
    }

    /// Original-text position for an offset in the parsed text. Line and
    /// column are recomputed from the original.
    pub fn map_position(&self, position: Position) -> Position {
        self.lines.position(self.map_index(position.index))
    }

    pub fn remap_program(&self, program: &mut Program) {
        program.start = self.map_position(program.start);
        program.end = self.map_position(program.end);

        let mut visited = 0;
        for node in program.roots_mut() {
            visited += self.remap_node(node);
        }
        debug!("Remapped {} node locations", visited);
    }

    fn remap_node(&self, node: &mut Node) -> usize {
        node.start = self.map_position(node.start);
        node.end = self.map_position(node.end);

        1 + node
            .children_mut()
            .into_iter()
            .map(|child| self.remap_node(child))
            .sum::<usize>()
    }
}
