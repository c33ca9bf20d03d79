//! Diagnostic rendering for grammar failures.
//!
//! A failed parse produces a [`Cause`] tree that records every alternative
//! tried along the way. Only one of those failures is shown to the user: the
//! one that got furthest into the input. This is a heuristic; the deepest
//! partial match is usually where the author made the mistake.
//!
//! The failure tree is copied into an arena of [`ErrorNode`]s in depth-first
//! pre-order. Each node knows its parent index, so the path from the root to
//! any node can be recovered for the trace rendering. A cause shared by
//! several parents is copied once, under the first parent that reaches it.
//!
//! # Output
//!
//! ```text
//! Expected "}", but got end of input at line 1 char 12.
//! Hello {name
//!            ^
//! ```

use std::{collections::HashMap, fmt, io, sync::Arc};

use super::{Cause, ParseError};

/// Byte and character offsets of every line start.
#[derive(Debug, Clone)]
struct LineIndex {
    byte_starts: Vec<usize>,
    char_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut byte_starts = vec![0];
        let mut char_starts = vec![0];
        for (chars, (bytes, c)) in source.char_indices().enumerate() {
            if c == '\n' {
                byte_starts.push(bytes + 1);
                char_starts.push(chars + 1);
            }
        }
        Self {
            byte_starts,
            char_starts,
        }
    }

    /// Zero-based line index containing `offset`.
    fn line_of(&self, offset: usize) -> usize {
        match self.byte_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }
}

/// One failure of the error tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    offset: usize,
    position: usize,
    line: usize,
    column: usize,
    message: String,
    depth: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl ErrorNode {
    /// Byte offset into the source.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Character offset into the source.
    pub fn position(&self) -> usize {
        self.position
    }

    /// One-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// One-based character column within the line.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// Arena copy of a [`Cause`] tree, resolved against its source text.
#[derive(Debug, Clone)]
pub struct ErrorTree<'src> {
    source: &'src str,
    lines: LineIndex,
    nodes: Vec<ErrorNode>,
}

impl<'src> ErrorTree<'src> {
    pub fn new(cause: &Cause, source: &'src str) -> Self {
        let mut tree = Self {
            source,
            lines: LineIndex::new(source),
            nodes: Vec::new(),
        };
        tree.push(cause, None, 0, &mut HashMap::new());
        tree
    }

    fn push(
        &mut self,
        cause: &Cause,
        parent: Option<usize>,
        depth: usize,
        seen: &mut HashMap<*const Cause, usize>,
    ) -> usize {
        let offset = cause.offset().min(self.source.len());
        let line = self.lines.line_of(offset);
        let line_start = self.lines.byte_starts[line];
        let column = self.source[line_start..offset].chars().count();
        let position = self.lines.char_starts[line] + column;

        let index = self.nodes.len();
        self.nodes.push(ErrorNode {
            offset,
            position,
            line: line + 1,
            column: column + 1,
            message: format!(
                "{} at line {} char {}.",
                cause.reason(),
                line + 1,
                column + 1
            ),
            depth,
            parent,
            children: Vec::new(),
        });

        for child in cause.children() {
            let key = Arc::as_ptr(child);
            let child_index = match seen.get(&key) {
                Some(&copied) => copied,
                None => {
                    let copied = self.push(child, Some(index), depth + 1, seen);
                    seen.insert(key, copied);
                    copied
                }
            };
            self.nodes[index].children.push(child_index);
        }
        index
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// All nodes in depth-first pre-order; index 0 is the root.
    pub fn nodes(&self) -> &[ErrorNode] {
        &self.nodes
    }

    pub fn root(&self) -> &ErrorNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> Option<&ErrorNode> {
        self.nodes.get(index)
    }

    /// Index of the node with the greatest position.
    ///
    /// Ties resolve to the node that comes first in pre-order.
    pub fn best_index(&self) -> usize {
        self.nodes
            .iter()
            .enumerate()
            .fold(0, |best, (index, node)| {
                if node.position > self.nodes[best].position {
                    index
                } else {
                    best
                }
            })
    }

    pub fn best(&self) -> &ErrorNode {
        &self.nodes[self.best_index()]
    }

    /// The path from the root down to the node at `index`, inclusive.
    pub fn ancestry(&self, index: usize) -> Vec<&ErrorNode> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(index);
        while let Some(node) = current {
            path.push(node);
            current = node.parent.and_then(|parent| self.nodes.get(parent));
        }
        path.reverse();
        path
    }

    /// The source line a node points into, without its line terminator.
    pub fn line_text(&self, node: &ErrorNode) -> &'src str {
        let start = self.lines.byte_starts[node.line - 1];
        let rest = &self.source[start..];
        let line = rest.find('\n').map_or(rest, |end| &rest[..end]);
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Text rendering of the best failure, or of its whole ancestor path when
    /// `trace` is set.
    pub fn report(&self, trace: bool) -> Report<'_, 'src> {
        Report { tree: self, trace }
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &ErrorNode,
        indent: usize,
    ) -> fmt::Result {
        let pad = "  ".repeat(indent);
        writeln!(f, "{pad}{}", node.message)?;
        writeln!(f, "{pad}{}", self.line_text(node))?;
        writeln!(f, "{pad}{}^", " ".repeat(node.column - 1))
    }
}

/// [`Display`](fmt::Display) adapter returned by [`ErrorTree::report`].
pub struct Report<'a, 'src> {
    tree: &'a ErrorTree<'src>,
    trace: bool,
}

impl fmt::Display for Report<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let best = self.tree.best_index();
        if self.trace {
            for node in self.tree.ancestry(best) {
                self.tree.write_node(f, node, node.depth)?;
            }
            Ok(())
        } else {
            self.tree.write_node(f, &self.tree.nodes[best], 0)
        }
    }
}

/// Write the diagnostic for a grammar failure to `sink`.
pub fn print_diagnostic(
    error: &ParseError,
    trace: bool,
    sink: &mut impl io::Write,
) -> io::Result<()> {
    let tree = error.error_tree();
    write!(sink, "{}", tree.report(trace))
}
