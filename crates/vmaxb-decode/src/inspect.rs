//! Inspection helpers for container trees and voxel streams.

use vmaxb_core::constants::CHUNK_SIZE;
use vmaxb_core::StoredColor;

use crate::stream::LocalVoxel;
use crate::tree::{NodeKind, TreeNode};

/// How a node was reached from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge<'a> {
    Key(&'a str),
    Index(usize),
}

/// Callbacks for a depth-first walk over a [`TreeNode`].
pub trait TreeVisitor<N: TreeNode> {
    fn enter(&mut self, depth: usize, edge: Option<Edge<'_>>, node: &N);

    fn leave(&mut self, _depth: usize, _node: &N) {}
}

/// Walk `root` depth-first, dictionaries in entry order and arrays by index.
pub fn walk<N: TreeNode, V: TreeVisitor<N>>(root: &N, visitor: &mut V) {
    walk_node(root, None, 0, visitor);
}

fn walk_node<N: TreeNode, V: TreeVisitor<N>>(
    node: &N,
    edge: Option<Edge<'_>>,
    depth: usize,
    visitor: &mut V,
) {
    visitor.enter(depth, edge, node);
    match node.kind() {
        NodeKind::Dict => {
            for (key, child) in node.dict_entries() {
                walk_node(child, Some(Edge::Key(key)), depth + 1, visitor);
            }
        }
        NodeKind::Array => {
            for index in 0..node.array_len().unwrap_or(0) {
                if let Some(child) = node.array_item(index) {
                    walk_node(child, Some(Edge::Index(index)), depth + 1, visitor);
                }
            }
        }
        _ => {}
    }
    visitor.leave(depth, node);
}

/// Indented one-line-per-node text dump.
#[derive(Debug, Default)]
pub struct TreePrinter {
    lines: Vec<String>,
}

impl TreePrinter {
    pub fn finish(self) -> String {
        self.lines.join("\n")
    }
}

impl<N: TreeNode> TreeVisitor<N> for TreePrinter {
    fn enter(&mut self, depth: usize, edge: Option<Edge<'_>>, node: &N) {
        let mut line = "  ".repeat(depth);
        match edge {
            Some(Edge::Key(key)) => line.push_str(&format!("{key}: ")),
            Some(Edge::Index(index)) => line.push_str(&format!("[{index}]: ")),
            None => {}
        }
        let value = match node.kind() {
            NodeKind::Dict => "dict".to_string(),
            NodeKind::Array => format!("array ({})", node.array_len().unwrap_or(0)),
            NodeKind::Data => format!(
                "data <{} bytes>",
                node.data_bytes().map_or(0, <[u8]>::len)
            ),
            NodeKind::UInt => format!("uint {}", node.uint().unwrap_or(0)),
            NodeKind::Real => format!("real {}", node.real().unwrap_or(0.0)),
            NodeKind::Bool => format!("bool {}", node.boolean().unwrap_or(false)),
            NodeKind::String => format!("string {:?}", node.string().unwrap_or("")),
        };
        line.push_str(&value);
        self.lines.push(line);
    }
}

/// Render a tree as indented text.
pub fn describe_tree<N: TreeNode>(root: &N) -> String {
    let mut printer = TreePrinter::default();
    walk(root, &mut printer);
    printer.finish()
}

/// A run of consecutive pairs sharing a color byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRun {
    /// Index of the first pair
    pub start: usize,
    pub len: usize,
    pub color: StoredColor,
}

/// Run-length summary of the color bytes of a stream.
pub fn color_runs(stream: &[u8]) -> Vec<ColorRun> {
    let mut runs: Vec<ColorRun> = Vec::new();
    for (index, pair) in stream.chunks_exact(2).enumerate() {
        let color = StoredColor(pair[1]);
        match runs.last_mut() {
            Some(run) if run.color == color => run.len += 1,
            _ => runs.push(ColorRun {
                start: index,
                len: 1,
                color,
            }),
        }
    }
    runs
}

/// ASCII map of one z-plane of a chunk: `#` occupied, `.` empty, rows by y.
pub fn z_slice(voxels: impl IntoIterator<Item = LocalVoxel>, z: u8) -> String {
    let mut grid = vec![[b'.'; CHUNK_SIZE]; CHUNK_SIZE];
    for voxel in voxels {
        let Some(pos) = voxel.pos.filter(|p| p.z == z) else {
            continue;
        };
        if let Some(cell) = grid
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
        {
            *cell = b'#';
        }
    }
    grid.iter()
        .map(|row| String::from_utf8_lossy(row).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}
