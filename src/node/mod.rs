pub mod area;
pub mod error;
pub mod merge;
pub mod preorder;
pub mod raster;

use std::convert::TryFrom;
use std::fmt;
use std::mem;

/// The three node tags, with their preorder symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
	/// `b`
	Black,
	/// `w`
	White,
	/// `p`; the region is subdivided.
	Mixed,
}

impl Color {
	/// Symbol used for this tag in preorder strings.
	pub fn symbol(self) -> char {
		match self {
			Color::Black => 'b',
			Color::White => 'w',
			Color::Mixed => 'p',
		}
	}

	pub fn from_symbol(symbol: char) -> Option<Color> {
		match symbol {
			'b' => Some(Color::Black),
			'w' => Some(Color::White),
			'p' => Some(Color::Mixed),
			_ => None,
		}
	}
}

/// Node in a quadtree for storing a black and white image.
///
/// Either a leaf of a single color, or a branch with exactly four
/// sections, ordered top-left, top-right, bottom-left, bottom-right.
///
/// Cloning, comparing, formatting and dropping all walk the tree with an
/// explicit stack, so arbitrarily deep trees are safe to handle.
#[derive(Eq)]
pub enum QuadtreeNode {
	Black,
	White,
	Mixed(Box<[QuadtreeNode; 4]>),
}

impl Default for QuadtreeNode {
	fn default() -> Self {
		QuadtreeNode::White
	}
}

impl QuadtreeNode {
	pub fn mixed(sections: [QuadtreeNode; 4]) -> Self {
		QuadtreeNode::Mixed(Box::new(sections))
	}

	pub fn color(&self) -> Color {
		match self {
			QuadtreeNode::Black => Color::Black,
			QuadtreeNode::White => Color::White,
			QuadtreeNode::Mixed(_) => Color::Mixed,
		}
	}

	pub fn is_leaf(&self) -> bool {
		!matches!(self, QuadtreeNode::Mixed(_))
	}

	pub fn sections(&self) -> Option<&[QuadtreeNode; 4]> {
		match self {
			QuadtreeNode::Mixed(sections) => Some(sections),
			_ => None,
		}
	}

	/// Visits this node and everything below it in preorder, along with
	/// each node's depth relative to this one.
	pub fn preorder(&self) -> Preorder<'_> {
		Preorder { stack: vec![(self, 0)] }
	}

	/// Collapses every branch whose sections are all leaves of one color,
	/// from the bottom up.
	pub fn canonicalize(&mut self) {
		if !self.is_leaf() {
			// Overlaying white leaves every pixel as it is; merging collapses
			// uniform branches on the way back up.
			*self = self.merge(&QuadtreeNode::White);
		}
	}
}

impl Clone for QuadtreeNode {
	fn clone(&self) -> Self {
		let mut copy = Assembler::default();
		for (node, _) in self.preorder() {
			let finished = match node {
				QuadtreeNode::Black => copy.push(QuadtreeNode::Black),
				QuadtreeNode::White => copy.push(QuadtreeNode::White),
				QuadtreeNode::Mixed(_) => {
					copy.open();
					None
				}
			};
			if let Some(root) = finished {
				return root;
			}
		}
		unreachable!("preorder ended inside a branch")
	}
}

/// Two trees are equal when their preorder symbols are; the preorder
/// string of a tree determines its shape.
impl PartialEq for QuadtreeNode {
	fn eq(&self, other: &QuadtreeNode) -> bool {
		self.preorder().map(|(n, _)| n.color())
			.eq(other.preorder().map(|(n, _)| n.color()))
	}
}

impl fmt::Debug for QuadtreeNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let symbols = self.preorder().map(|(n, _)| n.color().symbol()).collect::<String>();
		f.debug_tuple("QuadtreeNode").field(&symbols).finish()
	}
}

impl Drop for QuadtreeNode {
	fn drop(&mut self) {
		if let QuadtreeNode::Mixed(sections) = self {
			if sections.iter().any(|s| !s.is_leaf()) {
				dismantle(sections.iter_mut().map(mem::take).collect());
			}
		}
	}
}

/// The single leaf four sections collapse into, if they are all leaves
/// of the same color.
pub(crate) fn uniform_leaf(sections: &[QuadtreeNode; 4]) -> Option<QuadtreeNode> {
	if sections.iter().all(|s| matches!(s, QuadtreeNode::White)) {
		Some(QuadtreeNode::White)
	} else if sections.iter().all(|s| matches!(s, QuadtreeNode::Black)) {
		Some(QuadtreeNode::Black)
	} else {
		None
	}
}

/// Turns four collected sections into a branch.
pub(crate) fn close_branch(sections: Vec<QuadtreeNode>) -> QuadtreeNode {
	match <Box<[QuadtreeNode; 4]>>::try_from(sections.into_boxed_slice()) {
		Ok(sections) => QuadtreeNode::Mixed(sections),
		Err(_) => unreachable!("branch closed without four sections"),
	}
}

/// Builds a tree from nodes supplied in preorder, keeping the branches
/// that are still waiting for sections on an explicit stack.
#[derive(Debug, Default)]
pub(crate) struct Assembler {
	open: Vec<Vec<QuadtreeNode>>,
}

impl Assembler {
	/// Starts a branch; its four sections are the next nodes completed.
	pub(crate) fn open(&mut self) {
		self.open.push(Vec::with_capacity(4));
	}

	/// Attaches a finished node, closing every branch it completes.
	/// Returns the root once nothing is left open.
	pub(crate) fn push(&mut self, mut node: QuadtreeNode) -> Option<QuadtreeNode> {
		loop {
			match self.open.last_mut() {
				None => return Some(node),
				Some(sections) => {
					sections.push(node);
					if sections.len() < 4 {
						return None;
					}
				}
			}
			match self.open.pop() {
				Some(sections) => node = close_branch(sections),
				None => unreachable!("branch vanished while closing"),
			}
		}
	}
}

/// Releases nodes with a work-list so that teardown depth doesn't
/// depend on tree depth. Returns the number of nodes released.
///
/// Sections are taken out of each branch before it is dropped, so no
/// drop ever reaches below one level.
pub(crate) fn dismantle(mut pending: Vec<QuadtreeNode>) -> usize {
	let mut released = 0;
	while let Some(mut node) = pending.pop() {
		released += 1;
		if let QuadtreeNode::Mixed(sections) = &mut node {
			pending.extend(sections.iter_mut().map(mem::take));
		}
	}
	released
}

/// Depth-first preorder iterator over a subtree.
#[derive(Debug)]
pub struct Preorder<'a> {
	stack: Vec<(&'a QuadtreeNode, usize)>,
}

impl<'a> Iterator for Preorder<'a> {
	type Item = (&'a QuadtreeNode, usize);

	fn next(&mut self) -> Option<Self::Item> {
		let (node, depth) = self.stack.pop()?;
		if let QuadtreeNode::Mixed(sections) = node {
			self.stack.extend(sections.iter().rev().map(|s| (s, depth + 1)));
		}
		Some((node, depth))
	}
}

/// Owning handle to the root of a quadtree.
///
/// Dropping it releases every node exactly once, without recursion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuadTree {
	root: QuadtreeNode,
}

impl QuadTree {
	pub fn new(root: QuadtreeNode) -> Self {
		QuadTree { root }
	}

	pub fn root(&self) -> &QuadtreeNode {
		&self.root
	}

	pub fn into_root(mut self) -> QuadtreeNode {
		mem::take(&mut self.root)
	}

	pub fn node_count(&self) -> usize {
		self.root.preorder().count()
	}

	pub fn leaf_count(&self) -> usize {
		self.root.preorder().filter(|(n, _)| n.is_leaf()).count()
	}

	/// Depth of the deepest node; a lone leaf has depth 0.
	pub fn depth(&self) -> usize {
		self.root.preorder().map(|(_, d)| d).max().unwrap_or(0)
	}

	/// The depth shared by every leaf, or `None` if leaves sit at
	/// different depths.
	pub fn uniform_depth(&self) -> Option<usize> {
		let mut leaf_depths = self.root.preorder()
			.filter(|(n, _)| n.is_leaf())
			.map(|(_, d)| d);
		let first = leaf_depths.next()?;
		if leaf_depths.all(|d| d == first) {
			Some(first)
		} else {
			None
		}
	}

	/// Whether no branch has four leaf sections of the same color.
	pub fn is_canonical(&self) -> bool {
		self.root.preorder()
			.filter_map(|(n, _)| n.sections())
			.all(|sections| uniform_leaf(sections).is_none())
	}

	pub fn canonicalize(&mut self) {
		self.root.canonicalize();
	}

	/// Tears the tree down now, returning how many nodes were released.
	pub fn teardown(mut self) -> usize {
		dismantle(vec![mem::take(&mut self.root)])
	}
}

impl From<QuadtreeNode> for QuadTree {
	fn from(root: QuadtreeNode) -> Self {
		QuadTree::new(root)
	}
}

impl Drop for QuadTree {
	fn drop(&mut self) {
		if !self.root.is_leaf() {
			let released = dismantle(vec![mem::take(&mut self.root)]);
			tracing::trace!(released, "quadtree dropped");
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn tree(s: &str) -> QuadTree {
		QuadTree::from_preorder(s).unwrap()
	}

	#[test]
	fn color_symbols() {
		for c in [Color::Black, Color::White, Color::Mixed].iter() {
			assert_eq!(Some(*c), Color::from_symbol(c.symbol()));
		}
		assert_eq!(None, Color::from_symbol('x'));
	}

	#[test]
	fn counts_and_depth() {
		let t = tree("ppbwwbwwb");
		assert_eq!(9, t.node_count());
		assert_eq!(7, t.leaf_count());
		assert_eq!(2, t.depth());
		assert_eq!(None, t.uniform_depth());

		let leaf = tree("b");
		assert_eq!(1, leaf.node_count());
		assert_eq!(0, leaf.depth());
		assert_eq!(Some(0), leaf.uniform_depth());
		assert_eq!(Some(1), tree("pbwbw").uniform_depth());
	}

	#[test]
	fn preorder_visits_sections_in_order() {
		let t = tree("pbwpbbbww");
		let colors = t.root().preorder().map(|(n, _)| n.color().symbol()).collect::<String>();
		assert_eq!("pbwpbbbww", colors);
	}

	#[test]
	fn canonicalize_collapses_uniform_branches() {
		let mut t = tree("ppwwwwpbbbbwb");
		assert!(!t.is_canonical());
		t.canonicalize();
		assert_eq!("pwbwb", t.to_preorder());
		assert!(t.is_canonical());

		let mut all_black = tree("ppbbbbbbb");
		all_black.canonicalize();
		assert_eq!(QuadtreeNode::Black, *all_black.root());
	}

	#[test]
	fn canonicalize_keeps_mixed_regions() {
		let mut t = tree("pbwww");
		t.canonicalize();
		assert_eq!("pbwww", t.to_preorder());
	}

	#[test]
	fn teardown_releases_every_node_once() {
		// Full tree of depth 4: 1 + 4 + 16 + 64 + 256 nodes.
		let full = (0..4).fold("b".to_string(), |sub, _| format!("p{}", sub.repeat(4)));
		assert_eq!(341, full.len());
		let t = tree(&full);
		assert_eq!(341, t.node_count());
		assert_eq!(341, t.teardown());
	}

	#[test]
	fn deep_chain_drops_without_recursion() {
		let depth = 100_000;
		let s = format!("{}b{}", "p".repeat(depth), "www".repeat(depth));
		let t = tree(&s);
		assert_eq!(depth, t.depth());
		assert_eq!(4 * depth + 1, t.node_count());
		drop(t);
	}

	#[test]
	fn into_root_keeps_structure() {
		let root = tree("pbwbw").into_root();
		assert_eq!(Color::Mixed, root.color());
		assert_eq!(QuadtreeNode::Black, root.sections().unwrap()[0]);
	}

	fn chain(depth: usize) -> String {
		format!("{}b{}", "p".repeat(depth), "www".repeat(depth))
	}

	#[test]
	fn deep_bare_node_drops_without_recursion() {
		let root = tree(&chain(100_000)).into_root();
		assert_eq!(Color::Mixed, root.color());
		drop(root);
	}

	#[test]
	fn deep_chain_clones_and_compares() {
		let t = tree(&chain(100_000));
		let copy = t.clone();
		assert_eq!(t, copy);
		assert_eq!(chain(100_000), copy.to_preorder());
		assert_ne!(t, tree(&chain(99_999)));
	}

	#[test]
	fn deep_chain_canonicalizes() {
		let depth = 100_000;
		let mut t = tree(&chain(depth));
		t.canonicalize();
		assert_eq!(chain(depth), t.to_preorder());

		let mut uniform = tree(&format!("{}wwww{}", "p".repeat(depth), "www".repeat(depth - 1)));
		assert!(!uniform.is_canonical());
		uniform.canonicalize();
		assert_eq!(QuadtreeNode::White, *uniform.root());
	}

	#[test]
	fn debug_shows_preorder_symbols() {
		assert_eq!("QuadtreeNode(\"pbwww\")", format!("{:?}", tree("pbwww").root()));
		assert_eq!("QuadtreeNode(\"w\")", format!("{:?}", QuadtreeNode::default()));
	}
}
