use tracing::{debug, trace_span};

use super::error::MalformedInput;
use super::{Assembler, Color, QuadTree, QuadtreeNode};

/// Reads one complete node (and everything below it) from `symbols`,
/// starting at `cursor`.
///
/// On success `cursor` points just past the last symbol consumed, so
/// several concatenated trees can be read by calling this repeatedly.
/// Every symbol is bounds-checked before it is read; a string that ends
/// inside a branch gives `MalformedInput::Truncated`.
///
/// Open branches are kept on an explicit stack instead of the call stack,
/// so nesting depth is only limited by memory.
pub fn parse_at(symbols: &str, cursor: &mut usize) -> Result<QuadtreeNode, MalformedInput> {
	let bytes = symbols.as_bytes();
	let mut tree = Assembler::default();
	loop {
		let position = *cursor;
		let symbol = match bytes.get(position) {
			Some(b) => *b as char,
			None => return Err(MalformedInput::Truncated { position }),
		};
		let node = match Color::from_symbol(symbol) {
			Some(Color::Black) => QuadtreeNode::Black,
			Some(Color::White) => QuadtreeNode::White,
			Some(Color::Mixed) => {
				*cursor += 1;
				tree.open();
				continue;
			}
			None => {
				// Report the full character rather than a stray UTF-8 byte
				let symbol = symbols.get(position..)
					.and_then(|rest| rest.chars().next())
					.unwrap_or(symbol);
				return Err(MalformedInput::UnknownSymbol { symbol, position });
			}
		};
		*cursor += 1;
		if let Some(root) = tree.push(node) {
			return Ok(root);
		}
	}
}

impl QuadTree {
	/// Parses a complete preorder string (or image string; they share a
	/// grammar) into a quadtree.
	///
	/// The whole string must be consumed by exactly one tree.
	pub fn from_preorder(symbols: &str) -> Result<QuadTree, MalformedInput> {
		let _span = trace_span!("from_preorder", len = symbols.len()).entered();
		let mut cursor = 0;
		let root = parse_at(symbols, &mut cursor).map_err(|e| {
			debug!(error = %e, "rejected preorder string");
			e
		})?;
		let tree = QuadTree::new(root);
		if cursor != symbols.len() {
			debug!(cursor, len = symbols.len(), "trailing symbols after root");
			return Err(MalformedInput::TrailingSymbols { position: cursor });
		}
		debug!(nodes = tree.node_count(), "parsed quadtree");
		Ok(tree)
	}

	/// Serializes the tree into its preorder symbol string.
	///
	/// Inverse of `from_preorder`: `from_preorder(s)?.to_preorder() == s`.
	pub fn to_preorder(&self) -> String {
		self.root().preorder().map(|(node, _)| node.color().symbol()).collect()
	}
}

/// Preorder string of a tree that may not have been built; absent trees
/// serialize to the empty string.
pub fn serialize(tree: Option<&QuadTree>) -> String {
	tree.map(QuadTree::to_preorder).unwrap_or_default()
}

impl std::str::FromStr for QuadTree {
	type Err = MalformedInput;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		QuadTree::from_preorder(s)
	}
}

impl std::fmt::Display for QuadTree {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use std::fmt::Write;
		self.root().preorder().try_for_each(|(node, _)| f.write_char(node.color().symbol()))
	}
}
