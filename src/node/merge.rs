use tracing::trace_span;

use super::error::MissingOperand;
use super::{close_branch, uniform_leaf, QuadTree, QuadtreeNode};

/// Section pairs that still have to be merged below a branch.
type Pairs<'a> = [(&'a QuadtreeNode, &'a QuadtreeNode); 4];

/// What overlaying two nodes gives before anything below them is looked at.
enum Overlay<'a> {
	Settled(QuadtreeNode),
	Split(Pairs<'a>),
}

fn sections_of(node: &[QuadtreeNode; 4]) -> [&QuadtreeNode; 4] {
	[&node[0], &node[1], &node[2], &node[3]]
}

fn zip<'a>(left: [&'a QuadtreeNode; 4], right: [&'a QuadtreeNode; 4]) -> Pairs<'a> {
	[(left[0], right[0]), (left[1], right[1]), (left[2], right[2]), (left[3], right[3])]
}

fn overlay<'a>(a: &'a QuadtreeNode, b: &'a QuadtreeNode) -> Overlay<'a> {
	use QuadtreeNode::*;
	match (a, b) {
		(Black, _) | (_, Black) => Overlay::Settled(Black),
		(White, White) => Overlay::Settled(White),
		(Mixed(a), Mixed(b)) => Overlay::Split(zip(sections_of(a), sections_of(b))),
		(leaf @ White, Mixed(b)) => Overlay::Split(zip([leaf; 4], sections_of(b))),
		(Mixed(a), leaf @ White) => Overlay::Split(zip(sections_of(a), [leaf; 4])),
	}
}

/// A branch of the result whose sections are being merged.
struct Frame<'a> {
	pairs: Pairs<'a>,
	merged: Vec<QuadtreeNode>,
}

impl QuadtreeNode {
	/// Overlays two regions, black winning over white.
	///
	/// A leaf merged against a branch is paired with each of the branch's
	/// four sections in turn. Branches whose merged sections end up as four
	/// leaves of one color collapse into that leaf; any other mix stays a
	/// branch. Neither input is touched; the result is freshly allocated.
	///
	/// Branches being merged are kept on an explicit stack, so the depth of
	/// either input is only limited by memory.
	pub fn merge(&self, other: &QuadtreeNode) -> QuadtreeNode {
		let mut open: Vec<Frame<'_>> = Vec::new();
		let (mut a, mut b) = (self, other);
		loop {
			let mut node = match overlay(a, b) {
				Overlay::Settled(node) => node,
				Overlay::Split(pairs) => {
					let (first_a, first_b) = pairs[0];
					open.push(Frame { pairs, merged: Vec::with_capacity(4) });
					a = first_a;
					b = first_b;
					continue;
				}
			};
			// Hand the merged node to its branch, closing every branch it completes.
			loop {
				match open.last_mut() {
					None => return node,
					Some(frame) => {
						frame.merged.push(node);
						if let Some(&(next_a, next_b)) = frame.pairs.get(frame.merged.len()) {
							a = next_a;
							b = next_b;
							break;
						}
					}
				}
				node = match open.pop() {
					Some(frame) => {
						let branch = close_branch(frame.merged);
						branch.sections().and_then(uniform_leaf).unwrap_or(branch)
					}
					None => unreachable!("branch vanished while closing"),
				};
			}
		}
	}
}

impl QuadTree {
	/// Merges two trees into a new one; see `QuadtreeNode::merge`.
	pub fn merge(&self, other: &QuadTree) -> QuadTree {
		let _span = trace_span!("merge").entered();
		let merged = QuadTree::new(self.root().merge(other.root()));
		tracing::debug!(
			left = self.node_count(),
			right = other.node_count(),
			merged = merged.node_count(),
			"merged quadtrees"
		);
		merged
	}
}

/// Merges two trees that may not have been built.
///
/// If only one is present, the result is a copy of it. Both missing
/// is an error.
pub fn merge(a: Option<&QuadTree>, b: Option<&QuadTree>) -> Result<QuadTree, MissingOperand> {
	match (a, b) {
		(Some(a), Some(b)) => Ok(a.merge(b)),
		(Some(only), None) | (None, Some(only)) => Ok(only.clone()),
		(None, None) => Err(MissingOperand { operand: "input" }),
	}
}
