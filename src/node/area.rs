use tracing::trace;

use super::error::{AreaError, RasterError};
use super::{Color, QuadTree, QuadtreeNode};

/// Number of times `area` can be quartered exactly, if it is a power of four.
fn levels_in(area: u64) -> Option<usize> {
	if area.is_power_of_two() && area.trailing_zeros() % 2 == 0 {
		Some((area.trailing_zeros() / 2) as usize)
	} else {
		None
	}
}

impl QuadTree {
	/// Total area covered by leaves of `color`, when the root covers
	/// `total_area` and each section covers a quarter of its parent.
	///
	/// `total_area` must be a power of four with at least as many
	/// quarterings as the tree is deep, so every weight is an exact
	/// pixel count. `Color::Mixed` always gives 0, since branches cover
	/// no area of their own.
	pub fn weighted_area(&self, total_area: u64, color: Color) -> Result<u64, AreaError> {
		let levels = levels_in(total_area)
			.ok_or(AreaError::NotPowerOfFour { area: total_area })?;
		let depth = self.depth();
		if depth > levels {
			return Err(AreaError::TooDeep { area: total_area, depth });
		}

		let mut total = 0;
		let mut pending: Vec<(&QuadtreeNode, u64)> = vec![(self.root(), total_area)];
		while let Some((node, weight)) = pending.pop() {
			match node {
				QuadtreeNode::Mixed(sections) => {
					pending.extend(sections.iter().map(|s| (s, weight / 4)));
				}
				leaf if leaf.color() == color => total += weight,
				_ => (),
			}
		}
		trace!(total_area, ?color, total, "weighted area");
		Ok(total)
	}

	/// Number of black pixels in an image of `total_area` pixels.
	pub fn count_black(&self, total_area: u64) -> Result<u64, AreaError> {
		self.weighted_area(total_area, Color::Black)
	}

	pub fn count_white(&self, total_area: u64) -> Result<u64, AreaError> {
		self.weighted_area(total_area, Color::White)
	}

	/// Number of black pixels in a `side` by `side` image.
	pub fn count_black_for_side(&self, side: u32) -> Result<u64, RasterError> {
		if !side.is_power_of_two() {
			return Err(RasterError::NonPowerOfTwo { side });
		}
		self.count_black(u64::from(side) * u64::from(side))
			.map_err(|_| RasterError::TooDeep { side, depth: self.depth() })
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::node::preorder::test::preorder_string;
	use proptest::prelude::*;

	fn tree(s: &str) -> QuadTree {
		QuadTree::from_preorder(s).unwrap()
	}

	#[test]
	fn one_black_quadrant() {
		assert_eq!(Ok(256), tree("pbwww").count_black(1024));
		assert_eq!(Ok(768), tree("pbwww").count_white(1024));
	}

	#[test]
	fn leaves_cover_everything() {
		assert_eq!(Ok(1024), tree("b").count_black(1024));
		assert_eq!(Ok(0), tree("w").count_black(1024));
		assert_eq!(Ok(1), tree("b").count_black(1));
	}

	#[test]
	fn nested_weights_quarter() {
		// 256 + 64 + 64
		assert_eq!(Ok(384), tree("pbpbwbwww").count_black(1024));
		assert_eq!(Ok(3), tree("pwwwpbbwb").count_black(16));
	}

	#[test]
	fn mixed_color_has_no_area() {
		assert_eq!(Ok(0), tree("pbwww").weighted_area(64, Color::Mixed));
	}

	#[test]
	fn area_must_be_power_of_four() {
		assert_eq!(
			Err(AreaError::NotPowerOfFour { area: 512 }),
			tree("pbwww").count_black(512)
		);
		assert_eq!(
			Err(AreaError::NotPowerOfFour { area: 0 }),
			tree("b").count_black(0)
		);
		assert_eq!(
			Err(AreaError::NotPowerOfFour { area: 1000 }),
			tree("b").count_black(1000)
		);
	}

	#[test]
	fn tree_deeper_than_area() {
		assert_eq!(
			Err(AreaError::TooDeep { area: 4, depth: 2 }),
			tree("ppbwwwwww").count_black(4)
		);
		assert_eq!(Ok(1), tree("ppbwwwwww").count_black(16));
	}

	#[test]
	fn side_lengths() {
		assert_eq!(Ok(256), tree("pbwww").count_black_for_side(32));
		assert_eq!(
			Err(RasterError::NonPowerOfTwo { side: 12 }),
			tree("pbwww").count_black_for_side(12)
		);
		assert_eq!(
			Err(RasterError::TooDeep { side: 1, depth: 1 }),
			tree("pbwww").count_black_for_side(1)
		);
	}

	#[test]
	fn deep_chain() {
		let depth = 30;
		let s = format!("{}b{}", "p".repeat(depth), "www".repeat(depth));
		assert_eq!(Ok(1), tree(&s).count_black(1 << 60));
	}

	proptest! {
		#[test]
		fn black_and_white_partition_the_area(s in preorder_string(5)) {
			let t = tree(&s);
			let area = 1 << 10;
			prop_assert_eq!(area, t.count_black(area).unwrap() + t.count_white(area).unwrap());
		}
	}
}
