use bitvec::vec::BitVec;

use super::error::RasterError;
use super::{uniform_leaf, QuadTree, QuadtreeNode};

/// Luma values below this are read as black.
const BLACK_THRESHOLD: u8 = 128;

fn check_side(side: u32) -> Result<(), RasterError> {
	if side.is_power_of_two() {
		Ok(())
	} else {
		Err(RasterError::NonPowerOfTwo { side })
	}
}

/// A square, row-major black and white pixel mask; set bits are black.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
	side: u32,
	bits: BitVec,
}

impl Bitmap {
	/// An all-white mask.
	pub fn new(side: u32) -> Result<Bitmap, RasterError> {
		check_side(side)?;
		let len = side as usize * side as usize;
		Ok(Bitmap { side, bits: std::iter::repeat(false).take(len).collect() })
	}

	pub fn from_bits(side: u32, bits: BitVec) -> Result<Bitmap, RasterError> {
		check_side(side)?;
		let expected = side as usize * side as usize;
		if bits.len() != expected {
			return Err(RasterError::BitCount { expected, found: bits.len() });
		}
		Ok(Bitmap { side, bits })
	}

	/// Thresholds a grayscale buffer; dark pixels become black.
	pub fn from_luma(img: &image::GrayImage) -> Result<Bitmap, RasterError> {
		if img.width() != img.height() {
			return Err(RasterError::NonSquare);
		}
		check_side(img.width())?;
		let bits = img.pixels().map(|p| p.0[0] < BLACK_THRESHOLD).collect();
		Ok(Bitmap { side: img.width(), bits })
	}

	pub fn to_luma(&self) -> image::GrayImage {
		image::GrayImage::from_fn(self.side, self.side, |x, y| {
			image::Luma([if self.get(x, y) { 0 } else { 255 }])
		})
	}

	pub fn side(&self) -> u32 {
		self.side
	}

	pub fn bits(&self) -> &BitVec {
		&self.bits
	}

	fn index(&self, x: u32, y: u32) -> usize {
		assert!(x < self.side && y < self.side, "pixel ({}, {}) outside a {}x{} bitmap", x, y, self.side, self.side);
		y as usize * self.side as usize + x as usize
	}

	/// Whether the pixel at column `x`, row `y` is black.
	///
	/// # Panics
	///
	/// Panics if `x` or `y` is not below `side()`.
	pub fn get(&self, x: u32, y: u32) -> bool {
		self.bits[self.index(x, y)]
	}

	/// Paints the pixel at column `x`, row `y`.
	///
	/// # Panics
	///
	/// Panics if `x` or `y` is not below `side()`.
	pub fn set(&mut self, x: u32, y: u32, black: bool) {
		let i = self.index(x, y);
		self.bits.set(i, black);
	}

	pub fn black_pixels(&self) -> u64 {
		self.bits.iter().filter(|b| **b).count() as u64
	}

	fn fill(&mut self, x: u32, y: u32, size: u32) {
		for row in y..y + size {
			for col in x..x + size {
				self.set(col, row, true);
			}
		}
	}

	/// Arranges the square of pixels at (`x`, `y`) into a canonical
	/// quadtree; uniform squares become single leaves.
	fn mount(&self, x: u32, y: u32, size: u32) -> QuadtreeNode {
		if size == 1 {
			return if self.get(x, y) { QuadtreeNode::Black } else { QuadtreeNode::White };
		}
		let half = size / 2;
		let section = |ind: u32| self.mount(x + (ind & 1) * half, y + (ind >> 1) * half, half);
		let sections = [section(0), section(1), section(2), section(3)];
		uniform_leaf(&sections).unwrap_or_else(|| QuadtreeNode::mixed(sections))
	}
}

impl QuadTree {
	/// Builds the canonical quadtree of a pixel mask.
	pub fn from_bitmap(bitmap: &Bitmap) -> QuadTree {
		let tree = QuadTree::new(bitmap.mount(0, 0, bitmap.side));
		tracing::debug!(side = bitmap.side, nodes = tree.node_count(), "mounted bitmap");
		tree
	}

	/// Paints the tree into a `side` by `side` pixel mask.
	///
	/// Fails if `side` is not a power of two, or if the tree subdivides
	/// further than single pixels.
	pub fn to_bitmap(&self, side: u32) -> Result<Bitmap, RasterError> {
		let mut bitmap = Bitmap::new(side)?;
		let depth = self.depth();
		if depth > side.trailing_zeros() as usize {
			return Err(RasterError::TooDeep { side, depth });
		}
		let mut pending = vec![(self.root(), 0, 0, side)];
		while let Some((node, x, y, size)) = pending.pop() {
			match node {
				QuadtreeNode::Black => bitmap.fill(x, y, size),
				QuadtreeNode::White => (),
				QuadtreeNode::Mixed(sections) => {
					let half = size / 2;
					let positions = [(x, y), (x + half, y), (x, y + half), (x + half, y + half)];
					pending.extend(sections.iter().zip(positions.iter())
						.map(|(s, &(sx, sy))| (s, sx, sy, half)));
				}
			}
		}
		Ok(bitmap)
	}

	/// Number of black pixels in a `side` by `side` image, counted on the
	/// painted pixel mask rather than from leaf weights.
	pub fn count_painted(&self, side: u32) -> Result<u64, RasterError> {
		let black = self.to_bitmap(side)?.black_pixels();
		tracing::trace!(side, black, "counted painted pixels");
		Ok(black)
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
	fn sections_are_placed_in_reading_order() {
		// Only the bottom-left quadrant is black.
		let bitmap = tree("pwwbw").to_bitmap(4).unwrap();
		for y in 0..4 {
			for x in 0..4 {
				assert_eq!(x < 2 && y >= 2, bitmap.get(x, y), "pixel ({}, {})", x, y);
			}
		}
		assert_eq!(4, bitmap.black_pixels());
	}

	#[test]
	fn mount_builds_canonical_tree() {
		let mut bitmap = Bitmap::new(4).unwrap();
		for &(x, y) in [(2, 0), (3, 0), (2, 1), (3, 1), (0, 3)].iter() {
			bitmap.set(x, y, true);
		}
		assert_eq!("pwbpwwbww", QuadTree::from_bitmap(&bitmap).to_preorder());
		assert_eq!("w", QuadTree::from_bitmap(&Bitmap::new(8).unwrap()).to_preorder());
	}

	#[test]
	fn bitmap_sizes() {
		assert_eq!(Err(RasterError::NonPowerOfTwo { side: 6 }), Bitmap::new(6));
		assert_eq!(Err(RasterError::NonPowerOfTwo { side: 0 }), Bitmap::new(0));
		let bits: BitVec = std::iter::repeat(true).take(15).collect();
		assert_eq!(
			Err(RasterError::BitCount { expected: 16, found: 15 }),
			Bitmap::from_bits(4, bits)
		);
		let bits: BitVec = std::iter::repeat(true).take(16).collect();
		assert_eq!("b", QuadTree::from_bitmap(&Bitmap::from_bits(4, bits).unwrap()).to_preorder());
	}

	#[test]
	#[should_panic(expected = "pixel (4, 0) outside a 4x4 bitmap")]
	fn get_past_the_row_end_panics() {
		// (4, 0) would otherwise alias (0, 1)
		let mut bitmap = Bitmap::new(4).unwrap();
		bitmap.set(0, 1, true);
		bitmap.get(4, 0);
	}

	#[test]
	#[should_panic(expected = "pixel (0, 8) outside a 8x8 bitmap")]
	fn set_below_the_last_row_panics() {
		Bitmap::new(8).unwrap().set(0, 8, true);
	}

	#[test]
	fn tree_too_deep_for_side() {
		assert_eq!(
			Err(RasterError::TooDeep { side: 2, depth: 2 }),
			tree("ppbwwwwww").to_bitmap(2)
		);
		assert_eq!(Err(RasterError::NonPowerOfTwo { side: 3 }), tree("b").to_bitmap(3));
	}

	#[test]
	fn painted_count_agrees_with_area_count() {
		let t = tree("pbwpbwwbw");
		assert_eq!(Ok(24), t.count_painted(8));
		assert_eq!(t.count_black_for_side(8), t.count_painted(8));
		assert_eq!(Ok(1024), tree("b").count_painted(32));
		assert_eq!(Err(RasterError::TooDeep { side: 2, depth: 2 }), tree("pbwpbwwbw").count_painted(2));
		assert_eq!(Err(RasterError::NonPowerOfTwo { side: 12 }), t.count_painted(12));
	}

	#[test]
	fn luma_conversion() {
		let mut img = image::GrayImage::from_pixel(2, 2, image::Luma([200]));
		img.put_pixel(1, 1, image::Luma([10]));
		let bitmap = Bitmap::from_luma(&img).unwrap();
		assert_eq!("pwwwb", QuadTree::from_bitmap(&bitmap).to_preorder());
		let back = bitmap.to_luma();
		assert_eq!(0, back.get_pixel(1, 1).0[0]);
		assert_eq!(255, back.get_pixel(0, 1).0[0]);

		assert_eq!(
			Err(RasterError::NonSquare),
			Bitmap::from_luma(&image::GrayImage::new(4, 2))
		);
		assert_eq!(
			Err(RasterError::NonPowerOfTwo { side: 5 }),
			Bitmap::from_luma(&image::GrayImage::new(5, 5))
		);
	}

	proptest! {
		#[test]
		fn area_count_matches_pixels(s in preorder_string(4)) {
			let t = tree(&s);
			let bitmap = t.to_bitmap(16).unwrap();
			prop_assert_eq!(t.count_black(256).unwrap(), bitmap.black_pixels());
		}

		#[test]
		fn mounting_a_painted_tree_canonicalizes_it(s in preorder_string(4)) {
			let t = tree(&s);
			let mut canonical = t.clone();
			canonical.canonicalize();
			let mounted = QuadTree::from_bitmap(&t.to_bitmap(16).unwrap());
			prop_assert_eq!(canonical.to_preorder(), mounted.to_preorder());
		}

		#[test]
		fn merge_is_pixelwise_or(a in preorder_string(3), b in preorder_string(3)) {
			let (ta, tb) = (tree(&a), tree(&b));
			let (pa, pb) = (ta.to_bitmap(8).unwrap(), tb.to_bitmap(8).unwrap());
			let merged = ta.merge(&tb).to_bitmap(8).unwrap();
			for y in 0..8 {
				for x in 0..8 {
					prop_assert_eq!(pa.get(x, y) || pb.get(x, y), merged.get(x, y));
				}
			}
		}
	}
}
