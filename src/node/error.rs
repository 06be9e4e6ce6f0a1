use thiserror::Error;

/// Reason why a symbol string couldn't be parsed into a quadtree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MalformedInput {
	/// The string ended while a node symbol was still expected.
	#[error("preorder string ends early; expected a node symbol at position {position}")]
	Truncated {
		position: usize,
	},
	/// A character outside of `b`, `w` and `p` was found.
	#[error("unrecognized symbol {symbol:?} at position {position}")]
	UnknownSymbol {
		symbol: char,
		position: usize,
	},
	/// The root was complete but there were symbols left over.
	#[error("unconsumed symbols after a complete tree, starting at position {position}")]
	TrailingSymbols {
		position: usize,
	},
}

/// An operation needed a tree that hasn't been built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no {operand} quadtree is available")]
pub struct MissingOperand {
	/// Which tree was missing, for messages.
	pub operand: &'static str,
}

/// Reason why a weighted area couldn't be computed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AreaError {
	/// The total area can't be quartered exactly at every level.
	#[error("total area {area} is not a power of four")]
	NotPowerOfFour {
		area: u64,
	},
	/// The tree subdivides past single pixels of the given area.
	#[error("a tree of depth {depth} cannot be weighted against a total area of {area}")]
	TooDeep {
		area: u64,
		depth: usize,
	},
}

/// Reason why a quadtree couldn't be drawn to or taken from a pixel grid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RasterError {
	/// The pixel buffer's dimensions are not equal; the image is not a square.
	#[error("image is not square")]
	NonSquare,
	/// The side length is not a power of two.
	#[error("side length {side} is not a power of two")]
	NonPowerOfTwo {
		side: u32,
	},
	/// The bit buffer doesn't hold exactly `side * side` pixels.
	#[error("expected {expected} pixels, found {found}")]
	BitCount {
		expected: usize,
		found: usize,
	},
	/// A leaf would cover less than one pixel.
	#[error("a tree of depth {depth} does not fit in a {side}x{side} image")]
	TooDeep {
		side: u32,
		depth: usize,
	},
}
