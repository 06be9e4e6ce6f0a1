//! Retained trees behind the interactive menu, and the menu loop itself.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, info};

use crate::error::{AreaError, MalformedInput, MissingOperand};
use crate::merge::merge;
use crate::QuadTree;

/// Pixel area of the 32x32 images the menu works with unless told otherwise.
pub const DEFAULT_TOTAL_AREA: u64 = 1024;

/// Anything a menu action can fail with.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
	#[error("malformed quadtree string: {0}")]
	Malformed(#[from] MalformedInput),
	#[error(transparent)]
	Missing(#[from] MissingOperand),
	#[error("cannot count pixels: {0}")]
	Area(#[from] AreaError),
}

/// The trees a user has built so far.
#[derive(Debug)]
pub struct Session {
	first: Option<QuadTree>,
	second: Option<QuadTree>,
	merged: Option<QuadTree>,
	total_area: u64,
}

impl Default for Session {
	fn default() -> Self {
		Session::new(DEFAULT_TOTAL_AREA)
	}
}

impl Session {
	pub fn new(total_area: u64) -> Self {
		Session { first: None, second: None, merged: None, total_area }
	}

	pub fn first(&self) -> Option<&QuadTree> {
		self.first.as_ref()
	}

	pub fn second(&self) -> Option<&QuadTree> {
		self.second.as_ref()
	}

	pub fn merged(&self) -> Option<&QuadTree> {
		self.merged.as_ref()
	}

	pub fn total_area(&self) -> u64 {
		self.total_area
	}

	/// Parses an image string into the first slot.
	pub fn build_image(&mut self, symbols: &str) -> Result<&QuadTree, SessionError> {
		let tree = QuadTree::from_preorder(symbols)?;
		Ok(&*self.first.insert(tree))
	}

	/// Parses a preorder string into the second slot.
	pub fn build_preorder(&mut self, symbols: &str) -> Result<&QuadTree, SessionError> {
		let tree = QuadTree::from_preorder(symbols)?;
		Ok(&*self.second.insert(tree))
	}

	/// Parses two preorder strings, keeps them as the first and second
	/// trees, and merges them. Returns the merged preorder string.
	///
	/// Nothing is replaced unless both strings parse.
	pub fn merge_preorders(&mut self, first: &str, second: &str) -> Result<String, SessionError> {
		let first = QuadTree::from_preorder(first)?;
		let second = QuadTree::from_preorder(second)?;
		self.first = Some(first);
		self.second = Some(second);
		self.merge_retained()
	}

	/// Merges whichever of the first and second trees have been built.
	pub fn merge_retained(&mut self) -> Result<String, SessionError> {
		let merged = merge(self.first.as_ref(), self.second.as_ref())?;
		let preorder = merged.to_preorder();
		debug!(merged = %preorder, "stored merged tree");
		self.merged = Some(merged);
		Ok(preorder)
	}

	/// Black pixels in the most recently merged tree.
	pub fn count_merged(&self) -> Result<u64, SessionError> {
		let merged = self.merged.as_ref()
			.ok_or(MissingOperand { operand: "merged" })?;
		Ok(merged.count_black(self.total_area)?)
	}

	/// Drops every retained tree, returning the number of nodes released.
	pub fn clear(&mut self) -> usize {
		[self.first.take(), self.second.take(), self.merged.take()].iter_mut()
			.filter_map(Option::take)
			.map(QuadTree::teardown)
			.sum()
	}

	/// Runs the numbered menu over whitespace-delimited tokens from `input`
	/// until `0` or end of input. Failed actions are reported and the loop
	/// carries on.
	pub fn run_menu<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
		let mut tokens = Tokens::new(input);
		loop {
			writeln!(out, "Interaction Menu")?;
			writeln!(out, "1. Build Quad tree from image string")?;
			writeln!(out, "2. Convert preorder string to Quad tree")?;
			writeln!(out, "3. Merge Quad trees")?;
			writeln!(out, "4. Count black pixels in a Quad tree")?;
			writeln!(out, "0. Exit")?;
			let choice = match prompt(&mut tokens, &mut out, "Enter your choice: ")? {
				Some(c) => c,
				None => break,
			};
			match choice.as_str() {
				"1" => {
					let image = match prompt(&mut tokens, &mut out, "Enter the image string: ")? {
						Some(s) => s,
						None => break,
					};
					match self.build_image(&image) {
						Ok(_) => writeln!(out, "Quad tree built from image string.")?,
						Err(e) => writeln!(out, "{}", e)?,
					}
				}
				"2" => {
					let preorder = match prompt(&mut tokens, &mut out, "Enter the preorder string: ")? {
						Some(s) => s,
						None => break,
					};
					match self.build_preorder(&preorder) {
						Ok(_) => writeln!(out, "Quad tree built from preorder string.")?,
						Err(e) => writeln!(out, "{}", e)?,
					}
				}
				"3" => {
					let first = match prompt(&mut tokens, &mut out, "Enter the preorder for the first image: ")? {
						Some(s) => s,
						None => break,
					};
					let second = match prompt(&mut tokens, &mut out, "Enter the preorder for the second image: ")? {
						Some(s) => s,
						None => break,
					};
					match self.merge_preorders(&first, &second) {
						Ok(preorder) => {
							writeln!(out, "Quad trees merged.")?;
							writeln!(out, "Merged Quad Tree (Preorder): {}", preorder)?;
						}
						Err(e) => writeln!(out, "{}", e)?,
					}
				}
				"4" => match self.count_merged() {
					Ok(count) => writeln!(out, "Number of black pixels: {}", count)?,
					Err(SessionError::Missing(_)) => {
						writeln!(out, "No Quad tree available. Please merge Quad trees first.")?
					}
					Err(e) => writeln!(out, "{}", e)?,
				},
				"0" => break,
				other => {
					debug!(choice = other, "unrecognized menu choice");
					writeln!(out, "Invalid choice. Please try again.")?;
				}
			}
		}
		let released = self.clear();
		info!(released, "menu closed");
		writeln!(out, "Exiting program.")?;
		out.flush()
	}
}

fn prompt<R: BufRead, W: Write>(
	tokens: &mut Tokens<R>,
	out: &mut W,
	message: &str,
) -> io::Result<Option<String>> {
	write!(out, "{}", message)?;
	out.flush()?;
	tokens.next_token()
}

/// Splits a reader into whitespace-delimited tokens, like `cin >>`.
///
/// Input is read as bytes; bytes that are not valid UTF-8 become U+FFFD,
/// which the parser then reports as an unrecognized symbol.
struct Tokens<R> {
	input: R,
	pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
	fn new(input: R) -> Self {
		Tokens { input, pending: VecDeque::new() }
	}

	fn next_token(&mut self) -> io::Result<Option<String>> {
		loop {
			if let Some(token) = self.pending.pop_front() {
				return Ok(Some(token));
			}
			let mut line = Vec::new();
			if self.input.read_until(b'\n', &mut line)? == 0 {
				return Ok(None);
			}
			self.pending.extend(line.split(u8::is_ascii_whitespace)
				.filter(|token| !token.is_empty())
				.map(|token| String::from_utf8_lossy(token).into_owned()));
		}
	}
}
