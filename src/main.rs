use clap::{App, Arg, SubCommand};
use tracing_subscriber::EnvFilter;

use quadtree_bw::{QuadTree, Session};

use std::io;

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

fn parse_tree(symbols: &str) -> QuadTree {
	match QuadTree::from_preorder(symbols) {
		Ok(t) => t,
		Err(e) => error_exit(&format!("Invalid quadtree string: {}", e), 4)
	}
}

/// `clap`-based CLI for building, merging and measuring quadtrees.
///
/// Without a subcommand, runs the interactive menu on standard input.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: I/O issues
///
/// 4: invalid quadtree data
fn main() {
	tracing_subscriber::fmt()
		.with_writer(io::stderr)
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let clap_matches = App::new("quadtree_bw")
		.version("0.1.0")
		.author("vkcz")
		.about("Builds, merges and measures black and white images stored as preorder quadtree strings.")
		.arg(Arg::from_usage("-s, --side=[N] 'Image width (and height) in pixels; must be a power of two; defaults to 32'")
			.global(true))
		.subcommand(SubCommand::with_name("menu")
			.about("Interactive menu reading whitespace-separated answers from standard input (default)"))
		.subcommand(SubCommand::with_name("roundtrip")
			.about("Parses a preorder (or image) string and prints it back")
			.arg_from_usage("<PREORDER> 'Preorder string of b, w and p symbols'"))
		.subcommand(SubCommand::with_name("merge")
			.about("Overlays two images, black winning, and prints the merged preorder string")
			.arg_from_usage("<FIRST> 'Preorder string of the first image'")
			.arg_from_usage("<SECOND> 'Preorder string of the second image'"))
		.subcommand(SubCommand::with_name("count")
			.about("Prints the number of black pixels in an image")
			.arg_from_usage("-p, --painted 'Count pixels on a painted bitmap of the image instead of from leaf weights'")
			.arg_from_usage("<PREORDER> 'Preorder string of the image'"))
		.get_matches();

	let (command, sub_matches) = clap_matches.subcommand();
	let args = sub_matches.unwrap_or(&clap_matches);
	let side = match args.value_of("side").unwrap_or("32").parse::<u32>() {
		Ok(n) if n.is_power_of_two() => n,
		Ok(_) => error_exit("Side length must be a power of two", 2),
		Err(_) => error_exit("Non-numeric value for side", 2)
	};

	match command {
		"roundtrip" => {
			let tree = parse_tree(args.value_of("PREORDER").unwrap_or_default());
			println!("{}", tree);
		},
		"merge" => {
			let first = parse_tree(args.value_of("FIRST").unwrap_or_default());
			let second = parse_tree(args.value_of("SECOND").unwrap_or_default());
			println!("{}", first.merge(&second));
		},
		"count" => {
			let tree = parse_tree(args.value_of("PREORDER").unwrap_or_default());
			let count = if args.is_present("painted") {
				tree.count_painted(side)
			} else {
				tree.count_black_for_side(side)
			};
			match count {
				Ok(n) => println!("{}", n),
				Err(e) => error_exit(&format!("Cannot count pixels: {}", e), 4)
			}
		},
		_ => {
			let mut session = Session::new(u64::from(side) * u64::from(side));
			let stdin = io::stdin();
			let stdout = io::stdout();
			match session.run_menu(stdin.lock(), stdout.lock()) {
				Ok(()) => (),
				Err(_) => error_exit("Could not read from standard input or write to standard output", 3)
			}
		}
	}
}
