use std::io::{self, Read};

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Returns the inline argument, or reads standard input when it is absent or `-`.
pub fn inline_or_stdin(inline: Option<String>) -> io::Result<String> {
	match inline {
		Some(value) if value != "-" => Ok(value),
		_ => {
			let mut buf = String::new();

			io::stdin().read_to_string(&mut buf)?;

			Ok(buf.trim_end_matches(['\r', '\n']).to_string())
		},
	}
}
