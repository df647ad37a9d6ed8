//! Recognizers for the line-oriented directives of a literate document.
//!
//! Every recognizer works on a single line's text (without the line
//! terminator) and only matches at the start of the line. Whitespace means
//! ASCII whitespace and a word character is `[A-Za-z0-9_]`.

/// The three backticks that open and close a fenced block.
pub const FENCE: &str = "```";

/// A conditional output directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conditional<'a> {
	/// `! if EXPR`
	If(&'a str),
	/// `! elsif EXPR`
	Elsif(&'a str),
	/// `! else`
	Else,
	/// `! end`
	End,
}

/// The parts of a fence line: `` ```lang =name ``.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceHeader<'a> {
	pub indent: &'a str,
	pub language: &'a str,
	/// Whether the `=` replacement marker is present.
	pub replace: bool,
	pub name: &'a str,
}

fn is_word(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn is_space(c: char) -> bool {
	c.is_ascii_whitespace()
}

/// Split off the longest prefix whose characters satisfy `predicate`.
fn take_while(text: &str, predicate: impl Fn(char) -> bool) -> (&str, &str) {
	let end = text.find(|c: char| !predicate(c)).unwrap_or(text.len());
	text.split_at(end)
}

/// Strip at least one leading whitespace character.
fn require_space(text: &str) -> Option<&str> {
	let rest = text.trim_start_matches(is_space);
	(rest.len() < text.len()).then_some(rest)
}

/// Match `!<space>+<keyword>` and return what follows the keyword.
fn directive<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
	let rest = text.strip_prefix('!')?;
	require_space(rest)?.strip_prefix(keyword)
}

/// `! include [description](path)`, returning the path.
///
/// The description may itself contain brackets: the path is everything
/// between the last `](` and the closing parenthesis at the end of the line.
pub fn parse_include(text: &str) -> Option<&str> {
	let rest = require_space(directive(text, "include")?)?;
	let body = rest
		.strip_prefix('[')?
		.trim_end_matches(is_space)
		.strip_suffix(')')?;
	let idx = body.rfind("](")?;
	Some(&body[idx + 2..])
}

/// `! include-path DIR`, returning the directory.
pub fn parse_include_path(text: &str) -> Option<&str> {
	let dir = require_space(directive(text, "include-path")?)?.trim_end_matches(is_space);
	(!dir.is_empty()).then_some(dir)
}

pub fn parse_conditional(text: &str) -> Option<Conditional<'_>> {
	if let Some(rest) = directive(text, "if") {
		return require_space(rest).map(|expr| Conditional::If(expr.trim_end_matches(is_space)));
	}

	if let Some(rest) = directive(text, "elsif") {
		return require_space(rest)
			.map(|expr| Conditional::Elsif(expr.trim_end_matches(is_space)));
	}

	if let Some(rest) = directive(text, "else") {
		return (rest.is_empty() || rest.starts_with(is_space)).then_some(Conditional::Else);
	}

	if let Some(rest) = directive(text, "end") {
		return rest.trim_start_matches(is_space).is_empty().then_some(Conditional::End);
	}

	None
}

/// Parse a fence line. Any line whose first non-blank characters are three
/// backticks is a fence; the language, marker and name are all optional.
pub fn parse_fence(text: &str) -> Option<FenceHeader<'_>> {
	let (indent, rest) = take_while(text, is_space);
	let rest = rest.strip_prefix(FENCE)?;
	let rest = rest.strip_prefix(' ').unwrap_or(rest);
	let (language, rest) = take_while(rest, is_word);
	let rest = rest.strip_prefix(' ').unwrap_or(rest);
	let (replace, rest) = match rest.strip_prefix('=') {
		Some(rest) => (true, rest),
		None => (false, rest),
	};
	let (name, _) = take_while(rest, |c| is_word(c) || c == '-');

	Some(FenceHeader {
		indent,
		language,
		replace,
		name,
	})
}

/// An extension block opener: a fence with a language followed by `!`, for
/// example `` ``` toml ! ``.
pub fn is_extension_fence(text: &str) -> bool {
	let (_, rest) = take_while(text, is_space);
	let Some(rest) = rest.strip_prefix(FENCE) else {
		return false;
	};
	let rest = rest.strip_prefix(' ').unwrap_or(rest);
	let (language, rest) = take_while(rest, is_word);
	let (spaces, rest) = take_while(rest, |c| c == ' ');

	!language.is_empty() && !spaces.is_empty() && rest.starts_with('!')
}

/// Extension blocks end at the first line that contains a fence anywhere.
pub fn closes_extension(text: &str) -> bool {
	text.contains(FENCE)
}
