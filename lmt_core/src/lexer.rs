use logos::Logos;

/// Opening macro delimiter.
pub const MACRO_OPEN: &str = "⦅";
/// Closing macro delimiter.
pub const MACRO_CLOSE: &str = "⦆";
/// An escaped opening delimiter, kept literal during expansion.
pub const ESCAPED_OPEN: &str = "\\⦅";
/// An escaped closing delimiter, kept literal during expansion.
pub const ESCAPED_CLOSE: &str = "\\⦆";

/// Raw tokens produced by logos for a single line of text.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
	#[token("\\⦅")]
	EscapedOpen,
	#[token("\\⦆")]
	EscapedClose,
	#[token("⦅")]
	Open,
	#[token("⦆")]
	Close,
	#[token("|")]
	Pipe,
	#[token(" ")]
	Space,
	#[regex(r"[-A-Za-z0-9_]+")]
	Word,
	#[token("\\")]
	Backslash,
	#[regex(r"[^-A-Za-z0-9_ |\\⦅⦆]+")]
	Text,
}

impl RawToken {
	/// Tokens allowed between the delimiters of a macro reference.
	fn is_macro_interior(self) -> bool {
		matches!(self, Self::Word | Self::Space | Self::Pipe)
	}
}

/// A reference to a named block, e.g. `⦅name | filter_a | filter_b⦆`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRef {
	pub name: String,
	/// Filter names in application order.
	pub filters: Vec<String>,
}

impl MacroRef {
	/// Parse the text between the delimiters.
	pub fn parse(content: &str) -> Self {
		let mut parts = content.trim().split('|').map(str::trim);
		let name = parts.next().unwrap_or_default().to_string();
		let filters = parts.map(ToString::to_string).collect();

		Self { name, filters }
	}
}

/// A piece of a line: literal text or a macro reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
	Literal(&'a str),
	Macro(MacroRef),
}

/// Split a line into literal spans and macro references.
///
/// A macro opens at an unescaped `⦅`, contains only word characters, `-`,
/// spaces and pipes, and closes at the next `⦆`. Anything else is literal,
/// including escaped delimiters.
pub fn split_macros(text: &str) -> Vec<Segment<'_>> {
	let tokens: Vec<_> = RawToken::lexer(text)
		.spanned()
		.map(|(token, span)| (token.ok(), span))
		.collect();

	let mut segments = Vec::new();
	let mut literal_start = 0;
	let mut idx = 0;

	while idx < tokens.len() {
		let (token, span) = &tokens[idx];
		if *token != Some(RawToken::Open) {
			idx += 1;
			continue;
		}

		let mut end = idx + 1;
		while let Some((Some(inner), _)) = tokens.get(end) {
			if !inner.is_macro_interior() {
				break;
			}
			end += 1;
		}

		let Some((Some(RawToken::Close), close_span)) = tokens.get(end) else {
			idx += 1;
			continue;
		};

		if literal_start < span.start {
			segments.push(Segment::Literal(&text[literal_start..span.start]));
		}
		segments.push(Segment::Macro(MacroRef::parse(
			&text[span.end..close_span.start],
		)));
		literal_start = close_span.end;
		idx = end + 1;
	}

	if literal_start < text.len() {
		segments.push(Segment::Literal(&text[literal_start..]));
	}

	segments
}

/// Restore escaped delimiters to their literal form.
pub fn unescape_delimiters(text: &str) -> String {
	text.replace(ESCAPED_OPEN, MACRO_OPEN)
		.replace(ESCAPED_CLOSE, MACRO_CLOSE)
}
