use std::collections::HashMap;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::Line;
use crate::LmtError;
use crate::LmtResult;
use crate::syntax::parse_fence;

/// How a fragment combines with earlier fragments of the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
	/// Added after the fragments before it.
	Append,
	/// Discards every earlier fragment of the block.
	Replace,
}

/// The body of one fenced block in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
	pub kind: FragmentKind,
	pub lines: Vec<Line>,
}

/// All fragments sharing a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
	/// Block name; empty for the root block.
	pub name: String,
	/// Language tag shared by every fragment.
	pub language: String,
	pub fragments: Vec<Fragment>,
}

impl Block {
	pub fn resolve(&self) -> Vec<Line> {
		resolve_fragments(&self.fragments)
	}
}

/// Resolved block bodies keyed by name. The root block is never stored here.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deref, DerefMut)]
pub struct BlockTable(HashMap<String, Vec<Line>>);

impl FromIterator<(String, Vec<Line>)> for BlockTable {
	fn from_iter<I: IntoIterator<Item = (String, Vec<Line>)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// The result of block assembly: the root block (if any) and the named blocks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Assembly {
	pub root: Option<Vec<Line>>,
	pub blocks: BlockTable,
}

/// Concatenate the last `Replace` fragment (or the first fragment when there
/// is none) with every fragment after it. The final line loses its newline.
pub fn resolve_fragments(fragments: &[Fragment]) -> Vec<Line> {
	let start = fragments
		.iter()
		.rposition(|fragment| fragment.kind == FragmentKind::Replace)
		.unwrap_or(0);

	let mut lines: Vec<Line> = fragments
		.iter()
		.skip(start)
		.flat_map(|fragment| fragment.lines.iter().cloned())
		.collect();

	if let Some(last) = lines.last_mut() {
		last.newline = false;
	}

	lines
}

struct OpenFence {
	name: String,
	language: String,
	kind: FragmentKind,
	opener: Line,
	lines: Vec<Line>,
}

/// Partition lines into fenced blocks and group them by name in order of
/// first appearance. Lines outside fences and the fence lines themselves are
/// dropped.
pub fn collect_blocks(lines: &[Line]) -> LmtResult<Vec<Block>> {
	let mut blocks: Vec<Block> = Vec::new();
	let mut index: HashMap<String, usize> = HashMap::new();
	let mut open: Option<OpenFence> = None;

	for line in lines {
		let Some(header) = parse_fence(&line.text) else {
			if let Some(fence) = open.as_mut() {
				fence.lines.push(line.clone());
			}
			continue;
		};

		let Some(fence) = open.take() else {
			open = Some(OpenFence {
				name: header.name.to_string(),
				language: header.language.to_string(),
				kind: if header.replace {
					FragmentKind::Replace
				} else {
					FragmentKind::Append
				},
				opener: line.clone(),
				lines: Vec::new(),
			});
			continue;
		};

		let fragment = Fragment {
			kind: fence.kind,
			lines: fence.lines,
		};

		if let Some(&idx) = index.get(&fence.name) {
			let block = &mut blocks[idx];
			if block.language != fence.language {
				return Err(LmtError::MixedLanguages {
					name: fence.name,
					first: block.language.clone(),
					second: fence.language,
				});
			}
			block.fragments.push(fragment);
		} else {
			index.insert(fence.name.clone(), blocks.len());
			blocks.push(Block {
				name: fence.name,
				language: fence.language,
				fragments: vec![fragment],
			});
		}
	}

	if let Some(fence) = open {
		return Err(LmtError::MissingCodeFence {
			name: fence.name,
			location: fence.opener.location(),
		});
	}

	Ok(blocks)
}

/// Assemble the root block and the named block table.
pub fn assemble(lines: &[Line]) -> LmtResult<Assembly> {
	let mut assembly = Assembly::default();

	for block in collect_blocks(lines)? {
		let body = block.resolve();
		if block.name.is_empty() {
			assembly.root = Some(body);
		} else {
			assembly.blocks.insert(block.name, body);
		}
	}

	tracing::debug!(
		blocks = assembly.blocks.len(),
		has_root = assembly.root.is_some(),
		"assembled blocks"
	);

	Ok(assembly)
}
