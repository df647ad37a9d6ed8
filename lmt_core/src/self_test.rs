use crate::LmtError;
use crate::LmtResult;
use crate::TangleOptions;
use crate::Tangler;
use crate::line::join_lines;

/// Path reported for lines of the self test document.
pub const SELF_TEST_PATH: &str = "<self-test>";

/// A literate document exercising merging, macro syntax, every built-in
/// filter, extension blocks and conditional output.
pub const SELF_TEST_DOCUMENT: &str = r#"# Self test

``` toml !
[vars]
enabled = true

[filters]
shout = "line | upper"

[blocks]
from_extension = "from_extension = true"
```

```text
block_replacement = ⦅replaced_block⦆
⦅appended_block⦆
spaced = ⦅ spaced_value ⦆
escaped = \⦅not_a_macro\⦆
two_macros = ⦅foo⦆ ⦅foo⦆
escape = "⦅backslash | ruby_escape⦆"
quoted = ⦅words | double_quote⦆
indented = [⦅words | indent_lines⦆]
items = [⦅items | add_comma | indent_continuation⦆]
⦅from_extension⦆
shout = ⦅words | shout⦆
⦅conditionals⦆
```

```text replaced_block
false
```

```text =replaced_block
true
```

```text appended_block
appended_first = true
```

```text appended_block
appended_second = true
```

```text spaced_value
true
```

```text foo
foo
```

```text backslash
ends in \ and "quotes"
```

```text words
some text
```

```text items
item 1
item 2
```

! if true
```text conditionals
case1 = if
```
! elsif true
```text conditionals
case1 = elsif
```
! else
```text conditionals
case1 = else
```
! end

! if true
```text conditionals
case2 = if
```
! elsif false
```text conditionals
case2 = elsif
```
! else
```text conditionals
case2 = else
```
! end

! if false
```text conditionals
case3 = if
```
! elsif true
```text conditionals
case3 = elsif
```
! else
```text conditionals
case3 = else
```
! end

! if false
```text conditionals
case4 = if
```
! elsif false
```text conditionals
case4 = elsif
```
! else
```text conditionals
case4 = else
```
! end

! if enabled
```text conditionals
case5 = if
```
! else
```text conditionals
case5 = else
```
! end

! if not enabled
```text conditionals
case6 = if
```
! else
```text conditionals
case6 = else
```
! end
"#;

const EXPECTED: &[(&str, &str)] = &[
	("block_replacement = true", "block replacement doesn't work"),
	("appended_first = true", "appending to macros doesn't work"),
	("appended_second = true", "appending to macros doesn't work"),
	("spaced = true", "insertion must support spaces"),
	("escaped = ⦅not_a_macro⦆", "macro delimiters may be escaped"),
	(
		"two_macros = foo foo",
		"should be able to place two macros on the same line",
	),
	(
		r#"escape = "ends in \\ and \"quotes\"""#,
		"ruby_escape doesn't escape",
	),
	(r#"quoted = "some text""#, "double_quote doesn't double quote"),
	(
		"indented = [  some text]",
		"indent_lines should add two spaces to lines",
	),
	("items = [item 1,", "add_comma isn't adding commas"),
	(
		"  item 2,]",
		"indent_continuation should indent every line but the first",
	),
	("from_extension = true", "extension hook should be able to add blocks"),
	("shout = SOME TEXT", "extension blocks should be able to add filters"),
	("case1 = if", "conditional output if should be output when true"),
	("case2 = if", "conditional output if should be output when true"),
	(
		"case3 = elsif",
		"conditional output elsif should be output when elsif is true",
	),
	(
		"case4 = else",
		"conditional output else should be output when neither if nor elsif is true",
	),
	("case5 = if", "conditions should see extension variables"),
	(
		"case6 = else",
		"conditional output else should be output when if is false",
	),
];

const UNEXPECTED: &[(&str, &str)] = &[
	("block_replacement = false", "replaced blocks should be discarded"),
	(
		"case1 = elsif",
		"conditional output elsif should not be output even if true when if is also true",
	),
	(
		"case1 = else",
		"conditional output else should not be output when if is true",
	),
	(
		"case2 = elsif",
		"conditional output elsif should not be output when elsif is false",
	),
	(
		"case2 = else",
		"conditional output else should not be output when if is true",
	),
	("case3 = if", "conditional output if should not be output when false"),
	(
		"case3 = else",
		"conditional output else should not be output when elsif is true",
	),
	("case4 = if", "conditional output if should not be output when false"),
	(
		"case4 = elsif",
		"conditional output elsif should not be output when elsif is false",
	),
	(
		"case5 = else",
		"conditional output else should not be output when if is true",
	),
	("case6 = if", "conditional output if should not be output when false"),
];

/// Tangle the built-in document and return a message for every check that
/// does not hold. An empty list means the engine works.
pub fn self_test() -> Vec<String> {
	let mut tangler =
		Tangler::from_source(SELF_TEST_PATH, SELF_TEST_DOCUMENT, TangleOptions::default());

	let output = match tangler.tangle() {
		Ok(Some(lines)) => join_lines(lines),
		Ok(None) => return vec!["self test document has no root block".to_string()],
		Err(error) => return vec![format!("self test document failed to tangle: {error}")],
	};
	let lines: Vec<&str> = output.lines().collect();

	let missing = EXPECTED
		.iter()
		.filter(|(expected, _)| !lines.contains(expected));
	let present = UNEXPECTED
		.iter()
		.filter(|(unexpected, _)| lines.contains(unexpected));

	missing
		.chain(present)
		.map(|(_, message)| (*message).to_string())
		.collect()
}

/// Fail on the first self test failure, or in development mode log every
/// failure as a warning and carry on.
pub fn report_self_test_failures(failures: &[String], dev: bool) -> LmtResult<()> {
	if dev {
		for failure in failures {
			tracing::warn!(failure = %failure, "self test failure");
		}
		return Ok(());
	}

	match failures.first() {
		Some(failure) => Err(LmtError::SelfTest(failure.clone())),
		None => Ok(()),
	}
}
