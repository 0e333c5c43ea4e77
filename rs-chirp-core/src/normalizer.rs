use std::sync::LazyLock;

use regex::Regex;

/// Emails, URLs and anything shaped like `word.word`.
///
/// Dotted tokens such as `e.g` or `v1.2` are removed too. Case folding is
/// ASCII only, so `K` (Kelvin sign) or `ſ` never count as letters.
static LINKS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i-u)([a-z0-9\-_.+]+@)?(https?://)?([a-z0-9\-_/]+)(\.([a-z0-9\-_/]+))+([?&a-z0-9=])*")
		.expect("link pattern is valid")
});

/// `@user` mentions. ASCII word characters only, so every mention body is
/// also matched by the domain class of `LINKS`.
static MENTIONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_]+").expect("mention pattern is valid"));

/// Leading retweet markers, each optionally followed by whitespace and a colon.
/// Repeated markers (`RT :RT`) go in one pass.
static RETWEET: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^(?:RT\b(?:\s:)?)+").expect("retweet pattern is valid"));

/// Removes links, mentions and the leading retweet marker from a post.
///
/// The three passes run in that order and never touch whitespace, so the
/// gaps left by removed tokens stay in the output. `None` cleans to an empty
/// string.
///
/// Removing a mention can join its neighbours into a new link (`a.@b-c`
/// leaves `a.-c`), so the passes repeat until the text stops changing. Each
/// pass only deletes, which bounds the loop and makes cleaning idempotent.
pub fn clean<'a>(text: impl Into<Option<&'a str>>) -> String {
	let Some(text) = text.into() else {
		return String::new();
	};

	let mut text = text.to_owned();
	loop {
		let cleaned = {
			let links = LINKS.replace_all(&text, "");
			let mentions = MENTIONS.replace_all(&links, "");
			RETWEET.replace(&mentions, "").into_owned()
		};
		if cleaned.len() == text.len() {
			return text;
		}
		text = cleaned;
	}
}

#[cfg(test)]
mod tests {
	use rand::rngs::StdRng;
	use rand::{Rng, SeedableRng};

	use super::*;

	#[test]
	fn removes_link_mention_and_retweet_marker() {
		assert_eq!(clean("RT @nasa: Check out https://nasa.gov/mars today!"), " Check out  today!");
	}

	#[test]
	fn absent_text_is_empty() {
		assert_eq!(clean(None), "");
		assert_eq!(clean(""), "");
	}

	#[test]
	fn removes_emails() {
		assert_eq!(clean("write to john.doe+bot@mail.example.com now"), "write to  now");
	}

	#[test]
	fn removes_query_strings() {
		assert_eq!(clean("see example.com/page?id=42&x=1 please"), "see  please");
	}

	#[test]
	fn keeps_retweet_letters_inside_words() {
		assert_eq!(clean("Start the party"), "Start the party");
		assert_eq!(clean("RTFM please"), "RTFM please");
	}

	#[test]
	fn retweet_without_colon() {
		assert_eq!(clean("rt hello"), " hello");
		assert_eq!(clean("RT: hello"), ": hello");
	}

	#[test]
	fn stacked_retweet_markers() {
		assert_eq!(clean("RT :RT x"), " x");
		assert_eq!(clean("RT RT x"), " RT x");
	}

	#[test]
	fn dotted_tokens_are_removed_too() {
		assert_eq!(clean("version 1.2 shipped"), "version  shipped");
	}

	#[test]
	fn does_not_collapse_whitespace() {
		assert_eq!(clean("a  @b  c"), "a    c");
	}

	#[test]
	fn removed_mention_exposing_a_link() {
		assert_eq!(clean("a.@b-c"), "");
		assert_eq!(clean("see x.@bob/y now"), "see  now");
		assert_eq!(clean("v1.@x-2 out"), " out");
	}

	#[test]
	fn case_folding_is_ascii_only() {
		assert_eq!(clean("\u{212A}.\u{17F}"), "\u{212A}.\u{17F}");
		assert_eq!(clean("Example.COM"), "");
	}

	#[test]
	fn idempotent_on_generated_inputs() {
		let pieces = [
			"R", "T", "RT", "rt", "a", "b", "x", "1", "_", ".", "@", ":", "/", "-", "?", "=", "&", "+", " ", "\t",
			"http://", "https://", "é",
		];
		let mut rng = StdRng::seed_from_u64(17);
		for _ in 0..20_000 {
			let len = rng.random_range(0..12);
			let input: String = (0..len).map(|_| pieces[rng.random_range(0..pieces.len())]).collect();
			let once = clean(input.as_str());
			assert_eq!(clean(once.as_str()), once, "not idempotent for {input:?}");
		}
	}

	#[test]
	fn idempotent_on_tricky_inputs() {
		let inputs = [
			"RT @nasa: Check out https://nasa.gov/mars today!",
			"RT RT RT",
			"RTRT x",
			"@bob RT hi",
			"a@b.c @d.e f@g",
			"RT :x.y z",
			"RT\t:RT :RT done",
			"foo@bar .com",
			"@@alice@bob",
			"mail me: Jane@Example.ORG?ok=1",
			"https://",
			"RT",
			"émile@école.fr @κόσμε ok",
			"trailing space ",
			"a.@b-c",
			"see x.@bob/y now",
			"v1.@x-2",
		];
		for input in inputs {
			let once = clean(input);
			assert_eq!(clean(once.as_str()), once, "not idempotent for {input:?}");
		}
	}
}
