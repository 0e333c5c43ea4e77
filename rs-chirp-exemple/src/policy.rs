use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;

/// Chance to answer a post that does not mention the bot.
pub const DEFAULT_REPLY_PROB: f64 = 1.0 / 50.0;

/// Weight gained by an author each time they mention the bot.
pub const BUDDY_BONUS: f64 = 0.01;

/// Decides when the bot speaks up.
///
/// Authors who mention the bot become "buddies": each mention raises the
/// chance that the bot answers their next unprompted post.
#[derive(Debug, Clone)]
pub struct ReplyPolicy {
    default_prob: f64,
    buddies: HashMap<String, f64>,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_PROB)
    }
}

impl ReplyPolicy {
    pub fn new(default_prob: f64) -> Self {
        Self { default_prob, buddies: HashMap::new() }
    }

    /// Current weight of an author, if they ever mentioned the bot.
    pub fn buddy_weight(&self, author: &str) -> Option<f64> {
        self.buddies.get(author).copied()
    }

    /// Probability of answering this post. A mention always gets an answer
    /// and strengthens the author's weight.
    pub fn reply_probability(&mut self, author: &str, has_mention: bool) -> f64 {
        if has_mention {
            let weight = self.buddies.entry(author.to_owned()).or_insert(self.default_prob);
            *weight += BUDDY_BONUS;
            return 1.0;
        }
        self.buddy_weight(author).unwrap_or(self.default_prob)
    }

    pub fn should_reply<R: Rng + ?Sized>(&mut self, author: &str, has_mention: bool, rng: &mut R) -> bool {
        let prob = self.reply_probability(author, has_mention);
        rng.random_range(0.0..=1.0) <= prob
    }
}

/// Pause before posting: 2, 4, 6, 8 or 10 seconds.
pub fn human_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::from_secs(2 * rng.random_range(1..=5u64))
}

/// `@name` tokens of a post, without trailing punctuation.
pub fn mentions(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix('@'))
        .map(|name| name.trim_end_matches(|c: char| !(c.is_alphanumeric() || c == '_')))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Mentions to put in front of a reply: everyone mentioned in the post
/// except the bot, then the author.
pub fn reply_prefix(text: &str, author: &str, bot_name: &str) -> String {
    let mut names: Vec<String> = mentions(text)
        .into_iter()
        .filter(|name| !name.eq_ignore_ascii_case(bot_name))
        .map(|name| format!("@{name}"))
        .collect();
    names.push(format!("@{author}"));
    names.join(" ")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn mention_forces_reply_and_makes_a_buddy() {
        let mut policy = ReplyPolicy::default();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(policy.buddy_weight("alice"), None);
        assert!(policy.should_reply("alice", true, &mut rng));
        assert!(policy.should_reply("alice", true, &mut rng));

        let weight = policy.buddy_weight("alice").unwrap();
        assert!((weight - (DEFAULT_REPLY_PROB + 2.0 * BUDDY_BONUS)).abs() < 1e-12);
        assert!((policy.reply_probability("alice", false) - weight).abs() < 1e-12);
    }

    #[test]
    fn strangers_get_the_default_chance() {
        let mut policy = ReplyPolicy::default();
        assert_eq!(policy.reply_probability("bob", false), DEFAULT_REPLY_PROB);
        assert_eq!(policy.buddy_weight("bob"), None);
    }

    #[test]
    fn zero_chance_never_replies() {
        let mut policy = ReplyPolicy::new(0.0);
        let mut rng = StdRng::seed_from_u64(2);
        let replies = (0..500).filter(|_| policy.should_reply("carol", false, &mut rng)).count();
        assert_eq!(replies, 0);
    }

    #[test]
    fn delay_is_an_even_number_of_seconds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let secs = human_delay(&mut rng).as_secs();
            assert!((2..=10).contains(&secs) && secs % 2 == 0, "{secs}");
        }
    }

    #[test]
    fn extracts_mentions() {
        assert_eq!(mentions("hey @bot, ask @alice_1! or @"), vec!["bot", "alice_1"]);
    }

    #[test]
    fn reply_prefix_skips_the_bot() {
        assert_eq!(reply_prefix("@Botanado what does @alice think?", "bob", "botanado"), "@alice @bob");
        assert_eq!(reply_prefix("no mentions here", "bob", "botanado"), "@bob");
    }
}
