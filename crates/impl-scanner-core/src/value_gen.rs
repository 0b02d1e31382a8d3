//! Synthetic value generation.
//!
//! [`ValueSource`] is the capability the populator needs; any faker can sit
//! behind it. [`FakeValueGenerator`] is the bundled implementation: seeded,
//! lorem-ipsum words, recent UTC timestamps.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;
use uuid::Uuid;

/// Default locale for word generation.
pub const DEFAULT_LOCALE: &str = "en";

/// Window for [`ValueSource::recent_timestamp`], in seconds (one day).
const RECENT_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Source of plausible random primitive values.
pub trait ValueSource {
    /// A single word.
    fn word(&mut self) -> String;

    /// Integer in `[min, max]`.
    fn int(&mut self, min: i32, max: i32) -> i32;

    /// Decimal in `[min, max]`.
    fn decimal(&mut self, min: f64, max: f64) -> f64;

    fn uuid(&mut self) -> Uuid;

    /// A timestamp in the recent past.
    fn recent_timestamp(&mut self) -> DateTime<Utc>;

    /// Index of a uniformly picked enum member, `None` when `count == 0`.
    fn pick(&mut self, count: usize) -> Option<usize>;
}

/// Seeded fake-data generator.
pub struct FakeValueGenerator {
    rng: StdRng,
    words: &'static [&'static str],
    locale: String,
}

impl FakeValueGenerator {
    /// Generator with the given seed and locale.
    ///
    /// Unknown locales fall back to [`DEFAULT_LOCALE`].
    pub fn new(seed: u64, locale: &str) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), locale)
    }

    /// Generator seeded from OS entropy.
    pub fn from_entropy(locale: &str) -> Self {
        Self::with_rng(StdRng::from_entropy(), locale)
    }

    fn with_rng(rng: StdRng, locale: &str) -> Self {
        let (locale, words) = match words_for(locale) {
            Some(words) => (locale.to_string(), words),
            None => {
                warn!(
                    locale = %locale,
                    fallback = DEFAULT_LOCALE,
                    "unknown locale, falling back"
                );
                (DEFAULT_LOCALE.to_string(), LOREM_WORDS)
            }
        };
        Self { rng, words, locale }
    }

    /// The locale actually in use.
    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl ValueSource for FakeValueGenerator {
    fn word(&mut self) -> String {
        self.words[self.rng.gen_range(0..self.words.len())].to_string()
    }

    fn int(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn decimal(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        // Two fractional digits, like a money amount
        let raw: f64 = self.rng.gen_range(min..=max);
        ((raw * 100.0).round() / 100.0).clamp(min, max)
    }

    fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }

    fn recent_timestamp(&mut self) -> DateTime<Utc> {
        let back = self.rng.gen_range(0..RECENT_WINDOW_SECS);
        Utc::now() - Duration::seconds(back)
    }

    fn pick(&mut self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        Some(self.rng.gen_range(0..count))
    }
}

fn words_for(locale: &str) -> Option<&'static [&'static str]> {
    match locale {
        "en" | "en_US" | "en_GB" => Some(LOREM_WORDS),
        _ => None,
    }
}

const LOREM_WORDS: &[&str] = &[
    "alias", "consequatur", "aut", "perferendis", "sit", "voluptatem", "accusantium",
    "doloremque", "aperiam", "eaque", "ipsa", "quae", "ab", "illo", "inventore", "veritatis",
    "et", "quasi", "architecto", "beatae", "vitae", "dicta", "sunt", "explicabo", "aspernatur",
    "odit", "fugit", "sed", "quia", "consequuntur", "magni", "dolores", "eos", "qui",
    "ratione", "sequi", "nesciunt", "neque", "dolorem", "ipsum", "dolor", "amet",
    "consectetur", "adipisci", "velit", "numquam", "eius", "modi", "tempora", "incidunt",
    "ut", "labore", "dolore", "magnam", "aliquam", "quaerat", "enim", "minima", "veniam",
    "quis", "nostrum", "exercitationem", "ullam", "corporis", "nemo", "ipsam", "voluptas",
    "suscipit", "laboriosam", "nisi", "aliquid", "ex", "ea", "commodi", "autem", "vel", "eum",
    "iure", "reprehenderit", "in", "voluptate", "esse", "quam", "nihil", "molestiae",
    "illum", "fugiat", "quo", "minus", "omnis", "iste", "natus", "error", "similique",
    "rerum", "facilis", "expedita", "distinctio", "nam", "libero", "tempore", "cum",
    "soluta", "nobis", "eligendi", "optio", "cumque", "impedit", "placeat", "facere",
    "possimus", "assumenda", "repellendus", "temporibus", "quibusdam", "officiis",
    "debitis", "necessitatibus", "saepe", "eveniet", "voluptates", "repudiandae",
    "recusandae", "itaque", "earum", "hic", "tenetur", "sapiente", "delectus", "reiciendis",
    "voluptatibus", "maiores", "doloribus", "asperiores", "repellat",
];
