//! Text normalization applied to extracted resume text before embedding

use regex::{Captures, Regex};

/// Rewrites raw extracted text into the canonical single-line form that gets embedded.
///
/// Two rules are applied:
/// * a maximal run of single uppercase letters separated by single spaces
///   (`"J O H N"`, typical of letter-spaced PDF headings) is joined into one word;
/// * every run of whitespace (newlines and tabs included) becomes one ASCII space,
///   with leading and trailing whitespace removed.
///
/// Lowercase letters, digits and punctuation are never joined. The letter rule runs on
/// the raw text, so a wider gap such as `"M A R I A   G A R C I A"` still separates two
/// words, and once more on the collapsed text, which keeps `normalize` idempotent.
pub struct TextNormalizer {
    whitespace_regex: Regex,
    spaced_letters_regex: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        // Boundaries are captured rather than asserted: the regex crate has no lookaround
        let spaced_letters_regex =
            Regex::new(r"(^|\s)((?:[A-Z] )+[A-Z])(\s|$)").expect("Invalid spaced letters regex");

        Self {
            whitespace_regex,
            spaced_letters_regex,
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let despaced = self.remove_spaced_out_letters(text);
        let collapsed = self.collapse_whitespace(&despaced);
        // Collapsing can bring letters separated by a line break or a double space together
        self.remove_spaced_out_letters(&collapsed)
    }

    /// Trim, then collapse every whitespace run into a single space
    pub fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace_regex.replace_all(text.trim(), " ").into_owned()
    }

    /// Join runs like `"A B C"` into `"ABC"`. Letters must be separated by exactly one
    /// space; the run must be bounded by whitespace or the ends of the text.
    pub fn remove_spaced_out_letters(&self, text: &str) -> String {
        self.spaced_letters_regex
            .replace_all(text, |caps: &Captures| {
                format!("{}{}{}", &caps[1], caps[2].replace(' ', ""), &caps[3])
            })
            .into_owned()
    }
}

/// Best-effort candidate name: the first non-blank line of the unnormalized text, trimmed.
///
/// Returns an empty string when every line is blank. The result is not validated;
/// a job title or an address line is an acceptable answer.
pub fn extract_candidate_name(raw_text: &str) -> String {
    raw_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}
