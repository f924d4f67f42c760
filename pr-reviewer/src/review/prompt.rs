//! Prompt builder for the suggestion request.
//!
//! Pure and deterministic: the same diff always yields the same prompt for a
//! given [`PROMPT_VERSION`]. The diff is embedded verbatim at the end.

/// Bumped whenever the wording or the requested reply format changes.
pub const PROMPT_VERSION: u32 = 1;

/// Marker line that precedes the embedded diff.
pub const DIFF_MARKER: &str = "### DIFF";

/// Renders the review prompt for one pull request diff.
pub fn build_prompt(diff: &str) -> String {
    let mut s = String::with_capacity(diff.len() + 1024);
    s.push_str("You are a careful code reviewer. Review the unified diff below.\n");
    s.push_str("Catch simple style errors and likely bugs, and suggest concrete improvements.\n");
    s.push_str("\n# Reply format\n");
    s.push_str("Reply with ONLY a JSON array. Every element is an array of exactly 4 items:\n");
    s.push_str("[\"<file path>\", <line number>, \"<comment>\", \"<diff hunk>\"]\n");
    s.push_str("- file path: the changed file, as written after `+++ b/`\n");
    s.push_str(
        "- line number: position in that file's diff, counting lines below its first `@@` header (first line = 1)\n",
    );
    s.push_str("- comment: the review comment, Markdown allowed\n");
    s.push_str("- diff hunk: the `@@ ... @@` header of the hunk the comment is about\n");
    s.push_str("\n# Rules\n");
    s.push_str("- No prose, explanations, or code fences before or after the array.\n");
    s.push_str("- Escape quotes inside strings as JSON requires.\n");
    s.push_str("- If there is nothing worth commenting on, reply with [].\n");
    s.push('\n');
    s.push_str(DIFF_MARKER);
    s.push('\n');
    s.push_str(diff);
    if !diff.ends_with('\n') {
        s.push('\n');
    }
    s
}
