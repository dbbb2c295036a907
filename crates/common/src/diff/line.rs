// Positional line diff.
//
// Compares two texts line by line at the same index. This is not an LCS
// diff: an inserted or deleted line shifts every later line and shows up as a
// rewrite of the rest of the file. The AI prompt consumes this exact shape.

const ADDED_PREFIX: &str = "+ ";
const REMOVED_PREFIX: &str = "- ";

/// Computes a positional diff from `old_text` to `new_text`.
///
/// For every line index where the two sides differ, emits the new line
/// prefixed with `+ ` (unless empty) followed by the old line prefixed with
/// `- ` (unless empty). The shorter side is padded with empty lines. Returns
/// an empty string when nothing differs.
pub fn diff(old_text: &str, new_text: &str) -> String {
    if old_text == new_text {
        return String::new();
    }

    let old_lines: Vec<&str> = old_text.split('\n').collect();
    let new_lines: Vec<&str> = new_text.split('\n').collect();
    let max_len = old_lines.len().max(new_lines.len());

    let mut out: Vec<String> = Vec::new();
    for index in 0..max_len {
        let old_line = old_lines.get(index).copied().unwrap_or("");
        let new_line = new_lines.get(index).copied().unwrap_or("");
        if old_line == new_line {
            continue;
        }
        if !new_line.is_empty() {
            out.push(format!("{ADDED_PREFIX}{new_line}"));
        }
        if !old_line.is_empty() {
            out.push(format!("{REMOVED_PREFIX}{old_line}"));
        }
    }

    out.join("\n")
}
