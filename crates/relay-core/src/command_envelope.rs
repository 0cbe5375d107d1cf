#[derive(Debug, Clone, PartialEq, Eq)]
/// One comment line addressed to the bot, with the invocation prefix removed.
pub struct InvocationLine<'a> {
    pub line_number: usize,
    pub text: &'a str,
}

/// Strips the bot-invocation prefix from a single line.
///
/// The prefix match is ASCII case-insensitive and must be followed by
/// whitespace or the end of the line, so `@bot` does not fire for `@botty`.
pub fn strip_invocation_prefix<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return None;
    }
    let trimmed = line.trim();
    if trimmed.len() < prefix.len() || !trimmed.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = trimmed.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some(text)
}

/// Collects every line of `body` that invokes the bot, in document order.
pub fn collect_invocation_lines<'a>(body: &'a str, prefix: &str) -> Vec<InvocationLine<'a>> {
    body.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            strip_invocation_prefix(line, prefix).map(|text| InvocationLine {
                line_number: index + 1,
                text,
            })
        })
        .collect()
}
