//! Markup stripping for player supplied text.
//!
//! Names and chat lines are shown verbatim by clients, so anything that looks
//! like an HTML tag is removed and the remaining special characters are
//! escaped. Sanitization never rejects input; callers decide what an empty
//! result means.

pub const MAX_NAME_LENGTH: usize = 15;
pub const MAX_CHAT_LENGTH: usize = 60;
pub const DEFAULT_NAME: &str = "lorem ipsum";

/// Elements whose content is dropped together with the tags.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Strips tags and escapes `&`, `<`, `>` and `"`.
pub fn sanitize(input: &str) -> String {
    escape(&strip_tags(input))
}

/// Sanitized player name, truncated and never empty.
pub fn player_name(raw: &str) -> String {
    let name = sanitize(raw);
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        truncate(&name, MAX_NAME_LENGTH)
    }
}

/// Sanitized chat line, or `None` when nothing printable is left.
pub fn chat_text(raw: &str) -> Option<String> {
    let text = sanitize(raw);
    if text.is_empty() {
        None
    } else {
        Some(truncate(&text, MAX_CHAT_LENGTH))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if !opens_tag(tail) {
            out.push('<');
            rest = &tail[1..];
            continue;
        }

        // An unterminated tag swallows the rest of the input.
        let Some(end) = tail.find('>') else {
            return out;
        };

        let name = tag_name(&tail[1..end]);
        rest = &tail[end + 1..];

        if let Some(element) = RAW_TEXT_ELEMENTS.iter().find(|e| **e == name) {
            match find_closing_tag(rest, element) {
                Some(after) => rest = &rest[after..],
                None => return out,
            }
        }
    }

    out.push_str(rest);
    out
}

fn opens_tag(tail: &str) -> bool {
    match tail[1..].chars().next() {
        Some(c) => c.is_ascii_alphabetic() || c == '/' || c == '!',
        None => false,
    }
}

/// Lowercased name of an opening tag, empty for closing tags and comments.
fn tag_name(inner: &str) -> String {
    inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Byte offset just past `</element ...>`, matched case-insensitively.
fn find_closing_tag(text: &str, element: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let needle = format!("</{}", element);
    let start = lower.find(&needle)?;
    let close = lower[start..].find('>')?;
    Some(start + close + 1)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(sanitize("hello there"), "hello there");
    }

    #[test]
    fn tags_are_removed() {
        assert_eq!(sanitize("<b>bold</b> move"), "bold move");
        assert_eq!(sanitize("<img src=x onerror=alert(1)>hi"), "hi");
    }

    #[test]
    fn script_content_is_removed() {
        assert_eq!(sanitize("<script=\"alert();\">bob</script>"), "");
        assert_eq!(sanitize("a<SCRIPT>evil()</Script>b"), "ab");
        assert_eq!(sanitize("x<style>p{}</style>y"), "xy");
    }

    #[test]
    fn unterminated_tag_swallows_the_rest() {
        assert_eq!(sanitize("hello <b never closed"), "hello ");
    }

    #[test]
    fn lone_angle_brackets_are_escaped() {
        assert_eq!(sanitize("1 < 2 > 0"), "1 &lt; 2 &gt; 0");
        assert_eq!(sanitize("\"fish & chips\""), "&quot;fish &amp; chips&quot;");
    }

    #[test]
    fn names_default_and_truncate() {
        assert_eq!(player_name("<b></b>"), DEFAULT_NAME);
        assert_eq!(player_name("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmno");
        assert_eq!(player_name("bob"), "bob");
    }

    #[test]
    fn chat_is_capped_or_suppressed() {
        let long = "x".repeat(100);
        assert_eq!(chat_text(&long).map(|t| t.len()), Some(MAX_CHAT_LENGTH));
        assert_eq!(chat_text("<i></i>"), None);
        assert_eq!(chat_text("<script>alert(1)</script>"), None);
        assert_eq!(chat_text("gg").as_deref(), Some("gg"));
    }
}
