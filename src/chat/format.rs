use std::sync::OnceLock;

use chrono::{Local, TimeZone};
use regex::Regex;

use crate::models::ChatMessage;

const CODE_PREFIX: &str = "/code ";
const FENCE: &str = "```";

static FENCED_BLOCK: OnceLock<Option<Regex>> = OnceLock::new();
static INLINE_CODE: OnceLock<Option<Regex>> = OnceLock::new();

fn fenced_block() -> Option<&'static Regex> {
    FENCED_BLOCK
        .get_or_init(|| Regex::new(r"```(\w*)\n?([\s\S]*?)```").ok())
        .as_ref()
}

fn inline_code() -> Option<&'static Regex> {
    INLINE_CODE
        .get_or_init(|| Regex::new(r"`([^`\n]+)`").ok())
        .as_ref()
}

/// Escapes text for insertion into markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Markup for a fenced code block.
pub fn code_block(code: &str, lang: &str) -> String {
    let label = if lang.is_empty() { "code" } else { lang };
    format!(
        "<div class=\"code-block\"><div class=\"code-header\"><span class=\"code-lang\">{}</span></div><pre><code>{}</code></pre></div>",
        escape_html(label),
        escape_html(code)
    )
}

/// Wraps code in a fence so it round-trips through `format_content`.
pub fn fence(code: &str, lang: &str) -> String {
    format!("{}{}\n{}\n{}", FENCE, lang, code, FENCE)
}

/// Renders chat message content to markup.
///
/// A leading `/code ` makes the whole message one code block. Otherwise
/// fenced blocks are taken first-pair-at-a-time, inline spans inside the
/// text between them, and everything else is escaped. An unterminated fence
/// leaves the remainder as escaped text.
pub fn format_content(content: &str) -> String {
    if let Some(code) = content.strip_prefix(CODE_PREFIX) {
        return code_block(code.trim(), "");
    }

    let Some(fenced) = fenced_block() else {
        return escape_html(content);
    };

    let mut out = String::new();
    let mut rest = content;
    while let Some(caps) = fenced.captures(rest) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(2)) else {
            break;
        };
        let lang = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        out.push_str(&format_inline(&rest[..whole.start()]));
        out.push_str(&code_block(body.as_str().trim_end_matches('\n'), lang));
        rest = &rest[whole.end()..];
    }

    match rest.find(FENCE) {
        Some(idx) => {
            out.push_str(&format_inline(&rest[..idx]));
            out.push_str(&escape_html(&rest[idx..]));
        }
        None => out.push_str(&format_inline(rest)),
    }
    out
}

fn format_inline(text: &str) -> String {
    let Some(inline) = inline_code() else {
        return escape_html(text);
    };

    let mut out = String::new();
    let mut last = 0;
    for caps in inline.captures_iter(text) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&escape_html(&text[last..whole.start()]));
        out.push_str("<code class=\"inline-code\">");
        out.push_str(&escape_html(code.as_str()));
        out.push_str("</code>");
        last = whole.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// Local wall-clock `HH:MM` for an epoch-millisecond timestamp.
pub fn format_time(timestamp: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

pub fn render_messages(messages: &[ChatMessage], viewer_id: Option<&str>) -> String {
    if messages.is_empty() {
        return "<div class=\"chat-empty\"><p>No messages yet. Start the conversation!</p></div>".to_string();
    }

    messages
        .iter()
        .map(|msg| {
            let own = viewer_id == Some(msg.sender_id.as_str());
            let sender = if own {
                "You".to_string()
            } else {
                escape_html(msg.sender_name.as_deref().unwrap_or("Unknown"))
            };
            format!(
                "<div class=\"chat-message{}\"><div class=\"message-header\"><span class=\"message-sender\" data-user-id=\"{}\">{}</span><span class=\"message-time\">{}</span></div><div class=\"message-content\">{}</div></div>",
                if own { " own" } else { "" },
                escape_html(&msg.sender_id),
                sender,
                format_time(msg.timestamp),
                format_content(&msg.content)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_span() {
        assert_eq!(format_content("`x`"), "<code class=\"inline-code\">x</code>");
        assert_eq!(
            format_content("run `cargo <b>` now"),
            "run <code class=\"inline-code\">cargo &lt;b&gt;</code> now"
        );
    }

    #[test]
    fn test_fenced_block_with_language() {
        let html = format_content("look:\n```rust\nfn main() {}\n```\ndone");
        assert!(html.starts_with("look:\n<div class=\"code-block\">"));
        assert!(html.contains("<span class=\"code-lang\">rust</span>"));
        assert!(html.contains("<pre><code>fn main() {}</code></pre>"));
        assert!(html.ends_with("\ndone"));
    }

    #[test]
    fn test_code_prefix() {
        let html = format_content("/code if a < b { swap() }");
        assert!(html.contains("<span class=\"code-lang\">code</span>"));
        assert!(html.contains("if a &lt; b { swap() }"));
    }

    #[test]
    fn test_unterminated_fence_stays_text() {
        let html = format_content("`ok` then ```js\nalert('<x>')");
        assert_eq!(
            html,
            "<code class=\"inline-code\">ok</code> then ```js\nalert(&#39;&lt;x&gt;&#39;)"
        );
    }

    #[test]
    fn test_no_raw_angle_brackets_from_input() {
        let inputs = [
            "<script>alert(1)</script>",
            "`<img src=x>`",
            "```<lang>\n<div>\n```",
            "/code <b>",
            "``` <>",
        ];
        for input in inputs {
            let html = format_content(input);
            assert!(!html.contains("<script"), "{}", html);
            assert!(!html.contains("<img"), "{}", html);
            assert!(!html.contains("<b>"), "{}", html);
            assert!(!html.contains("<div>\n"), "{}", html);
        }
    }

    #[test]
    fn test_fence_round_trip() {
        let html = format_content(&fence("let x = 1;", "rust"));
        assert!(html.contains("<pre><code>let x = 1;</code></pre>"));
    }

    #[test]
    fn test_render_own_and_empty() {
        assert!(render_messages(&[], Some("u1")).contains("No messages yet"));

        let msgs = vec![ChatMessage {
            id: Some("m1".into()),
            session_id: None,
            sender_id: "u1".into(),
            sender_name: Some("Ada".into()),
            content: "hi".into(),
            timestamp: 0,
        }];
        let html = render_messages(&msgs, Some("u1"));
        assert!(html.contains("chat-message own"));
        assert!(html.contains(">You<"));
    }

    #[test]
    fn test_sender_carries_user_id() {
        let msgs = vec![ChatMessage {
            id: Some("m2".into()),
            session_id: None,
            sender_id: "u\"7".into(),
            sender_name: Some("Grace".into()),
            content: "hello".into(),
            timestamp: 0,
        }];
        let html = render_messages(&msgs, Some("u1"));
        assert!(html.contains("<span class=\"message-sender\" data-user-id=\"u&quot;7\">Grace</span>"));
    }
}
