//! Single-page application shell: the view document, page routing, page
//! timers, toasts and the page handlers that drive the other components.

mod app;
mod browse;
mod document;
mod forms;
mod profile;
mod router;
mod session_view;
mod timers;
mod toast;

use std::sync::OnceLock;

use regex::Regex;

pub use app::{App, ShellCommand};
pub use browse::BrowseView;
pub use document::{Document, Element, SharedDocument};
pub use forms::{LoginForm, SignupForm};
pub use profile::ProfileTab;
pub use router::Page;
pub use session_view::SESSION_ENDED;
pub use timers::TimerHandle;
pub use toast::{Toast, ToastKind, Toasts};

static BLOCK_END: OnceLock<Option<Regex>> = OnceLock::new();
static TAG: OnceLock<Option<Regex>> = OnceLock::new();

/// Markup reduced to readable text for a terminal: block ends become line
/// breaks, remaining tags are dropped and entities decoded.
pub fn plain_text(html: &str) -> String {
    let block_end = BLOCK_END
        .get_or_init(|| Regex::new(r"(?i)</(div|p|pre|h\d)>|<br\s*/?>").ok())
        .as_ref();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").ok()).as_ref();

    let (Some(block_end), Some(tag)) = (block_end, tag) else {
        return html.to_string();
    };
    let text = block_end.replace_all(html, "\n");
    let text = tag.replace_all(&text, " ");

    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
