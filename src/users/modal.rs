use super::directory::UserProfile;
use crate::chat::format::escape_html;
use crate::sessions::initials;

/// Where the modal was opened from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalContext {
    /// Session whose participant list the modal was opened from.
    pub session_id: Option<String>,
    /// The viewer created that session and may remove participants.
    pub can_kick: bool,
}

/// Five-star strip for an average rating, rounded to the nearest star.
pub fn stars(average: f64) -> String {
    let filled = average.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "⭐".repeat(filled), "☆".repeat(5 - filled))
}

pub fn render_user_modal(profile: &UserProfile, ctx: &ModalContext) -> String {
    let user = &profile.user;
    let name = escape_html(user.display_name());
    let year = user
        .year
        .as_deref()
        .map(|y| format!("Year {}", escape_html(y)))
        .unwrap_or_default();

    let rating = if profile.rating.rating_count > 0 {
        format!(
            "{} {:.1} ({} rating{})",
            stars(profile.rating.average_rating),
            profile.rating.average_rating,
            profile.rating.rating_count,
            if profile.rating.rating_count == 1 { "" } else { "s" }
        )
    } else {
        "No ratings yet".to_string()
    };

    let current = profile.my_rating.score.filter(|_| profile.my_rating.has_rated).unwrap_or(0);
    let rate_buttons: String = (1..=5u8)
        .map(|score| {
            format!(
                "<button class=\"rate-star{}\" data-user-id=\"{}\" data-score=\"{}\">{}</button>",
                if score <= current { " active" } else { "" },
                escape_html(&user.id),
                score,
                if score <= current { "⭐" } else { "☆" }
            )
        })
        .collect();

    let block_action = if profile.block.has_blocked {
        format!(
            "<button class=\"btn btn-secondary btn-sm unblock-btn\" data-user-id=\"{}\">Unblock</button>",
            escape_html(&user.id)
        )
    } else {
        format!(
            "<button class=\"btn btn-danger btn-sm block-btn\" data-user-id=\"{}\">Block</button>",
            escape_html(&user.id)
        )
    };

    let kick_action = match (&ctx.session_id, ctx.can_kick) {
        (Some(session_id), true) => format!(
            "<button class=\"btn btn-danger btn-sm kick-btn\" data-session-id=\"{}\" data-user-id=\"{}\">Remove from session</button>",
            escape_html(session_id),
            escape_html(&user.id)
        ),
        _ => String::new(),
    };

    let notice = if profile.block.is_blocked_by {
        "<p class=\"block-notice\">This user has blocked you</p>"
    } else {
        ""
    };

    format!(
        "<div class=\"user-modal\"><div class=\"profile-avatar\"><span>{}</span></div><h3>{}</h3><p class=\"user-year\">{}</p><p class=\"user-rating\">{}</p>{}<div class=\"rate-user\"><span>Your rating</span>{}</div><div class=\"modal-actions\">{}{}</div></div>",
        escape_html(&initials(user.display_name(), usize::MAX)),
        name,
        year,
        rating,
        notice,
        rate_buttons,
        block_action,
        kick_action
    )
}
