use chrono::{DateTime, Local, NaiveDate, TimeZone};

use super::timing::{scheduled_info, time_remaining};
use crate::chat::format::escape_html;
use crate::config::ExpiryPolicy;
use crate::models::{Session, User};
use crate::users::Requester;

/// What a session card offers the viewer in place of a join button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    Join,
    Requested,
    Joined,
    Locked,
    None,
}

/// Join is offered only to viewers who are not a participant, not the
/// creator and have no pending request, and only once the session is
/// no longer scheduled.
pub fn join_state(session: &Session, viewer: Option<&str>) -> JoinState {
    let participant = viewer.map_or(false, |v| session.is_participant(v));
    let creator = viewer.map_or(false, |v| session.is_creator(v));
    let pending = viewer.map_or(false, |v| session.has_pending_request(v));

    if !participant && !creator && !pending && !session.is_scheduled {
        JoinState::Join
    } else if session.is_scheduled {
        JoinState::Locked
    } else if pending {
        JoinState::Requested
    } else if participant || creator {
        JoinState::Joined
    } else {
        JoinState::None
    }
}

/// Upper-case initials of each word, at most `max` of them; "U" when empty.
pub fn initials(name: &str, max: usize) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(max)
        .collect();
    if letters.is_empty() {
        "U".to_string()
    } else {
        letters
    }
}

fn session_date(session: &Session, now: &DateTime<Local>) -> NaiveDate {
    session
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| now.date_naive())
}

/// `Sat 14 Mar`
pub fn short_date(session: &Session, now: &DateTime<Local>) -> String {
    session_date(session, now).format("%a %-d %b").to_string()
}

/// `Saturday 14 March 2026`
pub fn long_date(session: &Session, now: &DateTime<Local>) -> String {
    session_date(session, now).format("%A %-d %B %Y").to_string()
}

/// `HH:MM`, dropping any seconds.
pub fn clock_time(session: &Session) -> String {
    session
        .time
        .as_deref()
        .map(|t| t.chars().take(5).collect())
        .unwrap_or_default()
}

pub fn rating_label(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r > 0.0 => format!("⭐ {:.1}", r),
        _ => "No ratings".to_string(),
    }
}

pub fn duration_label(session: &Session) -> String {
    session
        .duration
        .map(|d| format!("{} minutes", d))
        .unwrap_or_default()
}

pub fn preference_tags(preferences: &[String]) -> String {
    preferences
        .iter()
        .map(|p| format!("<span class=\"preference-tag\">{}</span>", escape_html(p)))
        .collect()
}

/// Markup for one session card as seen by `viewer`.
pub fn render_card(session: &Session, viewer: Option<&str>, now: &DateTime<Local>, policy: ExpiryPolicy) -> String {
    let id = escape_html(&session.id);
    let status = escape_html(session.status.as_deref().unwrap_or(""));
    let creator_name = session.creator_name.as_deref().unwrap_or("");

    let badges = format!(
        "{}{}<span class=\"session-status {}\">{}</span>",
        if session.is_live { "<span class=\"live-badge\">LIVE</span>" } else { "" },
        if session.is_scheduled { "<span class=\"scheduled-badge\">SCHEDULED</span>" } else { "" },
        status,
        status
    );

    let timing = if session.is_scheduled {
        let info = session
            .scheduled_start_time
            .map(|start| scheduled_info(start, now.timestamp_millis()))
            .unwrap_or_default();
        format!("<strong class=\"scheduled-countdown\">{}</strong>", escape_html(&info))
    } else if let Some(remaining) = session
        .is_live
        .then(|| time_remaining(session, now.naive_local(), policy))
        .flatten()
    {
        format!("<strong>{}</strong>", escape_html(&remaining))
    } else {
        duration_label(session)
    };

    let prefs = preference_tags(&session.preferences);
    let prefs = if prefs.is_empty() {
        String::new()
    } else {
        format!("<div class=\"session-preferences\">{}</div>", prefs)
    };

    let action = match join_state(session, viewer) {
        JoinState::Join => format!(
            "<button class=\"btn btn-primary btn-sm join-btn\" data-session-id=\"{}\">Join</button>",
            id
        ),
        JoinState::Locked => "<span class=\"btn btn-locked btn-sm\">🔒 Locked</span>".to_string(),
        JoinState::Requested => "<span class=\"btn btn-warning btn-sm\">Requested</span>".to_string(),
        JoinState::Joined => "<span class=\"btn btn-success btn-sm\">Joined</span>".to_string(),
        JoinState::None => String::new(),
    };

    format!(
        concat!(
            "<div class=\"session-card\" data-session-id=\"{id}\">",
            "<div class=\"session-header\"><div><h3 class=\"session-title\">{title}</h3>",
            "<span class=\"session-module\">{module}</span></div>",
            "<div class=\"session-badges\">{badges}</div></div>",
            "<div class=\"session-details\">",
            "<div class=\"session-detail\"><span class=\"session-detail-icon\">📅</span>{started}{date} at {time}</div>",
            "<div class=\"session-detail\"><span class=\"session-detail-icon\">⏱️</span>{timing}</div>",
            "<div class=\"session-detail\"><span class=\"session-detail-icon\">👥</span>{spots} spots left</div>",
            "<div class=\"session-detail\"><span class=\"session-detail-icon\">🎓</span>Year {year}</div>",
            "</div>{prefs}",
            "<div class=\"session-footer\"><div class=\"session-creator\">",
            "<div class=\"creator-avatar\">{initials}</div>",
            "<div><div class=\"creator-name\">{creator}</div><div class=\"creator-rating\">{rating}</div></div></div>",
            "<div class=\"session-actions\">",
            "<button class=\"btn btn-secondary btn-sm view-btn\" data-session-id=\"{id}\">View</button>{action}",
            "</div></div></div>"
        ),
        id = id,
        title = escape_html(&session.title),
        module = escape_html(&session.module),
        badges = badges,
        started = if session.is_live { "Started " } else { "" },
        date = short_date(session, now),
        time = escape_html(&clock_time(session)),
        timing = timing,
        spots = session.spots_left(),
        year = escape_html(session.year.as_deref().unwrap_or("")),
        prefs = prefs,
        initials = escape_html(&initials(creator_name, usize::MAX)),
        creator = escape_html(creator_name),
        rating = rating_label(session.creator_rating),
        action = action,
    )
}

pub fn render_grid(sessions: &[Session], viewer: Option<&str>, now: &DateTime<Local>, policy: ExpiryPolicy) -> String {
    sessions
        .iter()
        .map(|s| render_card(s, viewer, now, policy))
        .collect()
}

pub fn render_requests(session_id: &str, requested: usize, requesters: &[Requester]) -> String {
    if requested == 0 {
        return "<p>No pending requests</p>".to_string();
    }
    if requesters.is_empty() {
        return "<p>No valid pending requests</p>".to_string();
    }

    let session_id = escape_html(session_id);
    requesters
        .iter()
        .map(|r| {
            let name = r.user.display_name();
            let rating = if r.rating.average_rating > 0.0 {
                format!("⭐ {:.1}", r.rating.average_rating)
            } else {
                "No ratings".to_string()
            };
            let user_id = escape_html(&r.user.id);
            format!(
                concat!(
                    "<div class=\"request-item\"><div class=\"request-user-info\">",
                    "<div class=\"creator-avatar\">{}</div><div>",
                    "<div class=\"request-user-name\">{}</div>",
                    "<div class=\"request-user-details\">Year {} • {}</div></div></div>",
                    "<div class=\"request-actions\">",
                    "<button class=\"btn btn-primary btn-sm accept-request-btn\" data-session-id=\"{}\" data-user-id=\"{}\">Accept</button>",
                    "<button class=\"btn btn-secondary btn-sm decline-request-btn\" data-session-id=\"{}\" data-user-id=\"{}\">Decline</button>",
                    "</div></div>"
                ),
                escape_html(&initials(name, usize::MAX)),
                escape_html(name),
                escape_html(r.user.year.as_deref().unwrap_or("")),
                rating,
                session_id,
                user_id,
                session_id,
                user_id
            )
        })
        .collect()
}

pub fn render_participants(participants: &[User], viewer: Option<&str>) -> String {
    participants
        .iter()
        .map(|user| {
            let you = viewer == Some(user.id.as_str());
            format!(
                "<div class=\"participant-chip{}\" data-user-id=\"{}\"><div class=\"chip-avatar\">{}</div><span>{}{}</span></div>",
                if you { " is-you" } else { "" },
                escape_html(&user.id),
                escape_html(&initials(user.display_name(), 2)),
                escape_html(user.display_name()),
                if you { " (You)" } else { "" }
            )
        })
        .collect()
}

/// Chat placeholder for a session that has not started yet.
pub fn render_scheduled_lock(start_ms: Option<i64>) -> String {
    let when = start_ms
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|t| t.format("%A %-d %B %Y at %H:%M").to_string())
        .unwrap_or_default();
    format!(
        concat!(
            "<div class=\"chat-locked scheduled\"><div class=\"lock-icon\">🔒</div>",
            "<h4>Session Not Yet Started</h4><p>This session is scheduled to start on:</p>",
            "<p class=\"scheduled-time\">{}</p>",
            "<p class=\"scheduled-note\">Chat and participation will be available once the session starts.</p></div>"
        ),
        when
    )
}

pub fn render_join_lock() -> String {
    "<div class=\"chat-locked\"><p>Join this session to access the chat room</p></div>".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatingStats;

    fn base() -> Session {
        Session {
            id: "s1".into(),
            title: "Graphs".into(),
            module: "CS2010".into(),
            year: Some("2".into()),
            date: Some("2026-03-14".into()),
            time: Some("14:30:00".into()),
            duration: Some(60),
            max_participants: Some(4),
            participants: vec!["host".into(), "p1".into()],
            join_requests: vec!["r1".into()],
            creator_id: Some("host".into()),
            creator_name: Some("Ada Lovelace".into()),
            creator_rating: Some(4.25),
            status: Some("open".into()),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Local> {
        Local::now()
    }

    #[test]
    fn test_join_state_per_viewer() {
        let s = base();
        assert_eq!(join_state(&s, Some("stranger")), JoinState::Join);
        assert_eq!(join_state(&s, None), JoinState::Join);
        assert_eq!(join_state(&s, Some("host")), JoinState::Joined);
        assert_eq!(join_state(&s, Some("p1")), JoinState::Joined);
        assert_eq!(join_state(&s, Some("r1")), JoinState::Requested);

        let scheduled = Session {
            is_scheduled: true,
            ..base()
        };
        for viewer in ["stranger", "host", "r1"] {
            assert_eq!(join_state(&scheduled, Some(viewer)), JoinState::Locked);
        }
    }

    #[test]
    fn test_join_button_hidden_for_members() {
        let s = base();
        let now = now();
        assert!(render_card(&s, Some("stranger"), &now, ExpiryPolicy::Countdown).contains("join-btn"));
        for viewer in ["host", "p1", "r1"] {
            assert!(!render_card(&s, Some(viewer), &now, ExpiryPolicy::Countdown).contains("join-btn"));
        }
    }

    #[test]
    fn test_card_content() {
        let html = render_card(&base(), None, &now(), ExpiryPolicy::Countdown);
        assert!(html.contains("Sat 14 Mar at 14:30"));
        assert!(html.contains("60 minutes"));
        assert!(html.contains("2 spots left"));
        assert!(html.contains("<div class=\"creator-avatar\">AL</div>"));
        assert!(html.contains("⭐ 4.2") || html.contains("⭐ 4.3"));
    }

    #[test]
    fn test_card_escapes_text() {
        let s = Session {
            title: "<script>x</script>".into(),
            preferences: vec!["\"quiet\"".into()],
            ..base()
        };
        let html = render_card(&s, None, &now(), ExpiryPolicy::Countdown);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&quot;quiet&quot;"));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("ada lovelace", usize::MAX), "AL");
        assert_eq!(initials("Jean Claude Van Damme", 2), "JC");
        assert_eq!(initials("   ", 2), "U");
    }

    #[test]
    fn test_requests_markup() {
        assert_eq!(render_requests("s1", 0, &[]), "<p>No pending requests</p>");
        assert_eq!(render_requests("s1", 2, &[]), "<p>No valid pending requests</p>");

        let requester = Requester {
            user: User {
                id: "r1".into(),
                name: Some("Grace Hopper".into()),
                year: Some("3".into()),
                ..Default::default()
            },
            rating: RatingStats::default(),
        };
        let html = render_requests("s1", 1, &[requester]);
        assert!(html.contains("Year 3 • No ratings"));
        assert!(html.contains("accept-request-btn\" data-session-id=\"s1\" data-user-id=\"r1\""));
    }

    #[test]
    fn test_participant_chips() {
        let users = vec![
            User {
                id: "u1".into(),
                name: Some("Ada Lovelace".into()),
                ..Default::default()
            },
            User {
                id: "u2".into(),
                name: Some("Unknown User".into()),
                ..Default::default()
            },
        ];
        let html = render_participants(&users, Some("u1"));
        assert!(html.contains("participant-chip is-you"));
        assert!(html.contains("Ada Lovelace (You)"));
        assert!(html.contains("<div class=\"chip-avatar\">UU</div>"));
    }
}
