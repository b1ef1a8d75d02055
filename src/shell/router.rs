use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login,
    Signup,
    Browse,
    Create,
    Profile,
    SessionView,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Home,
        Page::Login,
        Page::Signup,
        Page::Browse,
        Page::Create,
        Page::Profile,
        Page::SessionView,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Login => "login",
            Page::Signup => "signup",
            Page::Browse => "browse",
            Page::Create => "create",
            Page::Profile => "profile",
            Page::SessionView => "sessionView",
        }
    }

    /// Id of the page's section in the document, e.g. `browsePage`.
    pub fn element_id(&self) -> String {
        format!("{}Page", self.name())
    }

    /// Id of the page's navigation link.
    pub fn nav_id(&self) -> String {
        format!("{}Nav", self.name())
    }

    /// Elements rendered inside the page section.
    pub fn elements(&self) -> &'static [&'static str] {
        match self {
            Page::Home => &["userName"],
            Page::Login => &["loginError"],
            Page::Signup => &["signupError"],
            Page::Browse => &["sessionsGrid", "noSessions"],
            Page::Create => &["createError"],
            Page::Profile => &[
                "profileName",
                "profileYear",
                "profileAvatar",
                "statSessions",
                "statJoined",
                "statRating",
                "modulesList",
                "profileSessions",
            ],
            Page::SessionView => &[
                "viewSessionLive",
                "viewSessionTitle",
                "viewSessionModule",
                "viewSessionDateTime",
                "viewSessionDuration",
                "viewSessionParticipants",
                "viewSessionHost",
                "viewSessionDescription",
                "viewSessionPreferences",
                "pendingRequestsList",
                "participantsList",
                "chatLocked",
                "chatStatus",
                "chatMessages",
            ],
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Page::Create | Page::Profile)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Page {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| AppError::Internal(format!("unknown page: {}", s)))
    }
}
