use clap::{Parser, Subcommand};
use tracing::debug;

use studybuddy_client::sessions::SessionForm;
use studybuddy_client::shell::{LoginForm, ProfileTab, SignupForm};
use studybuddy_client::{App, Page};

#[derive(Debug, Parser)]
#[command(multicall = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Commands {
    Login {
        email: String,
        password: String,
    },
    Signup {
        name: String,
        email: String,
        year: String,
        password: String,
        confirm: String,
    },
    Logout,
    /// Switch page: home, login, signup, browse, create, profile
    Go {
        page: Page,
    },
    Filter {
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value = "")]
        module: String,
    },
    Create {
        title: String,
        module: String,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value = "")]
        date: String,
        #[arg(long, default_value = "")]
        time: String,
        #[arg(long, default_value = "60")]
        duration: String,
        #[arg(long, default_value = "4")]
        max: String,
        #[arg(long = "pref")]
        preferences: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        now: bool,
    },
    Join {
        session_id: String,
    },
    View {
        session_id: String,
    },
    Say {
        msg: Vec<String>,
    },
    Code {
        #[arg(long, default_value = "")]
        lang: String,
        code: Vec<String>,
    },
    Accept {
        session_id: String,
        user_id: String,
    },
    Decline {
        session_id: String,
        user_id: String,
    },
    Kick {
        session_id: String,
        user_id: String,
    },
    Delete {
        session_id: String,
    },
    User {
        user_id: String,
    },
    Rate {
        user_id: String,
        score: u8,
    },
    Block {
        user_id: String,
    },
    Unblock {
        user_id: String,
    },
    Tab {
        tab: ProfileTab,
    },
    Modules {
        modules: Vec<String>,
    },
    Show,
    Quit,
}

/// Runs one command against the shell. Returns `false` on quit.
pub async fn dispatch(app: &mut App, command: Commands) -> bool {
    match command {
        Commands::Login { email, password } => {
            app.submit_login(&LoginForm { email, password }).await;
        }
        Commands::Signup {
            name,
            email,
            year,
            password,
            confirm,
        } => {
            let form = SignupForm {
                name,
                email,
                year,
                password,
                confirm,
            };
            app.submit_signup(&form).await;
        }
        Commands::Logout => app.logout().await,
        Commands::Go { page } => app.navigate(page).await,
        Commands::Filter { year, module } => {
            app.apply_filters(&year, &module).await;
        }
        Commands::Create {
            title,
            module,
            year,
            date,
            time,
            duration,
            max,
            preferences,
            description,
            now,
        } => {
            let form = SessionForm {
                title,
                module,
                year,
                date,
                time,
                duration,
                max_participants: max,
                preferences,
                description,
                start_now: now,
            };
            app.submit_create_session(&form).await;
        }
        Commands::Join { session_id } => {
            app.join_session(&session_id).await;
        }
        Commands::View { session_id } => {
            if let Err(e) = app.view_session(&session_id).await {
                debug!("view {} ended with {}", session_id, e);
            }
        }
        Commands::Say { msg } => {
            app.send_chat(&msg.join(" ")).await;
        }
        Commands::Code { lang, code } => {
            app.send_code(&code.join(" "), &lang).await;
        }
        Commands::Accept { session_id, user_id } => {
            app.accept_request(&session_id, &user_id).await;
        }
        Commands::Decline { session_id, user_id } => {
            app.decline_request(&session_id, &user_id).await;
        }
        Commands::Kick { session_id, user_id } => {
            app.kick_participant(&session_id, &user_id).await;
        }
        Commands::Delete { session_id } => {
            app.delete_session(&session_id).await;
        }
        Commands::User { user_id } => {
            app.open_user_modal(&user_id).await;
        }
        Commands::Rate { user_id, score } => {
            app.rate_user(&user_id, score).await;
        }
        Commands::Block { user_id } => {
            app.block_user(&user_id).await;
        }
        Commands::Unblock { user_id } => {
            app.unblock_user(&user_id).await;
        }
        Commands::Tab { tab } => app.show_profile_tab(tab).await,
        Commands::Modules { modules } => {
            app.update_modules(modules).await;
        }
        Commands::Show => {}
        Commands::Quit => return false,
    }
    true
}
