use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::{AuthError, AuthService, PublicUser, User};

#[derive(Parser, Debug)]
#[command(name = "authapp", version, about = "Email/password accounts with a persisted session")]
pub struct Cli {
    /// Directory holding the user list and session record
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Create an account and start a session for it
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Must equal --password when given
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Start a session for an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
}

/// Runs one command. Returns `false` when the command was refused.
pub async fn run(
    command: Command,
    auth: &AuthService,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> anyhow::Result<bool> {
    match command {
        Command::Signup {
            name,
            email,
            password,
            confirm_password,
        } => {
            if confirm_password.is_some_and(|c| c != password) {
                writeln!(err, "Passwords do not match")?;
                return Ok(false);
            }
            report(auth.signup(&name, &email, &password).await, out, err)
        }
        Command::Login { email, password } => {
            report(auth.login(&email, &password).await, out, err)
        }
        Command::Logout => {
            auth.logout().await;
            writeln!(out, "Logged out")?;
            Ok(true)
        }
        Command::Whoami => {
            match auth.current_user().await {
                Some(user) => print_user(&user, out)?,
                None => writeln!(out, "Not logged in")?,
            }
            Ok(true)
        }
    }
}

fn report(
    outcome: Result<User, AuthError>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> anyhow::Result<bool> {
    match outcome {
        Ok(user) => {
            print_user(&user, out)?;
            Ok(true)
        }
        Err(e) => {
            writeln!(err, "{}", e)?;
            Ok(false)
        }
    }
}

fn print_user(user: &User, out: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&PublicUser::from(user))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    async fn exec(state: &AppState, args: &[&str]) -> (bool, String, String) {
        let cli = Cli::try_parse_from(std::iter::once("authapp").chain(args.iter().copied()))
            .expect("args parse");
        let mut out = Vec::new();
        let mut err = Vec::new();
        let ok = run(cli.command, &state.auth, &mut out, &mut err)
            .await
            .expect("run");
        (
            ok,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn parses_global_data_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["authapp", "whoami", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.command, Command::Whoami);
    }

    #[test]
    fn signup_requires_all_fields() {
        assert!(Cli::try_parse_from(["authapp", "signup", "--email", "a@b.co"]).is_err());
    }

    #[tokio::test]
    async fn signup_then_whoami_then_logout() {
        let state = AppState::fake().await;

        let (ok, out, _) = exec(
            &state,
            &["signup", "--name", "Ann", "--email", "Ann@Example.com", "--password", "secret1"],
        )
        .await;
        assert!(ok);
        let printed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(printed["email"], "Ann@Example.com");
        assert!(printed.get("password_hash").is_none());

        let (ok, out, _) = exec(&state, &["whoami"]).await;
        assert!(ok);
        assert!(out.contains("Ann@Example.com"));

        let (ok, out, _) = exec(&state, &["logout"]).await;
        assert!(ok);
        assert_eq!(out.trim(), "Logged out");

        let (_, out, _) = exec(&state, &["whoami"]).await;
        assert_eq!(out.trim(), "Not logged in");
    }

    #[tokio::test]
    async fn auth_errors_go_to_stderr() {
        let state = AppState::fake().await;
        let (ok, out, err) = exec(
            &state,
            &["login", "--email", "nobody@example.com", "--password", "x"],
        )
        .await;
        assert!(!ok);
        assert!(out.is_empty());
        assert_eq!(err.trim(), "No account found with this email");
    }

    #[tokio::test]
    async fn mismatched_confirmation_never_reaches_the_service() {
        let state = AppState::fake().await;
        let (ok, _, err) = exec(
            &state,
            &[
                "signup",
                "--name",
                "Ann",
                "--email",
                "ann@example.com",
                "--password",
                "secret1",
                "--confirm-password",
                "secret2",
            ],
        )
        .await;
        assert!(!ok);
        assert_eq!(err.trim(), "Passwords do not match");
        assert!(state.auth.store().load_users().await.is_empty());
    }
}
