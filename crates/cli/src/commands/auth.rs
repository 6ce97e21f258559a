//! Account and session commands.

use clap::Subcommand;
use secrecy::SecretString;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create a new account
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Confirm the one-time code sent after signup
    Verify {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// One-time code
        #[arg(short, long)]
        code: String,
    },
    /// Request a fresh one-time code
    ResendCode {
        /// Email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign in and persist the session
    Signin {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and discard the persisted session
    Signout,
    /// Show the signed-in identity
    Whoami,
}

pub async fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let shop = super::storefront().await?;

    match action {
        AuthAction::Signup {
            name,
            email,
            phone,
            password,
        } => {
            let outcome = shop
                .sign_up(
                    &name,
                    &email,
                    phone.as_deref(),
                    &SecretString::from(password),
                )
                .await?;
            println!("{}", outcome.message);
        }
        AuthAction::Verify { email, code } => {
            let outcome = shop.verify_otp(&email, &code).await?;
            println!("{}", outcome.message);
        }
        AuthAction::ResendCode { email } => {
            let outcome = shop.resend_otp(&email).await?;
            println!("{}", outcome.message);
        }
        AuthAction::Signin { email, password } => {
            let profile = shop.sign_in(&email, &SecretString::from(password)).await?;
            println!("Signed in as {} <{}>", profile.name, profile.email);
        }
        AuthAction::Signout => {
            shop.sign_out()?;
            println!("Signed out");
        }
        AuthAction::Whoami => match shop.session().current_user() {
            Some(profile) => {
                println!("{} <{}>", profile.name, profile.email);
                println!("role: {}", profile.role);
                println!("verified: {}", profile.is_verified);
            }
            None => println!("Not signed in"),
        },
    }
    Ok(())
}
