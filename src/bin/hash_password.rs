//! Prints an Argon2 PHC string for an `auth_credential` row or a
//! `[[auth.fake_users]]` entry.
//!
//! $ cargo run --bin hash_password -- 'correct horse'

use clap::Parser;
use hubgate::application_impl::Argon2PasswordHasher;
use hubgate::application_port::CredentialHasher;

#[derive(Parser, Debug)]
#[command(name = "hash_password", about = "Hash a password for the credential store")]
struct Args {
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let hash = Argon2PasswordHasher.hash_password(&args.password).await?;
    println!("{}", hash);
    Ok(())
}
