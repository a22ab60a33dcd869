//! Password gating.
//!
//! The database stores a bcrypt hash as its ASCII bytes. When a hash is
//! present every invocation must supply the matching password first.

use std::io::{BufRead, Write};

use dialoguer::{theme::ColorfulTheme, Password};
use tracing::warn;

use crate::console::Console;
use crate::error::{Error, Result};
use crate::repo::TaskRepository;

pub fn hash_password(plain: &str, cost: u32) -> Result<Vec<u8>> {
    Ok(bcrypt::hash(plain, cost)?.into_bytes())
}

/// False for a wrong password and for stored bytes that are not a bcrypt hash.
pub fn verify_password(plain: &str, stored: &[u8]) -> bool {
    std::str::from_utf8(stored)
        .ok()
        .and_then(|hash| bcrypt::verify(plain, hash).ok())
        .unwrap_or(false)
}

/// Read a password: hidden input on a terminal, a plain line otherwise.
pub fn read_password<R: BufRead, W: Write>(console: &mut Console<R, W>, label: &str, confirm: bool) -> Result<String> {
    if console.is_interactive() {
        let theme = ColorfulTheme::default();
        let mut prompt = Password::with_theme(&theme).with_prompt(label);
        if confirm {
            prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
        }
        return prompt.interact().map_err(|dialoguer::Error::IO(e)| Error::Io(e));
    }

    let password = console.prompt(&format!("{label}:"))?;
    if confirm && console.prompt("Confirm password:")? != password {
        return Err(Error::InvalidFormat("passwords do not match".into()));
    }
    Ok(password)
}

/// Require the stored password, if any. A mismatch is fatal to the invocation.
pub fn authenticate<R: BufRead, W: Write>(repo: &TaskRepository, console: &mut Console<R, W>) -> Result<()> {
    let Some(stored) = repo.password_hash() else {
        return Ok(());
    };
    let plain = read_password(console, "Enter password", false)?;
    if !verify_password(&plain, stored) {
        warn!("authentication failed");
        return Err(Error::AuthenticationFailed);
    }
    console.success("Authentication successful")
}
