//! Interactive collection of identity fields and passwords.

use std::io;

use inquire::error::InquireResult;
use inquire::validator::ValueRequiredValidator;
use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use sshman_core::Identity;

use super::cli::AddArgs;

/// Prompt for a value unless it was already given on the command line.
fn text_when_none(label: &str, value: Option<String>, required: bool) -> InquireResult<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    let mut prompt = Text::new(label);
    if required {
        prompt = prompt.with_validator(ValueRequiredValidator::default());
    }
    prompt.prompt()
}

fn port_when_none(value: Option<u16>) -> InquireResult<u16> {
    if let Some(value) = value {
        return Ok(value);
    }
    CustomType::<u16>::new("Port")
        .with_default(0)
        .with_help_message("0 uses the default ssh port")
        .with_error_message("Please type a port between 0 and 65535")
        .prompt()
}

/// Builds an [`Identity`] from `args`, asking for whatever is missing.
pub fn collect_identity(args: AddArgs) -> InquireResult<Identity> {
    let name = text_when_none("Identity Name", args.name, true)?;
    let username = text_when_none("Username", args.username, false)?;
    let address = text_when_none("Address", args.address, true)?;
    let port = port_when_none(args.port)?;
    let description = text_when_none("Description", args.description, false)?;
    Ok(Identity::new(name, username, address, port, description))
}

/// Masked password prompt for transports that authenticate in-process.
pub fn password(identity: &Identity) -> io::Result<String> {
    Password::new(&format!("Password for {}", identity.destination()))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .map_err(io::Error::other)
}
