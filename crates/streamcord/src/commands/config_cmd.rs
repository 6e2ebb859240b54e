//! Config subcommand handlers.

use std::io::{self, IsTerminal, Read};

use owo_colors::OwoColorize;
use secrecy::SecretString;

use streamcord_config::{Secret, store_secret};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretArg};
use crate::commands::{config_err, effective_path, load};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&effective_path(global).display().to_string());
            Ok(())
        }

        ConfigCommand::Show => {
            let (config, path) = load(global)?;
            let rendered = config.render_redacted().map_err(config_err(&path))?;
            output::print_output(rendered.trim_end());
            Ok(())
        }

        ConfigCommand::Check => {
            let (config, path) = load(global)?;
            config.validate().map_err(config_err(&path))?;
            let runtime = config.to_runtime().map_err(config_err(&path))?;

            let mark = if output::should_color(global.color) {
                "✓".green().to_string()
            } else {
                "✓".into()
            };
            output::print_output(&format!(
                "{mark} {} is valid ({} at {}, refresh every {}s)",
                path.display(),
                runtime.upstream.kind,
                runtime.upstream.url,
                runtime.poll.interval.as_secs(),
            ));
            Ok(())
        }

        ConfigCommand::SetSecret { secret } => {
            let secret = match secret {
                SecretArg::ApiKey => Secret::ApiKey,
                SecretArg::BotToken => Secret::BotToken,
            };
            let value = read_secret(secret)?;
            store_secret(secret, &value).map_err(config_err(&effective_path(global)))?;
            eprintln!("✓ {secret} stored in system keyring");
            Ok(())
        }
    }
}

/// Prompt on a terminal, otherwise read the whole of stdin.
fn read_secret(secret: Secret) -> Result<SecretString, CliError> {
    let raw = if io::stdin().is_terminal() {
        rpassword::prompt_password(format!("{secret}: "))?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidConfig {
            message: format!("{secret} cannot be empty"),
            path: "(stdin)".into(),
        });
    }
    Ok(SecretString::from(trimmed.to_owned()))
}
