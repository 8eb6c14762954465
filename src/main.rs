mod cli;
mod config;
mod config_file;
mod menu;
mod util;

pub(crate) use cli::*;
pub(crate) use config::*;
pub(crate) use config_file::*;
pub(crate) use util::*;

use std::fs;
use std::io;
use std::process::ExitCode;

use capsule_core::{CapsuleError, CapsuleKey, CreateReport, CreateRequest, OpenOutcome, list_capsules};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct CreateOutput<'a> {
    #[serde(flatten)]
    report: &'a CreateReport,
    blake3: String,
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn exit_code_for(err: &(dyn std::error::Error + 'static)) -> u8 {
    match err.downcast_ref::<CapsuleError>() {
        Some(e) if e.is_validation() => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(exit_code_for(err.as_ref()))
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_cli(&cli)?;
    tracing::debug!(
        home = %settings.home.display(),
        key_file = %settings.key_file.display(),
        passphrase = settings.passphrase_env.is_some(),
        "resolved settings"
    );

    match cli.command {
        Command::Keygen { out, force } => {
            let path = out.clone().unwrap_or_else(|| settings.key_file.clone());
            if path.exists() {
                if !force {
                    return Err(format!(
                        "refusing to overwrite existing key file {} (pass --force; capsules sealed with it become unreadable)",
                        path.display()
                    )
                    .into());
                }
                tracing::warn!(key_file = %path.display(), "replacing existing key file");
                fs::remove_file(&path)?;
            }
            let key = CapsuleKey::generate();
            key.save(&path)?;

            if out.is_some() {
                // remember a custom location for later commands
                let config_path = config_file_path(&settings.home);
                let mut file = load_file_config(&config_path)?;
                file.key_file = Some(fs::canonicalize(&path)?);
                save_file_config(&config_path, &file)?;
                tracing::info!(config = %config_path.display(), "recorded key file location");
            }
            println!("Wrote {} (fingerprint {})", path.display(), key.fingerprint());
            Ok(())
        }

        Command::Create {
            title,
            message,
            message_file,
            unlock,
            mut files,
            file_list,
            strict,
            json,
        } => {
            let content = match message_file {
                Some(path) => fs::read_to_string(&path)
                    .map_err(|e| format!("cannot read message file {}: {e}", path.display()))?,
                None => message.unwrap_or_default(),
            };
            if let Some(list) = file_list {
                files.extend(split_file_list(&list));
            }

            let capsules = settings
                .open_store(KeyAccess::CreateIfMissing)?
                .strict_attachments(strict || settings.strict_attachments);
            let report = capsules.create(&CreateRequest {
                title,
                content,
                unlock_date: unlock,
                files,
            })?;

            if json {
                let blake3 = blake3_file_hex(&report.path)?;
                print_json(&CreateOutput {
                    report: &report,
                    blake3,
                })?;
            } else {
                println!("{}", describe_report(&report));
            }
            Ok(())
        }

        Command::Open { capsule, json } => {
            let capsules = settings.open_store(KeyAccess::MustExist)?;
            let path = resolve_capsule_path(capsules.root(), capsule);
            let outcome = capsules.open(&path)?;
            if json {
                print_json(&outcome)?;
            } else {
                println!("{}", describe_outcome(&outcome));
                if let OpenOutcome::Opened { files, .. } = &outcome {
                    for name in files {
                        println!("  {name}");
                    }
                }
            }
            Ok(())
        }

        Command::Inspect { capsule, json } => {
            let capsules = settings.open_store(KeyAccess::MustExist)?;
            let path = resolve_capsule_path(capsules.root(), capsule);
            match capsules.inspect(&path)? {
                Some(summary) if json => print_json(&summary)?,
                Some(summary) => println!("{}", describe_summary(&summary)),
                None if json => print_json(&OpenOutcome::NotFound { path })?,
                None => println!("Capsule not found!"),
            }
            Ok(())
        }

        Command::List { json } => {
            // listing needs no key
            let paths = if settings.home.is_dir() {
                list_capsules(&settings.home)?
            } else {
                Vec::new()
            };
            if json {
                print_json(&paths)?;
            } else if paths.is_empty() {
                println!("No capsules in {}", settings.home.display());
            } else {
                for path in &paths {
                    println!("{}", path.display());
                }
            }
            Ok(())
        }

        Command::Menu => {
            let capsules = settings.open_store(KeyAccess::CreateIfMissing)?;
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut out = io::stdout();
            menu::run_menu(&capsules, capsule_core::today, &mut input, &mut out)?;
            Ok(())
        }
    }
}
