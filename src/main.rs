use clap::Parser;
use pocketvault::cli::commands::{add::AddArgs, edit::EditArgs};
use pocketvault::cli::{AuthAction, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    pocketvault::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Init {
            ref username,
            restore,
        } => pocketvault::cli::commands::init::execute(&cli, username.as_deref(), restore),
        Commands::Add {
            ref name,
            ref password,
            ref metadata,
            ref notes,
            generate,
            force,
        } => pocketvault::cli::commands::add::execute(
            &cli,
            AddArgs {
                name,
                password: password.as_deref(),
                metadata,
                notes: notes.as_deref(),
                generate,
                force,
            },
        ),
        Commands::Edit {
            ref name,
            ref metadata,
            ref notes,
            password,
            generate,
        } => pocketvault::cli::commands::edit::execute(
            &cli,
            EditArgs {
                name,
                metadata: metadata.as_deref(),
                notes: notes.as_deref(),
                password,
                generate,
            },
        ),
        Commands::Get {
            ref name,
            copy,
            notes,
        } => pocketvault::cli::commands::get::execute(&cli, name, copy, notes),
        Commands::List { ref query } => {
            pocketvault::cli::commands::list::execute(&cli, query.as_deref())
        }
        Commands::Delete { ref name, force } => {
            pocketvault::cli::commands::delete::execute(&cli, name, force)
        }
        Commands::Export {
            ref mode,
            ref output,
        } => pocketvault::cli::commands::export::execute(&cli, mode, output.as_deref()),
        Commands::Import {
            ref file,
            take_incoming,
        } => pocketvault::cli::commands::import_cmd::execute(&cli, file, take_incoming),
        Commands::Generate { length, copy } => {
            pocketvault::cli::commands::generate::execute(&cli, length, copy)
        }
        Commands::Sync { ref action } => pocketvault::cli::commands::sync::execute(&cli, action),
        Commands::Auth { ref action } => match action {
            AuthAction::Status => pocketvault::cli::commands::auth::execute_status(&cli),
            AuthAction::Passcode { clear } => {
                pocketvault::cli::commands::auth::execute_passcode(&cli, *clear)
            }
            AuthAction::ShowKey => pocketvault::cli::commands::auth::execute_show_key(&cli),
            AuthAction::Keyring { delete } => {
                pocketvault::cli::commands::auth::execute_keyring(&cli, *delete)
            }
            AuthAction::Reset { force } => {
                pocketvault::cli::commands::auth::execute_reset(&cli, *force)
            }
        },
        Commands::Completions { shell } => pocketvault::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        pocketvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
