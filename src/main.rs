use clap::Parser;
use tracing::info;

use mockctl::cli::{self, Cli, Command};
use mockctl::console::Console;
use mockctl::editor::TextBuffer;
use mockctl::guard::SessionGuard;
use mockctl::shell::Shell;
use mockctl::{Config, FileBrowser, HttpTransport, TunnelController};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli.overrides()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mockctl: configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing; stdout belongs to command output
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let transport = match HttpTransport::new(
        &config.server.url,
        config.server.password.clone(),
        config.connect_timeout(),
    ) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("mockctl: {e}");
            std::process::exit(1);
        }
    };
    info!("mockctl v{} -> {}", env!("CARGO_PKG_VERSION"), transport.base_url());

    let result = match cli.command.unwrap_or(Command::Shell) {
        Command::File(cmd) => cli::run_file(transport, cmd).await,
        Command::Tunnel(cmd) => cli::run_tunnel(transport, cmd).await,
        Command::Logs => cli::run_logs(transport, &config.logs.endpoint).await,
        Command::Shell => {
            let mut console = Console::spawn();
            let files = FileBrowser::new(
                transport.clone(),
                SessionGuard::new(console.clone()),
                TextBuffer::new(),
            );
            let tunnels = TunnelController::new(transport);
            let mut shell = Shell::new(files, tunnels, config.editor_command());
            if let Err(e) = shell.run(&mut console, &mut std::io::stdout()).await {
                eprintln!("mockctl: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("mockctl: {e}");
        std::process::exit(1);
    }
}
