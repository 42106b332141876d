use bct::cli::{Cli, Commands};
use clap::Parser;
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => bct::cli::commands::init::run(args),
        Commands::Item(cmd) => bct::cli::commands::item::run(cmd, &global),
        Commands::Asm(cmd) => bct::cli::commands::asm::run(cmd, &global),
        Commands::Vendor(cmd) => bct::cli::commands::vendor::run(cmd, &global),
        Commands::Contract(cmd) => bct::cli::commands::contract::run(cmd, &global),
        Commands::Change(cmd) => bct::cli::commands::change::run(cmd, &global),
        Commands::Spec(cmd) => bct::cli::commands::spec::run(cmd, &global),
        Commands::Map(cmd) => bct::cli::commands::map::run(cmd, &global),
        Commands::Task(cmd) => bct::cli::commands::task::run(cmd, &global),
        Commands::Import(args) => bct::cli::commands::import::run(args, &global),
        Commands::Snapshot(cmd) => bct::cli::commands::snapshot::run(cmd, &global),
        Commands::Status(args) => bct::cli::commands::status::run(args, &global),
        Commands::Validate(args) => bct::cli::commands::validate::run(args, &global),
        Commands::Report(cmd) => bct::cli::commands::report::run(cmd, &global),
        Commands::Cache(cmd) => bct::cli::commands::cache::run(cmd, &global),
        Commands::Config(cmd) => bct::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => bct::cli::commands::completions::run(args),
    }
}
