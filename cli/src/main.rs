use clap::Parser;
use docrag_cli::{Cli, init_logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut stdout = std::io::stdout();
    run(cli, &mut stdout).await
}
