use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = jobwatch_app::cli::Args::parse();
    jobwatch_app::cli::dispatch(args)
}
