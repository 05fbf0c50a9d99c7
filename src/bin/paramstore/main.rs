use anyhow::Result;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_run;
mod cmd_show;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт info.
    // Пример: RUST_LOG=debug ./paramstore run ...
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        // Логируем ошибку и выходим с кодом 1.
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse_args();
    match cli.cmd {
        cli::Cmd::Run {
            paths,
            addr,
            direct_write,
            tolerate_corrupt_save,
        } => cmd_run::exec(paths, addr, direct_write, tolerate_corrupt_save),

        cli::Cmd::Show { paths, json } => cmd_show::exec(paths, json),
    }
}
