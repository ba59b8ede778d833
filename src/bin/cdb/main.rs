use std::io::{self, Write};

use env_logger::{Builder, Env};

fn init_logger() {
    // Уровень из RUST_LOG, по умолчанию только предупреждения:
    // stdout занят выводом команд.
    // Пример: RUST_LOG=debug cdb data.cdb get key
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = ConstDB::cli::run(&mut out, std::env::args_os());
    let _ = out.flush();
    std::process::exit(code);
}
