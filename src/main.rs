use charmd::app;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("CHARMD_LOG", "warn"))
        .init();

    let code = match app::run(std::env::args_os().skip(1)) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("charmd error: {err}");
            err.exit_code()
        }
    };
    std::process::exit(code);
}
