use fintrack_core::cli::run_cli;

fn main() {
    fintrack_core::init();
    if let Err(err) = run_cli() {
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}
