fn main() {
    std::process::exit(fluidpost_cli::run_from_env());
}
