fn main() {
    if let Err(error) = symdex::cli::run_query() {
        eprintln!("qi: {error:#}");
        std::process::exit(1);
    }
}
