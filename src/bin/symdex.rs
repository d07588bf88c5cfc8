fn main() {
    if let Err(error) = symdex::cli::run_indexer() {
        eprintln!("symdex: {error:#}");
        std::process::exit(1);
    }
}
