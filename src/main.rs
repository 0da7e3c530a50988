fn main() {
    #[cfg(feature = "cli")]
    hufflock::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("hufflock: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
