fn main() {
    #[cfg(feature = "cli")]
    doccodec::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("doccodec: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
