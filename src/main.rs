fn main() {
    if let Err(err) = poi_cloud::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
