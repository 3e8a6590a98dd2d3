#[tokio::main]
async fn main() {
    if let Err(e) = medibook_lib::run().await {
        eprintln!("medibook: {e}");
        std::process::exit(1);
    }
}
