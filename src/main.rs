#[tokio::main]
async fn main() {
    if let Err(e) = mamacare_lib::run().await {
        eprintln!("mamacare: {e}");
        std::process::exit(1);
    }
}
