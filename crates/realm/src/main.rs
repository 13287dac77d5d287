//! `realm` binary entry point. Everything happens in [`lib_realm::init`].

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lib_realm::init().await
}
