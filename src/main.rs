#[tokio::main]
async fn main() {
    chatbridge::server::run().await;
}
