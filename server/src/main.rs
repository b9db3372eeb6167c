#[tokio::main]
async fn main() {
    padron::start_server().await;
}
