#[tokio::main]
async fn main() {
    song_api::start_server().await;
}
