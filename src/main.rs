mod app;
mod builder;
mod config;
mod editor;
mod scenario;
mod store;

use app::ConsoleApp;
use tracing_subscriber::EnvFilter;

/// 설정을 읽고 저장소를 구성한 뒤 콘솔 시나리오 빌더를 실행하는 진입점입니다.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_app_config(std::env::args().nth(1))?;
    let store = config::build_store(&config.store).await?;

    let mut app = ConsoleApp::new(store);
    app.run().await
}
