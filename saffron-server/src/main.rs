use saffron_server::{Config, Server, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境 (dotenv + 日志)
    dotenv::dotenv().ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(std::env::var("LOG_LEVEL").ok().as_deref(), log_dir.as_deref());

    tracing::info!("Saffron server starting...");

    // 2. 配置
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // 3. 初始化状态 (数据库、存储、服务)
    let state = ServerState::initialize(&config)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    // 4. 启动 HTTP 服务
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(anyhow::anyhow!("{e}"));
    }

    Ok(())
}
