use anyhow::{Context, Result};
use level_placement::utils::logging::init_subscriber;
use level_placement::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    init_subscriber(config.verbose_logging);

    // 初始化并运行应用
    let mut app = App::initialize(config).await.context("初始化应用失败")?;
    app.run().await.context("测评运行失败")?;

    Ok(())
}
