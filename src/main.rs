use anyhow::Result;
use std::path::Path;
use tiss_submit::utils::logging;
use tiss_submit::{App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：第一个参数为 TOML 配置文件，否则只读环境变量
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_toml_file(Path::new(&path))?,
        None => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化应用
    let app = App::initialize(config).await?;

    // Ctrl-C：当前指南提交完成后停止
    let cancel = app.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到中断信号，当前指南完成后停止...");
            cancel.cancel();
        }
    });

    app.run().await?;

    Ok(())
}
