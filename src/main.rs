use anyhow::{Context, Result};
use clap::Parser;
use ylt_batch::cli::Cli;
use ylt_batch::utils::logging;
use ylt_batch::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    let cli = Cli::parse();

    // 加载配置：环境变量，再由命令行覆盖
    let mut config = Config::from_env().context("读取环境变量配置失败")?;
    cli.apply_to(&mut config);
    config.validate().context("配置不合法")?;

    // 加载请求、启动浏览器并运行
    let report = App::initialize(config, &cli.input).await?.run().await?;
    if let Some(report) = report {
        println!("{}", report);
    }

    Ok(())
}
