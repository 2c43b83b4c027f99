use anyhow::Result;
use quiz_admin::utils::logging;
use quiz_admin::{App, Config};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    // 配置文件路径（可选），环境变量优先级更高
    let config_path = std::env::var_os("QUIZ_ADMIN_CONFIG").map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    logging::init(config.verbose_logging);

    let app = App::initialize(config).await?;
    app.run().await?;

    Ok(())
}
