//! `scmdl tools` – fetch vgmstream-cli.

use anyhow::{Context, Result};
use scmdl_core::config::{self, ScmConfig};
use scmdl_core::http::HttpSession;
use scmdl_core::tools;
use std::path::Path;

pub async fn run_tools(cfg: &ScmConfig, work_dir: &Path) -> Result<()> {
    println!("Fetching latest vgmstream-cli ({})...", cfg.tools.platform);

    let installed = tokio::task::spawn_blocking({
        let cfg = cfg.clone();
        let work_dir = work_dir.to_path_buf();
        move || -> Result<_> {
            let mut session = HttpSession::new(&cfg.site.user_agent, cfg.site.timeout())?;
            tools::install_vgmstream(&mut session, &cfg.tools, &work_dir)
        }
    })
    .await
    .context("tools task join")??;

    println!("vgmstream-cli extracted to: {}", installed.display());

    let configured = std::fs::canonicalize(&cfg.paths.vgmstream).ok();
    if configured.as_deref() != Some(installed.as_path()) {
        let cfg_path = config::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "config.toml".to_string());
        println!(
            "Set `vgmstream = \"{}\"` under [paths] in {} to use it from anywhere.",
            installed.display(),
            cfg_path
        );
    }
    Ok(())
}
