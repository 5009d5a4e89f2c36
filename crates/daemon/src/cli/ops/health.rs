use clap::Args;

use common::rpc::LIVEZ_PATH;
use strata_daemon::state::AppState;

const READYZ_PATH: &str = "/_status/readyz";

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        let configured = match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:   {}", state.strata_dir.display()));
                lines.push("  config.toml: OK".to_string());
                lines.push(match state.load_key() {
                    Ok(_) => "  key.pem:     OK".to_string(),
                    Err(e) => format!("  key.pem:     {}", e),
                });
                lines.push("  repo/:       OK".to_string());
                lines.push(format!(
                    "  p2p:         {}",
                    if state.config.p2p.enabled {
                        "enabled"
                    } else {
                        "disabled"
                    }
                ));
                lines.push(format!("  rpc_port:    {}", state.config.rpc.port));
                Some(state.config.rpc.local_url())
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
                None
            }
        };

        // 2. Check daemon liveness and readiness
        let base = match ctx.remote.clone().or(configured) {
            Some(base) => base,
            None => return Ok(lines.join("\n")),
        };
        let client = reqwest::Client::new();

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for (label, path) in [("livez: ", LIVEZ_PATH), ("readyz:", READYZ_PATH)] {
            let url = format!("{}{}", base.as_str().trim_end_matches('/'), path);
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    lines.push(format!("  {} OK", label));
                }
                Ok(resp) => {
                    lines.push(format!("  {} UNHEALTHY ({})", label, resp.status()));
                }
                Err(_) => {
                    lines.push(format!("  {} NOT REACHABLE", label));
                }
            }
        }

        Ok(lines.join("\n"))
    }
}
