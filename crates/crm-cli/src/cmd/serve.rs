use anyhow::Result;
use crm_core::config::{ProcessEnv, ResponseApiConfig};
use crm_server::state::AppState;

pub fn run(port: u16) -> Result<()> {
    let config = ResponseApiConfig::from_env(&ProcessEnv)?;
    let state = AppState::from_config(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(crm_server::serve(state, port))
}
