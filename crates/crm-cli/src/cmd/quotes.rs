use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use crm_core::cadence::{parse_created_at, CadenceFilter};
use crm_core::config::{CadenceConfig, ProcessEnv, QuotesConfig};
use crm_core::jobs::{run_quotes, QuotesJob};
use crm_core::mail::HttpMailTransport;
use crm_core::object_store::LocalObjectStore;
use crm_core::reader::SalesRepTable;
use crm_core::store::RedbStore;
use crm_core::template::Template;

use super::accept_event;
use crate::output::print_json;

pub fn run(event: &str, now: Option<&str>) -> Result<()> {
    let config = QuotesConfig::from_env(&ProcessEnv)?;
    let now = match now {
        Some(raw) => parse_now(raw)?,
        None => Local::now().naive_local(),
    };
    let Some(event) = accept_event(event)? else {
        return Ok(());
    };

    let template = Template::load(&config.template_path)?;
    let sales_reps = match &config.sales_reps_path {
        Some(path) => SalesRepTable::load(path)?,
        None => SalesRepTable::default(),
    };
    let cadence = CadenceFilter::from_config(&CadenceConfig::load_or_default(
        config.cadence_path.as_deref(),
    )?);
    let transport = HttpMailTransport::new(&config.mail.endpoint, config.mail.api_key.clone())?;
    let store = RedbStore::open(&config.store_path)?;
    let objects = LocalObjectStore::new(&config.object_root);

    let job = QuotesJob {
        objects: &objects,
        store: &store,
        transport: &transport,
        template: &template,
        sales_reps: &sales_reps,
        cadence: &cadence,
        sender: &config.mail.sender,
        quotes_table: &config.quotes_table,
        transactions_table: &config.transactions_table,
    };

    let response = run_quotes(&job, &event, now);
    print_json(&response)
}

fn parse_now(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    parse_created_at(raw).ok_or_else(|| anyhow!("invalid --now value '{raw}'"))
}
