//! Quote ingestion with follow-up email dispatch.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use super::JobResponse;
use crate::assembler::assemble_all;
use crate::cadence::CadenceFilter;
use crate::dispatch::{dispatch, AuditSink, DispatchReport};
use crate::event::parse_storage_event;
use crate::mail::MailTransport;
use crate::model::DBWriteResult;
use crate::object_store::ObjectStore;
use crate::reader::{load_quote_tables, SalesRepTable};
use crate::store::{batch_write, ItemStore};
use crate::template::Template;

/// Collaborators and settings for one quotes invocation.
pub struct QuotesJob<'a> {
    pub objects: &'a dyn ObjectStore,
    pub store: &'a dyn ItemStore,
    pub transport: &'a dyn MailTransport,
    pub template: &'a Template,
    pub sales_reps: &'a SalesRepTable,
    pub cadence: &'a CadenceFilter,
    pub sender: &'a str,
    pub quotes_table: &'a str,
    pub transactions_table: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuotesSummary {
    pub total: usize,
    #[serde(flatten)]
    pub write: DBWriteResult,
    pub emails: DispatchReport,
}

/// Process the quote archive named by `event`. `now` anchors the cadence
/// window.
pub fn run_quotes(job: &QuotesJob<'_>, event: &Value, now: NaiveDateTime) -> JobResponse {
    let location = match parse_storage_event(event) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("rejecting event: {e}");
            return JobResponse::invalid_event();
        }
    };
    tracing::info!(bucket = %location.bucket, key = %location.key, "processing quote archive");

    let tables = match job
        .objects
        .download(&location)
        .and_then(|scratch| load_quote_tables(&scratch))
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(key = %location.key, "failed to read quote archive: {e}");
            return JobResponse::failure(e);
        }
    };

    let quotes = assemble_all(&tables, job.sales_reps);
    let write = batch_write(job.store, job.quotes_table, &quotes);

    let due = job.cadence.filter(&quotes, now);
    let emails = dispatch(
        &due,
        job.template,
        job.sender,
        job.transport,
        &AuditSink {
            store: job.store,
            table: job.transactions_table,
        },
    );

    JobResponse::ok(QuotesSummary {
        total: quotes.len(),
        write,
        emails,
    })
}
