//! Follow-up email dispatch with an audit trail.
//!
//! Each qualifying quote gets one rendered email. Sends are attempted in
//! order and never retried; a failed send is logged and leaves no audit
//! record. Successful sends are written to the audit table as one batch
//! after the loop. An audit write that fails after its email went out is
//! logged at error level with the transaction and quote ids and is not
//! compensated.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::mail::{MailTransport, OutboundEmail};
use crate::model::{DBWriteResult, EmailTransaction, Quote};
use crate::store::{batch_write, ItemStore};
use crate::template::{Template, TemplateVars};
use crate::types::{quote_status, EmailStatus};

pub const SUBJECT_PREFIX: &str = "Detalles de tu cotización";
pub const TEXT_BODY: &str = "Los detalles de tu cotización están adjuntos.";

pub fn subject_for(quote_id: &str) -> String {
    format!("{SUBJECT_PREFIX} {quote_id}")
}

/// Where audit transactions are written.
pub struct AuditSink<'a> {
    pub store: &'a dyn ItemStore,
    pub table: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub qualifying: usize,
    pub sent: usize,
    pub failed: usize,
    pub audit: DBWriteResult,
}

/// Values available to the email template for one quote.
pub fn template_vars(quote: &Quote, transaction_id: &str) -> TemplateVars {
    [
        ("quote_id", quote.id.clone()),
        ("contact_id", quote.contact.id.clone()),
        ("contact_name", quote.contact.name.clone()),
        ("contact_email", quote.contact.email.clone()),
        ("amount", quote.amount.to_string()),
        ("status", quote_status::to_display_string(quote.status).to_string()),
        ("created_at", quote.created_at.clone()),
        ("transaction_id", transaction_id.to_string()),
        ("sales_rep_name", quote.sales_rep.name.clone()),
        ("sales_rep_email", quote.sales_rep.email.clone()),
        ("sales_rep_phone", quote.sales_rep.phone.clone()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

pub fn dispatch(
    quotes: &[Quote],
    template: &Template,
    sender: &str,
    transport: &dyn MailTransport,
    audit: &AuditSink<'_>,
) -> DispatchReport {
    let mut report = DispatchReport {
        qualifying: quotes.len(),
        ..DispatchReport::default()
    };
    let mut transactions = Vec::with_capacity(quotes.len());

    for quote in quotes {
        let transaction_id = Uuid::new_v4().to_string();
        let email = OutboundEmail {
            from: sender.to_string(),
            to: quote.contact.email.clone(),
            subject: subject_for(&quote.id),
            text: TEXT_BODY.to_string(),
            html: template.render(&template_vars(quote, &transaction_id)),
        };

        match transport.send(&email) {
            Ok(message_id) => {
                tracing::info!(quote = %quote.id, to = %email.to, %message_id, "email sent");
                report.sent += 1;
                transactions.push(EmailTransaction {
                    id: transaction_id,
                    quote_id: quote.id.clone(),
                    email_address: email.to,
                    sent_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    status: EmailStatus::Sent,
                });
            }
            Err(e) => {
                tracing::error!(quote = %quote.id, to = %email.to, "failed to send email: {e}");
                report.failed += 1;
            }
        }
    }

    if transactions.is_empty() {
        return report;
    }

    report.audit = batch_write(audit.store, audit.table, &transactions);
    for failed in &report.audit.failed_ids {
        let quote_id = transactions
            .iter()
            .find(|t| &t.id == failed)
            .map(|t| t.quote_id.as_str())
            .unwrap_or_default();
        tracing::error!(
            transaction = %failed,
            quote = quote_id,
            "email was sent but its audit record was not stored"
        );
    }
    report
}
