//! Outgoing mail for post recommendations.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use crate::config::{SiteConfig, SmtpConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Hand `mail` to the transport. Errors mean the message was not
    /// accepted; delivery itself may still fail later and is only logged.
    fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// SMTP when a host is configured, otherwise the log.
pub fn make_mailer(cfg: &SiteConfig) -> Result<Box<dyn Mailer>> {
    match &cfg.smtp {
        Some(smtp) => Ok(Box::new(SmtpMailer::new(smtp, &cfg.mail_from)?)),
        None => Ok(Box::new(LogMailer)),
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!(target: "blogd::mail", to = %mail.to, subject = %mail.subject, "mail not delivered (no smtp host)");
        debug!(target: "blogd::mail", body = %mail.body);
        Ok(())
    }
}

/// Keeps every message in memory; clones share one outbox.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl MemoryMailer {
    pub fn outbox(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Mailer for MemoryMailer {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn send(&self, mail: OutgoingMail) -> Result<()> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner()).push(mail);
        Ok(())
    }
}

/// Plain SMTP relay. Messages are sent from a background task.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig, from: &str) -> Result<Self> {
        let from: Mailbox = from
            .parse()
            .with_context(|| format!("invalid sender address {from:?}"))?;
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(cfg.host.as_str()).port(cfg.port);
        if let Some(user) = &cfg.username {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                cfg.password.clone().unwrap_or_default(),
            ));
        }
        info!(target: "blogd::mail", host = %cfg.host, port = cfg.port, "smtp mailer configured");
        Ok(Self {
            from,
            transport: builder.build(),
        })
    }

    fn message(&self, mail: &OutgoingMail) -> Result<Message> {
        let to: Mailbox = mail
            .to
            .parse()
            .with_context(|| format!("invalid recipient {:?}", mail.to))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .context("building message")
    }
}

impl Mailer for SmtpMailer {
    fn name(&self) -> &'static str {
        "smtp"
    }

    fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = self.message(&mail)?;
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| anyhow!("no runtime to deliver mail to {}", mail.to))?;
        let transport = self.transport.clone();
        handle.spawn(async move {
            match transport.send(message).await {
                Ok(_) => info!(target: "blogd::mail", to = %mail.to, "mail sent"),
                Err(e) => warn!(target: "blogd::mail", to = %mail.to, "smtp delivery failed: {e}"),
            }
        });
        Ok(())
    }
}
