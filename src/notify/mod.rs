//! Fire-and-forget notifications.
//!
//! Callers hand a `Message` to a `Notifier` and move on. The `Outbox`
//! delivers on a background task through a `Transport`; failures are
//! logged and never reach the operation that produced the message.

use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Notifier: Send + Sync {
    /// Queue `message` for delivery. Never blocks on the transport.
    fn send(&self, message: Message);
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery to {to} failed: {reason}")]
    Delivery { to: String, reason: String },
}

/// Whatever actually moves a message to its recipient.
pub trait Transport: Send + Sync + 'static {
    fn deliver(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of a mail server.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn deliver(&self, message: &Message) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            bytes = message.body.len(),
            "message delivered"
        );
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Outbox: background delivery
// ═══════════════════════════════════════════════════════════

pub struct Outbox {
    tx: mpsc::UnboundedSender<Message>,
    worker: JoinHandle<()>,
}

impl Outbox {
    /// Start the delivery task. Must be called inside a tokio runtime.
    pub fn spawn<T: Transport>(transport: T) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let worker = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = transport.deliver(&message) {
                    tracing::warn!(error = %e, subject = %message.subject, "notification dropped");
                }
            }
            tracing::debug!("outbox drained");
        });
        Self { tx, worker }
    }

    /// Stop accepting messages and wait for queued ones to be delivered.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::error!("outbox worker failed: {e}");
        }
    }
}

impl Notifier for Outbox {
    fn send(&self, message: Message) {
        if self.tx.send(message).is_err() {
            tracing::warn!("outbox closed, notification dropped");
        }
    }
}

/// Keeps every message in memory. For tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<Message>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: Message) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message),
            Err(_) => tracing::warn!("recording notifier lock poisoned"),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Message templates
// ═══════════════════════════════════════════════════════════

/// Tell the patient their appointment moved to a new status.
pub fn status_change_message(
    patient_email: &str,
    patient_name: &str,
    doctor_name: &str,
    appt: &Appointment,
) -> Message {
    let headline = match appt.status {
        AppointmentStatus::Pending => "is pending review",
        AppointmentStatus::Confirmed => "has been confirmed",
        AppointmentStatus::Cancelled => "has been cancelled",
        AppointmentStatus::Completed => "has been marked as completed",
    };
    Message {
        to: patient_email.to_string(),
        subject: format!("Your appointment {headline}"),
        body: format!(
            "Dear {patient_name},\n\n\
             Your appointment with Dr. {doctor_name} on {} at {} {headline}.\n\n\
             Status: {}\n",
            appt.date, appt.time, appt.status
        ),
    }
}
