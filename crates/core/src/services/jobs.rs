//! Job processing service for background tasks.
//!
//! A bounded in-memory channel drained by a small worker pool. The lifecycle
//! engine enqueues email deliveries here after its transaction commits; the
//! database mutation is the authoritative effect and a failed delivery is
//! logged, never propagated back to the request.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::services::email::{EmailMessage, EmailService};

/// Maximum number of concurrent job workers.
const MAX_WORKERS: usize = 4;

/// Channel buffer size for jobs.
const JOB_BUFFER_SIZE: usize = 1000;

/// Job types that can be processed.
#[derive(Debug, Clone)]
pub enum Job {
    /// Deliver a lifecycle email to a filer.
    Email { message: EmailMessage },
}

/// Job sender for enqueueing jobs.
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue a job for processing.
    pub async fn enqueue(&self, job: Job) -> Result<(), &'static str> {
        self.sender.send(job).await.map_err(|_| "Job queue is full")
    }

    /// Enqueue an email delivery job.
    pub async fn email(&self, message: EmailMessage) -> Result<(), &'static str> {
        self.enqueue(Job::Email { message }).await
    }
}

/// Job worker context containing services needed for job processing.
#[derive(Clone)]
pub struct JobWorkerContext {
    pub email_service: EmailService,
}

/// Job processing service.
pub struct JobService {
    sender: mpsc::Sender<Job>,
    receiver: Option<mpsc::Receiver<Job>>,
}

impl JobService {
    /// Create a new job service.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(JOB_BUFFER_SIZE);
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    /// Get a job sender for enqueueing jobs.
    #[must_use]
    pub fn sender(&self) -> JobSender {
        JobSender {
            sender: self.sender.clone(),
        }
    }

    /// Start the job processor with the given context.
    /// This consumes the receiver and spawns worker tasks.
    pub fn start(mut self, context: JobWorkerContext) {
        let Some(receiver) = self.receiver.take() else {
            error!("Job service already started");
            return;
        };
        let context = Arc::new(context);

        tokio::spawn(async move {
            info!("Job worker starting with {} workers", MAX_WORKERS);
            run_job_processor(receiver, context).await;
            info!("Job worker stopped");
        });
    }
}

impl Default for JobService {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the job processor.
async fn run_job_processor(mut receiver: mpsc::Receiver<Job>, context: Arc<JobWorkerContext>) {
    // Use a semaphore to limit concurrent workers
    let semaphore = Arc::new(tokio::sync::Semaphore::new(MAX_WORKERS));

    while let Some(job) = receiver.recv().await {
        let permit = semaphore.clone().acquire_owned().await;
        let ctx = context.clone();

        tokio::spawn(async move {
            let _permit = permit;
            process_job(job, &ctx).await;
        });
    }
}

/// Process a single job.
async fn process_job(job: Job, context: &JobWorkerContext) {
    match job {
        Job::Email { message } => {
            process_email(context, message).await;
        }
    }
}

/// Process an email delivery job.
async fn process_email(context: &JobWorkerContext, message: EmailMessage) {
    if !context.email_service.is_enabled() {
        debug!(to = %message.to, "Email service not configured, dropping message");
        return;
    }

    let to = message.to.clone();
    let subject = message.subject.clone();

    match context.email_service.send(message).await {
        Ok(()) => {
            debug!(to = %to, subject = %subject, "Email delivered");
        }
        Err(e) => {
            error!(to = %to, subject = %subject, error = %e, "Failed to deliver email");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_sender_enqueue() {
        let service = JobService::new();
        let sender = service.sender();

        // Start with email disabled; delivery is a logged no-op
        service.start(JobWorkerContext {
            email_service: EmailService::disabled(),
        });

        let filed_at = "2025-06-01T12:00:00+00:00".parse().unwrap();
        let result = sender
            .email(EmailMessage::report_spammed("citizen@example.com", "abcd1234", filed_at))
            .await;

        assert!(result.is_ok());
    }
}
