//! Scripted payment processor for driving the checkout orchestrator.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use copperleaf_core::PaymentIntentStatus;
use copperleaf_storefront::payments::{
    CardDetails, PaymentConfirmation, PaymentError, PaymentProcessor,
};

/// What the processor should do when asked to confirm.
#[derive(Debug, Clone)]
pub enum Script {
    /// Confirm successfully.
    Succeed,
    /// Reject the payment with a processor message.
    Decline { message: String, code: Option<String> },
    /// Resolve with a non-succeeded terminal status.
    EndWith(PaymentIntentStatus),
}

/// A [`PaymentProcessor`] that follows a fixed script and records every
/// client secret it was asked to confirm.
pub struct ScriptedProcessor {
    script: Script,
    confirmed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProcessor {
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self {
            script,
            confirmed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn succeeding() -> Self {
        Self::new(Script::Succeed)
    }

    #[must_use]
    pub fn declining(message: &str, code: &str) -> Self {
        Self::new(Script::Decline {
            message: message.to_string(),
            code: Some(code.to_string()),
        })
    }

    /// Client secrets this processor has been asked to confirm, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn confirmed_secrets(&self) -> Vec<String> {
        self.confirmed.lock().expect("processor lock").clone()
    }

    /// Shared handle on the confirmation log, usable after the processor
    /// has been moved into an orchestrator.
    #[must_use]
    pub fn secret_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.confirmed)
    }
}

#[async_trait]
impl PaymentProcessor for ScriptedProcessor {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        _card: &CardDetails,
    ) -> Result<PaymentConfirmation, PaymentError> {
        self.confirmed
            .lock()
            .expect("processor lock")
            .push(client_secret.to_string());

        match &self.script {
            Script::Succeed => Ok(PaymentConfirmation {
                status: PaymentIntentStatus::Succeeded,
            }),
            Script::Decline { message, code } => Err(PaymentError::Declined {
                message: message.clone(),
                code: code.clone(),
            }),
            Script::EndWith(status) => Ok(PaymentConfirmation { status: *status }),
        }
    }
}
