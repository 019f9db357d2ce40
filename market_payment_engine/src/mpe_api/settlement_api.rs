use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{OrderStatusType, Payment, PaymentId, PaymentStatus, SessionMode},
    events::{EventProducers, OrderCancelledEvent, OrderPaidEvent},
    payment_objects::SettlementOutcome,
    state_machine::SettlementSignal,
    traits::{MarketplaceDatabase, MarketplaceError, SettlementResult},
};

/// `SettlementApi` applies payment provider notifications to payments and their orders.
///
/// Settlement is idempotent and monotonic. Replaying a notification changes nothing, and once a payment has
/// succeeded or failed no later notification can change it.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
    mode: SessionMode,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({})", self.mode)
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers, mode: SessionMode) -> Self {
        Self { db, producers, mode }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }
}

impl<B> SettlementApi<B>
where B: MarketplaceDatabase
{
    /// Applies a provider notification for the transaction `txid` with the provider's raw transaction status.
    ///
    /// Unknown transactions and unrecognised statuses are logged and reported in the outcome, never as errors, so
    /// that the provider does not keep redelivering them. Errors are only returned for infrastructure failures.
    pub async fn settle(&self, txid: &str, raw_status: &str) -> Result<SettlementOutcome, MarketplaceError> {
        let signal = match raw_status.parse::<SettlementSignal>() {
            Ok(signal) => signal,
            Err(e) => {
                warn!("🔄️💰️ Notification for {txid} ignored. {e}");
                return Ok(SettlementOutcome::UnrecognisedStatus { status: raw_status.to_string() });
            },
        };
        let Some(payment) = self.db.fetch_payment_by_txid(txid).await? else {
            warn!("🔄️💰️ Received a '{signal}' notification for unknown transaction {txid}. It has been dropped.");
            return Ok(SettlementOutcome::UnknownTransaction { txid: txid.to_string() });
        };
        let requested = signal.payment_status();
        match self.db.settle_payment(payment.id, requested).await {
            Ok(result) => {
                self.call_settlement_hooks(&result);
                let SettlementResult { payment, order, payment_changed, .. } = result;
                if payment_changed {
                    info!("🔄️💰️ Payment {txid} is now {}. Order #{} is {}", payment.status, order.id, order.status);
                    Ok(SettlementOutcome::Applied { payment, order })
                } else {
                    debug!("🔄️💰️ Duplicate '{signal}' notification for {txid}");
                    Ok(SettlementOutcome::Duplicate { payment, order })
                }
            },
            Err(MarketplaceError::PaymentTransitionForbidden { from, to }) => {
                warn!("🔄️💰️ Payment {txid} is {from}. The '{signal}' notification asking for {to} has been rejected.");
                Ok(SettlementOutcome::Rejected { payment, requested: to })
            },
            Err(e) => Err(e),
        }
    }

    /// Marks a mock payment as successful, exactly as a `settlement` notification would.
    ///
    /// In mock mode any payment can be confirmed. In live mode only payments whose session was generated locally,
    /// because the gateway was unreachable and fallback is enabled, can be confirmed. The gateway never reports on
    /// those.
    pub async fn confirm_mock(&self, payment_id: PaymentId) -> Result<Payment, MarketplaceError> {
        if self.mode != SessionMode::Mock {
            let payment = self
                .db
                .fetch_payment(payment_id)
                .await?
                .ok_or_else(|| MarketplaceError::PaymentNotFound(payment_id.to_string()))?;
            if payment.session_mode != Some(SessionMode::Mock) {
                warn!("🔄️💰️ Refusing to confirm payment #{payment_id}. It does not have a mock session.");
                return Err(MarketplaceError::MockModeDisabled);
            }
            debug!("🔄️💰️ Payment #{payment_id} has a fallback mock session and may be confirmed in live mode");
        }
        let result = self.db.settle_payment(payment_id, PaymentStatus::Success).await?;
        self.call_settlement_hooks(&result);
        info!("🔄️💰️ Mock payment #{payment_id} confirmed. Order #{} is {}", result.order.id, result.order.status);
        Ok(result.payment)
    }

    fn call_settlement_hooks(&self, result: &SettlementResult) {
        if !result.order_changed {
            return;
        }
        match result.order.status {
            OrderStatusType::Paid => {
                for emitter in &self.producers.order_paid_producer {
                    debug!("🔄️💰️ Notifying order paid hook subscribers");
                    emitter.try_publish_event(OrderPaidEvent::new(result.order.clone(), result.payment.clone()));
                }
            },
            OrderStatusType::Cancelled => {
                for emitter in &self.producers.order_cancelled_producer {
                    debug!("🔄️💰️ Notifying order cancelled hook subscribers");
                    emitter.try_publish_event(OrderCancelledEvent::new(result.order.clone(), result.payment.clone()));
                }
            },
            _ => {},
        }
    }
}
