mod accounts;
mod billing_events;
mod certifications;
mod credits;
mod subscriptions;
mod usage;

pub use accounts::AccountRepository;
pub use billing_events::ProcessedBillingEventRepository;
pub use certifications::CertificationGrantRepository;
pub use credits::{CreditGrantInsert, CreditGrantRepository};
pub use subscriptions::SubscriptionRepository;
pub use usage::UsageLedgerRepository;
