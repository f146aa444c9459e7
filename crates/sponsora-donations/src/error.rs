//! Donation business-rule errors.

use sponsora_core::error::SponsoraError;
use sponsora_core::models::donation::DonationStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DonationError {
    #[error("money donations require an amount")]
    AmountRequired,

    #[error("donation amount must be greater than zero")]
    AmountNotPositive,

    #[error("goods donations must not carry an amount")]
    AmountOnGoods,

    #[error("goods donations require at least one item")]
    ItemsRequired,

    #[error("money donations must not carry items")]
    ItemsOnMoney,

    #[error("a donation may carry at most {max} items")]
    TooManyItems { max: usize },

    #[error("donated item name must not be empty")]
    ItemNameEmpty,

    #[error("donated item name exceeds {max} characters")]
    ItemNameTooLong { max: usize },

    #[error("quantity of '{name}' must be greater than zero")]
    QuantityNotPositive { name: String },

    #[error("estimated value of '{name}' must not be negative")]
    EstimatedValueNegative { name: String },

    #[error("a registered donor is required unless the donation is anonymous")]
    DonorRequired,

    #[error("anonymous donations must not reference a donor")]
    DonorOnAnonymous,

    #[error("anonymous donations require a name and an email")]
    AnonymousContactRequired,

    #[error("anonymous email address is invalid")]
    InvalidAnonymousEmail,

    #[error("a donation cannot be recorded as {0}")]
    InvalidInitialStatus(DonationStatus),

    #[error("cannot move donation from {from} to {to}")]
    InvalidTransition {
        from: DonationStatus,
        to: DonationStatus,
    },

    #[error("only goods donations can be transferred to inventory")]
    NotGoods,

    #[error("donation is {0}; only received donations can be transferred")]
    NotReceived(DonationStatus),

    #[error("stock change must not be zero")]
    ZeroAdjustment,

    #[error("only {available} of '{item}' in stock, cannot remove {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: u64,
    },

    #[error("stock of '{item}' cannot grow by {change}")]
    StockOverflow { item: String, change: i64 },

    #[error("campaign title must not be empty")]
    CampaignTitleEmpty,

    #[error("campaign target must be greater than zero")]
    TargetNotPositive,

    #[error("campaign still has {0} donations attributed to it")]
    CampaignHasDonations(u64),
}

impl From<DonationError> for SponsoraError {
    fn from(err: DonationError) -> Self {
        match err {
            DonationError::InvalidTransition { from, to } => SponsoraError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            DonationError::NotGoods
            | DonationError::NotReceived(_)
            | DonationError::InsufficientStock { .. }
            | DonationError::CampaignHasDonations(_) => SponsoraError::InvalidState {
                message: err.to_string(),
            },
            _ => SponsoraError::Validation {
                message: err.to_string(),
            },
        }
    }
}
