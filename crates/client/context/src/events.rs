//! Notifications published by the marketplace context.

use serde::{Deserialize, Serialize};

use client_blockchain_core::{ConfirmedTransaction, SaleKind};

/// Event published to context subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextEvent {
    /// Session account changed. `None` after a disconnect.
    AccountChanged { account: Option<String> },

    /// Content was added to the storage gateway.
    ContentUploaded { url: String },

    /// A sale transaction was confirmed on-chain.
    SaleConfirmed {
        kind: SaleKind,
        token_uri: String,
        transaction: ConfirmedTransaction,
    },
}
