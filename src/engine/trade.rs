use thiserror::Error;
use tracing::debug;

use crate::models::{Account, Holding, LedgerEntry, TradeAction, TradeRequest};

/// Upper bound on the share count of a single order. Orders beyond it are
/// rejected outright rather than clamped down.
pub const MAX_TRADE_QUANTITY: u32 = 999_999;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TradeError {
    #[error("insufficient funds: order costs {required:.2} but only {available:.2} is available")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient shares of {symbol}: tried to sell {requested} but only {held} held")]
    InsufficientShares {
        symbol: String,
        requested: u32,
        held: u32,
    },

    #[error("invalid quantity {quantity}: must be between 1 and {MAX_TRADE_QUANTITY}")]
    InvalidQuantity { quantity: u32 },

    #[error("invalid price {price}: must be a positive amount")]
    InvalidPrice { price: f64 },
}

/// Outcome of a successful execution.
#[derive(Debug, Clone)]
pub struct Execution {
    pub entry: LedgerEntry,
    /// Proceeds minus average cost for the shares sold. `None` on buys.
    pub realized_gain_loss: Option<f64>,
}

/// Checks an order against the account without changing anything.
///
/// Rules, in the order they are applied:
/// - quantity must be in `1..=MAX_TRADE_QUANTITY`
/// - price must be a positive, finite amount
/// - a buy must keep the combined position within `u32::MAX` shares
/// - a buy must cost no more than the available cash (an order that costs
///   exactly the cash balance is accepted)
/// - a sell must not exceed the shares currently held
pub fn validate(request: &TradeRequest, account: &Account) -> Result<(), TradeError> {
    if request.quantity == 0 || request.quantity > MAX_TRADE_QUANTITY {
        return Err(TradeError::InvalidQuantity {
            quantity: request.quantity,
        });
    }
    if !request.price_per_share.is_finite() || request.price_per_share <= 0.0 {
        return Err(TradeError::InvalidPrice {
            price: request.price_per_share,
        });
    }

    let gross = request.quantity as f64 * request.price_per_share;
    match request.action {
        TradeAction::Buy => {
            // the share counter is a u32; the combined position must still fit
            if account
                .shares_held(&request.symbol)
                .checked_add(request.quantity)
                .is_none()
            {
                return Err(TradeError::InvalidQuantity {
                    quantity: request.quantity,
                });
            }
            if gross > account.cash {
                return Err(TradeError::InsufficientFunds {
                    required: gross,
                    available: account.cash,
                });
            }
        }
        TradeAction::Sell => {
            let held = account.shares_held(&request.symbol);
            if request.quantity > held {
                return Err(TradeError::InsufficientShares {
                    symbol: request.symbol.clone(),
                    requested: request.quantity,
                    held,
                });
            }
        }
    }
    Ok(())
}

/// Validates and applies an order to the account, returning the ledger entry
/// that records it.
///
/// Validation runs to completion before the first mutation, so a rejected
/// order leaves the account untouched. Buys fold the new shares into the
/// weighted-average cost of any existing position; sells realize gain or loss
/// against that average and drop the position once it reaches zero shares.
///
/// `company_name` is only used when a buy opens a brand-new position; an
/// existing position keeps the name it was opened with.
pub fn execute(
    request: &TradeRequest,
    company_name: &str,
    account: &mut Account,
) -> Result<Execution, TradeError> {
    validate(request, account)?;

    let gross = request.quantity as f64 * request.price_per_share;
    let (entry_name, realized) = match request.action {
        TradeAction::Buy => {
            let name = match account
                .holdings
                .iter_mut()
                .find(|h| h.symbol == request.symbol)
            {
                Some(held) => {
                    // validate() already caps the total; never wrap or panic here
                    let new_shares = match held.shares.checked_add(request.quantity) {
                        Some(total) => total,
                        None => {
                            return Err(TradeError::InvalidQuantity {
                                quantity: request.quantity,
                            })
                        }
                    };
                    held.avg_price =
                        (held.shares as f64 * held.avg_price + gross) / new_shares as f64;
                    held.shares = new_shares;
                    held.current_price = request.price_per_share;
                    held.name.clone()
                }
                None => {
                    account.holdings.push(Holding::new(
                        request.symbol.clone(),
                        company_name.to_string(),
                        request.quantity,
                        request.price_per_share,
                    ));
                    company_name.to_string()
                }
            };
            account.cash -= gross;
            (name, None)
        }
        TradeAction::Sell => {
            let index = match account
                .holdings
                .iter()
                .position(|h| h.symbol == request.symbol)
            {
                Some(i) => i,
                // validate() already rejected this, but never panic here
                None => {
                    return Err(TradeError::InsufficientShares {
                        symbol: request.symbol.clone(),
                        requested: request.quantity,
                        held: 0,
                    })
                }
            };

            let held = &mut account.holdings[index];
            let realized = request.quantity as f64 * (request.price_per_share - held.avg_price);
            let name = held.name.clone();
            held.shares -= request.quantity;
            held.current_price = request.price_per_share;
            if held.shares == 0 {
                account.holdings.remove(index);
            }
            account.cash += gross;
            (name, Some(realized))
        }
    };

    debug!(
        "executed {} {} x{} @ {:.2}, cash now {:.2}",
        request.action.as_str(),
        request.symbol,
        request.quantity,
        request.price_per_share,
        account.cash
    );

    let entry = LedgerEntry::new(
        request.symbol.clone(),
        entry_name,
        request.action,
        request.quantity,
        request.price_per_share,
    );
    Ok(Execution {
        entry,
        realized_gain_loss: realized,
    })
}
