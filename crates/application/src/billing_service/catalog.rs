use std::collections::HashMap;
use std::str::FromStr;

use proofai_core::{AppError, AppResult};
use proofai_domain::PlanName;

/// Maps billing provider price references to plans and credit packs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingCatalog {
    plan_prices: HashMap<String, PlanName>,
    credit_pack_prices: HashMap<String, u32>,
}

impl BillingCatalog {
    /// Creates a catalog from explicit price maps.
    #[must_use]
    pub fn new(
        plan_prices: HashMap<String, PlanName>,
        credit_pack_prices: HashMap<String, u32>,
    ) -> Self {
        Self {
            plan_prices,
            credit_pack_prices,
        }
    }

    /// Parses `price=plan` and `price=credits` lists separated by commas.
    ///
    /// Empty input yields an empty map.
    pub fn parse(plan_price_map: &str, credit_pack_price_map: &str) -> AppResult<Self> {
        let plan_prices = parse_pairs(plan_price_map, "PLAN_PRICE_MAP", |value| {
            PlanName::from_str(value)
        })?;
        let credit_pack_prices = parse_pairs(credit_pack_price_map, "CREDIT_PACK_PRICE_MAP", |value| {
            match value.parse::<u32>() {
                Ok(credits) if credits > 0 => Ok(credits),
                _ => Err(AppError::Validation(format!(
                    "credit pack size '{value}' must be a positive integer"
                ))),
            }
        })?;

        Ok(Self::new(plan_prices, credit_pack_prices))
    }

    /// Returns the plan sold under `price_ref`.
    #[must_use]
    pub fn plan_for_price(&self, price_ref: &str) -> Option<PlanName> {
        self.plan_prices.get(price_ref).copied()
    }

    /// Returns the number of credits in the pack sold under `price_ref`.
    #[must_use]
    pub fn credit_pack_for_price(&self, price_ref: &str) -> Option<u32> {
        self.credit_pack_prices.get(price_ref).copied()
    }
}

fn parse_pairs<T>(
    raw: &str,
    variable: &str,
    parse_value: impl Fn(&str) -> AppResult<T>,
) -> AppResult<HashMap<String, T>> {
    let mut pairs = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((price_ref, value)) = entry.split_once('=') else {
            return Err(AppError::Validation(format!(
                "{variable} entry '{entry}' must look like 'price=value'"
            )));
        };

        let price_ref = price_ref.trim();
        if price_ref.is_empty() {
            return Err(AppError::Validation(format!(
                "{variable} entry '{entry}' has an empty price reference"
            )));
        }

        let value = parse_value(value.trim())
            .map_err(|error| AppError::Validation(format!("{variable}: {error}")))?;
        if pairs.insert(price_ref.to_owned(), value).is_some() {
            return Err(AppError::Validation(format!(
                "{variable} lists price '{price_ref}' more than once"
            )));
        }
    }

    Ok(pairs)
}
