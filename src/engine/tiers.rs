use serde::Serialize;

use crate::config::TierConfig;
use crate::error::{InputError, InputResult};

/// Which price the sheet is anchored on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BasePrice {
    Selling(f64),
    Wholesale(f64),
}

/// Unit price sheet for one product, every tier rounded to a whole currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceSheet {
    pub selling: u64,
    pub business: u64,
    pub wholesale: u64,
    pub box_general: u64,
    pub box_business: u64,
    pub box_wholesale: u64,
    pub pickup_general: u64,
    pub pickup_business: u64,
    pub pickup_wholesale: u64,
}

impl PriceSheet {
    pub fn rows(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("Selling price", self.selling),
            ("Business price", self.business),
            ("Wholesale price", self.wholesale),
            ("Box price (general)", self.box_general),
            ("Box price (business)", self.box_business),
            ("Box price (wholesale)", self.box_wholesale),
            ("Pickup price (general)", self.pickup_general),
            ("Pickup price (business)", self.pickup_business),
            ("Pickup price (wholesale)", self.pickup_wholesale),
        ]
    }
}

fn whole(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

pub fn price_sheet(config: &TierConfig, base: BasePrice) -> InputResult<PriceSheet> {
    let (selling, wholesale) = match base {
        BasePrice::Selling(price) => {
            check_price(price)?;
            (whole(price), whole(price * config.wholesale))
        }
        BasePrice::Wholesale(price) => {
            check_price(price)?;
            (whole(price / config.wholesale), whole(price))
        }
    };

    let tier = |ratio: f64| whole(selling as f64 * ratio);

    Ok(PriceSheet {
        selling,
        business: tier(config.business),
        wholesale,
        box_general: tier(config.box_general),
        box_business: tier(config.box_business),
        box_wholesale: tier(config.box_wholesale),
        pickup_general: tier(config.pickup_general),
        pickup_business: tier(config.pickup_business),
        pickup_wholesale: tier(config.pickup_wholesale),
    })
}

fn check_price(price: f64) -> InputResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(InputError::InvalidPrice(price));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_from_selling_price() {
        let sheet = price_sheet(&TierConfig::default(), BasePrice::Selling(10_000.0)).unwrap();
        assert_eq!(sheet.selling, 10_000);
        assert_eq!(sheet.business, 7_600);
        assert_eq!(sheet.wholesale, 5_800);
        assert_eq!(sheet.box_general, 7_000);
        assert_eq!(sheet.box_wholesale, 5_200);
        assert_eq!(sheet.pickup_wholesale, 4_200);
        assert_eq!(sheet.rows().len(), 9);
    }

    #[test]
    fn test_sheet_from_wholesale_price() {
        let sheet = price_sheet(&TierConfig::default(), BasePrice::Wholesale(5_800.0)).unwrap();
        assert_eq!(sheet.selling, 10_000);
        assert_eq!(sheet.wholesale, 5_800);
        assert_eq!(sheet.pickup_business, 5_000);
    }

    #[test]
    fn test_invalid_price_rejected() {
        let config = TierConfig::default();
        assert_eq!(
            price_sheet(&config, BasePrice::Selling(0.0)),
            Err(InputError::InvalidPrice(0.0))
        );
        assert!(price_sheet(&config, BasePrice::Wholesale(-1.0)).is_err());
    }
}
