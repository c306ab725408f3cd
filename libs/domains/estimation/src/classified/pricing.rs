use domain_pricing::CatalogEntry;

use super::ClassifiedServiceRow;
use crate::currency::round2;

/// A catalog row seen as a retail meter, with its price already converted
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RetailMeter {
    pub arm_sku: String,
    pub unit: String,
    pub price: f64,
    pub begin: f64,
    pub end: f64,
    /// Lowercased `"{meter} {product} {arm_sku}"`
    pub text: String,
}

impl RetailMeter {
    pub fn new(entry: &CatalogEntry, converted_price: f64) -> Self {
        let meter = entry.sku.meter.clone().unwrap_or_default();
        let meter_name = meter
            .meter_name
            .clone()
            .unwrap_or_else(|| entry.sku_name.clone());
        let arm_sku = entry.sku.base_sku.clone();
        Self {
            text: format!("{meter_name} {} {arm_sku}", entry.service_name).to_lowercase(),
            arm_sku,
            unit: entry.unit.clone(),
            price: converted_price,
            begin: meter.begin(),
            end: meter.end(),
        }
    }

    fn mentions(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }
}

/// Cost of one classified row
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PricedLine {
    pub monthly_cost: f64,
    pub unit_price: Option<f64>,
    pub note: String,
}

pub(crate) const NO_CATALOG_ROWS: &str = "No catalog rows for service";

impl PricedLine {
    /// Zero-cost line for a service the catalog has no rows for
    pub fn unpriced() -> Self {
        Self {
            monthly_cost: 0.0,
            unit_price: None,
            note: NO_CATALOG_ROWS.to_string(),
        }
    }
}

fn cheapest<'a>(meters: impl Iterator<Item = &'a RetailMeter>) -> Option<&'a RetailMeter> {
    meters
        .filter(|m| m.price > 0.0)
        .min_by(|a, b| a.price.total_cmp(&b.price))
}

/// Walk egress tiers in ascending order, filling each up to its width.
/// Free tiers add nothing but still use up their width.
pub(crate) fn tiered_egress(usage_gb: f64, meters: &[RetailMeter]) -> PricedLine {
    let note = "tiered bandwidth calculator".to_string();
    let mut tiers: Vec<&RetailMeter> = meters
        .iter()
        .filter(|m| m.mentions("data transfer out"))
        .collect();
    tiers.sort_by(|a, b| a.begin.total_cmp(&b.begin));

    if tiers.is_empty() || usage_gb <= 0.0 {
        return PricedLine {
            monthly_cost: 0.0,
            unit_price: None,
            note,
        };
    }

    let mut remaining = usage_gb;
    let mut total = 0.0;
    for tier in tiers {
        if remaining <= 0.0 {
            break;
        }
        let consumed = remaining.min(tier.end - tier.begin);
        if consumed <= 0.0 {
            continue;
        }
        total += tier.price * consumed;
        remaining -= consumed;
    }

    PricedLine {
        monthly_cost: round2(total),
        unit_price: Some(round2(total / usage_gb)),
        note,
    }
}

pub(crate) fn backup_storage(usage_gb: f64, meters: &[RetailMeter]) -> PricedLine {
    let note = "backup storage tier calculator".to_string();
    let chosen = cheapest(meters.iter().filter(|m| {
        m.mentions("backup") || m.mentions("data stored") || m.mentions("protected instance")
    }));

    match chosen {
        Some(meter) if usage_gb > 0.0 => PricedLine {
            monthly_cost: round2(meter.price * usage_gb),
            unit_price: Some(round2(meter.price)),
            note,
        },
        _ => PricedLine {
            monthly_cost: 0.0,
            unit_price: None,
            note,
        },
    }
}

/// Fixed gateway hours plus capacity-unit hours
pub(crate) fn application_gateway(
    row: &ClassifiedServiceRow,
    meters: &[RetailMeter],
    default_hours: f64,
) -> PricedLine {
    let gateway_rate = cheapest(meters.iter().filter(|m| m.mentions("gateway hour")))
        .map_or(0.0, |m| m.price);
    let capacity_rate = cheapest(meters.iter().filter(|m| m.mentions("capacity unit")))
        .map_or(0.0, |m| m.price);

    let quantity = f64::from(row.quantity.max(1));
    let hours = if row.usage_hours > 0.0 {
        row.usage_hours
    } else {
        default_hours
    };
    let capacity_units = row.capacity_units.max(0.0);

    PricedLine {
        monthly_cost: round2(
            gateway_rate * hours * quantity + capacity_rate * hours * capacity_units,
        ),
        unit_price: (gateway_rate > 0.0).then(|| round2(gateway_rate)),
        note: format!("gatewayHours={hours}, gateways={quantity}, capacityUnits={capacity_units}"),
    }
}

/// Cheapest matching meter, priced according to its unit of measure
pub(crate) fn generic(
    row: &ClassifiedServiceRow,
    meters: &[RetailMeter],
    default_hours: f64,
) -> PricedLine {
    let narrowed: Vec<&RetailMeter> = match row.sku_name.as_deref() {
        Some(sku) => {
            let sku = sku.to_lowercase();
            meters
                .iter()
                .filter(|m| m.arm_sku.to_lowercase().contains(&sku) || m.mentions(&sku))
                .collect()
        }
        None => Vec::new(),
    };
    let chosen = if narrowed.is_empty() {
        cheapest(meters.iter())
    } else {
        cheapest(narrowed.into_iter())
    };

    let Some(meter) = chosen else {
        return PricedLine {
            monthly_cost: 0.0,
            unit_price: None,
            note: "No matching retail meter found".to_string(),
        };
    };

    let price = meter.price;
    let unit = meter.unit.to_lowercase();
    let quantity = f64::from(row.quantity.max(1));
    let hours = if row.usage_hours > 0.0 {
        row.usage_hours
    } else {
        default_hours
    };

    let (monthly_cost, note) = if unit.contains("hour") {
        (
            price * hours * quantity,
            format!("hourly meter, hours={hours}, quantity={quantity}"),
        )
    } else if unit.contains("gb") {
        let gb = row.usage_gb.max(quantity);
        (price * gb, format!("gb meter, usageGB={gb}"))
    } else if unit.contains("month") {
        (price * quantity, format!("monthly meter, quantity={quantity}"))
    } else {
        (
            price * quantity,
            format!("unit={}, quantity={quantity}", meter.unit),
        )
    };

    PricedLine {
        monthly_cost: round2(monthly_cost),
        unit_price: Some(round2(price)),
        note,
    }
}
