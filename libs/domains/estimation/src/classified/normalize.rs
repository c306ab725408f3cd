use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::warn;

use super::{ClassifiedServiceInput, ClassifiedServiceRow, ServiceClassification};
use crate::currency::round2;

const SERVICE_TYPE_KEYS: &[&str] = &["servicetype", "__empty", "service_type"];
const REGION_KEYS: &[&str] = &["region", "__empty_2"];
const DESCRIPTION_KEYS: &[&str] = &["description", "__empty_3", "service_description"];

static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:fixed\s+gateway\s+)?hours?").unwrap()
});
static TIMES_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)x\s*(\d+(?:\.\d+)?)\s*hours?").unwrap());
static VM_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s+[a-z]\d+[a-z0-9._-]*(?:\s*v\d+)?\s*\(").unwrap()
});
static DISK_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)disk\s+type\s+(\d+(?:\.\d+)?)\s+disks?").unwrap());
static INSTANCE_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*instance").unwrap());
static USAGE_GB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+(?:\.\d+)?)\s*gb\s*(?:outbound\s+data\s+transfer|outbound|data\s+transfer|data\s+processed|average\s+monthly\s+backup\s+data)",
    )
    .unwrap()
});
static CAPACITY_UNITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*compute\s*units?").unwrap());
static VM_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([a-z]\d+[a-z0-9._-]*(?:\s*v\d+)?)\b").unwrap());
static DISK_TIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(p\d{1,3})\b").unwrap());
static GATEWAY_TIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(standard\s*v2|standard)\b").unwrap());

/// Turn raw classified rows into priceable rows.
///
/// Rows that do not match the expected shape are skipped with a warning.
pub fn normalize_rows(
    rows: &[Value],
    request_region: &str,
    default_hours: f64,
) -> Vec<ClassifiedServiceRow> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            match serde_json::from_value::<ClassifiedServiceInput>(raw.clone()) {
                Ok(input) => Some(normalize_row(input, request_region, default_hours)),
                Err(e) => {
                    warn!(index, error = %e, "Skipping invalid classified service row");
                    None
                }
            }
        })
        .collect()
}

fn normalize_row(
    input: ClassifiedServiceInput,
    request_region: &str,
    default_hours: f64,
) -> ClassifiedServiceRow {
    let row = input.row;
    let service_type = input
        .service_type
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| read_first(&row, SERVICE_TYPE_KEYS));
    let region = read_first(&row, REGION_KEYS).unwrap_or_else(|| request_region.to_string());
    let description = read_first(&row, DESCRIPTION_KEYS).unwrap_or_default();

    ClassifiedServiceRow {
        classification: input.classification,
        service_name: service_name(input.classification, service_type.as_deref()),
        sku_name: sku_name(input.classification, service_type.as_deref(), &description),
        region: normalize_region(&region),
        quantity: parse_quantity(&description),
        usage_hours: parse_hours(&description, default_hours),
        usage_gb: parse_usage_gb(&description),
        capacity_units: parse_capacity_units(&description),
        source_service_type: service_type,
        source_row: row,
    }
}

/// First key holding a non-blank string or a finite number
fn read_first(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_string),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(|_| n.to_string()),
        _ => None,
    })
}

/// Lowercase alphanumerics only, e.g. `Central India` becomes `centralindia`
pub fn normalize_region(region: &str) -> String {
    region
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_hours(description: &str, default_hours: f64) -> f64 {
    first_number(&HOURS, description)
        .or_else(|| first_number(&TIMES_HOURS, description))
        .unwrap_or(default_hours)
}

fn parse_quantity(description: &str) -> u32 {
    [&*VM_QUANTITY, &*DISK_QUANTITY, &*INSTANCE_QUANTITY]
        .into_iter()
        .find_map(|re| first_number(re, description))
        .map(|qty| qty.round().clamp(1.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

fn parse_usage_gb(description: &str) -> f64 {
    let total: f64 = USAGE_GB
        .captures_iter(description)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .sum();
    round2(total)
}

fn parse_capacity_units(description: &str) -> f64 {
    first_number(&CAPACITY_UNITS, description).unwrap_or(0.0)
}

fn sku_name(
    classification: ServiceClassification,
    service_type: Option<&str>,
    description: &str,
) -> Option<String> {
    let capture = |re: &Regex| {
        re.captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    match classification {
        ServiceClassification::ComputeVm => capture(&VM_SIZE),
        ServiceClassification::StorageDisk => capture(&DISK_TIER).map(|s| s.to_ascii_uppercase()),
        ServiceClassification::NetworkGateway => {
            capture(&GATEWAY_TIER).or_else(|| service_type.map(str::to_string))
        }
        _ => service_type.map(str::to_string),
    }
}

fn service_name(classification: ServiceClassification, service_type: Option<&str>) -> String {
    match classification {
        ServiceClassification::ComputeVm => "Virtual Machines",
        ServiceClassification::StorageDisk => "Storage",
        ServiceClassification::NetworkGateway => {
            if service_type.is_some_and(|s| s.to_lowercase().contains("nat")) {
                "Virtual Network"
            } else {
                "Application Gateway"
            }
        }
        ServiceClassification::NetworkEgress => "Bandwidth",
        ServiceClassification::Backup => "Recovery Services",
        ServiceClassification::Automation => "Automation",
        ServiceClassification::Monitoring => "Azure Monitor",
        ServiceClassification::LogicApps => "Logic Apps",
        ServiceClassification::Other => service_type.unwrap_or("Unknown Service"),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vm_row() {
        let rows = vec![json!({
            "classification": "COMPUTE_VM",
            "row": {
                "servicetype": "Virtual Machines",
                "region": "Central India",
                "description": "2 D4s v5 (4 vCPUs, 16 GB RAM) x 730 Hours; Linux"
            }
        })];
        let out = normalize_rows(&rows, "southindia", 730.0);
        assert_eq!(out.len(), 1);
        let vm = &out[0];
        assert_eq!(vm.region, "centralindia");
        assert_eq!(vm.quantity, 2);
        assert_eq!(vm.usage_hours, 730.0);
        assert_eq!(vm.sku_name.as_deref(), Some("D4s v5"));
        assert_eq!(vm.service_name, "Virtual Machines");
    }

    #[test]
    fn test_egress_sums_every_usage_phrase() {
        let rows = vec![json!({
            "classification": "NETWORK_EGRESS",
            "serviceType": "Bandwidth",
            "row": {
                "__empty_3": "Internet egress, 100 GB outbound data transfer; 50.5 GB data transfer"
            }
        })];
        let out = normalize_rows(&rows, "Central India", 730.0);
        assert_eq!(out[0].usage_gb, 150.5);
        assert_eq!(out[0].region, "centralindia");
        assert_eq!(out[0].service_name, "Bandwidth");
        assert_eq!(out[0].sku_name.as_deref(), Some("Bandwidth"));
    }

    #[test]
    fn test_gateway_and_disk_rows() {
        let rows = vec![
            json!({
                "classification": "NETWORK_GATEWAY",
                "row": {
                    "servicetype": "Application Gateway",
                    "description": "Standard V2 tier, 1 instance x 730 fixed gateway hours, 10 compute units"
                }
            }),
            json!({
                "classification": "NETWORK_GATEWAY",
                "row": { "servicetype": "NAT Gateway", "description": "1 gateway" }
            }),
            json!({
                "classification": "STORAGE_DISK",
                "row": { "description": "Managed Disks, Premium SSD, P10 disk type 3 disks" }
            }),
        ];
        let out = normalize_rows(&rows, "eastus", 730.0);
        assert_eq!(out[0].service_name, "Application Gateway");
        assert_eq!(out[0].sku_name.as_deref(), Some("Standard V2"));
        assert_eq!(out[0].capacity_units, 10.0);
        assert_eq!(out[0].usage_hours, 730.0);
        assert_eq!(out[1].service_name, "Virtual Network");
        assert_eq!(out[2].sku_name.as_deref(), Some("P10"));
        assert_eq!(out[2].quantity, 3);
    }

    #[test]
    fn test_defaults_and_invalid_rows() {
        let rows = vec![
            json!({ "classification": "MONITORING", "row": {} }),
            json!({ "classification": "NOT_A_CLASS", "row": {} }),
            json!("garbage"),
        ];
        let out = normalize_rows(&rows, "West US 2", 720.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].usage_hours, 720.0);
        assert_eq!(out[0].quantity, 1);
        assert_eq!(out[0].usage_gb, 0.0);
        assert_eq!(out[0].region, "westus2");
        assert_eq!(out[0].service_name, "Azure Monitor");
        assert_eq!(out[0].sku_name, None);
    }

    #[test]
    fn test_numeric_cells_are_read_as_text() {
        let mut row = Map::new();
        row.insert("__empty".into(), json!(""));
        row.insert("service_type".into(), json!(42));
        assert_eq!(read_first(&row, SERVICE_TYPE_KEYS).as_deref(), Some("42"));
    }
}
