//! Maps arbitrary spreadsheet column headers to canonical catalog fields
//! through a synonym table.

use rust_decimal::Decimal;

use super::normalize::{normalize_price, normalize_text};
use super::source::RawRecord;

/// Sentinel supplier for records that carry no supplier column.
pub const GENERIC_SUPPLIER: &str = "Fornitore Generico";

const NAME_SYNONYMS: &[&str] = &["nome prodotto", "nome", "descrizione", "prodotto"];
const CATEGORY_SYNONYMS: &[&str] = &["categoria", "reparto"];
const SUPPLIER_SYNONYMS: &[&str] = &["fornitore", "supplier", "marca"];
const PURCHASE_PRICE_SYNONYMS: &[&str] = &["prezzo acquisto", "acquisto", "costo", "prezzo d'acquisto"];
const SALE_PRICE_SYNONYMS: &[&str] = &["prezzo vendita", "vendita", "listino", "prezzo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Category,
    Supplier,
    PurchasePrice,
    SalePrice,
}

const FIELDS: &[(Field, &[&str])] = &[
    (Field::Name, NAME_SYNONYMS),
    (Field::Category, CATEGORY_SYNONYMS),
    (Field::Supplier, SUPPLIER_SYNONYMS),
    (Field::PurchasePrice, PURCHASE_PRICE_SYNONYMS),
    (Field::SalePrice, SALE_PRICE_SYNONYMS),
];

/// A spreadsheet record resolved against the canonical import schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProduct {
    pub name: String,
    pub category: Option<String>,
    pub supplier: String,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

/// Outcome of header mapping for one record. A rejected record is a soft
/// per-row failure: counted as skipped, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MappedRow {
    Recognized(ParsedProduct),
    Rejected { row_number: usize, reason: String },
}

/// Resolves a record's headers to canonical fields. Exact synonym equality
/// wins; substring containment is the fallback for fields that stay
/// unresolved, scanning only headers no other field has claimed. Header
/// comparison is always case-insensitive and trimmed.
pub fn map_record(record: &RawRecord) -> MappedRow {
    let headers: Vec<(String, String)> = record
        .headers()
        .map(|h| (h.to_string(), h.trim().to_lowercase()))
        .collect();

    let mut resolved: Vec<(Field, String)> = Vec::new();
    let mut claimed: Vec<usize> = Vec::new();

    for (field, synonyms) in FIELDS {
        if let Some(idx) = headers.iter().position(|(_, normalized)| {
            synonyms.contains(&normalized.as_str())
        }) {
            resolved.push((*field, headers[idx].0.clone()));
            claimed.push(idx);
        }
    }

    for (field, synonyms) in FIELDS {
        if resolved.iter().any(|(f, _)| f == field) {
            continue;
        }
        if let Some(idx) = headers.iter().enumerate().position(|(i, (_, normalized))| {
            !claimed.contains(&i) && synonyms.iter().any(|syn| normalized.contains(syn))
        }) {
            resolved.push((*field, headers[idx].0.clone()));
            claimed.push(idx);
        }
    }

    let cell_for = |field: Field| -> Option<&str> {
        resolved
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, header)| record.get(header))
    };

    let name = match cell_for(Field::Name) {
        Some(raw) => normalize_text(raw),
        None => {
            return MappedRow::Rejected {
                row_number: record.row_number,
                reason: "no product name column recognized".to_string(),
            }
        }
    };
    if name.is_empty() {
        return MappedRow::Rejected {
            row_number: record.row_number,
            reason: "product name cell is empty".to_string(),
        };
    }

    let category = cell_for(Field::Category)
        .map(normalize_text)
        .filter(|c| !c.is_empty());

    let supplier = cell_for(Field::Supplier)
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| GENERIC_SUPPLIER.to_string());

    let purchase_price = cell_for(Field::PurchasePrice).and_then(normalize_price);
    let sale_price = cell_for(Field::SalePrice).and_then(normalize_price);

    MappedRow::Recognized(ParsedProduct {
        name,
        category,
        supplier,
        purchase_price,
        sale_price,
    })
}
