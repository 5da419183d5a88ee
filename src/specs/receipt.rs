// src/specs/receipt.rs
//! Scraping *spec* for a receipt detail page.
//!
//! The page is one `<table>` whose `<tr>` rows carry the receipt top to bottom.
//! Reading is done in two passes:
//!
//! 1. [`read_rows`] flattens the table into plain [`Row`]s (class marker,
//!    cell texts, row text) and [`segment`] cuts them into zones:
//!    header (rows 0..9), items (rows from 10 tagged `b-check_item`),
//!    totals (the 3 rows after the items) and trailer (everything after).
//! 2. Each zone has its own grammar (`read_header`, `read_items`,
//!    `read_totals`, `read_trailer`), driven by the ordered lists in
//!    [`super::fields`].
//!
//! A receipt is returned whole or not at all: every grammar writes into a
//! local draft and the draft only leaves on success.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::common::html::{css, first_class, packed_text_of, select_all, text_of};
use crate::common::net::Fetch;
use crate::common::sanitize::{after_last, normalize_ws, strip_label};
use crate::error::{ExtractionCause, ExtractionError};
use crate::model::{parse_amount, CheckId, LineItem, Metadata, Receipt};

use super::fields::*;

/// Class that marks a line-item row.
pub const ITEM_ROW_CLASS: &str = "b-check_item";
/// Header candidates are the first nine rows.
pub const HEADER_ROWS: usize = 9;
/// Item rows are searched from here on.
pub const ITEMS_FROM: usize = 10;

static TABLE: LazyLock<Selector> = LazyLock::new(|| css("table"));
static TR: LazyLock<Selector> = LazyLock::new(|| css("tr"));
static TD: LazyLock<Selector> = LazyLock::new(|| css("td"));

/// One `<tr>`, reduced to what the grammars look at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    pub marker: Option<String>,
    pub cells: Vec<String>,
    /// Same cells with text nodes glued together; numbers are read from these.
    pub packed: Vec<String>,
    pub text: String,
}

impl Row {
    pub fn is_item(&self) -> bool {
        self.marker.as_deref() == Some(ITEM_ROW_CLASS)
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Cell texts joined with single spaces.
    pub fn joined(&self) -> String {
        normalize_ws(&self.cells.join(" "))
    }

    fn from_element(tr: ElementRef<'_>) -> Self {
        Row {
            marker: first_class(tr).map(str::to_string),
            cells: select_all(tr, &TD).into_iter().map(text_of).collect(),
            packed: select_all(tr, &TD).into_iter().map(packed_text_of).collect(),
            text: text_of(tr),
        }
    }
}

/// Rows of the first table in the document, or `None` when there is no table.
pub fn read_rows(doc: &Html) -> Option<Vec<Row>> {
    let table = doc.select(&TABLE).next()?;
    Some(select_all(table, &TR).into_iter().map(Row::from_element).collect())
}

/// The row list cut into its labeled zones.
#[derive(Debug)]
pub struct Zones<'r> {
    /// Non-blank rows among the first [`HEADER_ROWS`].
    pub header: Vec<&'r Row>,
    /// Item rows with their absolute row index.
    pub items: Vec<(usize, &'r Row)>,
    pub totals: &'r [Row],
    pub trailer: &'r [Row],
}

/// First pass: find where each zone lives. Totals start right after
/// `ITEMS_FROM + item count`, so the items must be counted first.
pub fn segment(rows: &[Row]) -> Zones<'_> {
    let header = rows
        .iter()
        .take(HEADER_ROWS)
        .filter(|r| !r.is_blank())
        .collect();

    let items: Vec<(usize, &Row)> = rows
        .iter()
        .enumerate()
        .skip(ITEMS_FROM)
        .filter(|(_, r)| r.is_item())
        .collect();

    let totals_start = (ITEMS_FROM + items.len()).min(rows.len());
    let totals_end = (totals_start + TOTAL_FIELDS.len()).min(rows.len());

    Zones {
        header,
        items,
        totals: &rows[totals_start..totals_end],
        trailer: &rows[totals_end..],
    }
}

/// Parse a detail document into a receipt. Pure; split out for tests.
pub fn parse_doc(html_doc: &str, check_id: CheckId) -> Result<Receipt, ExtractionError> {
    let doc = Html::parse_document(html_doc);
    let rows = read_rows(&doc).ok_or(ExtractionError::new(check_id, ExtractionCause::MissingTable))?;
    extract(&rows, check_id)
}

/// Fetch a detail page and extract it.
pub fn fetch(fetcher: &dyn Fetch, url: &str, check_id: CheckId) -> Result<Receipt, ExtractionError> {
    let html_doc = fetcher
        .get(url)
        .map_err(|e| ExtractionError::new(check_id, e))?;
    parse_doc(&html_doc, check_id)
}

/// Second pass: run each zone's grammar over a segmented row list.
pub fn extract(rows: &[Row], check_id: CheckId) -> Result<Receipt, ExtractionError> {
    let zones = segment(rows);
    let mut draft = Receipt::new(check_id);

    read_header(&zones.header, &mut draft);
    draft.items = read_items(&zones.items).map_err(|c| ExtractionError::new(check_id, c))?;
    read_totals(zones.totals, &mut draft).map_err(|c| ExtractionError::new(check_id, c))?;
    let trailer_from = rows.len() - zones.trailer.len();
    read_trailer(zones.trailer, trailer_from, &mut draft).map_err(|c| ExtractionError::new(check_id, c))?;

    Ok(draft)
}

/* ---------------- zone grammars ---------------- */

fn read_header(rows: &[&Row], draft: &mut Receipt) {
    for (field, row) in HEADER_FIELDS.iter().zip(rows) {
        let value = match field.label() {
            Some(label) => s!(strip_label(&row.text, label)),
            None => row.text.clone(),
        };
        match field {
            HeaderField::User => draft.user = Some(value),
            HeaderField::Address => draft.metadata = Some(Metadata { address: value }),
            HeaderField::UserInn => draft.user_inn = Some(value),
            HeaderField::DateTime => draft.date_time = Some(value),
            HeaderField::RequestNumber => draft.request_number = Some(value),
            HeaderField::ShiftNumber => draft.shift_number = Some(value),
            HeaderField::Cashier => {}
            HeaderField::OperationType => draft.operation_type = Some(value),
        }
    }
}

fn read_items(rows: &[(usize, &Row)]) -> Result<Vec<LineItem>, ExtractionCause> {
    rows.iter().map(|(idx, row)| read_item(*idx, row)).collect()
}

fn read_item(idx: usize, row: &Row) -> Result<LineItem, ExtractionCause> {
    let ([_, name, _, _, _], [pos, _, price, qty, sum]) = (row.cells.as_slice(), row.packed.as_slice()) else {
        return Err(ExtractionCause::CellCount {
            row: idx,
            expected: ITEM_FIELDS.len(),
            found: row.cells.len(),
        });
    };

    let position_number = pos.trim().parse::<i64>().map_err(|_| ExtractionCause::NotANumber {
        field: ItemField::PositionNumber.key(),
        text: pos.clone(),
    })?;

    Ok(LineItem {
        position_number,
        name: name.clone(),
        price: amount(ItemField::Price.key(), price)?,
        quantity: amount(ItemField::Quantity.key(), qty)?,
        sum: amount(ItemField::Sum.key(), sum)?,
    })
}

fn read_totals(rows: &[Row], draft: &mut Receipt) -> Result<(), ExtractionCause> {
    for (field, row) in TOTAL_FIELDS.iter().zip(rows) {
        let text = row.joined();
        // Slot/label mismatch: skip the slot, never reassign to another key.
        if !text.starts_with(field.label()) {
            continue;
        }
        let value = Some(amount(field.key(), strip_label(&text, field.label()))?);
        match field {
            TotalField::TotalSum => draft.total_sum = value,
            TotalField::CashTotalSum => draft.cash_total_sum = value,
            TotalField::EcashTotalSum => draft.ecash_total_sum = value,
        }
    }
    Ok(())
}

fn read_trailer(rows: &[Row], first: usize, draft: &mut Receipt) -> Result<(), ExtractionCause> {
    for (offset, row) in rows.iter().enumerate() {
        let text = row.text.as_str();
        match TrailerLabel::classify(text) {
            Some((label, TrailerLabel::TaxationType)) => {
                draft.applied_taxation_type = Some(s!(strip_label(text, label)));
            }
            Some((_, TrailerLabel::KktRegId)) => {
                draft.kkt_reg_id = Some(s!(after_last(text, KKT_MARKER)));
            }
            Some((_, TrailerLabel::FactoryNumber)) => continue,
            Some((_, TrailerLabel::FiscalSign)) => break,
            Some((label, TrailerLabel::FiscalDrive)) => {
                draft.fiscal_drive_number = Some(s!(strip_label(text, label)));
            }
            Some((label, TrailerLabel::FiscalDocument)) => {
                draft.fiscal_document_number = Some(s!(strip_label(text, label)));
            }
            None => read_vat_row(first + offset, row, draft)?,
        }
    }
    Ok(())
}

/// Tax breakdown row: first cell is the bucket label, last cell the amount.
/// Rows whose label is not a known bucket are ignored.
fn read_vat_row(idx: usize, row: &Row, draft: &mut Receipt) -> Result<(), ExtractionCause> {
    let Some(label) = row.cells.first() else { return Ok(()) };
    let Some(bucket) = VatBucket::from_label(label) else { return Ok(()) };

    if row.cells.len() < 2 {
        return Err(ExtractionCause::CellCount { row: idx, expected: 2, found: row.cells.len() });
    }
    let Some(last) = row.packed.last() else { return Ok(()) };
    let value = Some(amount(bucket.key(), last)?);
    match bucket {
        VatBucket::NoNds => draft.no_nds = value,
        VatBucket::Nds0 => draft.nds0 = value,
        VatBucket::Nds10 => draft.nds10 = value,
        VatBucket::Nds20 => draft.nds20 = value,
    }
    Ok(())
}

fn amount(field: &'static str, text: &str) -> Result<rust_decimal::Decimal, ExtractionCause> {
    parse_amount(text).ok_or_else(|| ExtractionCause::NotANumber { field, text: s!(text) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const HEAD: &str = r#"
        <tr><td>ООО "РОМАШКА"</td></tr>
        <tr><td>г. Москва, ул. Ленина, 1</td></tr>
        <tr><td>ИНН 7700000000</td></tr>
        <tr><td>01.06.2024 12:30</td></tr>
        <tr><td>Чек № 42</td></tr>
        <tr><td>Смена № 7</td></tr>
        <tr><td>Кассир Иванова</td></tr>
        <tr><td>Приход</td></tr>
        <tr><td> </td></tr>
        <tr class="b-check_head"><td>№</td><td>Название</td><td>Цена</td><td>Кол.</td><td>Сумма</td></tr>
    "#;

    fn page(body: &str) -> String {
        format!("<html><body><table>{HEAD}{body}</table></body></html>")
    }

    const ITEMS: &str = r#"
        <tr class="b-check_item"><td>1</td><td>Хлеб</td><td>50.005</td><td>2</td><td>100.01</td></tr>
        <tr class="b-check_item"><td>2</td><td>Молоко</td><td>89.90</td><td>1.000</td><td>89.90</td></tr>
    "#;

    const TOTALS: &str = r#"
        <tr><td>ИТОГО:</td><td>189.91</td></tr>
        <tr><td>Наличные</td><td>0.00</td></tr>
        <tr><td>Карта</td><td>189.91</td></tr>
    "#;

    #[test]
    fn parses_full_receipt() {
        let trailer = r#"
            <tr><td>ВИД НАЛОГООБЛОЖЕНИЯ: ОСН</td></tr>
            <tr><td>НДС итога чека со ставкой 20%</td><td>14.98</td></tr>
            <tr><td>НДС итога чека со ставкой 10%</td><td>8.17</td></tr>
            <tr><td>РЕГ. НОМЕР ККТ: 0001234567890</td></tr>
            <tr><td>ЗАВОД. №: 00000000</td></tr>
            <tr><td>ФН: 9960440300000001</td></tr>
            <tr><td>ФД: 12345</td></tr>
            <tr><td>ФПД: 987654321</td></tr>
        "#;
        let html = page(&format!("{ITEMS}{TOTALS}{trailer}"));
        let r = parse_doc(&html, 42).unwrap();

        assert_eq!(r.check_id, 42);
        assert_eq!(r.user.as_deref(), Some(r#"ООО "РОМАШКА""#));
        assert_eq!(r.metadata.as_ref().map(|m| m.address.as_str()), Some("г. Москва, ул. Ленина, 1"));
        assert_eq!(r.user_inn.as_deref(), Some("7700000000"));
        assert_eq!(r.date_time.as_deref(), Some("01.06.2024 12:30"));
        assert_eq!(r.request_number.as_deref(), Some("42"));
        assert_eq!(r.shift_number.as_deref(), Some("7"));
        assert_eq!(r.operation_type.as_deref(), Some("Приход"));

        assert_eq!(r.items.len(), 2);
        assert_eq!(r.items[0].position_number, 1);
        assert_eq!(r.items[0].name, "Хлеб");
        assert_eq!(r.items[0].price, dec("50.00"));
        assert_eq!(r.items[1].quantity, dec("1"));

        assert_eq!(r.total_sum, Some(dec("189.91")));
        assert_eq!(r.cash_total_sum, Some(dec("0")));
        assert_eq!(r.ecash_total_sum, Some(dec("189.91")));

        assert_eq!(r.applied_taxation_type.as_deref(), Some("ОСН"));
        assert_eq!(r.kkt_reg_id.as_deref(), Some("0001234567890"));
        assert_eq!(r.fiscal_drive_number.as_deref(), Some("9960440300000001"));
        assert_eq!(r.fiscal_document_number.as_deref(), Some("12345"));
        assert_eq!(r.nds20, Some(dec("14.98")));
        assert_eq!(r.nds10, Some(dec("8.17")));
        assert_eq!(r.nds0, None);
        assert_eq!(r.no_nds, None);
    }

    #[test]
    fn missing_totals_block_leaves_sums_absent() {
        let html = page(ITEMS);
        let r = parse_doc(&html, 1).unwrap();
        assert_eq!(r.items.len(), 2);
        assert_eq!(r.total_sum, None);
        assert_eq!(r.cash_total_sum, None);
        assert_eq!(r.ecash_total_sum, None);
    }

    #[test]
    fn item_cell_count_mismatch_rejects_record() {
        let items = r#"
            <tr class="b-check_item"><td>1</td><td>Хлеб</td><td>50.00</td><td>2</td><td>100.00</td></tr>
            <tr class="b-check_item"><td>2</td><td>Молоко</td><td>89.90</td><td>89.90</td></tr>
        "#;
        let err = parse_doc(&page(&format!("{items}{TOTALS}")), 9).unwrap_err();
        assert_eq!(err.check_id, 9);
        assert!(matches!(err.cause, ExtractionCause::CellCount { row: 11, expected: 5, found: 4 }));
    }

    #[test]
    fn non_numeric_item_rejects_record() {
        let items = r#"<tr class="b-check_item"><td>один</td><td>Хлеб</td><td>1</td><td>1</td><td>1</td></tr>"#;
        let err = parse_doc(&page(items), 3).unwrap_err();
        assert!(matches!(err.cause, ExtractionCause::NotANumber { field: "positionNumber", .. }));
    }

    #[test]
    fn missing_table_is_an_extraction_error() {
        let err = parse_doc("<html><body><p>Чек не найден</p></body></html>", 5).unwrap_err();
        assert!(matches!(err.cause, ExtractionCause::MissingTable));
    }

    #[test]
    fn card_only_payment_skips_cash_slot() {
        // No "Наличные" row: the card row lands in the cash slot and is skipped.
        let totals = r#"
            <tr><td>ИТОГО:</td><td>10.00</td></tr>
            <tr><td>Карта</td><td>10.00</td></tr>
            <tr><td>ВИД НАЛОГООБЛОЖЕНИЯ: УСН</td></tr>
        "#;
        let r = parse_doc(&page(&format!("{ITEMS}{totals}")), 2).unwrap();
        assert_eq!(r.total_sum, Some(dec("10")));
        assert_eq!(r.cash_total_sum, None);
        assert_eq!(r.ecash_total_sum, None);
        // Third slot holds the taxation row, which is not a total either.
        assert_eq!(r.applied_taxation_type, None);
    }

    #[test]
    fn trailer_stops_at_fiscal_sign() {
        let trailer = r#"
            <tr><td>ФД: 77</td></tr>
            <tr><td>ФПД: 1</td></tr>
            <tr><td>ФН: 9960440300000001</td></tr>
        "#;
        let r = parse_doc(&page(&format!("{ITEMS}{TOTALS}{trailer}")), 4).unwrap();
        assert_eq!(r.fiscal_document_number.as_deref(), Some("77"));
        assert_eq!(r.fiscal_drive_number, None);
    }

    #[test]
    fn unknown_trailer_rows_are_ignored() {
        let trailer = r#"
            <tr><td>Сайт ФНС:</td><td>nalog.gov.ru</td></tr>
            <tr><td>НДС не облагается</td><td></td><td>0.00</td></tr>
        "#;
        let r = parse_doc(&page(&format!("{ITEMS}{TOTALS}{trailer}")), 6).unwrap();
        assert_eq!(r.no_nds, Some(dec("0")));
    }

    #[test]
    fn numbers_split_by_inline_markup_read_whole() {
        let items = r#"<tr class="b-check_item"><td>1</td><td>Сыр <i>твёрдый</i></td><td>12<b>.50</b></td><td>2</td><td>25<span>.00</span></td></tr>"#;
        let trailer = r#"<tr><td>НДС итога чека со ставкой 20%</td><td>4<b>.17</b></td></tr>"#;
        let r = parse_doc(&page(&format!("{items}{TOTALS}{trailer}")), 11).unwrap();
        assert_eq!(r.items[0].name, "Сыр твёрдый");
        assert_eq!(r.items[0].price, dec("12.50"));
        assert_eq!(r.items[0].sum, dec("25"));
        assert_eq!(r.nds20, Some(dec("4.17")));
    }

    #[test]
    fn non_item_rows_between_items_only_shift_by_count() {
        let rows: Vec<Row> = (0..20)
            .map(|i| Row {
                marker: (i == 10 || i == 12).then(|| s!(ITEM_ROW_CLASS)),
                text: format!("r{i}"),
                ..Default::default()
            })
            .collect();
        let zones = segment(&rows);
        assert_eq!(zones.header.len(), HEADER_ROWS);
        assert_eq!(zones.items.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![10, 12]);
        assert_eq!(zones.totals[0].text, "r12");
        assert_eq!(zones.trailer[0].text, "r15");
    }

    #[test]
    fn segment_clamps_short_tables() {
        let rows = vec![Row { text: s!("only"), ..Default::default() }];
        let zones = segment(&rows);
        assert_eq!(zones.header.len(), 1);
        assert!(zones.items.is_empty());
        assert!(zones.totals.is_empty());
        assert!(zones.trailer.is_empty());
    }

    #[test]
    fn blank_header_rows_shift_positions() {
        let head = r#"
            <tr><td>ИП Петров</td></tr>
            <tr><td></td></tr>
            <tr><td>г. Тверь</td></tr>
            <tr><td>ИНН 690000000000</td></tr>
        "#;
        let html = format!("<table>{head}</table>");
        let r = parse_doc(&html, 8).unwrap();
        assert_eq!(r.user.as_deref(), Some("ИП Петров"));
        assert_eq!(r.metadata.map(|m| m.address), Some(s!("г. Тверь")));
        assert_eq!(r.user_inn.as_deref(), Some("690000000000"));
        assert_eq!(r.date_time, None);
        assert!(r.items.is_empty());
    }
}
