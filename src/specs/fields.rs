// src/specs/fields.rs
//! Ordered field lists and fixed labels of the receipt detail page.
//!
//! The page is read positionally, so the order of each list *is* the grammar.

/// Header rows, in page order after blank rows are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    User,
    Address,
    UserInn,
    DateTime,
    RequestNumber,
    ShiftNumber,
    /// Read to keep positions aligned, never stored.
    Cashier,
    OperationType,
}

pub const HEADER_FIELDS: [HeaderField; 8] = [
    HeaderField::User,
    HeaderField::Address,
    HeaderField::UserInn,
    HeaderField::DateTime,
    HeaderField::RequestNumber,
    HeaderField::ShiftNumber,
    HeaderField::Cashier,
    HeaderField::OperationType,
];

impl HeaderField {
    /// Leading token stripped from the row text before storing.
    pub const fn label(self) -> Option<&'static str> {
        match self {
            HeaderField::UserInn => Some("ИНН"),
            HeaderField::RequestNumber => Some("Чек №"),
            HeaderField::ShiftNumber => Some("Смена №"),
            _ => None,
        }
    }
}

/// Line-item cells, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemField {
    PositionNumber,
    Name,
    Price,
    Quantity,
    Sum,
}

pub const ITEM_FIELDS: [ItemField; 5] = [
    ItemField::PositionNumber,
    ItemField::Name,
    ItemField::Price,
    ItemField::Quantity,
    ItemField::Sum,
];

impl ItemField {
    pub const fn key(self) -> &'static str {
        match self {
            ItemField::PositionNumber => "positionNumber",
            ItemField::Name => "name",
            ItemField::Price => "price",
            ItemField::Quantity => "quantity",
            ItemField::Sum => "sum",
        }
    }
}

/// Totals rows directly after the items. Each slot only accepts its own label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TotalField {
    TotalSum,
    CashTotalSum,
    EcashTotalSum,
}

pub const TOTAL_FIELDS: [TotalField; 3] = [
    TotalField::TotalSum,
    TotalField::CashTotalSum,
    TotalField::EcashTotalSum,
];

impl TotalField {
    pub const fn key(self) -> &'static str {
        match self {
            TotalField::TotalSum => "totalSum",
            TotalField::CashTotalSum => "cashTotalSum",
            TotalField::EcashTotalSum => "ecashTotalSum",
        }
    }

    /// Row text must start with this for the slot to be filled.
    pub const fn label(self) -> &'static str {
        match self {
            TotalField::TotalSum => "ИТОГО",
            TotalField::CashTotalSum => "Наличные",
            TotalField::EcashTotalSum => "Карта",
        }
    }
}

/// Classification of a trailer row by its leading text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrailerLabel {
    TaxationType,
    KktRegId,
    FactoryNumber,
    /// Fiscal sign; everything after it is ignored.
    FiscalSign,
    FiscalDrive,
    FiscalDocument,
}

/// Checked in this order; `ФПД` must be tested before `ФН`/`ФД`.
pub const TRAILER_LABELS: [(&str, TrailerLabel); 6] = [
    ("ВИД НАЛОГООБЛОЖЕНИЯ", TrailerLabel::TaxationType),
    ("РЕГ.", TrailerLabel::KktRegId),
    ("ЗАВОД", TrailerLabel::FactoryNumber),
    ("ФПД", TrailerLabel::FiscalSign),
    ("ФН", TrailerLabel::FiscalDrive),
    ("ФД", TrailerLabel::FiscalDocument),
];

pub const KKT_MARKER: &str = "ККТ: ";

impl TrailerLabel {
    pub fn classify(text: &str) -> Option<(&'static str, TrailerLabel)> {
        TRAILER_LABELS
            .iter()
            .copied()
            .find(|(prefix, _)| text.starts_with(prefix))
    }
}

/// VAT buckets of the tax breakdown rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VatBucket {
    NoNds,
    Nds0,
    Nds10,
    Nds20,
}

pub const VAT_BUCKETS: [(&str, VatBucket); 4] = [
    ("НДС не облагается", VatBucket::NoNds),
    ("НДС итога чека со ставкой 0%", VatBucket::Nds0),
    ("НДС итога чека со ставкой 10%", VatBucket::Nds10),
    ("НДС итога чека со ставкой 20%", VatBucket::Nds20),
];

impl VatBucket {
    pub fn from_label(label: &str) -> Option<VatBucket> {
        VAT_BUCKETS
            .iter()
            .find(|(prefix, _)| label.starts_with(prefix))
            .map(|(_, bucket)| *bucket)
    }

    pub const fn key(self) -> &'static str {
        match self {
            VatBucket::NoNds => "noNds",
            VatBucket::Nds0 => "nds0",
            VatBucket::Nds10 => "nds10",
            VatBucket::Nds20 => "nds20",
        }
    }
}
