// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use receipt_harvest::config::options::SourceOptions;
use receipt_harvest::error::FetchError;
use receipt_harvest::model::CheckId;
use receipt_harvest::Fetch;

pub const BASE: &str = "http://stub.local";

/// In-memory site: URL -> markup. Unknown URLs fail like a dead link.
#[derive(Default)]
pub struct StubSite {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StubSite {
    pub fn source() -> SourceOptions {
        SourceOptions { base_url: BASE.into(), ..Default::default() }
    }

    /// Listing page `page` linking to `/check/<id>` for every id, in order.
    pub fn listing(mut self, page: u32, ids: &[CheckId]) -> Self {
        let url = Self::source().listing_url(page);
        self.pages.insert(url, listing_html(ids));
        self
    }

    /// Detail page for `id`.
    pub fn receipt(mut self, id: CheckId) -> Self {
        self.pages.insert(detail_url(id), receipt_html(id));
        self
    }

    pub fn receipts(self, ids: &[CheckId]) -> Self {
        ids.iter().fold(self, |site, id| site.receipt(*id))
    }

    pub fn raw(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requested.lock().unwrap().iter().any(|u| u == url)
    }
}

impl Fetch for StubSite {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable { url: url.to_string() })
    }
}

pub fn detail_url(id: CheckId) -> String {
    format!("{BASE}/check/{id}")
}

pub fn listing_html(ids: &[CheckId]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| format!(r#"<tr><td>{id}</td><td><a href="/check/{id}">01.06.2024</a></td><td>100.00</td></tr>"#))
        .collect();
    format!(
        r#"<html><body><div class="col-md-9">
             <div class="row"><h1>Чеки</h1></div>
             <div class="row"><table>
               <tr class="table-head"><td>№</td><td>Дата</td><td>Сумма</td></tr>
               {rows}
             </table></div>
           </div></body></html>"#
    )
}

pub fn receipt_html(id: CheckId) -> String {
    format!(
        r#"<html><body><table>
             <tr><td>ООО "ТЕСТ"</td></tr>
             <tr><td>г. Казань, ул. Баумана, 5</td></tr>
             <tr><td>ИНН 1650000000</td></tr>
             <tr><td>01.06.2024 10:00</td></tr>
             <tr><td>Чек № {id}</td></tr>
             <tr><td>Смена № 3</td></tr>
             <tr><td>Кассир</td></tr>
             <tr><td>Приход</td></tr>
             <tr><td></td></tr>
             <tr class="b-check_head"><td>№</td><td>Название</td><td>Цена</td><td>Кол.</td><td>Сумма</td></tr>
             <tr class="b-check_item"><td>1</td><td>Чай</td><td>120.00</td><td>1</td><td>120.00</td></tr>
             <tr><td>ИТОГО:</td><td>120.00</td></tr>
             <tr><td>Наличные</td><td>120.00</td></tr>
             <tr><td>Карта</td><td>0.00</td></tr>
             <tr><td>ФН: 9960440300000001</td></tr>
             <tr><td>ФД: {id}</td></tr>
           </table></body></html>"#
    )
}
