use anyhow::Result;
use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::models::{CompanySettings, Product};

// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;

const HEADER_SIZE: f32 = 20.0;
const SUBTITLE_SIZE: f32 = 11.0;
const COLUMN_SIZE: f32 = 11.0;
const ROW_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 9.0;

const ROW_STEP: f32 = 18.0;
const FOOTER_Y: f32 = 40.0;
/// Lowest baseline a table row may use before a page break.
const BOTTOM_LIMIT: f32 = 70.0;
/// Row start on continuation pages, below the repeated column header.
const CONTINUATION_TOP: f32 = 790.0;

const COL_NAME_X: f32 = MARGIN;
const COL_CATEGORY_X: f32 = 320.0;
const COL_PRICE_X: f32 = 470.0;

const NAME_MAX_CHARS: usize = 48;
const CATEGORY_MAX_CHARS: usize = 24;

/// Average Helvetica glyph advance as a fraction of the font size. Exact
/// centering would need the AFM width table; this is close enough for a
/// single-font layout and keeps the output deterministic.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// One table row of the exported catalog. The caller resolves the price
/// (user override or store price) and decides the order; the renderer
/// preserves it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
}

impl From<&Product> for CatalogItem {
    fn from(p: &Product) -> Self {
        CatalogItem {
            name: p.name.clone(),
            category: p.category.clone(),
            price: p.display_price(),
        }
    }
}

/// Company branding printed in the header and footer.
#[derive(Debug, Clone)]
pub struct CompanyInfo {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<&CompanySettings> for CompanyInfo {
    fn from(s: &CompanySettings) -> Self {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
        };
        CompanyInfo {
            name: s.company_name.clone(),
            phone: non_blank(&s.contact_phone),
            email: non_blank(&s.contact_email),
        }
    }
}

/// Render the catalog document: centered company header, dated subtitle,
/// `Produto | Categoria | Preço` table, contact footer on every page.
///
/// Pure function of its inputs — same items, company and date always
/// produce the same bytes. An empty item list yields a header-only
/// document; callers are expected to block that case in the UI.
pub fn render_catalog(
    items: &[CatalogItem],
    company: &CompanyInfo,
    date: NaiveDate,
) -> Result<Vec<u8>> {
    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut ops: Vec<Operation> = Vec::new();

    let mut y = page_header(&mut ops, company, date);
    column_header(&mut ops, y);
    y -= ROW_STEP;

    for item in items {
        if y < BOTTOM_LIMIT {
            footer(&mut ops, company);
            pages.push(std::mem::take(&mut ops));
            y = CONTINUATION_TOP;
            column_header(&mut ops, y);
            y -= ROW_STEP;
        }
        row(&mut ops, y, item);
        y -= ROW_STEP;
    }

    footer(&mut ops, company);
    pages.push(ops);

    assemble(pages)
}

/// `render_catalog` stamped with today's date.
pub fn render_catalog_now(items: &[CatalogItem], company: &CompanyInfo) -> Result<Vec<u8>> {
    render_catalog(items, company, chrono::Local::now().date_naive())
}

// --- Page content ---

fn page_header(ops: &mut Vec<Operation>, company: &CompanyInfo, date: NaiveDate) -> f32 {
    text(
        ops,
        "F2",
        HEADER_SIZE,
        centered_x(&company.name, HEADER_SIZE),
        780.0,
        &company.name,
    );

    let subtitle = format!("Catálogo de Produtos - {}", date.format("%d/%m/%Y"));
    text(
        ops,
        "F1",
        SUBTITLE_SIZE,
        centered_x(&subtitle, SUBTITLE_SIZE),
        758.0,
        &subtitle,
    );

    720.0
}

fn column_header(ops: &mut Vec<Operation>, y: f32) {
    text(ops, "F2", COLUMN_SIZE, COL_NAME_X, y, "Produto");
    text(ops, "F2", COLUMN_SIZE, COL_CATEGORY_X, y, "Categoria");
    text(ops, "F2", COLUMN_SIZE, COL_PRICE_X, y, "Preço");
}

fn row(ops: &mut Vec<Operation>, y: f32, item: &CatalogItem) {
    text(
        ops,
        "F1",
        ROW_SIZE,
        COL_NAME_X,
        y,
        &truncate(&item.name, NAME_MAX_CHARS),
    );
    let category = item.category.as_deref().unwrap_or("-");
    text(
        ops,
        "F1",
        ROW_SIZE,
        COL_CATEGORY_X,
        y,
        &truncate(category, CATEGORY_MAX_CHARS),
    );
    text(ops, "F1", ROW_SIZE, COL_PRICE_X, y, &format_price(item.price));
}

fn footer(ops: &mut Vec<Operation>, company: &CompanyInfo) {
    if let Some(phone) = &company.phone {
        text(ops, "F1", FOOTER_SIZE, MARGIN, FOOTER_Y, phone);
    }
    if let Some(email) = &company.email {
        let x = PAGE_WIDTH - MARGIN - text_width(email, FOOTER_SIZE);
        text(ops, "F1", FOOTER_SIZE, x, FOOTER_Y, email);
    }
}

/// Price cell format: `R$ <amount fixed to 2 decimals>`.
#[must_use]
pub fn format_price(price: f64) -> String {
    format!("R$ {price:.2}")
}

// --- Text helpers ---

fn text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, content: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(winansi(content))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Encode text for the built-in Helvetica fonts. Characters outside
/// Latin-1 fall back to `?`.
fn winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF { code as u8 } else { b'?' }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

fn centered_x(text: &str, size: f32) -> f32 {
    (PAGE_WIDTH - text_width(text, size)) / 2.0
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

// --- Document assembly ---

fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len())?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> CompanyInfo {
        CompanyInfo {
            name: "Acme".to_string(),
            phone: Some("+55 11 91234-5678".to_string()),
            email: Some("sales@acme.example".to_string()),
        }
    }

    fn widget() -> CatalogItem {
        CatalogItem {
            name: "Widget".to_string(),
            category: Some("Tools".to_string()),
            price: 19.9,
        }
    }

    fn extract_all_text(bytes: &[u8]) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        doc.extract_text(&pages).unwrap()
    }

    #[test]
    fn test_render_contains_header_and_row() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let bytes = render_catalog(&[widget()], &acme(), date).unwrap();
        let extracted = extract_all_text(&bytes);

        assert!(extracted.contains("Acme"), "missing header: {extracted}");
        assert!(extracted.contains("Widget"));
        assert!(extracted.contains("Tools"));
        assert!(extracted.contains("R$ 19.90"));
        assert!(extracted.contains("15/06/2024"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let a = render_catalog(&[widget()], &acme(), date).unwrap();
        let b = render_catalog(&[widget()], &acme(), date).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_category_renders_dash() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut item = widget();
        item.category = None;
        let bytes = render_catalog(&[item], &acme(), date).unwrap();
        let extracted = extract_all_text(&bytes);
        assert!(extracted.contains('-'));
        assert!(!extracted.contains("Tools"));
    }

    #[test]
    fn test_footer_omitted_when_contacts_absent() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let company = CompanyInfo {
            name: "Acme".to_string(),
            phone: None,
            email: None,
        };
        let bytes = render_catalog(&[widget()], &company, date).unwrap();
        let extracted = extract_all_text(&bytes);
        assert!(!extracted.contains("91234"));
        assert!(!extracted.contains('@'));
    }

    #[test]
    fn test_footer_present_when_contacts_set() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let bytes = render_catalog(&[widget()], &acme(), date).unwrap();
        let extracted = extract_all_text(&bytes);
        assert!(extracted.contains("+55 11 91234-5678"));
        assert!(extracted.contains("sales@acme.example"));
    }

    #[test]
    fn test_empty_items_render_header_only_document() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let bytes = render_catalog(&[], &acme(), date).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(extract_all_text(&bytes).contains("Acme"));
    }

    #[test]
    fn test_long_catalog_paginates() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let items: Vec<CatalogItem> = (0..100)
            .map(|i| CatalogItem {
                name: format!("Product {i:03}"),
                category: None,
                price: f64::from(i),
            })
            .collect();
        let bytes = render_catalog(&items, &acme(), date).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 2, "expected a page break");

        let extracted = extract_all_text(&bytes);
        assert!(extracted.contains("Product 000"));
        assert!(extracted.contains("Product 099"));
    }

    #[test]
    fn test_input_order_preserved() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let items = vec![
            CatalogItem {
                name: "Zeta".to_string(),
                category: None,
                price: 1.0,
            },
            CatalogItem {
                name: "Alpha".to_string(),
                category: None,
                price: 2.0,
            },
        ];
        let bytes = render_catalog(&items, &acme(), date).unwrap();
        let extracted = extract_all_text(&bytes);
        let zeta = extracted.find("Zeta").unwrap();
        let alpha = extracted.find("Alpha").unwrap();
        assert!(zeta < alpha, "renderer must not re-sort the input");
    }

    #[test]
    fn test_price_formatting() {
        assert_eq!(format_price(19.9), "R$ 19.90");
        assert_eq!(format_price(0.0), "R$ 0.00");
        assert_eq!(format_price(1234.5), "R$ 1234.50");
    }

    #[test]
    fn test_catalog_item_from_product_uses_display_price() {
        let product = Product {
            id: 1,
            woo_id: 10,
            name: "Widget".to_string(),
            price: 19.9,
            catalog_price: Some(15.0),
            description: String::new(),
            image_url: None,
            category: Some("Tools".to_string()),
            active: true,
            last_synced_at: String::new(),
            created_at: String::new(),
        };
        let item = CatalogItem::from(&product);
        assert!((item.price - 15.0).abs() < f64::EPSILON);
        assert_eq!(item.category.as_deref(), Some("Tools"));
    }
}
