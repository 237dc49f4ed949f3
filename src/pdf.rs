//! Renders a `TableLayout` as a US Letter PDF.
//!
//! Only the standard Type1 Helvetica faces are used, so no font program is
//! embedded and text is measured with the Helvetica metrics below. Cells
//! wrap on word boundaries; a row that does not fit the remaining height of
//! a page moves to the next one.

use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use super::error::RosterError;
use super::report::TableLayout;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const TABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_FONT_SIZE: f32 = 18.0;
const TITLE_LEADING: f32 = 22.0;
const TITLE_SPACE_AFTER: f32 = 24.0;

const PADDING_X: f32 = 6.0;
const PADDING_TOP: f32 = 3.0;
const PADDING_BOTTOM: f32 = 3.0;
const HEADER_PADDING_BOTTOM: f32 = 12.0;
const LEADING_FACTOR: f32 = 1.2;

const REGULAR_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

const GRID_GREY: (f32, f32, f32) = (0.5, 0.5, 0.5);
const WHITESMOKE: (f32, f32, f32) = (0.96, 0.96, 0.96);
const BEIGE: (f32, f32, f32) = (0.96, 0.96, 0.86);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

/// Helvetica advance widths for ' '..='~', in thousandths of the font size.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];
const DEFAULT_WIDTH: u16 = 556;
/// Helvetica-Bold runs about this much wider than the regular face.
const BOLD_WIDENING: f32 = 1.05;

#[derive(Clone, Copy)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    fn resource(self) -> &'static [u8] {
        match self {
            Face::Regular => REGULAR_FONT,
            Face::Bold => BOLD_FONT,
        }
    }
}

fn text_width(text: &str, size: f32, face: Face) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                u32::from(DEFAULT_WIDTH)
            }
        })
        .sum();
    let width = units as f32 * size / 1000.0;
    match face {
        Face::Regular => width,
        Face::Bold => width * BOLD_WIDENING,
    }
}

/// Greedy word wrap. Words longer than the line are split by character.
fn wrap(text: &str, max_width: f32, size: f32, face: Face) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size, face) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            let mut extended = current.clone();
            extended.push(c);
            if !current.is_empty() && text_width(&extended, size, face) > max_width {
                lines.push(std::mem::take(&mut current));
                current.push(c);
            } else {
                current = extended;
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// The standard fonts are set up with WinAnsiEncoding; characters it cannot
/// encode print as '?'.
fn win_ansi(text: &str) -> Vec<u8> {
    let mut buffer = [0; 4];
    text.chars()
        .map(|c| {
            let (bytes, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buffer));
            match *bytes {
                [byte] if !unmappable => byte,
                _ => b'?',
            }
        })
        .collect()
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn set_fill(ops: &mut Vec<Operation>, (r, g, b): (f32, f32, f32)) {
    ops.push(Operation::new("rg", vec![real(r), real(g), real(b)]));
}

fn rectangle(ops: &mut Vec<Operation>, x: f32, y: f32, width: f32, height: f32, paint: &str) {
    ops.push(Operation::new(
        "re",
        vec![real(x), real(y), real(width), real(height)],
    ));
    ops.push(Operation::new(paint, vec![]));
}

fn show_text(ops: &mut Vec<Operation>, text: &str, x: f32, baseline: f32, size: f32, face: Face) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(face.resource().to_vec()), real(size)],
    ));
    ops.push(Operation::new("Td", vec![real(x), real(baseline)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
    ops.push(Operation::new("ET", vec![]));
}

/// One table row with its cells already wrapped.
struct RowBox {
    cells: Vec<Vec<String>>,
    height: f32,
    size: f32,
    face: Face,
    padding_bottom: f32,
    background: (f32, f32, f32),
    text_colour: (f32, f32, f32),
}

impl RowBox {
    fn new(
        cells: &[String],
        widths: &[f32],
        size: f32,
        face: Face,
        padding_bottom: f32,
        background: (f32, f32, f32),
        text_colour: (f32, f32, f32),
    ) -> Self {
        let cells: Vec<Vec<String>> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let text = cells.get(i).map(String::as_str).unwrap_or_default();
                wrap(text, width - 2.0 * PADDING_X, size, face)
            })
            .collect();
        let line_count = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = line_count as f32 * size * LEADING_FACTOR + PADDING_TOP + padding_bottom;
        RowBox {
            cells,
            height,
            size,
            face,
            padding_bottom,
            background,
            text_colour,
        }
    }

    fn draw(&self, ops: &mut Vec<Operation>, top: f32, widths: &[f32]) {
        let bottom = top - self.height;
        let leading = self.size * LEADING_FACTOR;
        let content_height = self.height - PADDING_TOP - self.padding_bottom;

        let mut x = MARGIN;
        for (lines, width) in self.cells.iter().zip(widths) {
            set_fill(ops, self.background);
            rectangle(ops, x, bottom, *width, self.height, "f");

            // Centre the block of lines vertically, each line horizontally.
            let block = lines.len() as f32 * leading;
            let mut baseline =
                top - PADDING_TOP - (content_height - block) / 2.0 - self.size;
            set_fill(ops, self.text_colour);
            for line in lines {
                let line_x = x + (width - text_width(line, self.size, self.face)) / 2.0;
                show_text(ops, line, line_x, baseline, self.size, self.face);
                baseline -= leading;
            }

            ops.push(Operation::new("w", vec![real(1.0)]));
            ops.push(Operation::new(
                "RG",
                vec![real(BLACK.0), real(BLACK.1), real(BLACK.2)],
            ));
            rectangle(ops, x, bottom, *width, self.height, "S");
            x += width;
        }
    }
}

/// Pages of content operations for `layout`.
fn paginate(layout: &TableLayout) -> Vec<Vec<Operation>> {
    let widths: Vec<f32> = layout
        .column_fractions
        .iter()
        .map(|fraction| fraction * TABLE_WIDTH)
        .collect();

    let mut pages = Vec::new();
    let mut ops = Vec::new();
    let mut cursor = PAGE_HEIGHT - MARGIN;

    set_fill(&mut ops, BLACK);
    let title_width = text_width(&layout.title, TITLE_FONT_SIZE, Face::Bold);
    show_text(
        &mut ops,
        &layout.title,
        (PAGE_WIDTH - title_width) / 2.0,
        cursor - TITLE_FONT_SIZE,
        TITLE_FONT_SIZE,
        Face::Bold,
    );
    cursor -= TITLE_LEADING + TITLE_SPACE_AFTER;

    let header = RowBox::new(
        &layout.headers,
        &widths,
        layout.header_font_size,
        Face::Bold,
        HEADER_PADDING_BOTTOM,
        GRID_GREY,
        WHITESMOKE,
    );
    let body = layout.rows.iter().map(|row| {
        RowBox::new(
            row,
            &widths,
            layout.body_font_size,
            Face::Regular,
            PADDING_BOTTOM,
            BEIGE,
            BLACK,
        )
    });

    let mut rows_on_page = 0;
    for row in std::iter::once(header).chain(body) {
        if rows_on_page > 0 && cursor - row.height < MARGIN {
            pages.push(std::mem::take(&mut ops));
            cursor = PAGE_HEIGHT - MARGIN;
            rows_on_page = 0;
        }
        row.draw(&mut ops, cursor, &widths);
        cursor -= row.height;
        rows_on_page += 1;
    }
    pages.push(ops);
    pages
}

/// Renders `layout` into PDF bytes.
pub fn render(layout: &TableLayout) -> Result<Vec<u8>, RosterError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
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
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in paginate(layout) {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|err| RosterError::Render(err.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            real(PAGE_WIDTH),
            real(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(&layout.title)),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|err| RosterError::Render(err.to_string()))?;
    Ok(buffer)
}
